use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::{debug, trace, warn};

use crate::core::{AxisId, LineHandle, SurfaceId};
use crate::error::{PlotError, PlotResult};
use crate::event::{
    self, BusId, EventContext, EventKind, PointerPosition, SubscriptionToken, SurfaceEvent,
};
use crate::render::LineStyle;
use crate::surface::{Canvas, Surface};

use super::TrackingState;

/// Maps the raw pointer x (data units) to the x where lines are drawn.
///
/// Invoked with no session borrow held, so it may query the controller.
pub type CoordinateConverter = Rc<dyn Fn(f64) -> PlotResult<f64>>;

/// Converter snapping x to the nearest multiple of `step`.
pub fn snap_to_step(step: f64) -> PlotResult<impl Fn(f64) -> PlotResult<f64>> {
    if !step.is_finite() || step <= 0.0 {
        return Err(PlotError::Configuration(
            "snap step must be finite and > 0".to_owned(),
        ));
    }
    Ok(move |x: f64| Ok((x / step).round() * step))
}

/// Line style and optional converter for one tracking session.
pub struct TrackingOptions {
    style: LineStyle,
    converter: Option<CoordinateConverter>,
}

impl TrackingOptions {
    #[must_use]
    pub fn new(style: LineStyle) -> Self {
        Self {
            style,
            converter: None,
        }
    }

    #[must_use]
    pub fn with_converter<F>(mut self, converter: F) -> Self
    where
        F: Fn(f64) -> PlotResult<f64> + 'static,
    {
        self.converter = Some(Rc::new(converter));
        self
    }

    #[must_use]
    pub fn style(&self) -> LineStyle {
        self.style
    }

    #[must_use]
    pub fn has_converter(&self) -> bool {
        self.converter.is_some()
    }
}

impl Default for TrackingOptions {
    fn default() -> Self {
        Self::new(LineStyle::default())
    }
}

impl fmt::Debug for TrackingOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackingOptions")
            .field("style", &self.style)
            .field("converter", &self.converter.is_some())
            .finish()
    }
}

/// Tracking state of one surface.
///
/// Holds exactly one artifact slot per tracked axis. A slot is `Some` only
/// between a pointer move and the next move, disable or close.
pub struct TrackingSession {
    surface: SurfaceId,
    bus: BusId,
    generation: u64,
    artifacts: IndexMap<AxisId, Option<LineHandle>>,
    move_token: SubscriptionToken,
    close_token: SubscriptionToken,
    style: LineStyle,
    converter: Option<CoordinateConverter>,
    last_x: Option<f64>,
}

impl TrackingSession {
    #[must_use]
    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    /// Event bus holding this session's subscriptions.
    #[must_use]
    pub fn bus(&self) -> BusId {
        self.bus
    }

    pub fn tracked_axes(&self) -> impl Iterator<Item = AxisId> + '_ {
        self.artifacts.keys().copied()
    }

    #[must_use]
    pub fn tracked_len(&self) -> usize {
        self.artifacts.len()
    }

    /// Current line of `axis`; `None` when nothing is drawn or `axis` is untracked.
    #[must_use]
    pub fn artifact(&self, axis: AxisId) -> Option<LineHandle> {
        self.artifacts.get(&axis).copied().flatten()
    }

    pub fn artifacts(&self) -> impl Iterator<Item = (AxisId, Option<LineHandle>)> + '_ {
        self.artifacts.iter().map(|(axis, line)| (*axis, *line))
    }

    #[must_use]
    pub fn drawn_count(&self) -> usize {
        self.artifacts.values().filter(|line| line.is_some()).count()
    }

    /// `(move, close)` subscription tokens.
    #[must_use]
    pub fn tokens(&self) -> (SubscriptionToken, SubscriptionToken) {
        (self.move_token, self.close_token)
    }

    #[must_use]
    pub fn line_style(&self) -> LineStyle {
        self.style
    }

    /// X of the lines currently drawn, after conversion.
    #[must_use]
    pub fn last_x(&self) -> Option<f64> {
        self.last_x
    }

    /// Removes every drawn line and empties all slots. Returns how many lines
    /// were still present on the canvas.
    fn clear_artifacts(&mut self, canvas: &mut dyn Canvas) -> usize {
        let mut removed = 0;
        let mut missing = 0;
        for (axis, slot) in &mut self.artifacts {
            if let Some(line) = slot.take() {
                if canvas.remove_line(*axis, line) {
                    removed += 1;
                } else {
                    missing += 1;
                }
            }
        }
        self.last_x = None;
        if missing > 0 {
            warn!(surface = %self.surface, missing, "tracking lines already gone");
        }
        removed
    }

    /// First half of a move: drops the previous lines and yields the raw x
    /// to convert, if the event carries a usable one.
    fn begin_move(
        &mut self,
        canvas: &mut dyn Canvas,
        position: Option<PointerPosition>,
    ) -> Option<f64> {
        if self.clear_artifacts(canvas) > 0 {
            canvas.request_redraw();
        }
        position.map(|position| position.x).filter(|x| x.is_finite())
    }

    /// Second half of a move: draws one line per tracked axis at `x`.
    fn finish_move(&mut self, canvas: &mut dyn Canvas, raw_x: f64, x: f64) -> PlotResult<()> {
        if !x.is_finite() {
            return Err(PlotError::Converter(format!(
                "converted x must be finite, got {x} for {raw_x}"
            )));
        }

        let mut failure = None;
        for (axis, slot) in &mut self.artifacts {
            match canvas.draw_vertical_line(*axis, x, &self.style) {
                Ok(line) => *slot = Some(line),
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }
        if let Some(err) = failure {
            self.clear_artifacts(canvas);
            return Err(err);
        }

        self.last_x = Some(x);
        canvas.request_redraw();
        trace!(surface = %self.surface, x, lines = self.artifacts.len(), "drew tracking lines");
        Ok(())
    }
}

impl fmt::Debug for TrackingSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackingSession")
            .field("surface", &self.surface)
            .field("bus", &self.bus)
            .field("generation", &self.generation)
            .field("artifacts", &self.artifacts)
            .field("move_token", &self.move_token)
            .field("close_token", &self.close_token)
            .field("style", &self.style)
            .field("converter", &self.converter.is_some())
            .field("last_x", &self.last_x)
            .finish()
    }
}

/// Live tracking sessions, at most one per surface.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: IndexMap<SurfaceId, TrackingSession>,
    next_generation: u64,
}

impl SessionRegistry {
    #[must_use]
    pub fn get(&self, surface: SurfaceId) -> Option<&TrackingSession> {
        self.sessions.get(&surface)
    }

    #[must_use]
    pub fn contains(&self, surface: SurfaceId) -> bool {
        self.sessions.contains_key(&surface)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn allocate_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }

    // Handlers of a replaced session must never touch its successor.
    fn current_mut(&mut self, surface: SurfaceId, generation: u64) -> Option<&mut TrackingSession> {
        self.sessions
            .get_mut(&surface)
            .filter(|session| session.generation == generation)
    }

    fn take_current(&mut self, surface: SurfaceId, generation: u64) -> Option<TrackingSession> {
        self.current_mut(surface, generation)?;
        self.sessions.shift_remove(&surface)
    }

    // Tokens of a session are only valid on the bus that issued them.
    fn take_on_bus(&mut self, surface: SurfaceId, bus: BusId) -> Option<TrackingSession> {
        match self.sessions.get(&surface) {
            Some(session) if session.bus == bus => self.sessions.shift_remove(&surface),
            Some(session) => {
                warn!(
                    surface = %surface,
                    owner = session.bus.raw(),
                    bus = bus.raw(),
                    "surface id is tracked on another event bus; leaving it untouched"
                );
                None
            }
            None => None,
        }
    }
}

/// Draws synchronized vertical lines across a set of axes while the pointer
/// moves over a surface.
///
/// Clones share the same session registry.
#[derive(Debug, Clone, Default)]
pub struct TrackingController {
    sessions: Rc<RefCell<SessionRegistry>>,
}

impl TrackingController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self, surface: SurfaceId) -> TrackingState {
        if self.sessions.borrow().contains(surface) {
            TrackingState::Active
        } else {
            TrackingState::Inactive
        }
    }

    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.borrow().len()
    }

    /// Runs `inspect` against the session of `surface`, if any.
    pub fn with_session<R>(
        &self,
        surface: SurfaceId,
        inspect: impl FnOnce(&TrackingSession) -> R,
    ) -> Option<R> {
        self.sessions.borrow().get(surface).map(inspect)
    }

    /// Replaces any session on `surface` with one tracking `axes`.
    ///
    /// Arguments are checked before anything changes: an invalid style or an
    /// axis the surface does not host fails without touching the current
    /// session, and a bus lacking move or close events fails with
    /// `PlotError::Environment` before any subscription. So does a surface
    /// whose id is already tracked through a different event bus. Empty
    /// `axes` leaves the surface inactive.
    pub fn enable_tracking<S>(
        &self,
        surface: &mut S,
        axes: impl IntoIterator<Item = AxisId>,
        options: TrackingOptions,
    ) -> PlotResult<TrackingState>
    where
        S: Surface + ?Sized,
    {
        let surface_id = surface.id();
        let TrackingOptions { style, converter } = options;
        style.validate()?;

        let artifacts: IndexMap<AxisId, Option<LineHandle>> =
            axes.into_iter().map(|axis| (axis, None)).collect();
        {
            let (events, canvas) = surface.split();
            let bus = events.id();
            let owner = self.sessions.borrow().get(surface_id).map(TrackingSession::bus);
            if owner.is_some_and(|owner| owner != bus) {
                return Err(PlotError::Environment(format!(
                    "{surface_id} is already tracked through another event bus"
                )));
            }
            if let Some(axis) = artifacts.keys().find(|axis| !canvas.has_axis(**axis)) {
                return Err(PlotError::UnknownAxis(*axis));
            }
            for kind in [EventKind::PointerMove, EventKind::SurfaceClose] {
                if !artifacts.is_empty() && !events.supports(kind) {
                    return Err(PlotError::Environment(format!(
                        "{surface_id} cannot deliver `{}` events required for tracking",
                        kind.backend_name()
                    )));
                }
            }
        }

        self.disable_tracking(surface);
        if artifacts.is_empty() {
            debug!(surface = %surface_id, "tracking enabled without axes; surface stays inactive");
            return Ok(TrackingState::Inactive);
        }

        let bus = surface.events().id();
        let generation = self.sessions.borrow_mut().allocate_generation();
        let sessions = Rc::clone(&self.sessions);
        let move_token = event::subscribe(
            surface,
            EventKind::PointerMove,
            move |context: &mut EventContext<'_>, event: &SurfaceEvent| {
                on_pointer_move(&sessions, surface_id, generation, context, event)
            },
        )?;
        let sessions = Rc::clone(&self.sessions);
        let close_token = match event::subscribe(
            surface,
            EventKind::SurfaceClose,
            move |context: &mut EventContext<'_>, _: &SurfaceEvent| {
                on_surface_close(&sessions, surface_id, generation, context);
                Ok(())
            },
        ) {
            Ok(token) => token,
            Err(err) => {
                event::unsubscribe(surface, move_token);
                return Err(err);
            }
        };

        debug!(
            surface = %surface_id,
            axes = artifacts.len(),
            converter = converter.is_some(),
            "tracking enabled"
        );
        self.sessions.borrow_mut().sessions.insert(
            surface_id,
            TrackingSession {
                surface: surface_id,
                bus,
                generation,
                artifacts,
                move_token,
                close_token,
                style,
                converter,
                last_x: None,
            },
        );
        Ok(TrackingState::Active)
    }

    /// Unsubscribes both handlers, removes every line and forgets the
    /// session. Returns `false` when `surface` had no session, or when its id
    /// belongs to a session on another event bus, which is left untouched.
    pub fn disable_tracking<S>(&self, surface: &mut S) -> bool
    where
        S: Surface + ?Sized,
    {
        let surface_id = surface.id();
        let bus = surface.events().id();
        let Some(mut session) = self.sessions.borrow_mut().take_on_bus(surface_id, bus) else {
            return false;
        };

        let (events, canvas) = surface.split();
        events.unsubscribe(session.move_token);
        events.unsubscribe(session.close_token);
        let removed = session.clear_artifacts(canvas);
        if removed > 0 {
            canvas.request_redraw();
        }
        debug!(surface = %surface_id, removed, "tracking disabled");
        true
    }
}

fn on_pointer_move(
    sessions: &RefCell<SessionRegistry>,
    surface: SurfaceId,
    generation: u64,
    context: &mut EventContext<'_>,
    event: &SurfaceEvent,
) -> PlotResult<()> {
    let (raw_x, converter) = {
        let mut registry = sessions.borrow_mut();
        let Some(session) = registry.current_mut(surface, generation) else {
            return Ok(());
        };
        let Some(raw_x) = session.begin_move(context.canvas(), event.position()) else {
            return Ok(());
        };
        (raw_x, session.converter.clone())
    };

    // The registry is released here so the converter can reach the controller.
    let x = match converter {
        Some(converter) => converter(raw_x)?,
        None => raw_x,
    };

    let mut registry = sessions.borrow_mut();
    let Some(session) = registry.current_mut(surface, generation) else {
        return Ok(());
    };
    session.finish_move(context.canvas(), raw_x, x)
}

fn on_surface_close(
    sessions: &RefCell<SessionRegistry>,
    surface: SurfaceId,
    generation: u64,
    context: &mut EventContext<'_>,
) {
    let Some(mut session) = sessions.borrow_mut().take_current(surface, generation) else {
        return;
    };
    context.unsubscribe(session.move_token);
    context.unsubscribe(session.close_token);
    let removed = session.clear_artifacts(context.canvas());
    debug!(surface = %surface, removed, "tracking ended by surface close");
}

#[cfg(test)]
mod tests {
    use super::{TrackingController, TrackingOptions, snap_to_step};
    use crate::error::PlotError;
    use crate::event::SurfaceEvent;
    use crate::interaction::TrackingState;
    use crate::surface::{HeadlessSurface, Surface};

    #[test]
    fn snap_to_step_rounds_to_nearest_multiple() {
        let snap = snap_to_step(0.5).expect("valid step");
        assert_eq!(snap(1.2), Ok(1.0));
        assert_eq!(snap(1.3), Ok(1.5));
        assert!(matches!(snap_to_step(0.0), Err(PlotError::Configuration(_))));
    }

    #[test]
    fn replaced_session_handlers_do_not_touch_successor() {
        let controller = TrackingController::new();
        let mut surface = HeadlessSurface::new();
        let axis = surface.headless_mut().add_axis();

        controller
            .enable_tracking(&mut surface, [axis], TrackingOptions::default())
            .expect("first enable");
        let first_generation = controller
            .with_session(surface.id(), |session| session.generation)
            .expect("session");
        controller
            .enable_tracking(&mut surface, [axis], TrackingOptions::default())
            .expect("second enable");
        let second_generation = controller
            .with_session(surface.id(), |session| session.generation)
            .expect("session");
        assert!(second_generation > first_generation);

        // A stale close handler must not remove the live session.
        let stale = controller
            .sessions
            .borrow_mut()
            .take_current(surface.id(), first_generation);
        assert!(stale.is_none());
        assert_eq!(controller.state(surface.id()), TrackingState::Active);

        surface
            .dispatch(&SurfaceEvent::pointer_move(2.0, 0.0))
            .expect("dispatch");
        assert_eq!(surface.headless().line_count(), 1);
    }
}
