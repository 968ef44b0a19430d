use indexmap::IndexMap;
use tracing::trace;

use crate::core::{
    AxisId, AxisSide, LayoutPass, LineHandle, SpinePosition, SpineSide, SurfaceId, TickFormat,
};
use crate::error::{PlotError, PlotResult};
use crate::event::{EventKind, EventRegistry, SurfaceEvent};
use crate::layout::Legend;
use crate::render::{Color, LineStyle};

use super::{Canvas, LegendEntry, SpineState, Surface};

/// Vertical line recorded by the headless canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadlessLine {
    pub handle: LineHandle,
    pub x: f64,
    pub style: LineStyle,
}

/// Recorded state of one axis hosted by `HeadlessCanvas`.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessAxis {
    pub id: AxisId,
    pub twin_of: Option<AxisId>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub y_axis_side: AxisSide,
    pub frame_on: bool,
    pub patch_visible: bool,
    pub grid: bool,
    pub spines: IndexMap<SpineSide, SpineState>,
    pub y_tick_format: TickFormat,
    pub y_label_color: Option<Color>,
    pub y_tick_color: Option<Color>,
    pub series: Vec<LegendEntry>,
    pub lines: Vec<HeadlessLine>,
    pub legend: Option<Legend>,
}

impl HeadlessAxis {
    fn new(id: AxisId, twin_of: Option<AxisId>) -> Self {
        // Twins start frameless with ticks on the right, like twinned axes in
        // common plotting backends.
        let twin = twin_of.is_some();
        Self {
            id,
            twin_of,
            x_label: None,
            y_label: None,
            y_axis_side: if twin { AxisSide::Right } else { AxisSide::Left },
            frame_on: !twin,
            patch_visible: !twin,
            grid: false,
            spines: SpineSide::ALL
                .into_iter()
                .map(|side| (side, SpineState::default()))
                .collect(),
            y_tick_format: TickFormat::default(),
            y_label_color: None,
            y_tick_color: None,
            series: Vec::new(),
            lines: Vec::new(),
            legend: None,
        }
    }

    #[must_use]
    pub fn spine(&self, side: SpineSide) -> SpineState {
        self.spines.get(&side).copied().unwrap_or_default()
    }

    /// Spine position as an axis fraction, when placed in that unit.
    #[must_use]
    pub fn spine_fraction(&self, side: SpineSide) -> Option<f64> {
        match self.spine(side).position {
            SpinePosition::Axes(value) => Some(value),
            SpinePosition::Outward(_) => None,
        }
    }
}

/// In-memory canvas for tests and headless hosts.
///
/// It records every mutation instead of drawing, and models deferred redraw:
/// requests set a pending flag that `flush_redraw` turns into one repaint.
#[derive(Debug, Default)]
pub struct HeadlessCanvas {
    title: Option<String>,
    axes: IndexMap<AxisId, HeadlessAxis>,
    next_axis: u32,
    next_artist: u64,
    redraw_pending: bool,
    redraw_requests: u64,
    repaint_count: u64,
    layout_passes: Vec<LayoutPass>,
}

impl HeadlessCanvas {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_title(&mut self, title: Option<&str>) {
        self.title = title.map(str::to_owned);
    }

    /// Adds a primary (non-twin) axis.
    pub fn add_axis(&mut self) -> AxisId {
        self.insert_axis(None)
    }

    /// Plots a labeled series on `axis` so it contributes a legend entry.
    pub fn plot_series(&mut self, axis: AxisId, label: &str) -> PlotResult<LineHandle> {
        let handle = self.next_artist();
        self.axis_mut(axis)?
            .series
            .push(LegendEntry::new(handle, label));
        Ok(handle)
    }

    #[must_use]
    pub fn axis(&self, axis: AxisId) -> Option<&HeadlessAxis> {
        self.axes.get(&axis)
    }

    pub fn axes(&self) -> impl Iterator<Item = &HeadlessAxis> {
        self.axes.values()
    }

    #[must_use]
    pub fn axis_count(&self) -> usize {
        self.axes.len()
    }

    /// Total number of vertical lines currently drawn across all axes.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.axes.values().map(|axis| axis.lines.len()).sum()
    }

    #[must_use]
    pub fn layout_passes(&self) -> &[LayoutPass] {
        &self.layout_passes
    }

    #[must_use]
    pub fn redraw_requests(&self) -> u64 {
        self.redraw_requests
    }

    #[must_use]
    pub fn is_redraw_pending(&self) -> bool {
        self.redraw_pending
    }

    /// Ends the current processing tick. Returns `true` when a repaint ran.
    pub fn flush_redraw(&mut self) -> bool {
        if !self.redraw_pending {
            return false;
        }
        self.redraw_pending = false;
        self.repaint_count += 1;
        true
    }

    #[must_use]
    pub fn repaint_count(&self) -> u64 {
        self.repaint_count
    }

    /// Drops every axis and artist, as a backend does when its window is destroyed.
    pub fn teardown(&mut self) {
        self.axes.clear();
        self.redraw_pending = false;
    }

    fn insert_axis(&mut self, twin_of: Option<AxisId>) -> AxisId {
        let id = AxisId::new(self.next_axis);
        self.next_axis += 1;
        self.axes.insert(id, HeadlessAxis::new(id, twin_of));
        id
    }

    fn next_artist(&mut self) -> LineHandle {
        self.next_artist += 1;
        LineHandle::new(self.next_artist)
    }

    fn axis_ref(&self, axis: AxisId) -> PlotResult<&HeadlessAxis> {
        self.axes.get(&axis).ok_or(PlotError::UnknownAxis(axis))
    }

    fn axis_mut(&mut self, axis: AxisId) -> PlotResult<&mut HeadlessAxis> {
        self.axes.get_mut(&axis).ok_or(PlotError::UnknownAxis(axis))
    }
}

impl Canvas for HeadlessCanvas {
    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn request_redraw(&mut self) {
        self.redraw_requests += 1;
        self.redraw_pending = true;
    }

    fn apply_layout(&mut self, layout: LayoutPass) {
        self.layout_passes.push(layout);
    }

    fn has_axis(&self, axis: AxisId) -> bool {
        self.axes.contains_key(&axis)
    }

    fn create_twin_axis(&mut self, host: AxisId) -> PlotResult<AxisId> {
        self.axis_ref(host)?;
        let twin = self.insert_axis(Some(host));
        trace!(host = %host, twin = %twin, "created twin axis");
        Ok(twin)
    }

    fn set_x_label(&mut self, axis: AxisId, label: &str) -> PlotResult<()> {
        self.axis_mut(axis)?.x_label = Some(label.to_owned());
        Ok(())
    }

    fn set_grid(&mut self, axis: AxisId, visible: bool) -> PlotResult<()> {
        self.axis_mut(axis)?.grid = visible;
        Ok(())
    }

    fn set_y_label(&mut self, axis: AxisId, label: &str) -> PlotResult<()> {
        self.axis_mut(axis)?.y_label = Some(label.to_owned());
        Ok(())
    }

    fn set_y_axis_side(&mut self, axis: AxisId, side: AxisSide) -> PlotResult<()> {
        self.axis_mut(axis)?.y_axis_side = side;
        Ok(())
    }

    fn set_frame_on(&mut self, axis: AxisId, on: bool) -> PlotResult<()> {
        self.axis_mut(axis)?.frame_on = on;
        Ok(())
    }

    fn set_patch_visible(&mut self, axis: AxisId, visible: bool) -> PlotResult<()> {
        self.axis_mut(axis)?.patch_visible = visible;
        Ok(())
    }

    fn spine(&self, axis: AxisId, spine: SpineSide) -> PlotResult<SpineState> {
        Ok(self.axis_ref(axis)?.spine(spine))
    }

    fn set_spine_visible(
        &mut self,
        axis: AxisId,
        spine: SpineSide,
        visible: bool,
    ) -> PlotResult<()> {
        self.axis_mut(axis)?
            .spines
            .entry(spine)
            .or_default()
            .visible = visible;
        Ok(())
    }

    fn set_spine_position(
        &mut self,
        axis: AxisId,
        spine: SpineSide,
        position: SpinePosition,
    ) -> PlotResult<()> {
        self.axis_mut(axis)?
            .spines
            .entry(spine)
            .or_default()
            .position = position;
        Ok(())
    }

    fn set_y_tick_format(&mut self, axis: AxisId, format: TickFormat) -> PlotResult<()> {
        self.axis_mut(axis)?.y_tick_format = format;
        Ok(())
    }

    fn set_y_axis_color(
        &mut self,
        axis: AxisId,
        color: Color,
        label: bool,
        ticks: bool,
    ) -> PlotResult<()> {
        let state = self.axis_mut(axis)?;
        if label {
            state.y_label_color = Some(color);
        }
        if ticks {
            state.y_tick_color = Some(color);
        }
        Ok(())
    }

    fn draw_vertical_line(
        &mut self,
        axis: AxisId,
        x: f64,
        style: &LineStyle,
    ) -> PlotResult<LineHandle> {
        if !x.is_finite() {
            return Err(PlotError::Backend(format!(
                "vertical line position must be finite, got {x}"
            )));
        }
        self.axis_ref(axis)?;
        let handle = self.next_artist();
        self.axis_mut(axis)?.lines.push(HeadlessLine {
            handle,
            x,
            style: *style,
        });
        Ok(handle)
    }

    fn remove_line(&mut self, axis: AxisId, line: LineHandle) -> bool {
        let Some(state) = self.axes.get_mut(&axis) else {
            return false;
        };
        let before = state.lines.len();
        state.lines.retain(|drawn| drawn.handle != line);
        state.lines.len() != before
    }

    fn legend_entries(&self, axis: AxisId) -> PlotResult<Vec<LegendEntry>> {
        Ok(self.axis_ref(axis)?.series.clone())
    }

    fn set_legend(&mut self, axis: AxisId, legend: Legend) -> PlotResult<()> {
        self.axis_mut(axis)?.legend = Some(legend);
        Ok(())
    }

    fn remove_legend(&mut self, axis: AxisId) -> PlotResult<()> {
        self.axis_mut(axis)?.legend = None;
        Ok(())
    }
}

/// Headless surface: a `HeadlessCanvas` plus its event bus.
///
/// The close event is delivered at most once, whether it arrives through
/// `close` or `Surface::dispatch`.
#[derive(Debug)]
pub struct HeadlessSurface {
    id: SurfaceId,
    events: EventRegistry,
    canvas: HeadlessCanvas,
    closed: bool,
}

impl HeadlessSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::with_events(EventRegistry::new())
    }

    /// Surface whose bus only delivers `kinds`.
    #[must_use]
    pub fn with_supported_events(kinds: impl IntoIterator<Item = EventKind>) -> Self {
        Self::with_events(EventRegistry::with_supported(kinds))
    }

    fn with_events(events: EventRegistry) -> Self {
        Self {
            id: SurfaceId::allocate(),
            events,
            canvas: HeadlessCanvas::new(),
            closed: false,
        }
    }

    #[must_use]
    pub fn headless(&self) -> &HeadlessCanvas {
        &self.canvas
    }

    pub fn headless_mut(&mut self) -> &mut HeadlessCanvas {
        &mut self.canvas
    }

    #[must_use]
    pub fn event_registry(&self) -> &EventRegistry {
        &self.events
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Closes the surface and delivers the close event to its subscribers.
    pub fn close(&mut self) -> PlotResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.events.dispatch(&mut self.canvas, &SurfaceEvent::Close)
    }
}

impl Surface for HeadlessSurface {
    fn id(&self) -> SurfaceId {
        self.id
    }

    fn split(&mut self) -> (&mut EventRegistry, &mut dyn Canvas) {
        (&mut self.events, &mut self.canvas)
    }

    fn dispatch(&mut self, event: &SurfaceEvent) -> PlotResult<()> {
        match event {
            SurfaceEvent::Close => self.close(),
            _ => self.events.dispatch(&mut self.canvas, event),
        }
    }
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::{HeadlessCanvas, HeadlessSurface};
    use crate::core::{AxisSide, SpineSide};
    use crate::error::PlotError;
    use crate::event::{self, EventContext, EventKind, SurfaceEvent};
    use crate::render::LineStyle;
    use crate::surface::{Canvas, Surface};

    #[test]
    fn twin_axes_start_frameless_on_the_right() {
        let mut canvas = HeadlessCanvas::new();
        let host = canvas.add_axis();
        let twin = canvas.create_twin_axis(host).expect("twin");

        let twin_state = canvas.axis(twin).expect("twin state");
        assert_eq!(twin_state.twin_of, Some(host));
        assert_eq!(twin_state.y_axis_side, AxisSide::Right);
        assert!(!twin_state.frame_on);
        assert!(canvas.axis(host).expect("host").frame_on);
    }

    #[test]
    fn removing_missing_lines_is_not_an_error() {
        let mut canvas = HeadlessCanvas::new();
        let axis = canvas.add_axis();
        let line = canvas
            .draw_vertical_line(axis, 3.0, &LineStyle::default())
            .expect("draw");

        assert!(canvas.remove_line(axis, line));
        assert!(!canvas.remove_line(axis, line));
        canvas.teardown();
        assert!(!canvas.remove_line(axis, line));
    }

    #[test]
    fn unknown_axis_is_reported() {
        let mut canvas = HeadlessCanvas::new();
        let axis = canvas.add_axis();
        canvas.teardown();
        assert_eq!(
            canvas.set_spine_visible(axis, SpineSide::Left, false),
            Err(PlotError::UnknownAxis(axis))
        );
    }

    #[test]
    fn redraw_requests_coalesce_into_one_repaint() {
        let mut canvas = HeadlessCanvas::new();
        canvas.request_redraw();
        canvas.request_redraw();
        canvas.request_redraw();

        assert!(canvas.flush_redraw());
        assert!(!canvas.flush_redraw());
        assert_eq!(canvas.redraw_requests(), 3);
        assert_eq!(canvas.repaint_count(), 1);
    }

    #[test]
    fn close_is_delivered_once() {
        let mut surface = HeadlessSurface::new();
        assert!(surface.close().is_ok());
        assert!(surface.is_closed());
        assert!(surface.close().is_ok());
    }

    #[test]
    fn dispatched_close_goes_through_the_close_latch() {
        let mut surface = HeadlessSurface::new();
        let closes = Rc::new(Cell::new(0_u32));
        let counter = Rc::clone(&closes);
        event::subscribe(
            &mut surface,
            EventKind::SurfaceClose,
            move |_: &mut EventContext<'_>, _: &SurfaceEvent| {
                counter.set(counter.get() + 1);
                Ok(())
            },
        )
        .expect("subscribe close");

        surface.dispatch(&SurfaceEvent::Close).expect("first close");
        assert!(surface.is_closed());
        surface.dispatch(&SurfaceEvent::Close).expect("second close");
        surface.close().expect("explicit close");
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn headless_surfaces_get_distinct_ids() {
        let first = HeadlessSurface::new();
        let second = HeadlessSurface::default();
        assert_ne!(first.id(), second.id());
        assert_ne!(first.event_registry().id(), second.event_registry().id());
    }
}
