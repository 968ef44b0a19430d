mod headless;

use serde::{Deserialize, Serialize};

use crate::core::{
    AxisId, AxisSide, LayoutPass, LineHandle, SpinePosition, SpineSide, SurfaceId, TickFormat,
};
use crate::error::PlotResult;
use crate::event::{EventRegistry, SurfaceEvent};
use crate::layout::Legend;
use crate::render::{Color, LineStyle};

pub use headless::{HeadlessAxis, HeadlessCanvas, HeadlessLine, HeadlessSurface};

/// Visibility and placement of one spine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpineState {
    pub visible: bool,
    pub position: SpinePosition,
}

impl Default for SpineState {
    fn default() -> Self {
        Self {
            visible: true,
            position: SpinePosition::Outward(0.0),
        }
    }
}

/// One legend row as reported by an axis: the artist it describes and its label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub handle: LineHandle,
    pub label: String,
}

impl LegendEntry {
    #[must_use]
    pub fn new(handle: LineHandle, label: impl Into<String>) -> Self {
        Self {
            handle,
            label: label.into(),
        }
    }
}

/// Drawing and axis operations a plotting backend provides.
///
/// Every axis-addressed call fails with `PlotError::UnknownAxis` when the
/// axis is not hosted here, except `remove_line` which reports absence
/// through its return value so teardown stays idempotent.
pub trait Canvas {
    fn title(&self) -> Option<&str>;

    /// Schedules a repaint; repeated requests before the next frame coalesce.
    fn request_redraw(&mut self);

    fn apply_layout(&mut self, layout: LayoutPass);

    fn has_axis(&self, axis: AxisId) -> bool;

    /// Creates an axis sharing the x axis and plotting area of `host`.
    fn create_twin_axis(&mut self, host: AxisId) -> PlotResult<AxisId>;

    fn set_x_label(&mut self, axis: AxisId, label: &str) -> PlotResult<()>;

    fn set_grid(&mut self, axis: AxisId, visible: bool) -> PlotResult<()>;

    fn set_y_label(&mut self, axis: AxisId, label: &str) -> PlotResult<()>;

    /// Moves y label and y ticks to `side`.
    fn set_y_axis_side(&mut self, axis: AxisId, side: AxisSide) -> PlotResult<()>;

    fn set_frame_on(&mut self, axis: AxisId, on: bool) -> PlotResult<()>;

    fn set_patch_visible(&mut self, axis: AxisId, visible: bool) -> PlotResult<()>;

    fn spine(&self, axis: AxisId, spine: SpineSide) -> PlotResult<SpineState>;

    fn set_spine_visible(&mut self, axis: AxisId, spine: SpineSide, visible: bool)
    -> PlotResult<()>;

    fn set_spine_position(
        &mut self,
        axis: AxisId,
        spine: SpineSide,
        position: SpinePosition,
    ) -> PlotResult<()>;

    fn set_y_tick_format(&mut self, axis: AxisId, format: TickFormat) -> PlotResult<()>;

    fn set_y_axis_color(
        &mut self,
        axis: AxisId,
        color: Color,
        label: bool,
        ticks: bool,
    ) -> PlotResult<()>;

    /// Draws a line spanning the full height of `axis` at data coordinate `x`.
    fn draw_vertical_line(&mut self, axis: AxisId, x: f64, style: &LineStyle)
    -> PlotResult<LineHandle>;

    /// Returns `false` when the line (or its axis) no longer exists.
    fn remove_line(&mut self, axis: AxisId, line: LineHandle) -> bool;

    fn legend_entries(&self, axis: AxisId) -> PlotResult<Vec<LegendEntry>>;

    fn set_legend(&mut self, axis: AxisId, legend: Legend) -> PlotResult<()>;

    fn remove_legend(&mut self, axis: AxisId) -> PlotResult<()>;
}

/// A rendering target: one canvas plus the event bus delivering its input.
pub trait Surface {
    fn id(&self) -> SurfaceId;

    /// Disjoint access to the event bus and the canvas.
    fn split(&mut self) -> (&mut EventRegistry, &mut dyn Canvas);

    fn events(&mut self) -> &mut EventRegistry {
        self.split().0
    }

    fn canvas(&mut self) -> &mut dyn Canvas {
        self.split().1
    }

    /// Delivers one event occurrence to the current subscribers.
    ///
    /// Backends that latch their close state override this so a dispatched
    /// close passes through the latch.
    fn dispatch(&mut self, event: &SurfaceEvent) -> PlotResult<()> {
        let (events, canvas) = self.split();
        events.dispatch(canvas, event)
    }
}
