//! multiaxis-rs: multi-axis plot layout, combined legends and synchronized
//! mouse tracking over a backend-neutral drawing surface.
//!
//! The crate never draws by itself. Backends implement `surface::Canvas`
//! (axis, spine, legend and line operations) and `surface::Surface` (a canvas
//! plus its event bus); `surface::HeadlessSurface` is the in-memory backend
//! used by tests and headless hosts.

pub mod core;
pub mod error;
pub mod event;
pub mod interaction;
pub mod layout;
pub mod render;
pub mod surface;
pub mod telemetry;

pub use error::{PlotError, PlotResult};
pub use event::{EventKind, EventRegistry, SubscriptionToken, SurfaceEvent};
pub use interaction::{TrackingController, TrackingOptions, TrackingState};
pub use layout::{
    AxisLabels, AxisStack, AxisStackBuilder, AxisStackConfig, LegendLocation, LegendOptions,
    build_axis_stack, combine_legend,
};
pub use render::{Color, LineStyle};
pub use surface::{Canvas, HeadlessSurface, Surface};
