pub mod types;

pub use types::{
    AxisId, AxisSide, LayoutPass, LineHandle, SpinePosition, SpineSide, SurfaceId, TickFormat,
};
