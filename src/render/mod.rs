mod primitives;

pub use primitives::{Color, LineStrokeStyle, LineStyle};
