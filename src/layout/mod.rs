pub mod axis_stack;
pub mod legend;

pub use axis_stack::{
    AxisLabels, AxisStack, AxisStackBuilder, AxisStackConfig, DEFAULT_SPINE_OFFSET, OffsetUnit,
    build_axis_stack, tint_y_axis,
};
pub use legend::{Legend, LegendLocation, LegendOptions, combine_legend, combine_legend_with};
