use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::debug;

use crate::core::{AxisId, AxisSide, LayoutPass, SpinePosition, SpineSide, TickFormat};
use crate::error::{PlotError, PlotResult};
use crate::render::Color;
use crate::surface::Canvas;

/// Y labels requested for one side of the stack.
///
/// `Single` on the left labels the host axis in place; `Many` creates one
/// axis per label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AxisLabels {
    #[default]
    None,
    Single(String),
    Many(Vec<String>),
}

impl AxisLabels {
    #[must_use]
    pub fn many<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Many(labels.into_iter().map(Into::into).collect())
    }

    /// Number of axes these labels stand for.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Single(_) => 1,
            Self::Many(labels) => labels.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<&str> for AxisLabels {
    fn from(label: &str) -> Self {
        Self::Single(label.to_owned())
    }
}

impl From<String> for AxisLabels {
    fn from(label: String) -> Self {
        Self::Single(label)
    }
}

impl From<Vec<String>> for AxisLabels {
    fn from(labels: Vec<String>) -> Self {
        Self::Many(labels)
    }
}

impl From<Vec<&str>> for AxisLabels {
    fn from(labels: Vec<&str>) -> Self {
        Self::many(labels)
    }
}

impl<const N: usize> From<[&str; N]> for AxisLabels {
    fn from(labels: [&str; N]) -> Self {
        Self::many(labels)
    }
}

impl<T: Into<AxisLabels>> From<Option<T>> for AxisLabels {
    fn from(labels: Option<T>) -> Self {
        labels.map_or(Self::None, Into::into)
    }
}

/// Unit of the spacing between stacked spines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffsetUnit {
    /// Fraction of the plotting area width.
    #[default]
    Axes,
    /// Points pushed outward from the plotting area.
    Outward,
}

impl OffsetUnit {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Axes => "axes",
            Self::Outward => "outward",
        }
    }
}

impl fmt::Display for OffsetUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OffsetUnit {
    type Err = PlotError;

    fn from_str(input: &str) -> PlotResult<Self> {
        match input {
            "axes" => Ok(Self::Axes),
            "outward" => Ok(Self::Outward),
            other => Err(PlotError::Configuration(format!(
                "unsupported spine offset unit `{other}`"
            ))),
        }
    }
}

pub const DEFAULT_SPINE_OFFSET: f64 = 0.055;

/// Serializable description of an axis stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisStackConfig {
    #[serde(default)]
    pub x_label: Option<String>,
    #[serde(default)]
    pub left: AxisLabels,
    #[serde(default)]
    pub right: AxisLabels,
    #[serde(default = "default_offset")]
    pub offset: f64,
    #[serde(default)]
    pub offset_unit: OffsetUnit,
    /// Grid lines on the host axis.
    #[serde(default = "default_grid")]
    pub grid: bool,
}

impl AxisStackConfig {
    pub fn validate(&self) -> PlotResult<()> {
        if !self.offset.is_finite() || self.offset < 0.0 {
            return Err(PlotError::Configuration(format!(
                "spine offset must be finite and >= 0, got {}",
                self.offset
            )));
        }
        for (side, labels) in [("left", &self.left), ("right", &self.right)] {
            if let AxisLabels::Many(labels) = labels {
                if let Some(index) = labels.iter().position(|label| label.trim().is_empty()) {
                    return Err(PlotError::Configuration(format!(
                        "{side} y label #{index} is blank"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn to_json_pretty(&self) -> PlotResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            PlotError::Configuration(format!("failed to serialize axis stack config: {e}"))
        })
    }

    pub fn from_json_str(input: &str) -> PlotResult<Self> {
        let config: Self = serde_json::from_str(input).map_err(|e| {
            PlotError::Configuration(format!("failed to parse axis stack config: {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for AxisStackConfig {
    fn default() -> Self {
        Self {
            x_label: None,
            left: AxisLabels::None,
            right: AxisLabels::None,
            offset: default_offset(),
            offset_unit: OffsetUnit::Axes,
            grid: default_grid(),
        }
    }
}

fn default_offset() -> f64 {
    DEFAULT_SPINE_OFFSET
}

fn default_grid() -> bool {
    true
}

/// Axes sharing one surface, ordered outermost-left to outermost-right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisStack {
    axes: SmallVec<[AxisId; 4]>,
    left_len: usize,
}

impl AxisStack {
    #[must_use]
    pub fn as_slice(&self) -> &[AxisId] {
        &self.axes
    }

    /// Left axes, outermost first. The last one touches the plotting area.
    #[must_use]
    pub fn left(&self) -> &[AxisId] {
        &self.axes[..self.left_len]
    }

    /// Right axes, innermost first.
    #[must_use]
    pub fn right(&self) -> &[AxisId] {
        &self.axes[self.left_len..]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.axes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = AxisId> + '_ {
        self.axes.iter().copied()
    }

    #[must_use]
    pub fn side_of(&self, index: usize) -> Option<AxisSide> {
        if index >= self.axes.len() {
            None
        } else if index < self.left_len {
            Some(AxisSide::Left)
        } else {
            Some(AxisSide::Right)
        }
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<AxisId> {
        self.axes.into_vec()
    }
}

impl<'a> IntoIterator for &'a AxisStack {
    type Item = &'a AxisId;
    type IntoIter = std::slice::Iter<'a, AxisId>;

    fn into_iter(self) -> Self::IntoIter {
        self.axes.iter()
    }
}

/// Builds stacked y axes around a host axis.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisStackBuilder {
    host: AxisId,
    config: AxisStackConfig,
}

impl AxisStackBuilder {
    #[must_use]
    pub fn new(host: AxisId) -> Self {
        Self::from_config(host, AxisStackConfig::default())
    }

    #[must_use]
    pub fn from_config(host: AxisId, config: AxisStackConfig) -> Self {
        Self { host, config }
    }

    #[must_use]
    pub fn x_label(mut self, label: impl Into<String>) -> Self {
        self.config.x_label = Some(label.into());
        self
    }

    #[must_use]
    pub fn left(mut self, labels: impl Into<AxisLabels>) -> Self {
        self.config.left = labels.into();
        self
    }

    #[must_use]
    pub fn right(mut self, labels: impl Into<AxisLabels>) -> Self {
        self.config.right = labels.into();
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: f64) -> Self {
        self.config.offset = offset;
        self
    }

    #[must_use]
    pub fn offset_unit(mut self, unit: OffsetUnit) -> Self {
        self.config.offset_unit = unit;
        self
    }

    #[must_use]
    pub fn grid(mut self, grid: bool) -> Self {
        self.config.grid = grid;
        self
    }

    #[must_use]
    pub fn config(&self) -> &AxisStackConfig {
        &self.config
    }

    pub fn build(self, canvas: &mut dyn Canvas) -> PlotResult<AxisStack> {
        let Self { host, config } = self;
        config.validate()?;
        if !canvas.has_axis(host) {
            return Err(PlotError::UnknownAxis(host));
        }

        if let Some(label) = &config.x_label {
            canvas.set_x_label(host, label)?;
        }
        canvas.set_grid(host, config.grid)?;

        let mut axes: SmallVec<[AxisId; 4]> = SmallVec::new();
        match &config.left {
            AxisLabels::None => {}
            AxisLabels::Single(label) => {
                canvas.set_y_label(host, label)?;
                axes.push(host);
            }
            AxisLabels::Many(labels) => {
                let count = labels.len();
                for (index, label) in labels.iter().enumerate() {
                    let axis = if index == 0 {
                        host
                    } else {
                        canvas.create_twin_axis(host)?
                    };
                    let position =
                        left_spine_position(config.offset_unit, index, count, config.offset);
                    canvas.set_spine_position(axis, SpineSide::Left, position)?;
                    if index + 1 < count {
                        hide_patch_and_spines(canvas, axis)?;
                    }
                    attach_to_side(canvas, axis, AxisSide::Left, label)?;
                    axes.push(axis);
                }
            }
        }
        let mut left_len = axes.len();

        let right_labels: &[String] = match &config.right {
            AxisLabels::None => &[],
            AxisLabels::Single(label) if label.is_empty() => &[],
            AxisLabels::Single(label) => std::slice::from_ref(label),
            AxisLabels::Many(labels) => labels,
        };
        for (index, label) in right_labels.iter().enumerate() {
            let axis = canvas.create_twin_axis(host)?;
            let position = right_spine_position(config.offset_unit, index, config.offset);
            canvas.set_spine_position(axis, SpineSide::Right, position)?;
            if index > 0 {
                hide_patch_and_spines(canvas, axis)?;
            }
            attach_to_side(canvas, axis, AxisSide::Right, label)?;
            axes.push(axis);
        }

        if axes.is_empty() {
            axes.push(host);
            left_len = 1;
        }

        for &axis in &axes {
            canvas.set_y_tick_format(axis, TickFormat::plain())?;
        }

        let layout = LayoutPass::for_title(canvas.title());
        canvas.apply_layout(layout);

        debug!(
            host = %host,
            left = left_len,
            right = axes.len() - left_len,
            unit = %config.offset_unit,
            offset = config.offset,
            "built axis stack"
        );
        Ok(AxisStack { axes, left_len })
    }
}

/// Builds the stack described by `left` and `right` around `host`, using
/// axis-fraction spine offsets.
pub fn build_axis_stack(
    canvas: &mut dyn Canvas,
    host: AxisId,
    left: impl Into<AxisLabels>,
    right: impl Into<AxisLabels>,
    offset: f64,
) -> PlotResult<AxisStack> {
    AxisStackBuilder::new(host)
        .left(left)
        .right(right)
        .offset(offset)
        .build(canvas)
}

/// Colors the y label and/or y tick labels of `axis`.
pub fn tint_y_axis(
    canvas: &mut dyn Canvas,
    axis: AxisId,
    color: Color,
    label: bool,
    ticks: bool,
) -> PlotResult<()> {
    color.validate()?;
    canvas.set_y_axis_color(axis, color, label, ticks)
}

/// Left spines step outward from the plotting area; the innermost sits at 0.
fn left_spine_position(unit: OffsetUnit, index: usize, count: usize, offset: f64) -> SpinePosition {
    let steps = count - index - 1;
    let distance = steps as f64 * offset;
    match unit {
        OffsetUnit::Axes if steps == 0 => SpinePosition::Axes(0.0),
        OffsetUnit::Axes => SpinePosition::Axes(-distance),
        OffsetUnit::Outward => SpinePosition::Outward(distance),
    }
}

fn right_spine_position(unit: OffsetUnit, index: usize, offset: f64) -> SpinePosition {
    let distance = index as f64 * offset;
    match unit {
        OffsetUnit::Axes => SpinePosition::Axes(1.0 + distance),
        OffsetUnit::Outward => SpinePosition::Outward(distance),
    }
}

// Twinned axes come without a frame, which leaves a detached spine invisible.
// Turn the frame back on but keep the patch and every spine hidden.
fn hide_patch_and_spines(canvas: &mut dyn Canvas, axis: AxisId) -> PlotResult<()> {
    canvas.set_frame_on(axis, true)?;
    canvas.set_patch_visible(axis, false)?;
    for spine in SpineSide::ALL {
        canvas.set_spine_visible(axis, spine, false)?;
    }
    Ok(())
}

fn attach_to_side(
    canvas: &mut dyn Canvas,
    axis: AxisId,
    side: AxisSide,
    label: &str,
) -> PlotResult<()> {
    canvas.set_spine_visible(axis, side.spine(), true)?;
    canvas.set_y_axis_side(axis, side)?;
    canvas.set_y_label(axis, label)
}

#[cfg(test)]
mod tests {
    use super::{
        AxisLabels, AxisStackConfig, OffsetUnit, left_spine_position, right_spine_position,
    };
    use crate::core::SpinePosition;
    use crate::error::PlotError;

    #[test]
    fn left_positions_step_outward_from_zero() {
        let positions: Vec<SpinePosition> = (0..3)
            .map(|index| left_spine_position(OffsetUnit::Axes, index, 3, 0.1))
            .collect();
        assert_eq!(
            positions,
            vec![
                SpinePosition::Axes(-0.2),
                SpinePosition::Axes(-0.1),
                SpinePosition::Axes(0.0),
            ]
        );
        assert!(
            matches!(left_spine_position(OffsetUnit::Axes, 0, 1, 0.1), SpinePosition::Axes(v) if v.is_sign_positive())
        );
    }

    #[test]
    fn outward_unit_uses_positive_point_distances() {
        assert_eq!(
            left_spine_position(OffsetUnit::Outward, 0, 3, 40.0),
            SpinePosition::Outward(80.0)
        );
        assert_eq!(
            right_spine_position(OffsetUnit::Outward, 2, 40.0),
            SpinePosition::Outward(80.0)
        );
        assert_eq!(
            right_spine_position(OffsetUnit::Axes, 0, 0.25),
            SpinePosition::Axes(1.0)
        );
    }

    #[test]
    fn unsupported_unit_names_are_rejected() {
        assert_eq!("outward".parse::<OffsetUnit>(), Ok(OffsetUnit::Outward));
        assert!(matches!(
            "data".parse::<OffsetUnit>(),
            Err(PlotError::Configuration(_))
        ));
    }

    #[test]
    fn labels_deserialize_from_string_list_or_null() {
        let config = AxisStackConfig::from_json_str(
            r#"{"left":["Voltage","Current"],"right":"Power","x_label":null}"#,
        )
        .expect("parse config");
        assert_eq!(config.left, AxisLabels::many(["Voltage", "Current"]));
        assert_eq!(config.right, AxisLabels::Single("Power".to_owned()));
        assert!((config.offset - 0.055).abs() <= 1e-12);
        assert!(config.grid);
    }

    #[test]
    fn negative_or_nan_offsets_are_rejected() {
        for offset in [-0.1, f64::NAN, f64::INFINITY] {
            let config = AxisStackConfig {
                offset,
                ..AxisStackConfig::default()
            };
            assert!(matches!(config.validate(), Err(PlotError::Configuration(_))));
        }
    }

    #[test]
    fn blank_label_in_list_is_rejected() {
        let config = AxisStackConfig {
            right: AxisLabels::many(["Power", "  "]),
            ..AxisStackConfig::default()
        };
        assert!(matches!(config.validate(), Err(PlotError::Configuration(_))));
    }
}
