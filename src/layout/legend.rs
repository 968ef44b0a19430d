use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::AxisId;
use crate::error::{PlotError, PlotResult};
use crate::surface::{Canvas, LegendEntry};

/// Named anchor positions for a legend box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LegendLocation {
    #[default]
    #[serde(rename = "best")]
    Best,
    #[serde(rename = "upper right")]
    UpperRight,
    #[serde(rename = "upper left")]
    UpperLeft,
    #[serde(rename = "lower left")]
    LowerLeft,
    #[serde(rename = "lower right")]
    LowerRight,
    #[serde(rename = "right")]
    Right,
    #[serde(rename = "center left")]
    CenterLeft,
    #[serde(rename = "center right")]
    CenterRight,
    #[serde(rename = "lower center")]
    LowerCenter,
    #[serde(rename = "upper center")]
    UpperCenter,
    #[serde(rename = "center")]
    Center,
}

impl LegendLocation {
    pub const ALL: [Self; 11] = [
        Self::Best,
        Self::UpperRight,
        Self::UpperLeft,
        Self::LowerLeft,
        Self::LowerRight,
        Self::Right,
        Self::CenterLeft,
        Self::CenterRight,
        Self::LowerCenter,
        Self::UpperCenter,
        Self::Center,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Best => "best",
            Self::UpperRight => "upper right",
            Self::UpperLeft => "upper left",
            Self::LowerLeft => "lower left",
            Self::LowerRight => "lower right",
            Self::Right => "right",
            Self::CenterLeft => "center left",
            Self::CenterRight => "center right",
            Self::LowerCenter => "lower center",
            Self::UpperCenter => "upper center",
            Self::Center => "center",
        }
    }
}

impl fmt::Display for LegendLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LegendLocation {
    type Err = PlotError;

    fn from_str(input: &str) -> PlotResult<Self> {
        Self::ALL
            .into_iter()
            .find(|location| location.as_str() == input)
            .ok_or_else(|| PlotError::Configuration(format!("unknown legend location `{input}`")))
    }
}

/// Placement and frame options of a combined legend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LegendOptions {
    #[serde(default)]
    pub location: LegendLocation,
    /// Rounded corners on the legend frame.
    #[serde(default = "default_fancybox")]
    pub fancybox: bool,
    #[serde(default = "default_frame_alpha")]
    pub frame_alpha: f64,
}

impl LegendOptions {
    #[must_use]
    pub fn at(location: LegendLocation) -> Self {
        Self {
            location,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_fancybox(mut self, fancybox: bool) -> Self {
        self.fancybox = fancybox;
        self
    }

    #[must_use]
    pub fn with_frame_alpha(mut self, frame_alpha: f64) -> Self {
        self.frame_alpha = frame_alpha;
        self
    }

    pub fn validate(self) -> PlotResult<Self> {
        if !self.frame_alpha.is_finite() || !(0.0..=1.0).contains(&self.frame_alpha) {
            return Err(PlotError::Configuration(
                "legend frame alpha must be finite and in [0, 1]".to_owned(),
            ));
        }
        Ok(self)
    }

    pub fn to_json_pretty(self) -> PlotResult<String> {
        serde_json::to_string_pretty(&self).map_err(|e| {
            PlotError::Configuration(format!("failed to serialize legend options: {e}"))
        })
    }

    pub fn from_json_str(input: &str) -> PlotResult<Self> {
        let options: Self = serde_json::from_str(input).map_err(|e| {
            PlotError::Configuration(format!("failed to parse legend options: {e}"))
        })?;
        options.validate()
    }
}

impl Default for LegendOptions {
    fn default() -> Self {
        Self {
            location: LegendLocation::Best,
            fancybox: default_fancybox(),
            frame_alpha: default_frame_alpha(),
        }
    }
}

fn default_fancybox() -> bool {
    true
}

fn default_frame_alpha() -> f64 {
    0.7
}

/// A legend attached to one axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Legend {
    pub entries: Vec<LegendEntry>,
    pub options: LegendOptions,
}

impl Legend {
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.label.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Merges the legend entries of `axes` into one legend on `axes[0]`.
pub fn combine_legend(
    canvas: &mut dyn Canvas,
    axes: &[AxisId],
    location: LegendLocation,
) -> PlotResult<Legend> {
    combine_legend_with(canvas, axes, LegendOptions::at(location))
}

/// Like `combine_legend`, with explicit frame options.
///
/// Entries keep axis order, then per-axis order. Every other axis in `axes`
/// ends without a legend of its own. Nothing is mutated when validation or
/// entry collection fails.
pub fn combine_legend_with(
    canvas: &mut dyn Canvas,
    axes: &[AxisId],
    options: LegendOptions,
) -> PlotResult<Legend> {
    let options = options.validate()?;
    let Some((&target, rest)) = axes.split_first() else {
        return Err(PlotError::Configuration(
            "combined legend needs at least one axis".to_owned(),
        ));
    };

    let mut entries = Vec::new();
    for &axis in axes {
        entries.extend(canvas.legend_entries(axis)?);
    }

    for &axis in rest {
        if axis != target {
            canvas.remove_legend(axis)?;
        }
    }

    let legend = Legend { entries, options };
    debug!(
        target_axis = %target,
        axes = axes.len(),
        entries = legend.len(),
        location = %options.location,
        "combined legend"
    );
    canvas.set_legend(target, legend.clone())?;
    Ok(legend)
}
