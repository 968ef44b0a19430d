use serde::{Deserialize, Serialize};

use crate::error::{PlotError, PlotResult};

/// RGBA color in normalized 0..=1 channel values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
}

impl Color {
    #[must_use]
    pub const fn rgba(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    #[must_use]
    pub const fn rgb(red: f64, green: f64, blue: f64) -> Self {
        Self::rgba(red, green, blue, 1.0)
    }

    pub fn validate(self) -> PlotResult<()> {
        for (channel, value) in [
            ("red", self.red),
            ("green", self.green),
            ("blue", self.blue),
            ("alpha", self.alpha),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(PlotError::Configuration(format!(
                    "color channel `{channel}` must be finite and in [0, 1]"
                )));
            }
        }
        Ok(())
    }
}

/// Dash pattern of a stroked line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStrokeStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
    DashDot,
}

/// Style of a vertical tracking line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    pub color: Color,
    pub width: f64,
    #[serde(default)]
    pub stroke: LineStrokeStyle,
}

impl LineStyle {
    #[must_use]
    pub const fn new(color: Color, width: f64) -> Self {
        Self {
            color,
            width,
            stroke: LineStrokeStyle::Solid,
        }
    }

    #[must_use]
    pub const fn with_stroke(mut self, stroke: LineStrokeStyle) -> Self {
        self.stroke = stroke;
        self
    }

    pub fn validate(self) -> PlotResult<()> {
        if !self.width.is_finite() || self.width <= 0.0 {
            return Err(PlotError::Configuration(
                "line width must be finite and > 0".to_owned(),
            ));
        }
        self.color.validate()
    }
}

impl Default for LineStyle {
    fn default() -> Self {
        Self::new(Color::rgba(0.5, 0.5, 0.5, 0.8), 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{Color, LineStrokeStyle, LineStyle};
    use crate::error::PlotError;

    #[test]
    fn default_line_style_is_valid() {
        assert!(LineStyle::default().validate().is_ok());
    }

    #[test]
    fn non_positive_width_is_rejected() {
        let err = LineStyle::new(Color::rgb(1.0, 0.0, 0.0), 0.0)
            .validate()
            .expect_err("zero width must fail");
        assert!(matches!(err, PlotError::Configuration(_)));
    }

    #[test]
    fn out_of_range_channel_is_rejected() {
        let style = LineStyle::new(Color::rgba(0.0, 1.2, 0.0, 1.0), 1.0);
        assert!(matches!(style.validate(), Err(PlotError::Configuration(_))));
    }

    #[test]
    fn stroke_deserializes_from_snake_case() {
        let stroke: LineStrokeStyle = serde_json::from_str("\"dash_dot\"").expect("parse stroke");
        assert_eq!(stroke, LineStrokeStyle::DashDot);
    }
}
