use thiserror::Error;

use crate::core::AxisId;

pub type PlotResult<T> = Result<T, PlotError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlotError {
    /// Invalid label, unit, location, offset or style argument.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The surface cannot deliver an event kind the caller depends on.
    #[error("unsupported environment: {0}")]
    Environment(String),

    #[error("axis {0} is not hosted by this surface")]
    UnknownAxis(AxisId),

    /// The injected coordinate converter failed.
    #[error("coordinate converter failed: {0}")]
    Converter(String),

    #[error("backend failure: {0}")]
    Backend(String),
}
