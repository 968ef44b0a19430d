//! Mouse tracking: synchronized vertical lines that follow the pointer
//! across a set of axes of one surface.

mod tracking;

use serde::{Deserialize, Serialize};

pub use tracking::{
    CoordinateConverter, SessionRegistry, TrackingController, TrackingOptions, TrackingSession,
    snap_to_step,
};

/// Whether a surface currently has a tracking session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingState {
    #[default]
    Inactive,
    Active,
}

impl TrackingState {
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}
