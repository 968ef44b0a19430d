use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

static NEXT_SURFACE_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identity of a drawing surface.
///
/// Ids are only minted by `allocate`, so two surfaces never share one unless a
/// backend hands the same value out twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SurfaceId(u64);

impl SurfaceId {
    /// Returns an id no other call in this process has returned.
    #[must_use]
    pub fn allocate() -> Self {
        Self(NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

/// Identity of one coordinate frame hosted by a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AxisId(u32);

impl AxisId {
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for AxisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "axis#{}", self.0)
    }
}

/// Handle of a line primitive drawn on an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineHandle(u64);

impl LineHandle {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Side of the plotting area a y axis is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisSide {
    Left,
    Right,
}

impl AxisSide {
    #[must_use]
    pub const fn spine(self) -> SpineSide {
        match self {
            Self::Left => SpineSide::Left,
            Self::Right => SpineSide::Right,
        }
    }
}

/// One of the four boundary lines of an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpineSide {
    Left,
    Right,
    Top,
    Bottom,
}

impl SpineSide {
    pub const ALL: [Self; 4] = [Self::Left, Self::Right, Self::Top, Self::Bottom];
}

/// Spine placement relative to the plotting area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpinePosition {
    /// Axis-fraction coordinate: `0.0` is the left edge, `1.0` the right edge.
    Axes(f64),
    /// Distance in points pushed away from the plotting area.
    Outward(f64),
}

impl SpinePosition {
    #[must_use]
    pub fn value(self) -> f64 {
        match self {
            Self::Axes(value) | Self::Outward(value) => value,
        }
    }
}

/// Y tick label formatting switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickFormat {
    pub use_offset: bool,
    pub scientific: bool,
}

impl TickFormat {
    /// Plain numbers: no shared offset, no scientific notation.
    #[must_use]
    pub const fn plain() -> Self {
        Self {
            use_offset: false,
            scientific: false,
        }
    }
}

impl Default for TickFormat {
    fn default() -> Self {
        Self {
            use_offset: true,
            scientific: true,
        }
    }
}

/// Surface-level layout pass requested after axes are assembled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutPass {
    Tight,
    /// Tight layout restricted to `[left, bottom, right, top]` in figure fractions.
    TightWithin([f64; 4]),
}

impl LayoutPass {
    /// Keeps room for a surface title above the plotting area.
    pub const TITLE_RESERVED_RECT: [f64; 4] = [0.0, 0.03, 1.0, 0.95];

    #[must_use]
    pub fn for_title(title: Option<&str>) -> Self {
        match title {
            Some(title) if !title.is_empty() => Self::TightWithin(Self::TITLE_RESERVED_RECT),
            _ => Self::Tight,
        }
    }
}
