//! Surface event vocabulary and the subscription registry backing a surface's
//! event bus.

mod registry;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PlotError, PlotResult};
use crate::surface::Surface;

pub use registry::{BusId, EventCallback, EventContext, EventRegistry, SubscriptionToken};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    PointerPress,
    PointerRelease,
    PointerMove,
    KeyPress,
    KeyRelease,
    SurfaceClose,
}

impl EventKind {
    pub const ALL: [Self; 6] = [
        Self::PointerPress,
        Self::PointerRelease,
        Self::PointerMove,
        Self::KeyPress,
        Self::KeyRelease,
        Self::SurfaceClose,
    ];

    /// Name of the event in plotting backends' connect APIs.
    #[must_use]
    pub const fn backend_name(self) -> &'static str {
        match self {
            Self::PointerPress => "button_press_event",
            Self::PointerRelease => "button_release_event",
            Self::PointerMove => "motion_notify_event",
            Self::KeyPress => "key_press_event",
            Self::KeyRelease => "key_release_event",
            Self::SurfaceClose => "close_event",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PointerPress => "pointer_press",
            Self::PointerRelease => "pointer_release",
            Self::PointerMove => "pointer_move",
            Self::KeyPress => "key_press",
            Self::KeyRelease => "key_release",
            Self::SurfaceClose => "surface_close",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = PlotError;

    /// Accepts both the crate names (`pointer_move`) and backend names
    /// (`motion_notify_event`).
    fn from_str(input: &str) -> PlotResult<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == input || kind.backend_name() == input)
            .ok_or_else(|| PlotError::Configuration(format!("unknown event kind `{input}`")))
    }
}

/// Pointer position in data coordinates of the axis under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerPosition {
    pub x: f64,
    pub y: f64,
}

impl PointerPosition {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
    Other(u8),
}

/// One event occurrence emitted by a surface.
///
/// Pointer events carry `None` as position while the pointer is outside
/// every plotting area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceEvent {
    PointerPress {
        position: Option<PointerPosition>,
        button: PointerButton,
    },
    PointerRelease {
        position: Option<PointerPosition>,
        button: PointerButton,
    },
    PointerMove {
        position: Option<PointerPosition>,
    },
    KeyPress {
        key: String,
    },
    KeyRelease {
        key: String,
    },
    Close,
}

impl SurfaceEvent {
    #[must_use]
    pub const fn pointer_move(x: f64, y: f64) -> Self {
        Self::PointerMove {
            position: Some(PointerPosition::new(x, y)),
        }
    }

    #[must_use]
    pub const fn pointer_outside() -> Self {
        Self::PointerMove { position: None }
    }

    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::PointerPress { .. } => EventKind::PointerPress,
            Self::PointerRelease { .. } => EventKind::PointerRelease,
            Self::PointerMove { .. } => EventKind::PointerMove,
            Self::KeyPress { .. } => EventKind::KeyPress,
            Self::KeyRelease { .. } => EventKind::KeyRelease,
            Self::Close => EventKind::SurfaceClose,
        }
    }

    #[must_use]
    pub const fn position(&self) -> Option<PointerPosition> {
        match self {
            Self::PointerPress { position, .. }
            | Self::PointerRelease { position, .. }
            | Self::PointerMove { position } => *position,
            Self::KeyPress { .. } | Self::KeyRelease { .. } | Self::Close => None,
        }
    }
}

/// Subscribes `callback` to `kind` events of `surface`.
///
/// Fails with `PlotError::Environment` when the surface's bus cannot deliver
/// `kind`; nothing is registered in that case.
pub fn subscribe<S, F>(surface: &mut S, kind: EventKind, callback: F) -> PlotResult<SubscriptionToken>
where
    S: Surface + ?Sized,
    F: FnMut(&mut EventContext<'_>, &SurfaceEvent) -> PlotResult<()> + 'static,
{
    surface.events().subscribe(kind, Box::new(callback))
}

/// Removes a subscription. Returns `false` when the token was not registered.
pub fn unsubscribe<S>(surface: &mut S, token: SubscriptionToken) -> bool
where
    S: Surface + ?Sized,
{
    surface.events().unsubscribe(token)
}

#[cfg(test)]
mod tests {
    use super::{EventKind, SurfaceEvent};
    use crate::error::PlotError;

    #[test]
    fn event_kind_parses_backend_and_crate_names() {
        assert_eq!(
            "motion_notify_event".parse::<EventKind>().expect("backend name"),
            EventKind::PointerMove
        );
        assert_eq!(
            "surface_close".parse::<EventKind>().expect("crate name"),
            EventKind::SurfaceClose
        );
        assert!(matches!(
            "scroll_event".parse::<EventKind>(),
            Err(PlotError::Configuration(_))
        ));
    }

    #[test]
    fn pointer_outside_has_no_position() {
        let event = SurfaceEvent::pointer_outside();
        assert_eq!(event.kind(), EventKind::PointerMove);
        assert!(event.position().is_none());
        assert!(SurfaceEvent::Close.position().is_none());
    }
}
