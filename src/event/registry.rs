use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use crate::error::{PlotError, PlotResult};
use crate::surface::Canvas;

use super::{EventKind, SurfaceEvent};

/// Opaque id returned by `EventRegistry::subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionToken(u64);

impl SubscriptionToken {
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

static NEXT_BUS_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of one `EventRegistry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BusId(u64);

impl BusId {
    fn allocate() -> Self {
        Self(NEXT_BUS_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

pub type EventCallback = Box<dyn FnMut(&mut EventContext<'_>, &SurfaceEvent) -> PlotResult<()>>;

struct Subscription {
    kind: EventKind,
    // Taken out while the callback runs so it can receive the table mutably.
    callback: Option<EventCallback>,
}

/// Access handed to a callback while it runs.
pub struct EventContext<'a> {
    canvas: &'a mut dyn Canvas,
    subscriptions: &'a mut IndexMap<SubscriptionToken, Subscription>,
    current: SubscriptionToken,
}

impl EventContext<'_> {
    pub fn canvas(&mut self) -> &mut dyn Canvas {
        &mut *self.canvas
    }

    /// Token of the subscription being invoked.
    #[must_use]
    pub fn token(&self) -> SubscriptionToken {
        self.current
    }

    /// Removes a subscription immediately; it will not receive the event
    /// currently being dispatched if it has not run yet.
    pub fn unsubscribe(&mut self, token: SubscriptionToken) -> bool {
        let removed = self.subscriptions.shift_remove(&token).is_some();
        if removed {
            trace!(token = token.raw(), "unsubscribed during dispatch");
        }
        removed
    }
}

/// Subscription table of one surface's event bus.
///
/// Delivery happens in subscription order, at most once per dispatched event
/// and subscriber. Unsubscribing is effective as soon as the call returns,
/// including for the event being dispatched.
pub struct EventRegistry {
    id: BusId,
    next_token: u64,
    supported: SmallVec<[EventKind; 6]>,
    subscriptions: IndexMap<SubscriptionToken, Subscription>,
}

impl EventRegistry {
    /// Registry able to deliver every `EventKind`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_supported(EventKind::ALL)
    }

    /// Registry restricted to the given kinds, for backends lacking some inputs.
    #[must_use]
    pub fn with_supported(kinds: impl IntoIterator<Item = EventKind>) -> Self {
        let mut supported = SmallVec::new();
        for kind in kinds {
            if !supported.contains(&kind) {
                supported.push(kind);
            }
        }
        Self {
            id: BusId::allocate(),
            next_token: 1,
            supported,
            subscriptions: IndexMap::new(),
        }
    }

    /// Identity of this bus; tokens are only meaningful on the bus that issued them.
    #[must_use]
    pub fn id(&self) -> BusId {
        self.id
    }

    #[must_use]
    pub fn supports(&self, kind: EventKind) -> bool {
        self.supported.contains(&kind)
    }

    pub fn subscribe(
        &mut self,
        kind: EventKind,
        callback: EventCallback,
    ) -> PlotResult<SubscriptionToken> {
        if !self.supports(kind) {
            return Err(PlotError::Environment(format!(
                "event bus does not deliver `{}` events",
                kind.backend_name()
            )));
        }

        let token = SubscriptionToken(self.next_token);
        self.next_token += 1;
        self.subscriptions.insert(
            token,
            Subscription {
                kind,
                callback: Some(callback),
            },
        );
        debug!(token = token.raw(), kind = %kind, "subscribed");
        Ok(token)
    }

    /// Returns `true` when the token was registered.
    pub fn unsubscribe(&mut self, token: SubscriptionToken) -> bool {
        let removed = self.subscriptions.shift_remove(&token).is_some();
        if removed {
            debug!(token = token.raw(), "unsubscribed");
        }
        removed
    }

    #[must_use]
    pub fn is_subscribed(&self, token: SubscriptionToken) -> bool {
        self.subscriptions.contains_key(&token)
    }

    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    #[must_use]
    pub fn subscription_count_for(&self, kind: EventKind) -> usize {
        self.subscriptions
            .values()
            .filter(|subscription| subscription.kind == kind)
            .count()
    }

    /// Drops every subscription without invoking it.
    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }

    /// Delivers `event` to every subscriber of its kind.
    ///
    /// A failing callback does not prevent delivery to the remaining
    /// subscribers; the first error is returned once dispatch completes.
    pub fn dispatch(&mut self, canvas: &mut dyn Canvas, event: &SurfaceEvent) -> PlotResult<()> {
        let kind = event.kind();
        let targets: SmallVec<[SubscriptionToken; 4]> = self
            .subscriptions
            .iter()
            .filter(|(_, subscription)| subscription.kind == kind)
            .map(|(token, _)| *token)
            .collect();
        trace!(kind = %kind, targets = targets.len(), "dispatch event");

        let mut first_error = None;
        for token in targets {
            // Skips subscriptions removed by an earlier callback of this dispatch.
            let Some(mut callback) = self
                .subscriptions
                .get_mut(&token)
                .and_then(|subscription| subscription.callback.take())
            else {
                continue;
            };

            let result = {
                let mut context = EventContext {
                    canvas: &mut *canvas,
                    subscriptions: &mut self.subscriptions,
                    current: token,
                };
                callback(&mut context, event)
            };

            if let Some(subscription) = self.subscriptions.get_mut(&token) {
                subscription.callback = Some(callback);
            }
            if let Err(err) = result {
                warn!(token = token.raw(), kind = %kind, error = %err, "event callback failed");
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRegistry")
            .field("id", &self.id)
            .field("supported", &self.supported)
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}
