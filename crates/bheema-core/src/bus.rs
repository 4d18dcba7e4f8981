//! In-process synchronous publish/subscribe mediator.
//!
//! The bus is a pure conduit: it owns no domain data and runs every handler
//! inline on the publisher's call stack, in registration order. It is
//! constructed once per session and shared by reference (`Arc`), so tests
//! never depend on swapping a hidden global.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::Result;
use crate::events::AssistantEvent;

/// Token returned by [`EventBus::subscribe`], used to unsubscribe.
///
/// Rust closures have no identity, so removal is by token rather than by
/// handler reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Arc<dyn Fn(&AssistantEvent) -> Result<()> + Send + Sync>;

#[derive(Default)]
struct BusInner {
    next_id: u64,
    handlers: HashMap<String, Vec<(SubscriptionId, Handler)>>,
}

/// Synchronous event bus.
///
/// `publish` invokes all current subscribers for the event's name, in the
/// order they subscribed. A handler returning an error is logged and never
/// prevents later handlers from running, nor propagates to the publisher.
pub struct EventBus {
    inner: Mutex<BusInner>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(BusInner::default()),
        }
    }

    /// Register a handler for `event_name`. Returns a token for removal.
    pub fn subscribe<F>(&self, event_name: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&AssistantEvent) -> Result<()> + Send + Sync + 'static,
    {
        let mut inner = self.inner.lock().expect("bus mutex poisoned");
        inner.next_id += 1;
        let id = SubscriptionId(inner.next_id);
        inner
            .handlers
            .entry(event_name.to_string())
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    /// Remove a previously registered handler.
    ///
    /// Returns `true` if the handler was found and removed.
    pub fn unsubscribe(&self, event_name: &str, id: SubscriptionId) -> bool {
        let mut inner = self.inner.lock().expect("bus mutex poisoned");
        if let Some(list) = inner.handlers.get_mut(event_name) {
            let before = list.len();
            list.retain(|(sub_id, _)| *sub_id != id);
            return list.len() < before;
        }
        false
    }

    /// Dispatch an event to all current subscribers of its name.
    ///
    /// The handler list is snapshotted before invocation, so handlers may
    /// subscribe, unsubscribe, or publish again without deadlocking; such
    /// changes take effect on the next dispatch.
    pub fn publish(&self, event: &AssistantEvent) {
        let snapshot: Vec<Handler> = {
            let inner = self.inner.lock().expect("bus mutex poisoned");
            match inner.handlers.get(event.event_name()) {
                Some(list) => list.iter().map(|(_, h)| Arc::clone(h)).collect(),
                None => return,
            }
        };

        for handler in snapshot {
            if let Err(e) = handler(event) {
                tracing::warn!(event = event.event_name(), error = %e, "Event handler failed");
            }
        }
    }

    /// Number of subscribers currently registered for `event_name`.
    pub fn subscriber_count(&self, event_name: &str) -> usize {
        let inner = self.inner.lock().expect("bus mutex poisoned");
        inner.handlers.get(event_name).map_or(0, |l| l.len())
    }
}

// =============================================================================
// Tests
// =============================================================================
