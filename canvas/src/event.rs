//! Store change events and the observer registry that delivers them.
//!
//! Every successful store mutation publishes one [`StoreEvent`] through an
//! [`Observers`] registry. Listeners run synchronously on the publishing
//! thread. A listener that returns an error or panics is logged and skipped;
//! the remaining listeners are still notified.

#[cfg(test)]
#[path = "event_test.rs"]
mod event_test;

use std::collections::BTreeMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::doc::EntityId;
use crate::geom::Rect;

/// A selectable entity, tagged with its kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Zone(EntityId),
    Block(EntityId),
}

impl EntityRef {
    #[must_use]
    pub fn id(&self) -> &EntityId {
        match self {
            Self::Zone(id) | Self::Block(id) => id,
        }
    }

    #[must_use]
    pub fn is_zone(&self) -> bool {
        matches!(self, Self::Zone(_))
    }
}

/// Where an update came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// Direct user drag or edit; rendered immediately.
    Manual,
    /// Derived geometry (auto-fit, restore); rendered as a tween.
    Auto,
}

/// A change published by the store after the mutation is complete.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// An entity was created with the given rectangle.
    Added { entity: EntityRef, rect: Rect },
    /// An entity's fields changed; `rect` is its rectangle after the change.
    Updated { entity: EntityRef, rect: Rect, mode: UpdateMode },
    /// An entity was deleted.
    Removed { entity: EntityRef },
    /// A block's zone membership changed.
    Rezoned { block: EntityId, zone: Option<EntityId>, previous: Option<EntityId> },
    /// A block's technical link was replaced (empty `zones` means removed).
    Linked { block: EntityId, zones: Vec<EntityId> },
    /// The selection changed.
    Selected { selection: Option<EntityRef> },
    /// All collections were replaced from a snapshot.
    Replaced,
}

/// Fault reported by a listener.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListenerError {
    /// The listener refused the event.
    #[error("listener rejected event: {0}")]
    Rejected(String),
    /// The listener's shared state was already borrowed.
    #[error("listener state is busy")]
    Busy,
}

/// Handle returned by [`Observers::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sub({})", self.0)
    }
}

type Listener<E> = Box<dyn FnMut(&E) -> Result<(), ListenerError>>;

/// Ordered registry of listeners for events of type `E`.
pub struct Observers<E> {
    next_id: u64,
    listeners: BTreeMap<SubscriptionId, Listener<E>>,
}

impl<E: fmt::Debug> Observers<E> {
    #[must_use]
    pub fn new() -> Self {
        Self { next_id: 0, listeners: BTreeMap::new() }
    }

    /// Register a listener. Listeners are notified in subscription order.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&E) -> Result<(), ListenerError> + 'static,
    {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.listeners.insert(id, Box::new(listener));
        tracing::debug!(%id, "subscription added");
        id
    }

    /// Remove a listener. Returns `true` if it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let removed = self.listeners.remove(&id).is_some();
        if removed {
            tracing::debug!(%id, "subscription removed");
        }
        removed
    }

    /// Deliver `event` to every listener, isolating faults per listener.
    /// Returns the number of listeners that faulted.
    pub fn notify(&mut self, event: &E) -> usize {
        let mut faults = 0;
        for (id, listener) in &mut self.listeners {
            match catch_unwind(AssertUnwindSafe(|| listener(event))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    faults += 1;
                    tracing::warn!(%id, error = %err, ?event, "store listener failed");
                }
                Err(_) => {
                    faults += 1;
                    tracing::error!(%id, ?event, "store listener panicked");
                }
            }
        }
        faults
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl<E: fmt::Debug> Default for Observers<E> {
    fn default() -> Self {
        Self::new()
    }
}
