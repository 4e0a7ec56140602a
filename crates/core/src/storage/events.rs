//! Synchronous mutation notifications.
//!
//! Listeners are registered per [`EventKind`] and invoked in registration order
//! after the mutation has completed and the store lock has been released, so a
//! listener may read from or write to the store.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Insert,
    Delete,
    Clear,
}

/// A completed mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreEvent {
    Insert { id: String },
    Delete { id: String },
    Clear { removed: usize },
}

impl StoreEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            StoreEvent::Insert { .. } => EventKind::Insert,
            StoreEvent::Delete { .. } => EventKind::Delete,
            StoreEvent::Clear { .. } => EventKind::Clear,
        }
    }
}

/// Handle returned by `on`, used to unregister with `off`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub type Listener = Arc<dyn Fn(&StoreEvent) + Send + Sync>;

struct Registration {
    kind: EventKind,
    id: ListenerId,
    listener: Listener,
}

#[derive(Default)]
pub(crate) struct EventBus {
    listeners: Mutex<Vec<Registration>>,
    next_id: AtomicU64,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.lock().len())
            .finish()
    }
}

impl EventBus {
    pub(crate) fn subscribe(&self, kind: EventKind, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push(Registration { kind, id, listener });
        id
    }

    /// Returns `false` if no listener with `id` is registered for `kind`.
    pub(crate) fn unsubscribe(&self, kind: EventKind, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|r| !(r.kind == kind && r.id == id));
        listeners.len() != before
    }

    pub(crate) fn emit(&self, event: &StoreEvent) {
        let kind = event.kind();
        // Snapshot so listeners can subscribe or unsubscribe while being called
        let matching: Vec<Listener> = self
            .listeners
            .lock()
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| Arc::clone(&r.listener))
            .collect();
        for listener in matching {
            listener(event);
        }
    }

    pub(crate) fn emit_all(&self, events: &[StoreEvent]) {
        for event in events {
            self.emit(event);
        }
    }
}
