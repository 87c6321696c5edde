//! Event bus: synchronous publish/subscribe keyed by [`EventKind`].
//!
//! - Listeners registered for a kind are stored once per `Arc` (set semantics).
//! - `emit` delivers to the snapshot of listeners present at call time; the
//!   internal lock is released before any listener runs, so listeners may
//!   emit, subscribe or unsubscribe re-entrantly.
//! - A listener that returns `Err` or panics is logged and isolated; its
//!   siblings still run and `emit` never fails because of it.
//! - `once` listeners are removed before they are invoked.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tracing::{debug, error};

use cmsdash_core::events::{CmsEvent, EventKind};

/// Result returned by a listener.
pub type ListenerResult = Result<(), String>;

/// A registered event callback.
pub type Listener = Arc<dyn Fn(&CmsEvent) -> ListenerResult + Send + Sync>;

/// Wraps a closure into a [`Listener`].
pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&CmsEvent) -> ListenerResult + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Entry in the listener table.
struct ListenerEntry {
    /// Registration id, unique per bus.
    id: u64,
    /// The callback.
    listener: Listener,
    /// Remove after the first delivery.
    once: bool,
}

/// Shared state behind every [`EventBus`] handle.
struct BusInner {
    /// Event kind → listeners in registration order.
    listeners: Mutex<HashMap<EventKind, Vec<ListenerEntry>>>,
    /// Next registration id.
    next_id: AtomicU64,
}

impl BusInner {
    fn lock(&self) -> MutexGuard<'_, HashMap<EventKind, Vec<ListenerEntry>>> {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn remove_where<F>(&self, kind: &EventKind, predicate: F) -> bool
    where
        F: Fn(&ListenerEntry) -> bool,
    {
        let mut map = self.lock();
        let Some(entries) = map.get_mut(kind) else {
            return false;
        };

        let before = entries.len();
        entries.retain(|entry| !predicate(entry));
        let removed = entries.len() != before;

        if entries.is_empty() {
            map.remove(kind);
        }
        removed
    }
}

/// Cloneable handle to a process-local event bus.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                listeners: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Registers `listener` for `kind`.
    ///
    /// Registering the same `Arc` twice for the same kind keeps a single
    /// registration and returns a handle to it.
    pub fn on(&self, kind: EventKind, listener: Listener) -> Subscription {
        self.subscribe(kind, listener, false)
    }

    /// Registers `listener` for the next delivery of `kind` only.
    pub fn once(&self, kind: EventKind, listener: Listener) -> Subscription {
        self.subscribe(kind, listener, true)
    }

    /// Removes `listener` from `kind`. Returns whether it was registered.
    pub fn off(&self, kind: &EventKind, listener: &Listener) -> bool {
        self.inner
            .remove_where(kind, |entry| same_listener(&entry.listener, listener))
    }

    /// Delivers `event` to every listener registered for its kind.
    ///
    /// Returns how many listeners were invoked.
    pub fn emit(&self, event: &CmsEvent) -> usize {
        let kind = event.kind();

        let snapshot: Vec<Listener> = {
            let mut map = self.inner.lock();
            let Some(entries) = map.get_mut(&kind) else {
                return 0;
            };

            let snapshot = entries.iter().map(|e| Arc::clone(&e.listener)).collect();
            entries.retain(|e| !e.once);
            if entries.is_empty() {
                map.remove(&kind);
            }
            snapshot
        };

        debug!(event = %kind, listener_count = snapshot.len(), "Emitting event");

        for listener in &snapshot {
            invoke(&kind, listener, event);
        }

        snapshot.len()
    }

    /// Returns whether any listener is registered for `kind`.
    pub fn has_listeners(&self, kind: &EventKind) -> bool {
        self.listener_count(kind) > 0
    }

    /// Returns the number of listeners registered for `kind`.
    pub fn listener_count(&self, kind: &EventKind) -> usize {
        self.inner.lock().get(kind).map(Vec::len).unwrap_or(0)
    }

    /// Clears the listeners of one kind, or of every kind when `kind` is `None`.
    pub fn remove_all_listeners(&self, kind: Option<&EventKind>) {
        let mut map = self.inner.lock();
        match kind {
            Some(kind) => {
                map.remove(kind);
            }
            None => map.clear(),
        }
    }

    fn subscribe(&self, kind: EventKind, listener: Listener, once: bool) -> Subscription {
        let mut map = self.inner.lock();
        let entries = map.entry(kind.clone()).or_default();

        let id = match entries
            .iter()
            .find(|entry| same_listener(&entry.listener, &listener))
        {
            Some(existing) => existing.id,
            None => {
                let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
                entries.push(ListenerEntry { id, listener, once });
                id
            }
        };

        Subscription {
            id,
            kind,
            bus: Arc::downgrade(&self.inner),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let map = self.inner.lock();
        f.debug_struct("EventBus")
            .field("kinds", &map.len())
            .field("listeners", &map.values().map(Vec::len).sum::<usize>())
            .finish()
    }
}

/// Handle returned by [`EventBus::on`] and [`EventBus::once`].
///
/// Dropping the handle does not unsubscribe.
#[derive(Clone)]
pub struct Subscription {
    id: u64,
    kind: EventKind,
    bus: Weak<BusInner>,
}

impl Subscription {
    /// Removes the registration. Safe to call any number of times.
    ///
    /// Returns `true` only for the call that actually removed it.
    pub fn unsubscribe(&self) -> bool {
        match self.bus.upgrade() {
            Some(inner) => inner.remove_where(&self.kind, |entry| entry.id == self.id),
            None => false,
        }
    }

    /// Returns the kind this subscription listens to.
    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    /// Returns whether the registration is still present on the bus.
    pub fn is_active(&self) -> bool {
        self.bus
            .upgrade()
            .map(|inner| {
                inner
                    .lock()
                    .get(&self.kind)
                    .is_some_and(|entries| entries.iter().any(|e| e.id == self.id))
            })
            .unwrap_or(false)
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("kind", &self.kind.as_str())
            .finish()
    }
}

fn same_listener(a: &Listener, b: &Listener) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

fn invoke(kind: &EventKind, listener: &Listener, event: &CmsEvent) {
    match catch_unwind(AssertUnwindSafe(|| listener(event))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            error!(event = %kind, error = %e, "Event listener failed");
        }
        Err(panic) => {
            error!(
                event = %kind,
                panic = %panic_message(panic.as_ref()),
                "Event listener panicked"
            );
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
