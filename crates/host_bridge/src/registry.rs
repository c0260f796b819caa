use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Weak,
    },
};

use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;

pub type EventHandler = Arc<dyn Fn(&Value) + Send + Sync>;

struct Entry {
    id: u64,
    handler: EventHandler,
}

/// Subscriber list shared by a bridge and the subscriptions it hands out.
#[derive(Default)]
pub struct SubscriberRegistry {
    next_id: AtomicU64,
    handlers: Mutex<HashMap<String, Vec<Entry>>>,
}

impl SubscriberRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn subscribe(self: &Arc<Self>, event: &str, handler: EventHandler) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.handlers
            .lock()
            .entry(event.to_string())
            .or_default()
            .push(Entry { id, handler });
        debug!(event, subscription_id = id, "bridge subscriber registered");

        Subscription {
            event: event.to_string(),
            id,
            registry: Arc::downgrade(self),
            active: AtomicBool::new(true),
        }
    }

    /// Delivers `payload` to every subscriber of `event` in registration
    /// order and returns how many handlers ran.
    ///
    /// Handlers are invoked without the registry lock held, so they may
    /// subscribe or unsubscribe. A handler removed by an earlier handler of
    /// the same delivery is skipped.
    pub fn dispatch(&self, event: &str, payload: &Value) -> usize {
        let snapshot: Vec<(u64, EventHandler)> = match self.handlers.lock().get(event) {
            Some(entries) => entries
                .iter()
                .map(|entry| (entry.id, Arc::clone(&entry.handler)))
                .collect(),
            None => Vec::new(),
        };

        if snapshot.is_empty() {
            debug!(event, "host event dropped: no subscribers");
            return 0;
        }

        let mut delivered = 0;
        for (id, handler) in snapshot {
            if !self.is_registered(event, id) {
                continue;
            }
            handler(payload);
            delivered += 1;
        }
        delivered
    }

    pub fn subscriber_count(&self, event: &str) -> usize {
        self.handlers.lock().get(event).map_or(0, Vec::len)
    }

    fn is_registered(&self, event: &str, id: u64) -> bool {
        self.handlers
            .lock()
            .get(event)
            .is_some_and(|entries| entries.iter().any(|entry| entry.id == id))
    }

    fn remove(&self, event: &str, id: u64) {
        let mut handlers = self.handlers.lock();
        if let Some(entries) = handlers.get_mut(event) {
            entries.retain(|entry| entry.id != id);
            if entries.is_empty() {
                handlers.remove(event);
            }
        }
        debug!(event, subscription_id = id, "bridge subscriber removed");
    }
}

/// Handle for one registered handler. Unsubscribes on drop.
pub struct Subscription {
    event: String,
    id: u64,
    registry: Weak<SubscriberRegistry>,
    active: AtomicBool,
}

impl Subscription {
    pub fn event(&self) -> &str {
        &self.event
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Idempotent; a no-op once the bridge itself is gone.
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(&self.event, self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("event", &self.event)
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
