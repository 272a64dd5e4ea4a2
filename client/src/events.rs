//! Change notification for cart and wishlist consumers.
//!
//! Header badges and similar views subscribe here. Every local write made by
//! the sync services is published before the operation returns.

use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;

/// A change to device-local state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeEvent {
    CartChanged {
        device_id: String,
        item_count: u32,
        total: Decimal,
    },
    WishlistChanged {
        device_id: String,
        item_count: usize,
    },
}

/// Sender half handed to the registry.
pub type EventSender = mpsc::UnboundedSender<ChangeEvent>;

/// Receiver half kept by a subscriber.
pub type EventReceiver = mpsc::UnboundedReceiver<ChangeEvent>;

/// Registry of change subscribers.
///
/// Thread-safe and shared via `Arc`. Subscribers whose receiver was dropped
/// are removed on the next publish.
#[derive(Debug, Default)]
pub struct Subscribers {
    senders: DashMap<String, EventSender>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self {
            senders: DashMap::new(),
        }
    }

    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register a subscriber and return its id with the receiving end.
    pub fn subscribe(&self) -> (String, EventReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = uuid::Uuid::new_v4().to_string();
        self.senders.insert(id.clone(), tx);
        tracing::debug!(subscriber = %id, "Change subscriber registered");
        (id, rx)
    }

    pub fn unsubscribe(&self, id: &str) -> bool {
        let removed = self.senders.remove(id).is_some();
        if removed {
            tracing::debug!(subscriber = %id, "Change subscriber removed");
        }
        removed
    }

    /// Send `event` to every live subscriber.
    ///
    /// Returns the number of subscribers that received it.
    pub fn publish(&self, event: &ChangeEvent) -> usize {
        let mut sent_count = 0;
        let mut closed = Vec::new();

        for entry in self.senders.iter() {
            if entry.value().send(event.clone()).is_ok() {
                sent_count += 1;
            } else {
                closed.push(entry.key().clone());
            }
        }

        for id in closed {
            self.senders.remove(&id);
        }

        sent_count
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}
