// Invalidation bus: mutations announce which query keys went stale.

use crate::infrastructure::query_key::QueryKey;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidationReason {
    MutationSuccess,
    SessionChanged,
    ManualInvalidation,
}

#[derive(Debug, Clone)]
pub struct InvalidationEvent {
    /// Prefixes; each one covers every key that starts with it.
    pub keys: Vec<QueryKey>,
    pub reason: InvalidationReason,
    pub issued_at: DateTime<Utc>,
}

impl InvalidationEvent {
    pub fn new(keys: Vec<QueryKey>, reason: InvalidationReason) -> Self {
        Self {
            keys,
            reason,
            issued_at: Utc::now(),
        }
    }
}

/// Fan-out channel between mutations and every cache listening on it.
#[derive(Debug, Clone)]
pub struct InvalidationBus {
    sender: broadcast::Sender<InvalidationEvent>,
}

impl InvalidationBus {
    pub const DEFAULT_CAPACITY: usize = 64;

    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Returns how many listeners received the event.
    pub fn publish(&self, event: InvalidationEvent) -> usize {
        let keys = event.keys.len();
        match self.sender.send(event) {
            Ok(listeners) => {
                debug!("Published invalidation of {} key(s) to {} listener(s)", keys, listeners);
                listeners
            }
            Err(_) => {
                debug!("Invalidation of {} key(s) dropped: no listeners", keys);
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<InvalidationEvent> {
        self.sender.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for InvalidationBus {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
