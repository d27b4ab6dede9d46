use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

/// Unique key of a live connection within a Thing's subscriber set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("subscriber connection closed")]
    Closed,
    #[error("subscriber outbox full")]
    Full,
}

/// A connection that receives serialized notifications
///
/// `deliver` is a hand-off, not a network write: implementations queue the
/// message and return. An error marks the subscriber for removal.
pub trait Subscriber: Send + Sync {
    fn deliver(&self, message: Arc<str>) -> Result<(), DeliveryError>;
}

/// Subscriber backed by a bounded outbox; a writer task drains the receiver into the socket
pub struct ChannelSubscriber {
    tx: mpsc::Sender<Arc<str>>,
}

impl ChannelSubscriber {
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<Arc<str>>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self { tx }, rx)
    }
}

impl Subscriber for ChannelSubscriber {
    fn deliver(&self, message: Arc<str>) -> Result<(), DeliveryError> {
        self.tx.try_send(message).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::Full,
            TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }
}

/// Concurrent set of a Thing's live subscribers
#[derive(Default)]
pub struct SubscriberSet {
    subscribers: DashMap<SubscriberId, Arc<dyn Subscriber>>,
}

impl SubscriberSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber; a second insert with the same id keeps the first handle
    pub fn insert(&self, id: SubscriberId, subscriber: Arc<dyn Subscriber>) -> bool {
        let mut added = false;
        self.subscribers.entry(id).or_insert_with(|| {
            added = true;
            subscriber
        });
        added
    }

    /// Remove a subscriber; removing an unknown id is a no-op
    pub fn remove(&self, id: &SubscriberId) -> bool {
        self.subscribers.remove(id).is_some()
    }

    pub fn contains(&self, id: &SubscriberId) -> bool {
        self.subscribers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    pub fn clear(&self) {
        self.subscribers.clear();
    }

    /// Copy of the current members, so delivery never runs under a shard lock
    pub(crate) fn snapshot(&self) -> Vec<(SubscriberId, Arc<dyn Subscriber>)> {
        self.subscribers
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect()
    }
}
