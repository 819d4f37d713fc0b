//! Message store adapter
//!
//! Abstraction over durable message storage: append, bounded recent-history
//! query, and an age-based retention sweep. The `ChatServer` only talks to
//! the [`MessageStore`] trait; [`MemoryStore`] is the shipped backend and a
//! durable implementation can be plugged in behind the same seam.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::types::ConnectionId;

/// Message store failures
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error from a storage backend
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend-specific failure
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// A message accepted for persistence, before the store assigns
/// its id and timestamp.
#[derive(Debug, Clone)]
pub struct NewMessageRecord {
    /// Sender's username (already validated and trimmed)
    pub username: String,
    /// Message body (already validated and trimmed)
    pub message: String,
    /// Room the message belongs to
    pub room: String,
    /// Originating connection (diagnostic only, never used for delivery)
    pub connection_id: ConnectionId,
}

/// A persisted message as returned by the store
#[derive(Debug, Clone)]
pub struct StoredMessage {
    /// Store-assigned monotonic id
    pub id: u64,
    pub username: String,
    pub message: String,
    pub room: String,
    /// Store-assigned creation time
    pub timestamp: DateTime<Utc>,
    /// Originating connection (diagnostic only)
    pub connection_id: ConnectionId,
}

/// Durable message storage contract
///
/// Implementations must serialize writes: each successful `append` produces
/// exactly one persisted record, and `recent` sees a consistent snapshot.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a message, assigning its id and timestamp
    async fn append(&self, record: NewMessageRecord) -> Result<StoredMessage, StoreError>;

    /// Fetch the most recent `limit` messages of a room in chronological
    /// (oldest-first) order
    ///
    /// Selection is by timestamp descending with ties broken by insertion
    /// order, then reversed.
    async fn recent(&self, room: &str, limit: usize) -> Result<Vec<StoredMessage>, StoreError>;

    /// Delete all messages older than the cutoff, returning the count
    ///
    /// Used only by an external retention trigger, never by the session
    /// manager.
    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError>;
}

/// In-memory message store
///
/// Keeps messages in insertion order under a single mutex, which both
/// serializes writes and makes timestamp tie-breaking stable.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryStoreInner>,
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    messages: Vec<StoredMessage>,
    next_id: u64,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn append(&self, record: NewMessageRecord) -> Result<StoredMessage, StoreError> {
        let mut inner = self.inner.lock().await;
        inner.next_id += 1;
        let stored = StoredMessage {
            id: inner.next_id,
            username: record.username,
            message: record.message,
            room: record.room,
            timestamp: Utc::now(),
            connection_id: record.connection_id,
        };
        inner.messages.push(stored.clone());
        Ok(stored)
    }

    async fn recent(&self, room: &str, limit: usize) -> Result<Vec<StoredMessage>, StoreError> {
        let inner = self.inner.lock().await;
        let mut matching: Vec<StoredMessage> = inner
            .messages
            .iter()
            .filter(|m| m.room == room)
            .cloned()
            .collect();
        // Stable sort keeps insertion order for equal timestamps
        matching.sort_by_key(|m| m.timestamp);
        let skip = matching.len().saturating_sub(limit);
        Ok(matching.split_off(skip))
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut inner = self.inner.lock().await;
        let before = inner.messages.len();
        inner.messages.retain(|m| m.timestamp >= cutoff);
        Ok(before - inner.messages.len())
    }
}
