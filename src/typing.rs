//! Typing tracker
//!
//! Debounced per-connection "is typing" state with automatic expiry.
//! Each active typing session owns exactly one tokio timer task; re-arming
//! aborts the previous timer before scheduling a new one. Expiry callbacks
//! carry a generation token so a callback that lost a race with `stop`,
//! a re-arm, or a disconnect is recognized as stale and discarded by the
//! caller via [`TypingTracker::expire`].

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::types::ConnectionId;

#[derive(Debug)]
struct TypingEntry {
    timer: JoinHandle<()>,
    generation: u64,
}

/// Per-connection typing state with expiry timers
#[derive(Debug, Default)]
pub struct TypingTracker {
    entries: HashMap<ConnectionId, TypingEntry>,
    next_generation: u64,
}

impl TypingTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm or re-arm the expiry timer for a connection
    ///
    /// `on_expire` receives the generation token of this arming and is
    /// awaited after `ttl` of silence. Returns true only when this call
    /// transitioned the connection into the typing state; a re-arm
    /// refreshes the timer and returns false.
    pub fn start<F, Fut>(&mut self, connection_id: ConnectionId, ttl: Duration, on_expire: F) -> bool
    where
        F: FnOnce(u64) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.next_generation += 1;
        let generation = self.next_generation;
        let expiry = on_expire(generation);

        let timer = tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            expiry.await;
        });

        match self.entries.insert(connection_id, TypingEntry { timer, generation }) {
            Some(previous) => {
                previous.timer.abort();
                false
            }
            None => true,
        }
    }

    /// Cancel the timer and clear state; safe to call when not typing
    ///
    /// Returns true if the connection was actively typing.
    pub fn stop(&mut self, connection_id: ConnectionId) -> bool {
        match self.entries.remove(&connection_id) {
            Some(entry) => {
                entry.timer.abort();
                true
            }
            None => false,
        }
    }

    /// Resolve an expiry callback
    ///
    /// Clears the entry and returns true only when the generation matches
    /// the currently armed timer; a stale callback (raced by stop or a
    /// re-arm) returns false and leaves state untouched.
    pub fn expire(&mut self, connection_id: ConnectionId, generation: u64) -> bool {
        match self.entries.get(&connection_id) {
            Some(entry) if entry.generation == generation => {
                self.entries.remove(&connection_id);
                true
            }
            _ => false,
        }
    }

    /// Whether the connection is currently typing
    pub fn is_active(&self, connection_id: ConnectionId) -> bool {
        self.entries.contains_key(&connection_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    const TTL: Duration = Duration::from_millis(3000);

    fn expiry_channel() -> (mpsc::UnboundedSender<u64>, mpsc::UnboundedReceiver<u64>) {
        mpsc::unbounded_channel()
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_reports_transition_only_once() {
        let mut tracker = TypingTracker::new();
        let id = ConnectionId::new();
        let (tx, _rx) = expiry_channel();

        let tx2 = tx.clone();
        assert!(tracker.start(id, TTL, move |generation| async move {
            let _ = tx2.send(generation);
        }));
        assert!(tracker.is_active(id));

        // Refresh while active: no transition
        assert!(!tracker.start(id, TTL, move |generation| async move {
            let _ = tx.send(generation);
        }));
        assert!(tracker.is_active(id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_after_ttl() {
        let mut tracker = TypingTracker::new();
        let id = ConnectionId::new();
        let (tx, mut rx) = expiry_channel();

        tracker.start(id, TTL, move |generation| async move {
            let _ = tx.send(generation);
        });

        let generation = rx.recv().await.unwrap();
        assert!(tracker.expire(id, generation));
        assert!(!tracker.is_active(id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_pending_timer() {
        let mut tracker = TypingTracker::new();
        let id = ConnectionId::new();
        let (tx, mut rx) = expiry_channel();

        tracker.start(id, TTL, move |generation| async move {
            let _ = tx.send(generation);
        });
        assert!(tracker.stop(id));
        assert!(!tracker.is_active(id));

        // Give the aborted timer a chance to (incorrectly) fire
        tokio::time::sleep(TTL * 2).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_when_not_typing_is_noop() {
        let mut tracker = TypingTracker::new();
        assert!(!tracker.stop(ConnectionId::new()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_invalidates_previous_generation() {
        let mut tracker = TypingTracker::new();
        let id = ConnectionId::new();
        let (tx, mut rx) = expiry_channel();

        let tx1 = tx.clone();
        tracker.start(id, TTL, move |generation| async move {
            let _ = tx1.send(generation);
        });
        let first = rx.recv().await.unwrap();

        // Re-arm before the first expiry is resolved
        tracker.start(id, TTL, move |generation| async move {
            let _ = tx.send(generation);
        });

        // The stale expiry must not clear the fresh session
        assert!(!tracker.expire(id, first));
        assert!(tracker.is_active(id));

        let second = rx.recv().await.unwrap();
        assert!(tracker.expire(id, second));
        assert!(!tracker.is_active(id));
    }
}
