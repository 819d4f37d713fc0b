//! Presence registry
//!
//! Maps each live connection to its identity (username, room) and derives
//! the per-room online-user list from those entries. Rooms are not stored
//! anywhere: a room exists as the set of entries whose `room` field
//! matches. Fully in-memory; a process restart drops everything and
//! clients must rejoin.

use crate::types::ConnectionId;

/// One live connection's identity
#[derive(Debug, Clone)]
pub struct PresenceEntry {
    pub connection_id: ConnectionId,
    pub username: String,
    pub room: String,
}

/// Insertion-ordered registry of joined connections
///
/// Entries keep join order so `usernames_in` lists users in the order
/// they arrived. Lookups scan linearly; the registry only ever holds
/// one entry per live joined connection.
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    entries: Vec<PresenceEntry>,
}

impl PresenceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the entry for a connection, replacing any stale one
    ///
    /// Normal flow always inserts fresh; replacement only happens on misuse.
    pub fn add(&mut self, connection_id: ConnectionId, username: String, room: String) {
        self.entries.retain(|e| e.connection_id != connection_id);
        self.entries.push(PresenceEntry {
            connection_id,
            username,
            room,
        });
    }

    /// Remove and return the entry for a connection; None if absent
    pub fn remove(&mut self, connection_id: ConnectionId) -> Option<PresenceEntry> {
        let pos = self
            .entries
            .iter()
            .position(|e| e.connection_id == connection_id)?;
        Some(self.entries.remove(pos))
    }

    /// Look up the entry for a connection
    pub fn get(&self, connection_id: ConnectionId) -> Option<&PresenceEntry> {
        self.entries.iter().find(|e| e.connection_id == connection_id)
    }

    /// Snapshot of usernames currently in a room, in join order
    pub fn usernames_in(&self, room: &str) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.room == room)
            .map(|e| e.username.clone())
            .collect()
    }

    /// Snapshot of connection ids currently in a room, in join order
    pub fn members_of(&self, room: &str) -> Vec<ConnectionId> {
        self.entries
            .iter()
            .filter(|e| e.room == room)
            .map(|e| e.connection_id)
            .collect()
    }
}
