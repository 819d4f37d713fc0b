//! ChatServer Actor implementation
//!
//! The central actor that owns all mutable state: connection handles, the
//! presence registry, the typing tracker, and the message store handle.
//! Uses the Actor pattern with mpsc channels for message passing, so every
//! state mutation is serialized without locks and per-connection intent
//! order is preserved.
//!
//! Connection lifecycle: a connection starts unjoined (known to the actor
//! but absent from presence), becomes joined on a successful `Join`, and is
//! closed when its `Disconnect` removes it from the map. There is no way
//! back; a second join on the same connection is rejected.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::{Config, MAX_MESSAGE_LEN, MAX_USERNAME_LEN};
use crate::connection::Connection;
use crate::error::AppError;
use crate::message::{HistoryEntry, ServerMessage};
use crate::presence::PresenceRegistry;
use crate::store::{MessageStore, NewMessageRecord};
use crate::types::ConnectionId;
use crate::typing::TypingTracker;

/// Commands sent from handlers to the ChatServer actor
#[derive(Debug)]
pub enum ServerCommand {
    /// New client connected
    Connect {
        connection_id: ConnectionId,
        sender: mpsc::Sender<ServerMessage>,
    },
    /// Client disconnected
    Disconnect {
        connection_id: ConnectionId,
    },
    /// Join a room under a username
    Join {
        connection_id: ConnectionId,
        username: String,
        room: Option<String>,
    },
    /// Send a chat message to the joined room
    SendMessage {
        connection_id: ConnectionId,
        message: String,
    },
    /// Client started (or refreshed) typing
    Typing {
        connection_id: ConnectionId,
    },
    /// Client stopped typing
    StopTyping {
        connection_id: ConnectionId,
    },
    /// A typing expiry timer fired; generation guards against stale timers
    TypingExpired {
        connection_id: ConnectionId,
        generation: u64,
    },
}

/// The main ChatServer actor
///
/// Manages all state and processes commands from client handlers.
/// Holds a sender to its own command channel so typing expiry timers can
/// report back through the same serialized path as client intents.
pub struct ChatServer {
    /// All live connections: ConnectionId -> Connection
    connections: HashMap<ConnectionId, Connection>,
    /// Joined connections and their (username, room) identity
    presence: PresenceRegistry,
    /// Active typing sessions and their expiry timers
    typing: TypingTracker,
    /// Durable message storage
    store: Arc<dyn MessageStore>,
    /// Runtime tunables
    config: Config,
    /// Command receiver channel
    receiver: mpsc::Receiver<ServerCommand>,
    /// Sender side of the command channel, cloned into timer tasks
    self_sender: mpsc::Sender<ServerCommand>,
}

impl ChatServer {
    /// Create a new ChatServer
    ///
    /// `self_sender` must be the sender side of `receiver`'s channel.
    pub fn new(
        receiver: mpsc::Receiver<ServerCommand>,
        self_sender: mpsc::Sender<ServerCommand>,
        store: Arc<dyn MessageStore>,
        config: Config,
    ) -> Self {
        Self {
            connections: HashMap::new(),
            presence: PresenceRegistry::new(),
            typing: TypingTracker::new(),
            store,
            config,
            receiver,
            self_sender,
        }
    }

    /// Run the ChatServer event loop
    ///
    /// Continuously receives and processes commands until all senders are dropped.
    pub async fn run(mut self) {
        info!("ChatServer started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd).await;
        }

        info!("ChatServer shutting down");
    }

    /// Process a single command
    async fn handle_command(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::Connect { connection_id, sender } => {
                self.handle_connect(connection_id, sender);
            }
            ServerCommand::Disconnect { connection_id } => {
                self.handle_disconnect(connection_id).await;
            }
            ServerCommand::Join { connection_id, username, room } => {
                self.handle_join(connection_id, username, room).await;
            }
            ServerCommand::SendMessage { connection_id, message } => {
                self.handle_send_message(connection_id, message).await;
            }
            ServerCommand::Typing { connection_id } => {
                self.handle_typing(connection_id).await;
            }
            ServerCommand::StopTyping { connection_id } => {
                self.handle_stop_typing(connection_id).await;
            }
            ServerCommand::TypingExpired { connection_id, generation } => {
                self.handle_typing_expired(connection_id, generation).await;
            }
        }
    }

    /// Handle new client connection
    fn handle_connect(&mut self, connection_id: ConnectionId, sender: mpsc::Sender<ServerMessage>) {
        info!("Connection {} established", connection_id);
        let connection = Connection::new(connection_id, sender);
        self.connections.insert(connection_id, connection);
        debug!("Total connections: {}", self.connections.len());
    }

    /// Handle client disconnection
    ///
    /// Valid from any state and idempotent: a repeated disconnect finds
    /// nothing to remove and does nothing.
    async fn handle_disconnect(&mut self, connection_id: ConnectionId) {
        self.typing.stop(connection_id);

        if self.connections.remove(&connection_id).is_none() {
            return;
        }

        if let Some(entry) = self.presence.remove(connection_id) {
            info!("{} left room {}", entry.username, entry.room);

            self.broadcast(
                &entry.room,
                ServerMessage::UserLeft {
                    username: entry.username,
                    timestamp: Utc::now(),
                },
                None,
            )
            .await;

            self.broadcast_online_users(&entry.room).await;
        }

        info!("Connection {} closed", connection_id);
        debug!("Total connections: {}", self.connections.len());
    }

    /// Handle a join intent
    async fn handle_join(
        &mut self,
        connection_id: ConnectionId,
        username: String,
        room: Option<String>,
    ) {
        if !self.connections.contains_key(&connection_id) {
            return;
        }

        // One connection stays bound to one room for its lifetime
        if self.presence.get(connection_id).is_some() {
            self.send_error(connection_id, AppError::AlreadyJoined).await;
            return;
        }

        let username = username.trim().to_string();
        if username.is_empty() || username.chars().count() > MAX_USERNAME_LEN {
            self.send_error(connection_id, AppError::InvalidUsername).await;
            return;
        }

        let room = room
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| self.config.default_room.clone());

        self.presence.add(connection_id, username.clone(), room.clone());
        info!("{} joined room {}", username, room);

        // History replay goes to the joiner alone
        match self.store.recent(&room, self.config.history_limit).await {
            Ok(messages) => {
                let messages = messages.into_iter().map(HistoryEntry::from).collect();
                self.send_to(connection_id, ServerMessage::MessageHistory { messages })
                    .await;
            }
            Err(e) => {
                warn!("History query failed for room {}: {}", room, e);
                self.send_error(connection_id, AppError::Store(e)).await;
            }
        }

        self.broadcast(
            &room,
            ServerMessage::UserJoined {
                username,
                timestamp: Utc::now(),
            },
            Some(connection_id),
        )
        .await;

        self.broadcast_online_users(&room).await;
    }

    /// Handle a chat message
    async fn handle_send_message(&mut self, connection_id: ConnectionId, message: String) {
        let Some(entry) = self.presence.get(connection_id) else {
            self.send_error(connection_id, AppError::NotJoined).await;
            return;
        };
        let username = entry.username.clone();
        let room = entry.room.clone();

        let body = message.trim();
        // Whitespace-only bodies are dropped silently
        if body.is_empty() {
            return;
        }
        if body.chars().count() > MAX_MESSAGE_LEN {
            self.send_error(connection_id, AppError::MessageTooLong).await;
            return;
        }

        let record = NewMessageRecord {
            username,
            message: body.to_string(),
            room: room.clone(),
            connection_id,
        };

        // Failed appends are private to the sender; nothing is broadcast
        // and the server never retries
        let stored = match self.store.append(record).await {
            Ok(stored) => stored,
            Err(e) => {
                error!("Failed to persist message in room {}: {}", room, e);
                self.send_error(connection_id, AppError::Store(e)).await;
                return;
            }
        };

        debug!("[{}] {}: message persisted (id {})", room, stored.username, stored.id);

        self.broadcast(
            &room,
            ServerMessage::NewMessage {
                username: stored.username,
                message: stored.message,
                timestamp: stored.timestamp,
            },
            None,
        )
        .await;
    }

    /// Handle typing indicator start or refresh
    async fn handle_typing(&mut self, connection_id: ConnectionId) {
        let Some(entry) = self.presence.get(connection_id) else {
            return;
        };
        let username = entry.username.clone();
        let room = entry.room.clone();

        let ttl = self.config.typing_timeout;
        let expiry_tx = self.self_sender.clone();
        let fresh = self.typing.start(connection_id, ttl, move |generation| async move {
            let _ = expiry_tx
                .send(ServerCommand::TypingExpired {
                    connection_id,
                    generation,
                })
                .await;
        });

        // Only the transition into typing is announced; refreshes re-arm
        // the timer silently
        if fresh {
            self.broadcast(
                &room,
                ServerMessage::UserTyping { username },
                Some(connection_id),
            )
            .await;
        }
    }

    /// Handle explicit typing stop
    async fn handle_stop_typing(&mut self, connection_id: ConnectionId) {
        let Some(entry) = self.presence.get(connection_id) else {
            return;
        };
        let username = entry.username.clone();
        let room = entry.room.clone();

        self.typing.stop(connection_id);

        self.broadcast(
            &room,
            ServerMessage::UserStopTyping { username },
            Some(connection_id),
        )
        .await;
    }

    /// Handle a fired typing expiry timer
    async fn handle_typing_expired(&mut self, connection_id: ConnectionId, generation: u64) {
        // Stale timers (raced by stop, re-arm, or disconnect) resolve false
        if !self.typing.expire(connection_id, generation) {
            return;
        }

        let Some(entry) = self.presence.get(connection_id) else {
            return;
        };
        let username = entry.username.clone();
        let room = entry.room.clone();

        debug!("Typing expired for {} in room {}", username, room);

        self.broadcast(
            &room,
            ServerMessage::UserStopTyping { username },
            Some(connection_id),
        )
        .await;
    }

    /// Helper: Send a message to a single connection
    async fn send_to(&self, connection_id: ConnectionId, msg: ServerMessage) {
        if let Some(connection) = self.connections.get(&connection_id) {
            if connection.send(msg).await.is_err() {
                debug!("Dropping message for closed connection {}", connection_id);
            }
        }
    }

    /// Helper: Report an error privately to the offending connection
    async fn send_error(&self, connection_id: ConnectionId, err: AppError) {
        self.send_to(connection_id, err.into()).await;
    }

    /// Helper: Deliver a message to every presence-registered member of a
    /// room, optionally excluding one connection
    ///
    /// Delivery is best-effort: a closed channel is skipped, never an error.
    async fn broadcast(&self, room: &str, msg: ServerMessage, exclude: Option<ConnectionId>) {
        for member in self.presence.members_of(room) {
            if Some(member) == exclude {
                continue;
            }
            if let Some(connection) = self.connections.get(&member) {
                if connection.send(msg.clone()).await.is_err() {
                    debug!("Dropping broadcast for closed connection {}", member);
                }
            }
        }
    }

    /// Helper: Broadcast the refreshed online-user list to a whole room
    async fn broadcast_online_users(&self, room: &str) {
        let users = self.presence.usernames_in(room);
        self.broadcast(room, ServerMessage::OnlineUsers { users }, None)
            .await;
    }
}
