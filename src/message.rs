//! Message protocol definitions
//!
//! JSON-based bidirectional message protocol using Serde's tagged enum
//! for type-safe serialization/deserialization. Event names and payload
//! shapes follow the wire contract: `join`, `send_message`, `typing`,
//! `stop_typing` inbound; `message_history`, `new_message`, `user_joined`,
//! `user_left`, `online_users`, `user_typing`, `user_stop_typing`, `error`
//! outbound.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::store::StoredMessage;

/// Client → Server message
///
/// All messages from client to server. Uses tagged enum with snake_case naming.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Join a room under a username; room defaults to the configured
    /// default room when omitted
    Join {
        username: String,
        #[serde(default)]
        room: Option<String>,
    },
    /// Send a chat message to the joined room
    SendMessage { message: String },
    /// Indicate typing started (or refresh an active indicator)
    Typing,
    /// Indicate typing stopped
    StopTyping,
}

/// One replayed history item: the projection of a stored message
/// that goes over the wire
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub username: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl From<StoredMessage> for HistoryEntry {
    fn from(stored: StoredMessage) -> Self {
        Self {
            username: stored.username,
            message: stored.message,
            timestamp: stored.timestamp,
        }
    }
}

/// Server → Client message
///
/// All messages from server to client. Uses tagged enum with snake_case naming.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Recent messages of the joined room, oldest first (joiner only)
    MessageHistory { messages: Vec<HistoryEntry> },
    /// A new chat message (room broadcast, sender included)
    NewMessage {
        username: String,
        message: String,
        timestamp: DateTime<Utc>,
    },
    /// A user joined the room (room broadcast, joiner excluded)
    UserJoined {
        username: String,
        timestamp: DateTime<Utc>,
    },
    /// A user left the room (room broadcast, leaver excluded)
    UserLeft {
        username: String,
        timestamp: DateTime<Utc>,
    },
    /// Refreshed list of users in the room, in join order (room broadcast)
    OnlineUsers { users: Vec<String> },
    /// A user started typing (room broadcast, typist excluded)
    UserTyping { username: String },
    /// A user stopped typing (room broadcast, typist excluded)
    UserStopTyping { username: String },
    /// Error occurred (private to the offending connection)
    Error { code: ErrorCode, message: String },
}

/// Error codes for ServerMessage::Error
///
/// Represents different error scenarios that can be communicated to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Missing, blank, or over-length username on join
    InvalidUsername,
    /// Join attempted while already joined to a room
    AlreadyJoined,
    /// Action attempted before joining a room
    NotJoined,
    /// Message body over the length limit
    MessageTooLong,
    /// Message store unavailable; the client owns retry
    Persistence,
    /// Invalid message format
    InvalidMessage,
}

/// Convert AppError to ServerMessage for client notification
impl From<AppError> for ServerMessage {
    fn from(err: AppError) -> Self {
        let (code, message) = match &err {
            AppError::InvalidUsername => (
                ErrorCode::InvalidUsername,
                "Username must be 1-50 characters".to_string(),
            ),
            AppError::AlreadyJoined => (
                ErrorCode::AlreadyJoined,
                "You already joined a room".to_string(),
            ),
            AppError::NotJoined => (
                ErrorCode::NotJoined,
                "Join a room before doing that".to_string(),
            ),
            AppError::MessageTooLong => (
                ErrorCode::MessageTooLong,
                "Message too long (max. 1000 characters)".to_string(),
            ),
            AppError::Store(_) => (
                ErrorCode::Persistence,
                "Failed to process message, please retry".to_string(),
            ),
            AppError::Json(e) => (
                ErrorCode::InvalidMessage,
                format!("Invalid message format: {}", e),
            ),
            // Fatal errors are not typically converted (connection closes)
            _ => (ErrorCode::InvalidMessage, "Internal error".to_string()),
        };
        ServerMessage::Error { code, message }
    }
}
