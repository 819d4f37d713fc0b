//! Error types for the chat server
//!
//! Defines application-level errors and message send errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

use crate::store::StoreError;

/// Application-level errors
///
/// Covers both fatal errors (connection termination) and
/// business errors (send error message to client).
#[derive(Debug, Error)]
pub enum AppError {
    /// WebSocket protocol error (fatal)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON serialization/deserialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error (fatal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Channel send error (fatal - internal channel broken)
    #[error("Channel send error")]
    ChannelSend,

    /// Username is missing, blank, or over the length limit
    #[error("Invalid username")]
    InvalidUsername,

    /// Connection is already joined to a room
    #[error("Already joined a room")]
    AlreadyJoined,

    /// Action attempted before joining a room
    #[error("Not joined to a room")]
    NotJoined,

    /// Message body exceeds the length limit
    #[error("Message too long")]
    MessageTooLong,

    /// Message store failure (append or history query)
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Message send errors
///
/// Occurs when attempting to send messages through closed channels.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,
}
