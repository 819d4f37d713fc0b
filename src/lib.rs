//! Room-based WebSocket Chat Server Library
//!
//! A real-time chat backend built with tokio-tungstenite using the Actor
//! pattern for state management.
//!
//! # Features
//! - WebSocket connection handling
//! - Named rooms, any room name valid on join
//! - Message history replay on join (persisted, bounded)
//! - Real-time room broadcast with per-room online-user lists
//! - Typing indicators with automatic expiry
//! - Disconnection handling
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `ChatServer` is the central actor managing all state
//! - Each connection has a `handler` task communicating with the server
//! - No locks needed - all state access goes through message passing
//! - The `MessageStore` trait is the seam for durable storage
//!
//! # Example
//! ```ignore
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//! use tokio::sync::mpsc;
//! use room_chat_server::{handle_connection, ChatServer, Config, MemoryStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await.unwrap();
//!     let (cmd_tx, cmd_rx) = mpsc::channel(256);
//!
//!     let server = ChatServer::new(
//!         cmd_rx,
//!         cmd_tx.clone(),
//!         Arc::new(MemoryStore::new()),
//!         Config::from_env(),
//!     );
//!     tokio::spawn(server.run());
//!
//!     while let Ok((stream, _)) = listener.accept().await {
//!         let cmd_tx = cmd_tx.clone();
//!         tokio::spawn(handle_connection(stream, cmd_tx));
//!     }
//! }
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod handler;
pub mod message;
pub mod presence;
pub mod server;
pub mod store;
pub mod types;
pub mod typing;

// Re-export main types for convenience
pub use config::Config;
pub use connection::Connection;
pub use error::{AppError, SendError};
pub use handler::handle_connection;
pub use message::{ClientMessage, ErrorCode, HistoryEntry, ServerMessage};
pub use presence::PresenceRegistry;
pub use server::{ChatServer, ServerCommand};
pub use store::{MemoryStore, MessageStore, NewMessageRecord, StoreError, StoredMessage};
pub use types::ConnectionId;
pub use typing::TypingTracker;
