//! Connection handle
//!
//! Represents one live transport channel: its id and the outbound message
//! sender. Username and room live in the presence registry once the
//! connection joins; an entry here without a presence entry is an
//! unjoined connection.

use tokio::sync::mpsc;

use crate::error::SendError;
use crate::message::ServerMessage;
use crate::types::ConnectionId;

/// A connected client channel
#[derive(Debug)]
pub struct Connection {
    /// Unique identifier for this connection
    pub id: ConnectionId,
    /// Server → Client message channel
    pub sender: mpsc::Sender<ServerMessage>,
}

impl Connection {
    /// Create a new connection handle with the given ID and sender channel
    pub fn new(id: ConnectionId, sender: mpsc::Sender<ServerMessage>) -> Self {
        Self { id, sender }
    }

    /// Send a message to this connection
    ///
    /// Returns an error if the channel is closed (client disconnected).
    pub async fn send(&self, msg: ServerMessage) -> Result<(), SendError> {
        self.sender
            .send(msg)
            .await
            .map_err(|_| SendError::ChannelClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::ErrorCode;

    #[tokio::test]
    async fn test_send_delivers_message() {
        let (tx, mut rx) = mpsc::channel(32);
        let conn = Connection::new(ConnectionId::new(), tx);

        conn.send(ServerMessage::OnlineUsers { users: vec![] })
            .await
            .unwrap();

        assert!(matches!(
            rx.recv().await,
            Some(ServerMessage::OnlineUsers { .. })
        ));
    }

    #[tokio::test]
    async fn test_send_to_closed_channel_errors() {
        let (tx, rx) = mpsc::channel(32);
        drop(rx);
        let conn = Connection::new(ConnectionId::new(), tx);

        let result = conn
            .send(ServerMessage::Error {
                code: ErrorCode::InvalidMessage,
                message: "gone".to_string(),
            })
            .await;
        assert!(result.is_err());
    }
}
