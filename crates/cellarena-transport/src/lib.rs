//! Transport abstraction layer for cellarena.
//!
//! Provides the [`Connector`] and [`Connection`] traits that the session
//! drives. A connector opens one message-framed duplex channel; a
//! connection moves whole frames in both directions. Neither knows what
//! the frames mean.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket connector via `tokio-tungstenite`

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketConnector};

use std::fmt;
use std::future::Future;

/// Opaque identifier for one opened connection.
///
/// A session that reconnects gets a new id each time, which makes it easy
/// to tell connection attempts apart in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// HTTP headers sent with the upgrade request, as `(name, value)` pairs.
pub type Headers = [(String, String)];

/// Opens connections to a server.
///
/// The session receives a connector instead of calling a network library
/// directly, so tests (or a different transport) can be swapped in.
pub trait Connector: Send + Sync + 'static {
    /// The connection type produced by this connector.
    type Connection: Connection;

    /// Opens a connection to `url`, sending `headers` with the opening
    /// request.
    fn connect(
        &self,
        url: &str,
        headers: &Headers,
    ) -> impl Future<Output = Result<Self::Connection, TransportError>> + Send;
}

/// A single open connection that moves whole frames.
///
/// Methods take `&mut self`: exactly one task owns a connection, so no
/// internal locking is needed.
pub trait Connection: Send + 'static {
    /// Sends one frame.
    fn send(
        &mut self,
        data: &[u8],
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Receives the next frame.
    ///
    /// Returns `Ok(None)` when the stream has ended (the peer closed or
    /// the socket reached EOF).
    fn recv(
        &mut self,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, TransportError>> + Send;

    /// Sends a close frame. The connection is unusable afterwards.
    fn close(&mut self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Id for log fields.
    fn id(&self) -> ConnectionId;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_shows_in_logs_as_conn_n() {
        let id = ConnectionId::new(7);
        assert_eq!(format!("{id}"), "conn-7");
        assert_eq!(id.into_inner(), 7);
        assert_ne!(id, ConnectionId::new(8));
    }
}
