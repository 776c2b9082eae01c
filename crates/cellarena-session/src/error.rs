//! Error types for the session layer.

use cellarena_transport::TransportError;

/// Errors that end a session or reject a command.
///
/// Anything listed here is fatal to [`Session::run`](crate::Session::run).
/// Recoverable conditions (the server closing the stream, a malformed
/// frame) never surface as a `SessionError`; the session handles them by
/// dropping the frame or reconnecting.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The lookup request failed, timed out, or got a non-success status.
    #[error("region lookup failed: {0}")]
    Lookup(#[source] reqwest::Error),

    /// The lookup response did not contain a server address and token.
    #[error("malformed lookup response: {0:?}")]
    MalformedTicket(String),

    /// Opening the connection to the game server failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A handshake frame could not be sent.
    #[error("handshake failed: {0}")]
    Handshake(#[source] TransportError),

    /// The session driver is gone, so commands can no longer be sent.
    #[error("session closed")]
    Closed,
}
