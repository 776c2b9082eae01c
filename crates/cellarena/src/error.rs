//! Unified error type for cellarena.

use cellarena_protocol::ProtocolError;
use cellarena_session::SessionError;
use cellarena_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// Every task in a [`TaskSet`](crate::TaskSet) returns this type, so the
/// first task to finish can be reported the same way whatever it was.
#[derive(Debug, thiserror::Error)]
pub enum CellArenaError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Session(#[from] SessionError),

    /// Reading or writing a recording failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A recording line could not be decoded.
    #[error("recording line {line}: {source}")]
    Replay {
        line: usize,
        #[source]
        source: ProtocolError,
    },

    /// A task panicked.
    #[error("task {task} panicked: {message}")]
    TaskPanicked { task: String, message: String },

    /// A task was cancelled or could not be joined.
    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
}
