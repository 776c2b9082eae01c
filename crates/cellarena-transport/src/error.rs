/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The URL or one of the handshake headers could not be turned into
    /// a valid upgrade request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Opening the connection (TCP connect or HTTP upgrade) failed.
    #[error("connect failed: {0}")]
    ConnectFailed(#[source] std::io::Error),

    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),
}
