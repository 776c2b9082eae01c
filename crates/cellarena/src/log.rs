//! A consumer that logs every message.

use cellarena_protocol::Message;
use tokio::sync::mpsc;

/// Drains its queue and emits each message as a `debug` event.
pub struct MessageLog {
    inbox: mpsc::UnboundedReceiver<Message>,
}

impl MessageLog {
    pub fn new(inbox: mpsc::UnboundedReceiver<Message>) -> Self {
        Self { inbox }
    }

    /// Runs until the queue closes. Returns the number of messages seen.
    pub async fn run(mut self) -> u64 {
        let mut seen = 0u64;
        while let Some(message) = self.inbox.recv().await {
            seen += 1;
            match message.kind() {
                Some(kind) => tracing::debug!(%kind, ?message, "message"),
                None => tracing::debug!(code = message.code(), "unknown message"),
            }
        }
        seen
    }
}
