//! The cloneable command side of a session.

use std::time::Duration;

use cellarena_protocol::Command;
use tokio::sync::{mpsc, watch};

use crate::{SessionError, SessionState};

/// Sends gameplay commands to a running [`Session`](crate::Session) and
/// observes its readiness.
///
/// Every command method waits until the session is connected, then queues
/// the command for the driver. Commands are fire-and-forget: `Ok` means
/// queued, not delivered.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<SessionState>,
    spectate_delay: Duration,
}

impl SessionHandle {
    pub(crate) fn new(
        commands: mpsc::UnboundedSender<Command>,
        state: watch::Receiver<SessionState>,
        spectate_delay: Duration,
    ) -> Self {
        Self {
            commands,
            state,
            spectate_delay,
        }
    }

    /// The current connection state.
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// `true` once the handshake has completed, until the stream ends.
    pub fn is_ready(&self) -> bool {
        self.state().is_connected()
    }

    /// A fresh receiver for state changes.
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Waits until the session is connected.
    ///
    /// # Errors
    /// [`SessionError::Closed`] if the session driver ended first.
    pub async fn wait_ready(&self) -> Result<(), SessionError> {
        let mut state = self.state.clone();
        state
            .wait_for(|s| s.is_connected())
            .await
            .map(|_| ())
            .map_err(|_| SessionError::Closed)
    }

    /// Waits for readiness, then queues `command`.
    pub async fn send(&self, command: Command) -> Result<(), SessionError> {
        self.wait_ready().await?;
        tracing::trace!(command = command.name(), "queueing command");
        self.commands.send(command).map_err(|_| SessionError::Closed)
    }

    pub async fn move_to(&self, x: f64, y: f64) -> Result<(), SessionError> {
        self.send(Command::Move { x, y }).await
    }

    pub async fn spawn(&self, nickname: &str) -> Result<(), SessionError> {
        self.send(Command::Spawn {
            nickname: nickname.to_string(),
        })
        .await
    }

    pub async fn split(&self) -> Result<(), SessionError> {
        self.send(Command::Split).await
    }

    pub async fn eject(&self) -> Result<(), SessionError> {
        self.send(Command::Eject).await
    }

    /// Waits for readiness, sleeps the configured spectate delay, then
    /// asks to spectate.
    ///
    /// The server ignores a spectate request that arrives right after the
    /// handshake, hence the delay.
    pub async fn spectate(&self) -> Result<(), SessionError> {
        self.wait_ready().await?;
        tokio::time::sleep(self.spectate_delay).await;
        self.send(Command::Spectate).await
    }
}
