//! The session driver: the one task that owns the connection.

use cellarena_protocol::{
    Command, Decoder, Message, client_token_frame, protocol_version_frame, session_token_frame,
};
use cellarena_transport::{Connection, Connector};
use rand::Rng;
use tokio::sync::{mpsc, watch};

use crate::{RegionLookup, ServerTicket, SessionConfig, SessionError, SessionHandle, SessionState};

/// What the read loop wants to happen next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Next {
    Reconnect,
    Shutdown,
}

/// Drives one logical session with the game server.
///
/// ```text
///   lookup ─→ connect ─→ handshake ─→ read loop ─┬─→ Message queue
///     ↑                                           │
///     └──────── pause + jitter ←── stream end ────┘
/// ```
///
/// Created with [`Session::new`] and consumed by [`Session::run`], which
/// normally never returns: the stream ending is answered with a fresh
/// lookup and handshake, with no retry limit.
pub struct Session<L, C> {
    config: SessionConfig,
    lookup: L,
    connector: C,
    decoder: Decoder,
    state: watch::Sender<SessionState>,
    commands: mpsc::UnboundedReceiver<Command>,
    commands_open: bool,
    output: mpsc::UnboundedSender<Message>,
    ticket: Option<ServerTicket>,
}

impl<L, C> Session<L, C>
where
    L: RegionLookup,
    C: Connector,
{
    /// Creates a session together with its command handle and the queue
    /// decoded messages are pushed into.
    pub fn new(
        config: SessionConfig,
        lookup: L,
        connector: C,
    ) -> (Self, SessionHandle, mpsc::UnboundedReceiver<Message>) {
        let (state_tx, state_rx) = watch::channel(SessionState::Disconnected);
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel();

        let handle = SessionHandle::new(cmd_tx, state_rx, config.spectate_delay);
        let session = Self {
            decoder: Decoder::new(config.coord_width),
            config,
            lookup,
            connector,
            state: state_tx,
            commands: cmd_rx,
            commands_open: true,
            output: out_tx,
            ticket: None,
        };
        (session, handle, out_rx)
    }

    /// Runs the session until it fails or nobody reads its messages.
    ///
    /// Returns `Ok(())` only when the message queue's receiver has been
    /// dropped.
    ///
    /// # Errors
    /// - [`SessionError::Transport`] if a connection cannot be opened.
    /// - [`SessionError::Handshake`] if a handshake frame cannot be sent.
    /// - Any lookup error from the [`RegionLookup`].
    pub async fn run(mut self) -> Result<(), SessionError> {
        loop {
            let mut conn = match self.connect().await {
                Ok(conn) => conn,
                Err(e) => {
                    tracing::error!(error = %e, "session handshake failed");
                    self.state.send_replace(SessionState::Disconnected);
                    return Err(e);
                }
            };

            let next = self.pump(&mut conn).await;
            self.state.send_replace(SessionState::Disconnected);
            if let Err(e) = conn.close().await {
                tracing::debug!(id = %conn.id(), error = %e, "close after stream end failed");
            }

            match next {
                Next::Shutdown => {
                    tracing::info!("message queue closed, session ending");
                    return Ok(());
                }
                Next::Reconnect => {
                    self.ticket = None;
                    let pause = self.reconnect_pause();
                    tracing::info!(
                        id = %conn.id(),
                        pause_ms = pause.as_millis() as u64,
                        "stream ended, reconnecting"
                    );
                    tokio::time::sleep(pause).await;
                }
            }
        }
    }

    /// Looks up (if needed), opens the connection and sends the three
    /// handshake frames. Readiness is published only after all three
    /// sends succeeded.
    async fn connect(&mut self) -> Result<C::Connection, SessionError> {
        self.state.send_replace(SessionState::Handshaking);

        let ticket = match self.ticket.take() {
            Some(ticket) => ticket,
            None => self.lookup.lookup(&self.config.region).await?,
        };

        let url = ticket.url();
        let mut conn = self.connector.connect(&url, &self.config.headers).await?;
        tracing::debug!(id = %conn.id(), %url, "connected, sending handshake");

        for frame in [
            protocol_version_frame(self.config.protocol_version),
            client_token_frame(self.config.client_token),
            session_token_frame(&ticket.token),
        ] {
            conn.send(&frame).await.map_err(SessionError::Handshake)?;
        }

        self.discard_stale_commands();
        self.ticket = Some(ticket);
        self.state.send_replace(SessionState::Connected);
        tracing::info!(id = %conn.id(), %url, "session ready");
        Ok(conn)
    }

    /// Drops commands queued for an earlier connection. Handles only queue
    /// while connected, so anything left here predates this handshake.
    fn discard_stale_commands(&mut self) {
        let mut stale = 0usize;
        while let Ok(command) = self.commands.try_recv() {
            tracing::trace!(command = command.name(), "discarding stale command");
            stale += 1;
        }
        if stale > 0 {
            tracing::debug!(stale, "discarded commands from previous connection");
        }
    }

    /// Moves frames in and commands out until the stream ends or the
    /// message queue closes.
    async fn pump(&mut self, conn: &mut C::Connection) -> Next {
        loop {
            tokio::select! {
                frame = conn.recv() => match frame {
                    Ok(Some(bytes)) => {
                        if let Some(next) = self.on_frame(&bytes) {
                            return next;
                        }
                    }
                    Ok(None) => {
                        tracing::debug!(id = %conn.id(), "server closed the stream");
                        return Next::Reconnect;
                    }
                    Err(e) => {
                        tracing::warn!(id = %conn.id(), error = %e, "receive failed");
                        return Next::Reconnect;
                    }
                },
                command = self.commands.recv(), if self.commands_open => match command {
                    Some(command) => {
                        tracing::trace!(command = command.name(), "sending command");
                        if let Err(e) = conn.send(&command.encode()).await {
                            tracing::warn!(id = %conn.id(), error = %e, "send failed");
                            return Next::Reconnect;
                        }
                    }
                    None => {
                        tracing::debug!("all session handles dropped");
                        self.commands_open = false;
                    }
                },
            }
        }
    }

    /// Decodes one frame and forwards it. Returns `Some` when the loop
    /// must stop.
    fn on_frame(&self, bytes: &[u8]) -> Option<Next> {
        match self.decoder.decode(bytes) {
            Ok(Message::Unknown { code }) => {
                tracing::warn!(code, len = bytes.len(), "unknown message type");
                None
            }
            Ok(message) => {
                tracing::trace!(kind = ?message.kind(), "message");
                self.output.send(message).err().map(|_| Next::Shutdown)
            }
            Err(e) if e.is_stream_fatal() => {
                tracing::warn!(error = %e, "corrupt frame, dropping connection");
                Some(Next::Reconnect)
            }
            Err(e) => {
                tracing::debug!(error = %e, len = bytes.len(), "dropping malformed frame");
                None
            }
        }
    }

    fn reconnect_pause(&self) -> std::time::Duration {
        let jitter_ms = self.config.reconnect_jitter.as_millis() as u64;
        let extra = if jitter_ms == 0 {
            0
        } else {
            rand::rng().random_range(0..=jitter_ms)
        };
        self.config.reconnect_pause + std::time::Duration::from_millis(extra)
    }
}
