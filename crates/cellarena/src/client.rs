//! `ClientBuilder`: wires a session, the hub and the consumers together.
//!
//! ```text
//!            ┌─────────────────────── TaskSet ───────────────────────┐
//!            │                                                       │
//! network ──→│ session ──→ hub ──┬──→ bot ──→ (commands back to session)
//!            │                   ├──→ recorder ──→ file              │
//!            │                   └──→ message log                    │
//!            └───────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use cellarena_bot::{BotController, BotKind};
use cellarena_hub::Hub;
use cellarena_session::{RegionLookup, Session, SessionConfig, SessionHandle};
use cellarena_transport::Connector;

use crate::{CellArenaError, MessageLog, Recorder, Replay, ReplayConfig, TaskOutcome, TaskSet};

/// Nickname used when none is given.
pub const DEFAULT_NICKNAME: &str = "cellarena";

/// What the client does once connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Watch the game; re-sent after every reconnect.
    Spectate,
    /// Play with a bot policy.
    Bot(BotKind),
}

/// Builder for a client run.
///
/// # Example
///
/// ```rust,ignore
/// use cellarena::prelude::*;
///
/// let outcome = ClientBuilder::new()
///     .session_config(SessionConfig::default().with_region("US-Atlanta"))
///     .mode(Mode::Bot(BotKind::Greedy))
///     .record_to("game.jsonl")
///     .run(HttpRegionLookup::default(), WebSocketConnector::new())
///     .await;
/// ```
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    session_config: SessionConfig,
    nickname: String,
    mode: Mode,
    record_to: Option<PathBuf>,
    log_messages: bool,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            session_config: SessionConfig::default(),
            nickname: DEFAULT_NICKNAME.to_string(),
            mode: Mode::Spectate,
            record_to: None,
            log_messages: false,
        }
    }

    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    pub fn nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = nickname.into();
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Records every message to `path` as JSON lines.
    pub fn record_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.record_to = Some(path.into());
        self
    }

    /// Attaches a [`MessageLog`] consumer.
    pub fn log_messages(mut self, enabled: bool) -> Self {
        self.log_messages = enabled;
        self
    }

    /// Runs against a live server until the first task finishes.
    ///
    /// The session, the hub and every consumer are siblings: whichever
    /// ends first (normally the session, on a fatal error) stops them all.
    pub async fn run<L, C>(self, lookup: L, connector: C) -> Option<TaskOutcome>
    where
        L: RegionLookup,
        C: Connector,
    {
        let (session, handle, messages) = Session::new(self.session_config, lookup, connector);
        let mut hub = Hub::new(messages);
        let mut tasks = TaskSet::new();

        match self.mode {
            Mode::Spectate => {
                tasks.spawn_helper("spectate", spectate_on_every_connect(handle.clone()));
            }
            Mode::Bot(kind) => {
                let inbox = hub.subscribe("bot");
                let bot = BotController::new(kind, self.nickname.clone(), handle.clone(), inbox);
                tasks.spawn("bot", async move {
                    let report = bot.run().await?;
                    tracing::info!(?report, "bot stopped");
                    Ok(())
                });
            }
        }

        if let Some(path) = self.record_to {
            let recorder = Recorder::new(path, hub.subscribe("recorder"));
            tasks.spawn("recorder", async move {
                recorder.run().await?;
                Ok(())
            });
        }

        if self.log_messages {
            let log = MessageLog::new(hub.subscribe("log"));
            tasks.spawn("log", async move {
                log.run().await;
                Ok(())
            });
        }

        tasks.spawn("session", async move { Ok(session.run().await?) });
        tasks.spawn("hub", async move {
            let report = hub.run().await;
            tracing::debug!(?report, "hub stopped");
            Ok(())
        });

        tasks.run().await
    }

    /// Plays a recording through the hub to the message log.
    ///
    /// The replay, hub and log run as one task so the log drains every
    /// message before the run ends.
    pub async fn replay(self, path: impl Into<PathBuf>, config: ReplayConfig) -> Option<TaskOutcome> {
        let (replay, messages) = Replay::new(path);
        let replay = replay.with_config(config);
        let mut hub = Hub::new(messages);
        let log = MessageLog::new(hub.subscribe("log"));
        let recorder = self
            .record_to
            .map(|path| Recorder::new(path, hub.subscribe("recorder")));

        let mut tasks = TaskSet::new();
        tasks.spawn("replay", async move {
            let record = async {
                match recorder {
                    Some(recorder) => recorder.run().await.map(|_| ()),
                    None => Ok(()),
                }
            };
            let (emitted, report, logged, ()) = tokio::try_join!(
                replay.run(),
                async { Ok::<_, CellArenaError>(hub.run().await) },
                async { Ok::<_, CellArenaError>(log.run().await) },
                record,
            )?;
            tracing::info!(emitted, received = report.received, logged, "replay complete");
            Ok(())
        });
        tasks.run().await
    }
}

/// Asks to spectate on every connection the session makes.
///
/// After each request the helper waits for the next state change rather
/// than for a particular state, so a connection that drops and comes back
/// before the helper looks again still gets its own request.
async fn spectate_on_every_connect(handle: SessionHandle) -> Result<(), CellArenaError> {
    let closed = |_| cellarena_session::SessionError::Closed;
    let mut state = handle.watch();
    loop {
        state.wait_for(|s| s.is_connected()).await.map_err(closed)?;
        handle.spectate().await?;
        tracing::info!("spectating");
        state.changed().await.map_err(closed)?;
    }
}
