//! The bot consumer: applies messages, respawns, steers.

use std::future::Future;

use cellarena_protocol::Message;
use cellarena_session::{SessionError, SessionHandle};
use tokio::sync::mpsc;

use crate::{BotKind, WorldView};

/// Where a bot sends its commands.
///
/// Implemented by [`SessionHandle`]; tests implement it with a recorder.
pub trait CommandSink: Send + Sync + 'static {
    fn move_to(&self, x: f64, y: f64) -> impl Future<Output = Result<(), SessionError>> + Send;

    fn spawn(&self, nickname: &str) -> impl Future<Output = Result<(), SessionError>> + Send;
}

impl CommandSink for SessionHandle {
    async fn move_to(&self, x: f64, y: f64) -> Result<(), SessionError> {
        SessionHandle::move_to(self, x, y).await
    }

    async fn spawn(&self, nickname: &str) -> Result<(), SessionError> {
        SessionHandle::spawn(self, nickname).await
    }
}

/// Counters returned when a bot's queue closes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BotReport {
    pub messages: u64,
    pub spawns: u64,
    pub moves: u64,
}

/// Drains one consumer queue and plays with a single [`BotKind`].
///
/// After every message the bot respawns if it is dead (once per death,
/// not once per message) and then moves wherever its policy says.
pub struct BotController<S> {
    kind: BotKind,
    nickname: String,
    sink: S,
    inbox: mpsc::UnboundedReceiver<Message>,
    world: WorldView,
    /// Epoch a spawn was already requested for.
    spawned_for: Option<u64>,
}

impl<S: CommandSink> BotController<S> {
    pub fn new(
        kind: BotKind,
        nickname: impl Into<String>,
        sink: S,
        inbox: mpsc::UnboundedReceiver<Message>,
    ) -> Self {
        Self {
            kind,
            nickname: nickname.into(),
            sink,
            inbox,
            world: WorldView::new(),
            spawned_for: None,
        }
    }

    pub fn kind(&self) -> BotKind {
        self.kind
    }

    /// Runs until the inbox closes.
    ///
    /// # Errors
    /// Whatever the sink returns, typically [`SessionError::Closed`] once
    /// the session is gone.
    pub async fn run(mut self) -> Result<BotReport, SessionError> {
        tracing::info!(bot = %self.kind, nickname = %self.nickname, "bot running");
        let mut report = BotReport::default();

        while let Some(message) = self.inbox.recv().await {
            report.messages += 1;
            self.world.apply(&message);

            if !self.world.is_alive() {
                let epoch = self.world.epoch();
                if self.spawned_for != Some(epoch) {
                    tracing::debug!(bot = %self.kind, epoch, "respawning");
                    self.sink.spawn(&self.nickname).await?;
                    self.spawned_for = Some(epoch);
                    report.spawns += 1;
                }
                continue;
            }

            if let Some(target) = self.kind.decide(&self.world) {
                self.sink.move_to(target.x, target.y).await?;
                report.moves += 1;
            }
        }

        tracing::info!(bot = %self.kind, ?report, "bot inbox closed");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use cellarena_protocol::{CellId, Eat, Status};

    use super::*;
    use crate::world::tests::{cell, field, status};

    #[derive(Debug, Clone, PartialEq)]
    enum Sent {
        Move(f64, f64),
        Spawn(String),
    }

    #[derive(Clone, Default)]
    struct RecordingSink(Arc<Mutex<Vec<Sent>>>);

    impl RecordingSink {
        fn sent(&self) -> Vec<Sent> {
            self.0.lock().unwrap().clone()
        }
    }

    impl CommandSink for RecordingSink {
        async fn move_to(&self, x: f64, y: f64) -> Result<(), SessionError> {
            self.0.lock().unwrap().push(Sent::Move(x, y));
            Ok(())
        }

        async fn spawn(&self, nickname: &str) -> Result<(), SessionError> {
            self.0.lock().unwrap().push(Sent::Spawn(nickname.to_string()));
            Ok(())
        }
    }

    struct ClosedSink;

    impl CommandSink for ClosedSink {
        async fn move_to(&self, _x: f64, _y: f64) -> Result<(), SessionError> {
            Err(SessionError::Closed)
        }

        async fn spawn(&self, _nickname: &str) -> Result<(), SessionError> {
            Err(SessionError::Closed)
        }
    }

    fn eaten(id: u32) -> Message {
        Message::Status(Status {
            eats: vec![Eat {
                eater: CellId(99),
                eatee: CellId(id),
            }],
            ..Status::default()
        })
    }

    async fn run_with(kind: BotKind, messages: Vec<Message>) -> (BotReport, Vec<Sent>) {
        let sink = RecordingSink::default();
        let (tx, rx) = mpsc::unbounded_channel();
        for message in messages {
            tx.send(message).unwrap();
        }
        drop(tx);
        let report = BotController::new(kind, "bot", sink.clone(), rx)
            .run()
            .await
            .unwrap();
        (report, sink.sent())
    }

    #[tokio::test]
    async fn test_spawns_once_while_dead() {
        let (report, sent) = run_with(
            BotKind::Closer,
            vec![status(vec![]), status(vec![]), status(vec![])],
        )
        .await;
        assert_eq!(report.spawns, 1);
        assert_eq!(sent, vec![Sent::Spawn("bot".into())]);
    }

    #[tokio::test]
    async fn test_respawns_after_each_death() {
        let (report, sent) = run_with(
            BotKind::Closer,
            vec![
                status(vec![]),
                Message::PlayerIdentity(CellId(1)),
                status(vec![cell(1, 0, 0, 50), cell(2, 5, 5, 10)]),
                eaten(1),
                status(vec![]),
                Message::PlayerIdentity(CellId(3)),
            ],
        )
        .await;

        assert_eq!(report.spawns, 2);
        let spawns = sent
            .iter()
            .filter(|s| matches!(s, Sent::Spawn(_)))
            .count();
        assert_eq!(spawns, 2);
        assert!(sent.contains(&Sent::Move(5.0, 5.0)));
    }

    #[tokio::test]
    async fn test_respawns_on_new_field_when_identity_never_came() {
        // The first connection drops after the spawn request but before
        // the server assigned a cell; the second one must spawn again.
        let (report, sent) = run_with(
            BotKind::Closer,
            vec![
                field(),
                field(),
                status(vec![cell(7, 1, 1, 10)]),
                status(vec![cell(8, 2, 2, 10)]),
            ],
        )
        .await;
        assert_eq!(report.spawns, 2);
        assert_eq!(
            sent,
            vec![Sent::Spawn("bot".into()), Sent::Spawn("bot".into())]
        );
    }

    #[tokio::test]
    async fn test_moves_follow_policy() {
        let (report, sent) = run_with(
            BotKind::Greedy,
            vec![
                Message::PlayerIdentity(CellId(1)),
                status(vec![cell(1, 0, 0, 50), cell(2, 3, 4, 10)]),
            ],
        )
        .await;
        assert_eq!(report.messages, 2);
        assert_eq!(report.spawns, 0);
        assert_eq!(sent.last(), Some(&Sent::Move(3.0, 4.0)));
    }

    #[tokio::test]
    async fn test_sink_error_ends_run() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(status(vec![])).unwrap();
        let result = BotController::new(BotKind::Center, "x", ClosedSink, rx)
            .run()
            .await;
        assert!(matches!(result, Err(SessionError::Closed)));
    }
}
