//! Gameplay recordings: one JSON document per line.
//!
//! ```text
//! {"at":0.0,"message":{"ScreenAndCamera":{...}}}
//! {"at":0.016,"message":{"Status":{...}}}
//! ```
//!
//! `at` is seconds since the recorder saw its first message. Replay
//! sleeps the difference between consecutive `at` values, so a recording
//! plays back at the pace it was captured.

use std::path::{Path, PathBuf};
use std::time::Duration;

use cellarena_protocol::{Codec, JsonCodec, Message};
use serde::{Deserialize, Serialize};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::CellArenaError;

/// One line of a recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub at: f64,
    pub message: Message,
}

// ---------------------------------------------------------------------------
// Recorder
// ---------------------------------------------------------------------------

/// Consumer that writes every message it receives to a file.
///
/// Each record is flushed as soon as it is written, so a recording cut
/// short by a crash is still readable up to the last complete line.
pub struct Recorder<C = JsonCodec> {
    path: PathBuf,
    codec: C,
    inbox: mpsc::UnboundedReceiver<Message>,
}

impl Recorder<JsonCodec> {
    pub fn new(path: impl Into<PathBuf>, inbox: mpsc::UnboundedReceiver<Message>) -> Self {
        Self::with_codec(path, JsonCodec, inbox)
    }
}

impl<C: Codec> Recorder<C> {
    pub fn with_codec(
        path: impl Into<PathBuf>,
        codec: C,
        inbox: mpsc::UnboundedReceiver<Message>,
    ) -> Self {
        Self {
            path: path.into(),
            codec,
            inbox,
        }
    }

    /// Records until the inbox closes. Returns the number of records.
    ///
    /// The file is created (or truncated) before the first message
    /// arrives.
    pub async fn run(mut self) -> Result<u64, CellArenaError> {
        let file = File::create(&self.path).await?;
        let mut out = BufWriter::new(file);
        tracing::info!(path = %self.path.display(), "recording gameplay");

        let mut start = None;
        let mut written = 0u64;
        while let Some(message) = self.inbox.recv().await {
            let start = *start.get_or_insert_with(Instant::now);
            let record = Record {
                at: start.elapsed().as_secs_f64(),
                message,
            };
            let mut line = self.codec.encode(&record)?;
            line.push(b'\n');
            out.write_all(&line).await?;
            out.flush().await?;
            written += 1;
        }

        out.flush().await?;
        tracing::info!(path = %self.path.display(), records = written, "recording closed");
        Ok(written)
    }
}

// ---------------------------------------------------------------------------
// Replay
// ---------------------------------------------------------------------------

/// Playback settings.
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Playback speed multiplier. `2.0` plays twice as fast; `0.0` or
    /// below disables pacing entirely.
    pub speed: f64,

    /// Longest single pause, so an idle stretch in the recording does not
    /// stall playback.
    pub max_gap: Option<Duration>,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            speed: 1.0,
            max_gap: None,
        }
    }
}

impl ReplayConfig {
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_max_gap(mut self, gap: Duration) -> Self {
        self.max_gap = Some(gap);
        self
    }

    /// How long to wait between records `from` and `to` seconds in.
    fn pause(&self, from: f64, to: f64) -> Duration {
        if self.speed <= 0.0 {
            return Duration::ZERO;
        }
        let pause = Duration::try_from_secs_f64((to - from) / self.speed).unwrap_or_default();
        match self.max_gap {
            Some(max) => pause.min(max),
            None => pause,
        }
    }
}

/// Source that reads a recording and emits its messages in their
/// original rhythm.
///
/// Plays the role the session plays for a live game: its queue can feed
/// a [`Hub`](cellarena_hub::Hub) directly.
pub struct Replay<C = JsonCodec> {
    path: PathBuf,
    codec: C,
    config: ReplayConfig,
    output: mpsc::UnboundedSender<Message>,
}

impl Replay<JsonCodec> {
    /// Creates a replay of `path` and the queue it will push into.
    pub fn new(path: impl Into<PathBuf>) -> (Self, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let replay = Self {
            path: path.into(),
            codec: JsonCodec,
            config: ReplayConfig::default(),
            output: tx,
        };
        (replay, rx)
    }
}

impl<C: Codec> Replay<C> {
    pub fn with_config(mut self, config: ReplayConfig) -> Self {
        self.config = config;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Plays the whole file. Returns the number of messages emitted.
    ///
    /// Blank lines are skipped. Stops early, without error, if the
    /// receiving side of the queue is dropped.
    ///
    /// # Errors
    /// [`CellArenaError::Io`] if the file cannot be read and
    /// [`CellArenaError::Replay`] for a line that does not decode.
    pub async fn run(self) -> Result<u64, CellArenaError> {
        let file = File::open(&self.path).await?;
        let mut lines = BufReader::new(file).lines();
        tracing::info!(path = %self.path.display(), "replaying recording");

        let mut previous: Option<f64> = None;
        let mut line_no = 0usize;
        let mut emitted = 0u64;
        while let Some(line) = lines.next_line().await? {
            line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            let record: Record = self
                .codec
                .decode(line.as_bytes())
                .map_err(|source| CellArenaError::Replay {
                    line: line_no,
                    source,
                })?;

            if let Some(previous) = previous {
                tokio::time::sleep(self.config.pause(previous, record.at)).await;
            }
            previous = Some(record.at);

            if self.output.send(record.message).is_err() {
                tracing::debug!("replay queue closed, stopping early");
                break;
            }
            emitted += 1;
        }

        tracing::info!(path = %self.path.display(), messages = emitted, "replay finished");
        Ok(emitted)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use cellarena_protocol::{CellId, LeaderboardEntry};

    use super::*;

    #[test]
    fn test_pause_scales_and_clamps() {
        let config = ReplayConfig::default();
        assert_eq!(config.pause(1.0, 1.5), Duration::from_millis(500));
        assert_eq!(config.pause(2.0, 1.0), Duration::ZERO);

        let fast = ReplayConfig::default().with_speed(2.0);
        assert_eq!(fast.pause(0.0, 1.0), Duration::from_millis(500));

        let clamped = ReplayConfig::default().with_max_gap(Duration::from_millis(100));
        assert_eq!(clamped.pause(0.0, 60.0), Duration::from_millis(100));

        let unpaced = ReplayConfig::default().with_speed(0.0);
        assert_eq!(unpaced.pause(0.0, 60.0), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_recorder_writes_one_line_per_message() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.jsonl");

        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(Message::PlayerIdentity(CellId(1))).unwrap();
        tx.send(Message::Reset).unwrap();
        drop(tx);

        let written = Recorder::new(&path, rx).run().await.unwrap();
        assert_eq!(written, 2);

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: Record = JsonCodec.decode(lines[0].as_bytes()).unwrap();
        assert_eq!(first.message, Message::PlayerIdentity(CellId(1)));
        assert!(first.at >= 0.0);
    }

    #[tokio::test]
    async fn test_replay_emits_records_in_order() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let records = [
            Record {
                at: 0.0,
                message: Message::PlayerIdentity(CellId(3)),
            },
            Record {
                at: 0.01,
                message: Message::Leaderboard(vec![LeaderboardEntry {
                    id: CellId(3),
                    name: "me".into(),
                }]),
            },
        ];
        for record in &records {
            let line = JsonCodec.encode(record).unwrap();
            file.write_all(&line).unwrap();
            file.write_all(b"\n\n").unwrap();
        }
        file.flush().unwrap();

        let (replay, mut rx) = Replay::new(file.path());
        let emitted = replay.run().await.unwrap();
        assert_eq!(emitted, 2);
        assert_eq!(rx.recv().await, Some(records[0].message.clone()));
        assert_eq!(rx.recv().await, Some(records[1].message.clone()));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_replay_bad_line_reports_line_number() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{\"at\":0.0,\"message\":\"Reset\"}}").unwrap();
        writeln!(file, "not json").unwrap();
        file.flush().unwrap();

        let (replay, _rx) = Replay::new(file.path());
        let result = replay.run().await;
        assert!(matches!(result, Err(CellArenaError::Replay { line: 2, .. })));
    }

    #[tokio::test]
    async fn test_replay_missing_file_is_io_error() {
        let (replay, _rx) = Replay::new("/nonexistent/cellarena/recording.jsonl");
        assert!(matches!(replay.run().await, Err(CellArenaError::Io(_))));
    }
}
