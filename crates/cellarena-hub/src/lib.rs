//! Broadcast hub for cellarena.
//!
//! The session produces one queue of decoded messages. Every consumer
//! (bot, recorder, logger) wants all of them, in order, at its own pace.
//! The [`Hub`] sits in between: it drains the single source and pushes a
//! clone of each item into every registered sink without ever waiting on
//! a consumer.
//!
//! ```text
//!                      ┌──→ sink "bot"      ──→ BotController
//! Session ──→ source ──┼──→ sink "recorder" ──→ Recorder
//!                      └──→ sink "log"      ──→ MessageLog
//! ```

mod hub;

pub use hub::{Hub, HubReport, SinkId};
