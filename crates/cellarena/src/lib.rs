//! # cellarena
//!
//! A headless client for a cell-growth arena game.
//!
//! The workspace is split by layer; this crate ties the layers together
//! and adds the pieces that only make sense once they are combined:
//!
//! - [`ClientBuilder`]: session + hub + consumers as one run
//! - [`TaskSet`]: sibling tasks, first to finish wins
//! - [`Recorder`] / [`Replay`]: JSON-lines gameplay recordings
//! - [`MessageLog`]: a consumer that logs every message
//! - [`CellArenaError`]: one error type over every layer
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cellarena::prelude::*;
//!
//! # async fn demo() {
//! let outcome = ClientBuilder::new()
//!     .mode(Mode::Bot(BotKind::EatWhenNoPredators))
//!     .run(HttpRegionLookup::default(), WebSocketConnector::new())
//!     .await;
//! if let Some(outcome) = outcome {
//!     println!("{} finished first: {:?}", outcome.name, outcome.result);
//! }
//! # }
//! ```

mod client;
mod error;
mod log;
mod record;
mod tasks;

pub use client::{ClientBuilder, DEFAULT_NICKNAME, Mode};
pub use error::CellArenaError;
pub use log::MessageLog;
pub use record::{Record, Recorder, Replay, ReplayConfig};
pub use tasks::{TaskOutcome, TaskSet};

pub use cellarena_bot as bot;
pub use cellarena_hub as hub;
pub use cellarena_protocol as protocol;
pub use cellarena_session as session;
pub use cellarena_transport as transport;

/// The types most programs need.
pub mod prelude {
    pub use crate::{
        CellArenaError, ClientBuilder, MessageLog, Mode, Recorder, Replay, ReplayConfig,
        TaskOutcome, TaskSet,
    };
    pub use cellarena_bot::{BotController, BotKind, CommandSink, WorldView};
    pub use cellarena_hub::Hub;
    pub use cellarena_protocol::{Command, Message, MessageKind};
    pub use cellarena_session::{
        HttpRegionLookup, RegionLookup, ServerTicket, Session, SessionConfig, SessionHandle,
        SessionState, StaticLookup,
    };
    pub use cellarena_transport::{Connector, WebSocketConnector};
}
