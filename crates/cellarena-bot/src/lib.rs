//! Bots for cellarena.
//!
//! - [`WorldView`]: a per-consumer registry of visible cells, rebuilt from
//!   the message stream.
//! - Policies ([`closer`], [`greedy`], [`escape`], [`center`],
//!   [`eat_when_no_predators`]): pure functions from a view to a
//!   [`Target`].
//! - [`BotController`]: a consumer that applies messages, respawns after
//!   death and steers through a [`CommandSink`].

mod controller;
mod policy;
mod world;

pub use controller::{BotController, BotReport, CommandSink};
pub use policy::{
    BotKind, Target, UnknownBotKind, center, closer, eat_when_no_predators, escape, greedy,
};
pub use world::{SIZE_MARGIN, WorldView};
