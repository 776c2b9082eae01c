//! Wire protocol for cellarena.
//!
//! This crate defines the "language" the game server speaks and the
//! client answers in:
//!
//! - **Types** ([`Message`], [`Cell`], [`Status`], …): what the server
//!   tells us about the world.
//! - **Decoder** ([`Decoder`], [`FrameReader`]): how a binary frame
//!   becomes a [`Message`].
//! - **Commands** ([`Command`], handshake frames): what the client sends.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how messages are stored
//!   outside the live stream (recordings).
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw frames) and session
//! (connection lifecycle). It knows nothing about sockets or retries; it
//! only turns bytes into values and values into bytes.
//!
//! ```text
//! Transport (frames) → Protocol (Message) → Session → Hub → consumers
//! ```

mod codec;
mod command;
mod decode;
mod encode;
mod error;
mod reader;
mod types;
mod writer;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use command::{
    CLIENT_TOKEN, Command, PROTOCOL_VERSION, client_token_frame,
    protocol_version_frame, session_token_frame,
};
pub use decode::{Decoded, Decoder, ESCAPE_CODE, ESCAPE_SKIP, FLAG_VIRUS, flag_skip};
pub use encode::encode_message;
pub use error::ProtocolError;
pub use reader::FrameReader;
pub use types::{
    Camera, Cell, CellId, Color, CoordWidth, Eat, LeaderboardEntry, Message,
    MessageKind, Screen, Status,
};
pub use writer::FrameWriter;
