//! Client → server frames: the three handshake frames and the gameplay
//! commands.
//!
//! None of these expect a reply. The server acts on them silently and the
//! effect (a new cell, a split, a moved camera) shows up later in the
//! regular message stream.

use crate::FrameWriter;

/// Protocol version announced in the first handshake frame.
pub const PROTOCOL_VERSION: u32 = 4;

/// Fixed numeric client identifier. Sent in the second handshake frame
/// and in the region lookup request.
pub const CLIENT_TOKEN: u32 = 154_669_603;

const VERSION_CODE: u8 = 254;
const CLIENT_TOKEN_CODE: u8 = 255;
const SESSION_TOKEN_CODE: u8 = 80;

// ---------------------------------------------------------------------------
// Handshake
// ---------------------------------------------------------------------------

/// First handshake frame: `u8 254, u32 version`.
pub fn protocol_version_frame(version: u32) -> Vec<u8> {
    let mut w = FrameWriter::with_code(VERSION_CODE);
    w.u32(version);
    w.into_bytes()
}

/// Second handshake frame: `u8 255, u32 token`.
pub fn client_token_frame(token: u32) -> Vec<u8> {
    let mut w = FrameWriter::with_code(CLIENT_TOKEN_CODE);
    w.u32(token);
    w.into_bytes()
}

/// Third handshake frame: `u8 80` followed by the session token bytes as
/// returned by the region lookup.
pub fn session_token_frame(token: &str) -> Vec<u8> {
    let mut w = FrameWriter::with_code(SESSION_TOKEN_CODE);
    w.bytes(token.as_bytes());
    w.into_bytes()
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// A gameplay command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Steer towards a point in play-field coordinates.
    Move { x: f64, y: f64 },
    /// Enter the game with a new cell.
    Spawn { nickname: String },
    /// Split every player cell in two.
    Split,
    /// Eject a small amount of mass.
    Eject,
    /// Watch the game without a cell.
    Spectate,
}

impl Command {
    /// The type code this command is sent with.
    pub fn opcode(&self) -> u8 {
        match self {
            Self::Spawn { .. } => 0,
            Self::Spectate => 1,
            Self::Move { .. } => 16,
            Self::Split => 17,
            Self::Eject => 21,
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Move { .. } => "move",
            Self::Spawn { .. } => "spawn",
            Self::Split => "split",
            Self::Eject => "eject",
            Self::Spectate => "spectate",
        }
    }

    /// Encodes the command as one frame.
    ///
    /// - `Move`: `u8 16, f64 x, f64 y, u32 0`
    /// - `Spawn`: `u8 0` then one `u16` per UTF-16 code unit, no
    ///   terminator
    /// - `Split`, `Eject`, `Spectate`: the type byte alone
    pub fn encode(&self) -> Vec<u8> {
        let mut w = FrameWriter::with_code(self.opcode());
        match self {
            Self::Move { x, y } => {
                w.f64(*x).f64(*y).u32(0);
            }
            Self::Spawn { nickname } => {
                w.utf16_units(nickname);
            }
            Self::Split | Self::Eject | Self::Spectate => {}
        }
        w.into_bytes()
    }
}
