//! Message types decoded from the server stream.
//!
//! Everything here is plain data: once the decoder builds a value it is
//! never mutated. Consumers that need live state (which cells exist right
//! now, whether the player is alive) build it themselves by applying
//! messages in order.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Server-assigned identifier of a cell.
///
/// The player's own cell, food pellets, viruses and every opponent share
/// this id space. An id of `0` never names a cell; it terminates the cell
/// list of a status frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellId(pub u32);

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Cells and events
// ---------------------------------------------------------------------------

/// An RGB color as sent in cell records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// Creates a color from its components.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Packs the color as `0xRRGGBB`.
    pub fn to_rgb(self) -> u32 {
        (u32::from(self.r) << 16) | (u32::from(self.g) << 8) | u32::from(self.b)
    }
}

/// Formats as six lowercase hex digits, e.g. `33ff00`.
impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06x}", self.to_rgb())
    }
}

/// One cell as seen in a status frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub id: CellId,
    /// Position in play-field coordinates. The wire carries either 16 or
    /// 32 bits depending on [`CoordWidth`]; both fit in `i32`.
    pub x: i32,
    pub y: i32,
    pub size: i16,
    pub color: Color,
    pub is_virus: bool,
    /// Display name. Empty names on the wire decode to `None`.
    pub name: Option<String>,
}

/// `eater` consumed `eatee` since the previous status frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eat {
    pub eater: CellId,
    pub eatee: CellId,
}

/// Play-field bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Screen {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Screen {
    /// The midpoint of the play field.
    pub fn center(&self) -> (f64, f64) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }
}

/// Viewport position and zoom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Camera {
    /// A camera centered on `screen` at zoom 1.0, which is what the
    /// server implies when it (re)defines the play field.
    pub fn centered_on(screen: &Screen) -> Self {
        let (x, y) = screen.center();
        Self { x, y, zoom: 1.0 }
    }
}

/// One leaderboard row. Rows arrive already ranked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub id: CellId,
    pub name: String,
}

/// The world delta carried by a status frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Status {
    /// Eat events, in wire order.
    pub eats: Vec<Eat>,
    /// Cells that are new or changed, in wire order.
    pub cells: Vec<Cell>,
    /// Cells that left the visible area.
    pub disappeared: Vec<CellId>,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// Every message the server can send, plus [`Message::Unknown`] for type
/// codes this client does not recognise.
///
/// This is a closed set: adding a message kind means adding a variant
/// here, a [`MessageKind`] entry, and a decoder arm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    Status(Status),
    Leaderboard(Vec<LeaderboardEntry>),
    /// Mass fraction of each team, in team order.
    TeamScore(Vec<f32>),
    ScreenAndCamera { screen: Screen, camera: Camera },
    CameraPosition(Camera),
    /// The server assigned the player a new cell.
    PlayerIdentity(CellId),
    /// Payload-less message the server occasionally sends. Decoded so
    /// it is not reported as unknown; carries no data.
    Reset,
    /// Two signed 16-bit values the server occasionally sends. Their
    /// meaning is not known; they are kept verbatim.
    Auxiliary { first: i16, second: i16 },
    /// A type code outside [`MessageKind`]. Only the code is kept.
    Unknown { code: u8 },
}

impl Message {
    /// The kind of this message, or `None` for [`Message::Unknown`].
    pub fn kind(&self) -> Option<MessageKind> {
        match self {
            Self::Status(_) => Some(MessageKind::Status),
            Self::Leaderboard(_) => Some(MessageKind::Leaderboard),
            Self::TeamScore(_) => Some(MessageKind::TeamScore),
            Self::ScreenAndCamera { .. } => Some(MessageKind::ScreenAndCamera),
            Self::CameraPosition(_) => Some(MessageKind::CameraPosition),
            Self::PlayerIdentity(_) => Some(MessageKind::PlayerIdentity),
            Self::Reset => Some(MessageKind::Reset),
            Self::Auxiliary { .. } => Some(MessageKind::Auxiliary),
            Self::Unknown { .. } => None,
        }
    }

    /// The wire type code, including the raw code of an unknown message.
    pub fn code(&self) -> u8 {
        match self {
            Self::Unknown { code } => *code,
            known => known.kind().map_or(0, MessageKind::code),
        }
    }

    /// Returns `true` for [`Message::Unknown`].
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown { .. })
    }
}

/// Type codes of the messages this client understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageKind {
    Status = 16,
    CameraPosition = 17,
    Reset = 20,
    Auxiliary = 21,
    PlayerIdentity = 32,
    Leaderboard = 49,
    TeamScore = 50,
    ScreenAndCamera = 64,
}

impl MessageKind {
    /// Maps a wire type code to a kind. Codes outside the table give
    /// `None`.
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            16 => Self::Status,
            17 => Self::CameraPosition,
            20 => Self::Reset,
            21 => Self::Auxiliary,
            32 => Self::PlayerIdentity,
            49 => Self::Leaderboard,
            50 => Self::TeamScore,
            64 => Self::ScreenAndCamera,
            _ => return None,
        })
    }

    /// The wire type code.
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// ---------------------------------------------------------------------------
// Coordinate width
// ---------------------------------------------------------------------------

/// Width of the x/y fields in cell records.
///
/// This is a property of the server build, not of individual records:
/// every record in every status frame uses the same width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordWidth {
    /// Signed 16-bit coordinates.
    I16,
    /// Signed 32-bit coordinates.
    #[default]
    I32,
}

impl CoordWidth {
    /// Encoded size of one coordinate.
    pub fn bytes(self) -> usize {
        match self {
            Self::I16 => 2,
            Self::I32 => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_display_is_six_hex_digits() {
        assert_eq!(Color::new(0x33, 0xff, 0x00).to_string(), "33ff00");
        assert_eq!(Color::new(0, 0, 1).to_string(), "000001");
    }

    #[test]
    fn test_camera_centered_on_screen() {
        let screen = Screen { x1: 0.0, y1: 0.0, x2: 100.0, y2: 50.0 };
        let camera = Camera::centered_on(&screen);
        assert_eq!(camera, Camera { x: 50.0, y: 25.0, zoom: 1.0 });
    }

    #[test]
    fn test_message_kind_code_table_is_consistent() {
        for code in 0..=u8::MAX {
            if let Some(kind) = MessageKind::from_code(code) {
                assert_eq!(kind.code(), code);
            }
        }
        assert_eq!(MessageKind::from_code(200), None);
    }

    #[test]
    fn test_message_kind_of_unknown_is_none() {
        assert_eq!(Message::Unknown { code: 3 }.kind(), None);
        assert_eq!(
            Message::PlayerIdentity(CellId(1)).kind(),
            Some(MessageKind::PlayerIdentity)
        );
    }
}
