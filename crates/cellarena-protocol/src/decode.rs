//! Frame decoder: raw bytes in, one [`Message`] out.
//!
//! The first byte of every frame is a type code. Code [`ESCAPE_CODE`]
//! wraps the real frame: the next [`ESCAPE_SKIP`] bytes are a header this
//! client does not use, and the byte after them is the real type code.
//!
//! ```text
//! [code] [payload ...]
//! [240] [5 header bytes] [code] [payload ...]
//! ```
//!
//! Codes outside [`MessageKind`] decode to [`Message::Unknown`] without
//! touching the payload. Everything else is read field by field through a
//! [`FrameReader`], so a short buffer always surfaces as an error and
//! never as a panic or a silently shortened list.

use crate::{
    Camera, Cell, CellId, Color, CoordWidth, Eat, FrameReader,
    LeaderboardEntry, Message, MessageKind, ProtocolError, Screen, Status,
};

/// Type code that introduces a wrapped frame.
pub const ESCAPE_CODE: u8 = 240;

/// Header bytes skipped after [`ESCAPE_CODE`].
pub const ESCAPE_SKIP: usize = 5;

/// Flag bit marking a cell as a virus.
pub const FLAG_VIRUS: u8 = 0x01;

// Smallest encoded width of one record in each length-prefixed list.
const EAT_WIDTH: usize = 8;
const DISAPPEAR_WIDTH: usize = 4;
const LEADERBOARD_MIN_WIDTH: usize = 4 + 2;
const TEAM_SCORE_WIDTH: usize = 4;

/// Number of uninterpreted bytes that follow the flags byte of a cell
/// record. Bit 2 is tested first, then 4, then 8.
pub fn flag_skip(flags: u8) -> usize {
    if flags & 0x02 != 0 {
        4
    } else if flags & 0x04 != 0 {
        8
    } else if flags & 0x08 != 0 {
        16
    } else {
        0
    }
}

/// A decoded message and how many bytes it occupied.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub message: Message,
    /// Bytes read from the starting offset, type code(s) included.
    pub consumed: usize,
}

/// Decodes server frames.
///
/// The only state is the coordinate width, which is fixed per server and
/// therefore chosen once when the session is built.
#[derive(Debug, Clone, Copy, Default)]
pub struct Decoder {
    width: CoordWidth,
}

impl Decoder {
    /// Creates a decoder for servers that send coordinates of `width`.
    pub fn new(width: CoordWidth) -> Self {
        Self { width }
    }

    /// The coordinate width this decoder expects.
    pub fn width(&self) -> CoordWidth {
        self.width
    }

    /// Decodes the frame that starts at the beginning of `buf`.
    pub fn decode(&self, buf: &[u8]) -> Result<Message, ProtocolError> {
        self.decode_at(buf, 0).map(|decoded| decoded.message)
    }

    /// Decodes the frame that starts at `offset` and reports how many
    /// bytes it used.
    ///
    /// # Errors
    /// - [`ProtocolError::Truncated`] if a field runs past the buffer.
    /// - [`ProtocolError::CorruptLength`] if a count prefix cannot fit.
    pub fn decode_at(
        &self,
        buf: &[u8],
        offset: usize,
    ) -> Result<Decoded, ProtocolError> {
        let mut r = FrameReader::at(buf, offset);

        let mut code = r.u8()?;
        if code == ESCAPE_CODE {
            r.skip(ESCAPE_SKIP)?;
            code = r.u8()?;
        }

        let message = match MessageKind::from_code(code) {
            Some(kind) => self.payload(kind, &mut r)?,
            None => Message::Unknown { code },
        };

        Ok(Decoded {
            message,
            consumed: r.offset() - offset,
        })
    }

    fn payload(
        &self,
        kind: MessageKind,
        r: &mut FrameReader<'_>,
    ) -> Result<Message, ProtocolError> {
        Ok(match kind {
            MessageKind::Status => Message::Status(self.status(r)?),
            MessageKind::Leaderboard => Message::Leaderboard(leaderboard(r)?),
            MessageKind::TeamScore => Message::TeamScore(team_score(r)?),
            MessageKind::ScreenAndCamera => {
                let screen = Screen {
                    x1: r.f64()?,
                    y1: r.f64()?,
                    x2: r.f64()?,
                    y2: r.f64()?,
                };
                Message::ScreenAndCamera {
                    screen,
                    camera: Camera::centered_on(&screen),
                }
            }
            MessageKind::CameraPosition => Message::CameraPosition(Camera {
                x: f64::from(r.f32()?),
                y: f64::from(r.f32()?),
                zoom: f64::from(r.f32()?),
            }),
            MessageKind::PlayerIdentity => {
                Message::PlayerIdentity(CellId(r.u32()?))
            }
            MessageKind::Reset => Message::Reset,
            MessageKind::Auxiliary => Message::Auxiliary {
                first: r.i16()?,
                second: r.i16()?,
            },
        })
    }

    fn status(&self, r: &mut FrameReader<'_>) -> Result<Status, ProtocolError> {
        let eat_count = usize::from(r.u16()?);
        r.ensure_records(eat_count, EAT_WIDTH)?;
        let mut eats = Vec::with_capacity(eat_count);
        for _ in 0..eat_count {
            eats.push(Eat {
                eater: CellId(r.u32()?),
                eatee: CellId(r.u32()?),
            });
        }

        let mut cells = Vec::new();
        loop {
            let id = r.u32()?;
            if id == 0 {
                break;
            }
            cells.push(self.cell(r, CellId(id))?);
        }

        let disappear_count = r.u32()? as usize;
        r.ensure_records(disappear_count, DISAPPEAR_WIDTH)?;
        let mut disappeared = Vec::with_capacity(disappear_count);
        for _ in 0..disappear_count {
            disappeared.push(CellId(r.u32()?));
        }

        Ok(Status {
            eats,
            cells,
            disappeared,
        })
    }

    /// Reads the rest of a cell record whose id was already consumed.
    fn cell(
        &self,
        r: &mut FrameReader<'_>,
        id: CellId,
    ) -> Result<Cell, ProtocolError> {
        let x = self.coordinate(r)?;
        let y = self.coordinate(r)?;
        let size = r.i16()?;
        let color = Color::new(r.u8()?, r.u8()?, r.u8()?);
        let flags = r.u8()?;
        r.skip(flag_skip(flags))?;
        let name = r.utf16_string()?;

        Ok(Cell {
            id,
            x,
            y,
            size,
            color,
            is_virus: flags & FLAG_VIRUS != 0,
            name: (!name.is_empty()).then_some(name),
        })
    }

    fn coordinate(&self, r: &mut FrameReader<'_>) -> Result<i32, ProtocolError> {
        match self.width {
            CoordWidth::I16 => r.i16().map(i32::from),
            CoordWidth::I32 => r.i32(),
        }
    }
}

fn leaderboard(
    r: &mut FrameReader<'_>,
) -> Result<Vec<LeaderboardEntry>, ProtocolError> {
    let count = r.u32()? as usize;
    r.ensure_records(count, LEADERBOARD_MIN_WIDTH)?;
    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        entries.push(LeaderboardEntry {
            id: CellId(r.u32()?),
            name: r.utf16_string()?,
        });
    }
    Ok(entries)
}

fn team_score(r: &mut FrameReader<'_>) -> Result<Vec<f32>, ProtocolError> {
    let count = r.u32()? as usize;
    r.ensure_records(count, TEAM_SCORE_WIDTH)?;
    (0..count).map(|_| r.f32()).collect()
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Literal byte sequences, written out by hand so the tests check the
    //! wire layout itself rather than agreeing with our own encoder.

    use super::*;

    // -- Helpers ----------------------------------------------------------

    /// One 32-bit-coordinate cell record with the given flags, `extra`
    /// skip bytes and the name "ab".
    ///
    /// Width: 4 id + 4 x + 4 y + 2 size + 3 rgb + 1 flags + extra + 6 name.
    fn record_i32(id: u8, flags: u8, extra: usize) -> Vec<u8> {
        let mut bytes = vec![
            id, 0, 0, 0, // id
            0x10, 0, 0, 0, // x = 16
            0xf0, 0xff, 0xff, 0xff, // y = -16
            0x20, 0x00, // size = 32
            0x11, 0x22, 0x33, // rgb
            flags,
        ];
        bytes.extend(std::iter::repeat_n(0xee, extra));
        bytes.extend_from_slice(&[b'a', 0, b'b', 0, 0, 0]);
        bytes
    }

    /// Wraps cell records in a status frame with no eats and no
    /// disappearances.
    fn status_frame(records: &[Vec<u8>]) -> Vec<u8> {
        let mut frame = vec![16, 0, 0]; // code, eat count = 0
        for record in records {
            frame.extend_from_slice(record);
        }
        frame.extend_from_slice(&[0, 0, 0, 0]); // terminator id
        frame.extend_from_slice(&[0, 0, 0, 0]); // disappear count = 0
        frame
    }

    const FRAME_OVERHEAD: usize = 1 + 2 + 4 + 4;

    fn decode_status(frame: &[u8]) -> (Status, usize) {
        let decoded = Decoder::default().decode_at(frame, 0).unwrap();
        match decoded.message {
            Message::Status(status) => (status, decoded.consumed),
            other => panic!("expected Status, got {other:?}"),
        }
    }

    // =====================================================================
    // Framing
    // =====================================================================

    #[test]
    fn test_decode_unknown_code_reads_only_type_byte() {
        let frame = [200, 0xde, 0xad, 0xbe, 0xef];
        let decoded = Decoder::default().decode_at(&frame, 0).unwrap();
        assert_eq!(decoded.message, Message::Unknown { code: 200 });
        assert_eq!(decoded.consumed, 1);
    }

    #[test]
    fn test_decode_escape_skips_header_and_rereads_code() {
        let frame = [240, 9, 9, 9, 9, 9, 32, 7, 0, 0, 0];
        let decoded = Decoder::default().decode_at(&frame, 0).unwrap();
        assert_eq!(decoded.message, Message::PlayerIdentity(CellId(7)));
        assert_eq!(decoded.consumed, frame.len());
    }

    #[test]
    fn test_decode_escape_with_unknown_inner_code() {
        let frame = [240, 0, 0, 0, 0, 0, 99];
        let decoded = Decoder::default().decode_at(&frame, 0).unwrap();
        assert_eq!(decoded.message, Message::Unknown { code: 99 });
        assert_eq!(decoded.consumed, 7);
    }

    #[test]
    fn test_decode_empty_buffer_is_truncated() {
        let err = Decoder::default().decode(&[]).unwrap_err();
        assert!(matches!(err, ProtocolError::Truncated { offset: 0, .. }));
    }

    #[test]
    fn test_decode_at_nonzero_offset() {
        let buf = [0xaa, 0xbb, 32, 5, 0, 0, 0];
        let decoded = Decoder::default().decode_at(&buf, 2).unwrap();
        assert_eq!(decoded.message, Message::PlayerIdentity(CellId(5)));
        assert_eq!(decoded.consumed, 5);
    }

    // =====================================================================
    // Status: cell record widths per flag branch
    // =====================================================================

    #[test]
    fn test_status_record_width_for_each_flag_branch() {
        // (flags, extra skip): none, virus bit, then the three skip bits.
        let cases = [(0x00, 0), (0x01, 0), (0x02, 4), (0x04, 8), (0x08, 16)];
        for (flags, extra) in cases {
            let record = record_i32(1, flags, extra);
            assert_eq!(record.len(), 4 + 4 + 4 + 2 + 3 + 1 + extra + 6);

            let frame = status_frame(&[record.clone()]);
            let (status, consumed) = decode_status(&frame);

            assert_eq!(consumed, FRAME_OVERHEAD + record.len(), "flags {flags:#x}");
            assert_eq!(status.cells.len(), 1, "flags {flags:#x}");
            let cell = &status.cells[0];
            assert_eq!(cell.id, CellId(1));
            assert_eq!((cell.x, cell.y, cell.size), (16, -16, 32));
            assert_eq!(cell.color.to_string(), "112233");
            assert_eq!(cell.is_virus, flags & FLAG_VIRUS != 0);
            assert_eq!(cell.name.as_deref(), Some("ab"));
        }
    }

    #[test]
    fn test_status_skip_bit_2_wins_over_4_and_8() {
        // All three skip bits set: only the 4-byte skip applies.
        assert_eq!(flag_skip(0x0e), 4);
        assert_eq!(flag_skip(0x0c), 8);
        assert_eq!(flag_skip(0x01), 0);

        let record = record_i32(3, 0x0e, 4);
        let frame = status_frame(&[record]);
        let (status, _) = decode_status(&frame);
        assert_eq!(status.cells[0].name.as_deref(), Some("ab"));
    }

    #[test]
    fn test_status_stops_at_first_zero_id() {
        // Two records, terminator, zero disappearances, then bytes that
        // look like another record and must never be read.
        let mut frame = status_frame(&[record_i32(1, 0, 0), record_i32(2, 0x04, 8)]);
        let expected = frame.len();
        frame.extend_from_slice(&record_i32(3, 0, 0));

        let (status, consumed) = decode_status(&frame);
        let ids: Vec<_> = status.cells.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![CellId(1), CellId(2)]);
        assert_eq!(consumed, expected);
    }

    #[test]
    fn test_status_sixteen_bit_coordinates() {
        let frame = [
            16, 0, 0, // code, no eats
            9, 0, 0, 0, // id 9
            0xff, 0xff, // x = -1
            0x02, 0x00, // y = 2
            0x05, 0x00, // size 5
            0xff, 0x00, 0x00, // red
            0x01, // virus
            0, 0, // empty name
            0, 0, 0, 0, // terminator
            0, 0, 0, 0, // no disappearances
        ];
        let decoded = Decoder::new(CoordWidth::I16).decode_at(&frame, 0).unwrap();
        assert_eq!(decoded.consumed, frame.len());
        let Message::Status(status) = decoded.message else {
            panic!("expected Status");
        };
        let cell = &status.cells[0];
        assert_eq!((cell.x, cell.y, cell.size), (-1, 2, 5));
        assert!(cell.is_virus);
        assert_eq!(cell.name, None, "empty name means no name");
    }

    #[test]
    fn test_status_eats_and_disappearances() {
        let frame = [
            16, //
            2, 0, // two eats
            1, 0, 0, 0, 2, 0, 0, 0, // 1 ate 2
            3, 0, 0, 0, 4, 0, 0, 0, // 3 ate 4
            0, 0, 0, 0, // no cells
            2, 0, 0, 0, // two disappearances
            5, 0, 0, 0, //
            6, 0, 0, 0, //
        ];
        let (status, consumed) = decode_status(&frame);
        assert_eq!(consumed, frame.len());
        assert_eq!(
            status.eats,
            vec![
                Eat { eater: CellId(1), eatee: CellId(2) },
                Eat { eater: CellId(3), eatee: CellId(4) },
            ]
        );
        assert!(status.cells.is_empty());
        assert_eq!(status.disappeared, vec![CellId(5), CellId(6)]);
    }

    // =====================================================================
    // Status: malformed input
    // =====================================================================

    #[test]
    fn test_status_disappear_count_beyond_buffer_is_corrupt_length() {
        let empty = status_frame(&[]);
        assert!(Decoder::default().decode(&empty).is_ok());

        let mut bad = empty.clone();
        let len = bad.len();
        bad[len - 4..].copy_from_slice(&3u32.to_le_bytes());
        bad.extend_from_slice(&[7, 0, 0, 0]); // only one id present

        let err = Decoder::default().decode(&bad).unwrap_err();
        assert!(err.is_stream_fatal());
        assert!(matches!(err, ProtocolError::CorruptLength { count: 3, .. }));
    }

    #[test]
    fn test_status_eat_count_beyond_buffer_is_corrupt_length() {
        let frame = [16, 0xff, 0xff, 1, 0, 0, 0];
        let err = Decoder::default().decode(&frame).unwrap_err();
        assert!(matches!(err, ProtocolError::CorruptLength { count: 65_535, .. }));
    }

    #[test]
    fn test_status_cut_mid_record_is_truncated() {
        let mut frame = status_frame(&[record_i32(1, 0, 0)]);
        frame.truncate(10);
        let err = Decoder::default().decode(&frame).unwrap_err();
        assert!(matches!(err, ProtocolError::Truncated { .. }));
        assert!(!err.is_stream_fatal());
    }

    #[test]
    fn test_status_missing_terminator_is_truncated() {
        let frame = [16, 0, 0];
        assert!(matches!(
            Decoder::default().decode(&frame),
            Err(ProtocolError::Truncated { offset: 3, .. })
        ));
    }

    // =====================================================================
    // Other message kinds
    // =====================================================================

    #[test]
    fn test_leaderboard_preserves_order() {
        let frame = [
            49, //
            2, 0, 0, 0, // two rows
            9, 0, 0, 0, b'z', 0, 0, 0, // 9 "z"
            4, 0, 0, 0, b'a', 0, b'b', 0, 0, 0, // 4 "ab"
        ];
        let decoded = Decoder::default().decode_at(&frame, 0).unwrap();
        assert_eq!(decoded.consumed, frame.len());
        assert_eq!(
            decoded.message,
            Message::Leaderboard(vec![
                LeaderboardEntry { id: CellId(9), name: "z".into() },
                LeaderboardEntry { id: CellId(4), name: "ab".into() },
            ])
        );
    }

    #[test]
    fn test_leaderboard_huge_count_is_corrupt_length() {
        let frame = [49, 0xff, 0xff, 0xff, 0x7f];
        let err = Decoder::default().decode(&frame).unwrap_err();
        assert!(err.is_stream_fatal());
    }

    #[test]
    fn test_team_score() {
        let mut frame = vec![50, 3, 0, 0, 0];
        for v in [0.5f32, 0.25, 0.25] {
            frame.extend_from_slice(&v.to_le_bytes());
        }
        let msg = Decoder::default().decode(&frame).unwrap();
        assert_eq!(msg, Message::TeamScore(vec![0.5, 0.25, 0.25]));
    }

    #[test]
    fn test_screen_and_camera_derives_centered_camera() {
        let mut frame = vec![64];
        for v in [0.0f64, 0.0, 11_180.0, 11_180.0] {
            frame.extend_from_slice(&v.to_le_bytes());
        }
        let decoded = Decoder::default().decode_at(&frame, 0).unwrap();
        assert_eq!(decoded.consumed, 33);
        let Message::ScreenAndCamera { screen, camera } = decoded.message else {
            panic!("expected ScreenAndCamera");
        };
        assert_eq!(screen.x2, 11_180.0);
        assert_eq!(camera, Camera { x: 5_590.0, y: 5_590.0, zoom: 1.0 });
    }

    #[test]
    fn test_camera_position() {
        let mut frame = vec![17];
        for v in [10.0f32, -20.0, 0.5] {
            frame.extend_from_slice(&v.to_le_bytes());
        }
        assert_eq!(
            Decoder::default().decode(&frame).unwrap(),
            Message::CameraPosition(Camera { x: 10.0, y: -20.0, zoom: 0.5 })
        );
    }

    #[test]
    fn test_reset_and_auxiliary() {
        assert_eq!(Decoder::default().decode(&[20]).unwrap(), Message::Reset);
        assert_eq!(
            Decoder::default().decode(&[21, 0xff, 0xff, 3, 0]).unwrap(),
            Message::Auxiliary { first: -1, second: 3 }
        );
    }

    #[test]
    fn test_player_identity_truncated() {
        assert!(matches!(
            Decoder::default().decode(&[32, 1, 0]),
            Err(ProtocolError::Truncated { .. })
        ));
    }
}
