//! Server-side encoding of [`Message`] values.
//!
//! The client never sends these frames. The encoder exists so tests and
//! local fake servers can produce well-formed frames without spelling out
//! every byte, and so decoding can be checked against an independent
//! writer.
//!
//! Cell records are written with only the virus bit in the flags byte, so
//! no extra skip bytes are ever produced.
//!
//! Values the wire cannot carry are clamped rather than wrapped: a list
//! longer than its count field allows is cut to the first `MAX` entries,
//! and 16-bit coordinates saturate at `i16::MIN`/`i16::MAX`. The frame is
//! always well-formed.

use crate::decode::FLAG_VIRUS;
use crate::{CoordWidth, FrameWriter, Message};

/// Encodes `message` as one server frame using coordinates of `width`.
///
/// [`Message::Unknown`] encodes to its bare type code.
pub fn encode_message(message: &Message, width: CoordWidth) -> Vec<u8> {
    let mut w = FrameWriter::with_code(message.code());

    match message {
        Message::Status(status) => {
            let eats = capped(&status.eats, u16::MAX.into());
            w.u16(u16::try_from(eats.len()).unwrap_or(u16::MAX));
            for eat in eats {
                w.u32(eat.eater.0).u32(eat.eatee.0);
            }
            for cell in &status.cells {
                w.u32(cell.id.0);
                match width {
                    CoordWidth::I16 => {
                        w.i16(saturate_i16(cell.x)).i16(saturate_i16(cell.y));
                    }
                    CoordWidth::I32 => {
                        w.i32(cell.x).i32(cell.y);
                    }
                }
                w.i16(cell.size)
                    .u8(cell.color.r)
                    .u8(cell.color.g)
                    .u8(cell.color.b)
                    .u8(if cell.is_virus { FLAG_VIRUS } else { 0 })
                    .utf16_string(cell.name.as_deref().unwrap_or(""));
            }
            w.u32(0);
            let disappeared = count_u32(&mut w, &status.disappeared);
            for id in disappeared {
                w.u32(id.0);
            }
        }
        Message::Leaderboard(entries) => {
            for entry in count_u32(&mut w, entries) {
                w.u32(entry.id.0).utf16_string(&entry.name);
            }
        }
        Message::TeamScore(scores) => {
            for score in count_u32(&mut w, scores) {
                w.f32(*score);
            }
        }
        Message::ScreenAndCamera { screen, .. } => {
            w.f64(screen.x1).f64(screen.y1).f64(screen.x2).f64(screen.y2);
        }
        Message::CameraPosition(camera) => {
            w.f32(camera.x as f32)
                .f32(camera.y as f32)
                .f32(camera.zoom as f32);
        }
        Message::PlayerIdentity(id) => {
            w.u32(id.0);
        }
        Message::Auxiliary { first, second } => {
            w.i16(*first).i16(*second);
        }
        Message::Reset | Message::Unknown { .. } => {}
    }

    w.into_bytes()
}

fn capped<T>(items: &[T], max: usize) -> &[T] {
    &items[..items.len().min(max)]
}

/// Writes a `u32` count and returns the entries it covers.
fn count_u32<'a, T>(w: &mut FrameWriter, items: &'a [T]) -> &'a [T] {
    let items = capped(items, usize::try_from(u32::MAX).unwrap_or(usize::MAX));
    w.u32(u32::try_from(items.len()).unwrap_or(u32::MAX));
    items
}

fn saturate_i16(v: i32) -> i16 {
    i16::try_from(v).unwrap_or(if v < 0 { i16::MIN } else { i16::MAX })
}
