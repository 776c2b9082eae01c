//! Bounds-checked little-endian cursor over a received frame.
//!
//! Every read advances the cursor by exactly the width of the value.
//! There is no padding and no alignment anywhere in the protocol, so the
//! reader is just an offset into a borrowed slice.

use crate::ProtocolError;

/// A read cursor over a single frame.
///
/// The reader borrows the frame (`&'a [u8]`) instead of copying it, so
/// decoding allocates only for the values it produces (cell lists,
/// names), never for the raw bytes.
#[derive(Debug, Clone)]
pub struct FrameReader<'a> {
    buf: &'a [u8],
    offset: usize,
}

/// Generates one `pub fn name(&mut self) -> Result<ty, ProtocolError>`
/// per primitive. They differ only in the type and its width.
macro_rules! read_le {
    ($($(#[$doc:meta])* $name:ident => $ty:ty;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&mut self) -> Result<$ty, ProtocolError> {
                Ok(<$ty>::from_le_bytes(self.take()?))
            }
        )*
    };
}

impl<'a> FrameReader<'a> {
    /// Creates a reader positioned at the start of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self::at(buf, 0)
    }

    /// Creates a reader positioned at `offset`.
    ///
    /// An offset past the end is allowed; the first read will fail with
    /// [`ProtocolError::Truncated`].
    pub fn at(buf: &'a [u8], offset: usize) -> Self {
        Self { buf, offset }
    }

    /// Current cursor position, relative to the start of the buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.offset)
    }

    /// Returns `true` when every byte has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    read_le! {
        /// Reads a `u8`.
        u8 => u8;
        /// Reads an `i8`.
        i8 => i8;
        /// Reads a little-endian `u16`.
        u16 => u16;
        /// Reads a little-endian `i16`.
        i16 => i16;
        /// Reads a little-endian `u32`.
        u32 => u32;
        /// Reads a little-endian `i32`.
        i32 => i32;
        /// Reads a little-endian `u64`.
        u64 => u64;
        /// Reads a little-endian `i64`.
        i64 => i64;
        /// Reads a little-endian IEEE-754 `f32`.
        f32 => f32;
        /// Reads a little-endian IEEE-754 `f64`.
        f64 => f64;
    }

    /// Advances the cursor by `n` bytes without interpreting them.
    pub fn skip(&mut self, n: usize) -> Result<(), ProtocolError> {
        self.slice(n).map(|_| ())
    }

    /// Reads 16-bit code units up to (and including) a zero unit and
    /// returns them as a string. Unpaired surrogates are replaced.
    pub fn utf16_string(&mut self) -> Result<String, ProtocolError> {
        let mut units = Vec::new();
        loop {
            match self.u16()? {
                0 => break,
                unit => units.push(unit),
            }
        }
        Ok(String::from_utf16_lossy(&units))
    }

    /// Checks that `count` records of at least `min_width` bytes each can
    /// still fit in the unread part of the buffer.
    ///
    /// Call this right after reading a length prefix, before looping.
    pub fn ensure_records(
        &self,
        count: usize,
        min_width: usize,
    ) -> Result<(), ProtocolError> {
        let fits = count
            .checked_mul(min_width)
            .is_some_and(|needed| needed <= self.remaining());
        if fits {
            Ok(())
        } else {
            Err(ProtocolError::CorruptLength {
                offset: self.offset,
                count,
                min_width,
                available: self.remaining(),
            })
        }
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], ProtocolError> {
        let bytes = self.slice(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    fn slice(&mut self, n: usize) -> Result<&'a [u8], ProtocolError> {
        let bytes = self
            .buf
            .get(self.offset..)
            .and_then(|rest| rest.get(..n))
            .ok_or(ProtocolError::Truncated {
                offset: self.offset,
                needed: n,
                available: self.remaining(),
            })?;
        self.offset += n;
        Ok(bytes)
    }
}
