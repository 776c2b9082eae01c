//! Little-endian frame builder, the mirror image of [`FrameReader`].
//!
//! [`FrameReader`]: crate::FrameReader

/// An append-only buffer for building one outbound frame.
#[derive(Debug, Clone, Default)]
pub struct FrameWriter {
    buf: Vec<u8>,
}

macro_rules! write_le {
    ($($name:ident => $ty:ty;)*) => {
        $(
            #[doc = concat!("Appends a little-endian `", stringify!($ty), "`.")]
            pub fn $name(&mut self, value: $ty) -> &mut Self {
                self.buf.extend_from_slice(&value.to_le_bytes());
                self
            }
        )*
    };
}

impl FrameWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a writer whose first byte is the given type code.
    pub fn with_code(code: u8) -> Self {
        let mut writer = Self::new();
        writer.u8(code);
        writer
    }

    write_le! {
        u8 => u8;
        u16 => u16;
        i16 => i16;
        u32 => u32;
        i32 => i32;
        f32 => f32;
        f64 => f64;
    }

    /// Appends raw bytes.
    pub fn bytes(&mut self, data: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(data);
        self
    }

    /// Appends the UTF-16 code units of `text` with no terminator.
    pub fn utf16_units(&mut self, text: &str) -> &mut Self {
        for unit in text.encode_utf16() {
            self.u16(unit);
        }
        self
    }

    /// Appends the UTF-16 code units of `text` followed by a zero unit.
    pub fn utf16_string(&mut self, text: &str) -> &mut Self {
        self.utf16_units(text).u16(0)
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consumes the writer and returns the frame.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}
