//! Error types for the protocol layer.
//!
//! Each crate in cellarena defines its own error enum. A `ProtocolError`
//! always means the bytes themselves were the problem: a frame ended too
//! early, a length prefix lied, or a JSON record could not be
//! (de)serialized.

/// Errors that can occur while decoding or encoding frames.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// A read ran off the end of the buffer.
    ///
    /// Only the current frame is lost. The transport still delivers
    /// whole frames, so the next one can be decoded normally.
    #[error(
        "frame truncated at offset {offset}: needed {needed} bytes, \
         {available} available"
    )]
    Truncated {
        /// Cursor position where the read was attempted.
        offset: usize,
        /// Width of the read that failed.
        needed: usize,
        /// Bytes left in the buffer at that point.
        available: usize,
    },

    /// A length prefix declares more records than the buffer could
    /// possibly hold.
    ///
    /// Unlike [`Truncated`](Self::Truncated), this means the framing
    /// itself can no longer be trusted, so the session treats it the
    /// same way as the server closing the stream.
    #[error(
        "corrupt length at offset {offset}: {count} records of at least \
         {min_width} bytes cannot fit in {available} bytes"
    )]
    CorruptLength {
        /// Cursor position right after the count was read.
        offset: usize,
        /// The declared record count.
        count: usize,
        /// Smallest possible encoded width of one record.
        min_width: usize,
        /// Bytes left in the buffer after the count.
        available: usize,
    },

    /// Serializing a message to JSON failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserializing a JSON record failed.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}

impl ProtocolError {
    /// Returns `true` if the error means the stream is no longer usable
    /// and the connection should be re-established.
    pub fn is_stream_fatal(&self) -> bool {
        matches!(self, Self::CorruptLength { .. })
    }
}
