//! Text codec for storing decoded messages outside the live stream.
//!
//! The binary wire format is fixed by the server and only goes one way
//! (server → [`Message`]). Anything that needs to write messages back out,
//! such as the gameplay recorder, goes through the [`Codec`] trait
//! instead, so the on-disk format can change without touching the
//! recorder or the replay reader.
//!
//! [`JsonCodec`] is the only implementation: one JSON document per
//! record, which keeps recordings greppable.
//!
//! [`Message`]: crate::Message

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Converts serde types to bytes and back.
///
/// `Send + Sync + 'static` because codecs live inside long-running
/// consumer tasks that Tokio may move between worker threads.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value cannot be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or do not
    /// match `T`.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] backed by `serde_json`. Behind the `json` feature
/// (enabled by default).
///
/// ```rust
/// use cellarena_protocol::{Codec, JsonCodec, Message, CellId};
///
/// let codec = JsonCodec;
/// let bytes = codec.encode(&Message::PlayerIdentity(CellId(7))).unwrap();
/// let back: Message = codec.decode(&bytes).unwrap();
/// assert_eq!(back, Message::PlayerIdentity(CellId(7)));
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
