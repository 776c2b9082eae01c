//! Server session for cellarena.
//!
//! This crate turns "play in region X" into a live stream of decoded
//! messages:
//!
//! 1. **Lookup**: resolve the region to a server and token
//!    ([`RegionLookup`], [`HttpRegionLookup`], [`StaticLookup`])
//! 2. **Handshake**: open the connection and send the three handshake
//!    frames ([`Session`])
//! 3. **Read loop**: decode frames and push them into an unbounded queue
//! 4. **Reconnect**: when the stream ends, do it all again
//!
//! Commands go the other way through a cloneable [`SessionHandle`], which
//! waits for readiness before queueing anything.
//!
//! # How it fits in the stack
//!
//! ```text
//! Hub / consumers (above)  ← drain the Message queue, send commands
//!     ↕
//! Session Layer (this crate)  ← owns the connection, handshake, readiness
//!     ↕
//! Protocol + Transport (below)  ← frame codec, WebSocket connector
//! ```

mod driver;
mod error;
mod handle;
mod lookup;
mod session;

pub use driver::Session;
pub use error::SessionError;
pub use handle::SessionHandle;
pub use lookup::{
    DEFAULT_INFO_ENDPOINT, DEFAULT_LOOKUP_ENDPOINT, HttpRegionLookup, RegionInfo, RegionLookup,
    RegionStats, ServerTicket, StaticLookup,
};
pub use session::{
    DEFAULT_ORIGIN, DEFAULT_REGION, DEFAULT_USER_AGENT, SessionConfig, SessionState,
};
