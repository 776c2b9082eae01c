//! Session configuration and connection state.

use std::fmt;
use std::time::Duration;

use cellarena_protocol::{CLIENT_TOKEN, CoordWidth, PROTOCOL_VERSION};

/// Browser user agent presented to the lookup endpoint and game server.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Origin the game server expects on the upgrade request.
pub const DEFAULT_ORIGIN: &str = "http://agar.io";

/// Region used when none is given.
pub const DEFAULT_REGION: &str = "EU-London";

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for one [`Session`](crate::Session).
///
/// Build it with `SessionConfig::default()` and override what you need with
/// the `with_*` methods.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Region name passed to the lookup, e.g. `EU-London`.
    pub region: String,

    /// Value of the first handshake frame.
    pub protocol_version: u32,

    /// Value of the second handshake frame.
    pub client_token: u32,

    /// Coordinate width the server build uses in cell records.
    pub coord_width: CoordWidth,

    /// Headers sent with the WebSocket upgrade request.
    pub headers: Vec<(String, String)>,

    /// How long [`SessionHandle::spectate`](crate::SessionHandle::spectate)
    /// waits after readiness before sending.
    pub spectate_delay: Duration,

    /// Fixed pause before reconnecting after the stream ends.
    pub reconnect_pause: Duration,

    /// Upper bound of the random delay added to `reconnect_pause`.
    pub reconnect_jitter: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            protocol_version: PROTOCOL_VERSION,
            client_token: CLIENT_TOKEN,
            coord_width: CoordWidth::default(),
            headers: vec![
                ("Origin".to_string(), DEFAULT_ORIGIN.to_string()),
                ("User-Agent".to_string(), DEFAULT_USER_AGENT.to_string()),
            ],
            spectate_delay: Duration::from_secs(2),
            reconnect_pause: Duration::from_millis(500),
            reconnect_jitter: Duration::from_millis(250),
        }
    }
}

impl SessionConfig {
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_coord_width(mut self, width: CoordWidth) -> Self {
        self.coord_width = width;
        self
    }

    /// Replaces the whole header set.
    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = headers;
        self
    }

    /// Sets one header, replacing an existing one with the same
    /// (case-insensitive) name.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    pub fn with_spectate_delay(mut self, delay: Duration) -> Self {
        self.spectate_delay = delay;
        self
    }

    /// Sets the reconnect pause and its maximum random jitter.
    pub fn with_reconnect_pause(mut self, pause: Duration, jitter: Duration) -> Self {
        self.reconnect_pause = pause;
        self.reconnect_jitter = jitter;
        self
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Where the session is in its connection lifecycle.
///
/// ```text
///   Disconnected ──(lookup + open)──→ Handshaking ──(3 frames sent)──→ Connected
///        ↑                                                               │
///        └──────────────────────(stream end / receive error)─────────────┘
/// ```
///
/// Readiness, as seen by command senders, is `state == Connected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Disconnected,
    Handshaking,
    Connected,
}

impl SessionState {
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Handshaking => "handshaking",
            Self::Connected => "connected",
        };
        f.write_str(name)
    }
}
