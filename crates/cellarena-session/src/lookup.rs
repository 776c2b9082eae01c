//! Region lookup: turning a region name into a game server and token.
//!
//! The session never talks to the lookup endpoint directly. It is handed
//! something implementing [`RegionLookup`], which keeps the handshake
//! testable and lets the CLI skip the lookup entirely with a fixed
//! [`StaticLookup`].

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use cellarena_protocol::CLIENT_TOKEN;
use reqwest::header::{HeaderMap, HeaderValue, ORIGIN, REFERER, USER_AGENT};
use serde::Deserialize;

use crate::SessionError;
use crate::session::{DEFAULT_ORIGIN, DEFAULT_USER_AGENT};

/// Default lookup endpoint.
pub const DEFAULT_LOOKUP_ENDPOINT: &str = "http://m.agar.io/";

/// Default endpoint listing regions and their player counts.
pub const DEFAULT_INFO_ENDPOINT: &str = "https://m.agar.io/info";

const REFERER_VALUE: &str = "http://agar.io/";

/// Upper bound on one lookup request, redirects included.
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// ServerTicket
// ---------------------------------------------------------------------------

/// A game server address plus the token that admits us to it.
///
/// Tickets are single-use from the session's point of view: after the
/// stream ends the ticket is dropped and a fresh one is looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerTicket {
    /// `host:port`, or a full `ws://`/`wss://` URL.
    pub address: String,
    pub token: String,
}

impl ServerTicket {
    pub fn new(address: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            token: token.into(),
        }
    }

    /// Parses a lookup response body: `server\ntoken[\n...]`.
    ///
    /// Trailing lines are ignored. `\r\n` line endings are accepted.
    ///
    /// # Errors
    /// [`SessionError::MalformedTicket`] if either of the first two lines
    /// is missing or empty.
    pub fn parse(body: &str) -> Result<Self, SessionError> {
        let mut lines = body.lines().map(str::trim);
        match (lines.next(), lines.next()) {
            (Some(address), Some(token)) if !address.is_empty() && !token.is_empty() => {
                Ok(Self::new(address, token))
            }
            _ => Err(SessionError::MalformedTicket(body.to_string())),
        }
    }

    /// WebSocket URL for this ticket's server.
    pub fn url(&self) -> String {
        if self.address.starts_with("ws://") || self.address.starts_with("wss://") {
            self.address.clone()
        } else {
            format!("ws://{}", self.address)
        }
    }
}

// ---------------------------------------------------------------------------
// RegionLookup
// ---------------------------------------------------------------------------

/// Resolves a region name to a [`ServerTicket`].
///
/// `Send + Sync + 'static` because the lookup lives inside the session
/// driver task for its whole life and is called again on every reconnect.
pub trait RegionLookup: Send + Sync + 'static {
    fn lookup(
        &self,
        region: &str,
    ) -> impl Future<Output = Result<ServerTicket, SessionError>> + Send;
}

/// Always returns the same ticket.
#[derive(Debug, Clone)]
pub struct StaticLookup {
    ticket: ServerTicket,
}

impl StaticLookup {
    pub fn new(ticket: ServerTicket) -> Self {
        Self { ticket }
    }
}

impl RegionLookup for StaticLookup {
    async fn lookup(&self, region: &str) -> Result<ServerTicket, SessionError> {
        tracing::debug!(region, address = %self.ticket.address, "using static server ticket");
        Ok(self.ticket.clone())
    }
}

/// Looks the region up with an HTTP POST.
///
/// The request body is `"<region>\n<client token>"`. The endpoint only
/// accepts requests that look like they come from the browser client, so
/// `Origin`, `Referer` and `User-Agent` are always sent. Redirects are
/// followed.
#[derive(Debug, Clone)]
pub struct HttpRegionLookup {
    client: reqwest::Client,
    endpoint: String,
    info_endpoint: String,
    client_token: u32,
}

impl Default for HttpRegionLookup {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKUP_ENDPOINT)
    }
}

impl HttpRegionLookup {
    /// Creates a lookup that POSTs to `endpoint` (a full `http(s)://` URL).
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            info_endpoint: DEFAULT_INFO_ENDPOINT.to_string(),
            client_token: CLIENT_TOKEN,
        }
    }

    pub fn with_client_token(mut self, token: u32) -> Self {
        self.client_token = token;
        self
    }

    /// Overrides where [`regions`](Self::regions) fetches from.
    pub fn with_info_endpoint(mut self, url: impl Into<String>) -> Self {
        self.info_endpoint = url.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ORIGIN, HeaderValue::from_static(DEFAULT_ORIGIN));
        headers.insert(REFERER, HeaderValue::from_static(REFERER_VALUE));
        headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
        headers
    }

    /// Lists the known regions with their current load, sorted by name.
    ///
    /// # Errors
    /// [`SessionError::Lookup`] if the request fails, the status is not a
    /// success, or the body is not the expected JSON.
    pub async fn regions(&self) -> Result<Vec<RegionInfo>, SessionError> {
        tracing::debug!(endpoint = %self.info_endpoint, "fetching region list");
        let body: InfoResponse = self
            .client
            .get(&self.info_endpoint)
            .headers(Self::headers())
            .timeout(LOOKUP_TIMEOUT)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(SessionError::Lookup)?
            .json()
            .await
            .map_err(SessionError::Lookup)?;

        Ok(body
            .regions
            .into_iter()
            .map(|(name, stats)| RegionInfo { name, stats })
            .collect())
    }
}

impl RegionLookup for HttpRegionLookup {
    async fn lookup(&self, region: &str) -> Result<ServerTicket, SessionError> {
        tracing::debug!(region, endpoint = %self.endpoint, "looking up region");

        let body = self
            .client
            .post(&self.endpoint)
            .headers(Self::headers())
            .body(format!("{region}\n{}", self.client_token))
            .timeout(LOOKUP_TIMEOUT)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(SessionError::Lookup)?
            .text()
            .await
            .map_err(SessionError::Lookup)?;

        let ticket = ServerTicket::parse(&body)?;
        tracing::info!(region, address = %ticket.address, "region resolved");
        Ok(ticket)
    }
}

// ---------------------------------------------------------------------------
// Region list
// ---------------------------------------------------------------------------

/// Load figures for one region, as reported by the info endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegionStats {
    pub num_players: u64,
    pub num_realms: u64,
    pub num_servers: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionInfo {
    pub name: String,
    pub stats: RegionStats,
}

#[derive(Debug, Deserialize)]
struct InfoResponse {
    #[serde(default)]
    regions: BTreeMap<String, RegionStats>,
}
