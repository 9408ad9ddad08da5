//! Discogs API client.
//!
//! Implements [`Catalog`] over the public REST API (`/releases`, `/masters`,
//! `/artists`). Requests are unauthenticated, so the API allows 25 requests
//! per minute; a shared [`RateLimiter`] spaces them out across the worker
//! threads that resolve contributors.
//!
//! Transport errors, HTTP 429 and 5xx responses are retried after a fixed
//! wait. Any other non-success status fails immediately.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::catalog::{Artist, ArtistLookup, Catalog, Master, Release};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::rate_limiter::RateLimiter;

pub const API_BASE: &str = "https://api.discogs.com";

/// Per-request timeout; a stalled connection counts as a transport failure.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct DiscogsClient {
    agent: ureq::Agent,
    base_url: String,
    user_agent: String,
    rate_limiter: Mutex<RateLimiter>,
    retry_wait: Duration,
    max_attempts: Option<u32>,
}

impl DiscogsClient {
    pub fn new(user_agent: &str, request_interval: Duration, retry_wait: Duration, max_attempts: Option<u32>) -> Self {
        DiscogsClient {
            agent: ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build(),
            base_url: API_BASE.to_string(),
            user_agent: user_agent.to_string(),
            rate_limiter: Mutex::new(RateLimiter::for_interval("Discogs", request_interval)),
            retry_wait,
            max_attempts,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.user_agent(),
            config.request_interval(),
            config.retry_wait(),
            config.max_fetch_attempts,
        )
    }

    /// Point the client at another API root (a mirror or a local test server).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn limiter(&self) -> MutexGuard<'_, RateLimiter> {
        self.rate_limiter.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// GET `path` and decode the JSON body, waiting and re-requesting on
    /// retryable failures until `max_attempts` is used up.
    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let mut attempts = 0;

        loop {
            attempts += 1;
            self.limiter().wait_if_needed();
            debug!("GET {} (attempt {})", url, attempts);

            let reason = match self.agent.get(&url).set("User-Agent", &self.user_agent).call() {
                Ok(response) => {
                    return serde_json::from_reader(response.into_reader())
                        .map_err(|source| Error::Decode { url, source });
                }
                Err(ureq::Error::Status(status, _)) if is_retryable(status) => format!("HTTP {}", status),
                Err(ureq::Error::Status(status, _)) => return Err(Error::CatalogStatus { url, status }),
                Err(ureq::Error::Transport(transport)) => transport.to_string(),
            };

            if self.max_attempts.is_some_and(|max| attempts >= max) {
                return Err(Error::CatalogFetch { url, attempts, reason });
            }
            warn!(
                "Request to {} failed ({}), retrying in {}s",
                url,
                reason,
                self.retry_wait.as_secs()
            );
            thread::sleep(self.retry_wait);
        }
    }
}

/// Rate limiting and server-side trouble are worth another try.
fn is_retryable(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

impl ArtistLookup for DiscogsClient {
    fn artist(&self, id: u64) -> Result<Artist> {
        self.get_json(&format!("/artists/{}", id))
    }
}

impl Catalog for DiscogsClient {
    fn release(&self, id: u64) -> Result<Release> {
        self.get_json(&format!("/releases/{}", id))
    }

    fn master(&self, id: u64) -> Result<Master> {
        self.get_json(&format!("/masters/{}", id))
    }
}

/// Release id from a Discogs release URL like
/// `https://www.discogs.com/release/30298511-DJ-Shadow-Endtroducing`, or from
/// a bare number.
pub fn parse_discogs_url(url: &str) -> Option<u64> {
    if let Some(idx) = url.find("/release/") {
        let after = &url[idx + "/release/".len()..];
        let digits: String = after.chars().take_while(|c| c.is_ascii_digit()).collect();
        return digits.parse().ok();
    }
    url.trim().parse().ok()
}
