//! Minimum-interval rate limiter for catalog requests.
//!
//! Discogs allows 25 unauthenticated requests per minute. The limiter keeps
//! a fixed spacing between requests; failed requests do not change it.

use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

pub struct RateLimiter {
    name: String,
    last_request: Option<Instant>,
    interval: Duration,
}

impl RateLimiter {
    /// Limiter for a service that allows one request per `interval`.
    pub fn for_interval(name: &str, interval: Duration) -> Self {
        RateLimiter {
            name: name.to_string(),
            last_request: None,
            interval,
        }
    }

    pub fn current_interval(&self) -> Duration {
        self.interval
    }

    /// How long a request issued at `now` has to wait.
    pub fn next_wait(&self, now: Instant) -> Duration {
        match self.last_request {
            Some(last) => self.interval.saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        }
    }

    /// Block until the next request may go out, then claim the slot.
    pub fn wait_if_needed(&mut self) {
        let wait = self.next_wait(Instant::now());
        if !wait.is_zero() {
            debug!("[{}] Rate limiting: waiting {:.1}s", self.name, wait.as_secs_f64());
            thread::sleep(wait);
        }
        self.last_request = Some(Instant::now());
    }
}
