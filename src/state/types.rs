//! Rate-limit state types
//!
//! Index `i` of `reset_seconds` describes when the `i`-th window's
//! `remaining` value refreshes. Windows are ordered short to long.

use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Remaining requests assumed before any response has been observed
pub const DEFAULT_REMAINING: [i64; 3] = [300, 3000, 12000];

/// Header carrying remaining requests per window
pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Header carrying seconds until each window resets
pub const RESET_HEADER: &str = "x-ratelimit-reset";

/// Client-local view of the server's rate-limit windows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitState {
    /// Remaining requests per window
    pub remaining: Vec<i64>,
    /// Seconds until each window resets (empty until the first response with headers)
    pub reset_seconds: Vec<u64>,
    /// When the most recent response was observed
    pub last_request_time: Option<DateTime<Utc>>,
}

impl Default for RateLimitState {
    fn default() -> Self {
        Self {
            remaining: DEFAULT_REMAINING.to_vec(),
            reset_seconds: Vec::new(),
            last_request_time: None,
        }
    }
}

impl RateLimitState {
    /// Create the initial state
    pub fn new() -> Self {
        Self::default()
    }

    /// Update from a response's headers
    ///
    /// When `X-RateLimit-Remaining` is present both lists are replaced
    /// wholesale. A missing `X-RateLimit-Reset` leaves `reset_seconds` empty.
    /// Malformed values leave the counters untouched. The timestamp is
    /// always moved to `now`.
    ///
    /// Returns `true` if the counters were replaced.
    pub fn update_from_headers(&mut self, headers: &HeaderMap, now: DateTime<Utc>) -> bool {
        let replaced = match Self::from_headers(headers) {
            Ok(Some((remaining, reset_seconds))) => {
                self.remaining = remaining;
                self.reset_seconds = reset_seconds;
                true
            }
            Ok(None) => false,
            Err(message) => {
                warn!("Ignoring rate limit headers: {message}");
                false
            }
        };

        self.last_request_time = Some(now);
        replaced
    }

    /// Parse the rate-limit headers without touching any state
    ///
    /// `Ok(None)` means the response carried no `X-RateLimit-Remaining`.
    pub fn from_headers(
        headers: &HeaderMap,
    ) -> std::result::Result<Option<(Vec<i64>, Vec<u64>)>, String> {
        let Some(remaining) = headers.get(REMAINING_HEADER) else {
            return Ok(None);
        };

        let remaining = remaining
            .to_str()
            .map_err(|e| format!("{REMAINING_HEADER} is not ASCII: {e}"))?;
        let remaining = parse_window_list::<i64>(remaining)
            .ok_or_else(|| format!("invalid {REMAINING_HEADER} value '{remaining}'"))?;

        let reset_seconds = match headers.get(RESET_HEADER) {
            Some(reset) => {
                let reset = reset
                    .to_str()
                    .map_err(|e| format!("{RESET_HEADER} is not ASCII: {e}"))?;
                parse_window_list::<u64>(reset)
                    .ok_or_else(|| format!("invalid {RESET_HEADER} value '{reset}'"))?
            }
            None => Vec::new(),
        };

        Ok(Some((remaining, reset_seconds)))
    }

    /// Longest reset time among exhausted windows
    ///
    /// A window is exhausted when its remaining count is `<= 0` and it has a
    /// known reset time. Windows are paired index-wise up to the shorter of
    /// the two lists; unpaired entries never count as exhausted.
    pub fn exhausted_reset(&self) -> Option<u64> {
        self.remaining
            .iter()
            .zip(&self.reset_seconds)
            .filter(|(remaining, _)| **remaining <= 0)
            .map(|(_, reset)| *reset)
            .max()
    }

    /// How long to hold the next request, if at all
    ///
    /// The longest exhausted reset time minus the time elapsed since the last
    /// observed response. `None` when nothing is exhausted or the reset has
    /// already passed.
    pub fn throttle_delay(&self, now: DateTime<Utc>) -> Option<Duration> {
        let reset = Duration::from_secs(self.exhausted_reset()?);
        let elapsed = self
            .last_request_time
            .and_then(|last| (now - last).to_std().ok())
            .unwrap_or_default();

        reset.checked_sub(elapsed).filter(|d| !d.is_zero())
    }

    /// Check if any window is exhausted
    pub fn is_exhausted(&self) -> bool {
        self.exhausted_reset().is_some()
    }
}

/// Parse a `/`-delimited list of integers such as `200/2500/11000`
///
/// Returns `None` if the list is empty or any element fails to parse.
pub fn parse_window_list<T: FromStr>(value: &str) -> Option<Vec<T>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    value
        .split('/')
        .map(|part| part.trim().parse().ok())
        .collect()
}
