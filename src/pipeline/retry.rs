//! Retry policy
//!
//! Decides after every attempt whether the logical request is finished or
//! should be sent again, and how long to wait first.
//!
//! Semantics:
//! - `max_retries` counts retries, not attempts: the default of 5 allows
//!   6 sends in total.
//! - Refused or dropped connections, timeouts, 429 and 502/503/504 are
//!   retried.
//!   Every other status, including other 4xx/5xx, ends the loop and is
//!   handed to the caller unchanged.
//! - A 429 is retried immediately since the throttle should already have
//!   waited. Everything else backs off linearly (`base_delay * n` before the
//!   n-th retry) with no cap and no jitter.

use crate::config::RetrySettings;
use crate::error::{is_retryable_status, is_retryable_transport};
use crate::http::ApiResponse;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::warn;

/// Default retry cap
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Default backoff unit
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Statuses that are worth another attempt
pub const RETRYABLE_STATUSES: [u16; 4] = [429, 502, 503, 504];

/// Longest body excerpt written to the log
const BODY_SNIPPET_LEN: usize = 500;

/// Result of one attempt, as seen by the policy
#[derive(Debug, Clone, Copy)]
pub enum Outcome<'a> {
    /// The server answered
    Response(&'a ApiResponse),
    /// The request never got a response
    TransportError(&'a reqwest::Error),
}

impl Outcome<'_> {
    fn status(&self) -> Option<StatusCode> {
        match self {
            Outcome::Response(response) => Some(response.status()),
            Outcome::TransportError(_) => None,
        }
    }
}

/// What the pipeline should do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Done; return the response to the caller (whatever its status)
    Succeeded,
    /// Send again after `delay`
    Retrying { delay: Duration },
    /// Done; the attempt failed and will not be retried
    Failed,
}

impl RetryDecision {
    /// Check if the pipeline should stop
    pub fn is_final(&self) -> bool {
        !matches!(self, RetryDecision::Retrying { .. })
    }
}

/// Retry policy for eCom requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self::new(
            settings.max_retries,
            Duration::from_millis(settings.base_delay_ms),
        )
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Decide what to do after an attempt
    ///
    /// `retries` is the number of retries already performed for this logical
    /// request (0 after the first attempt).
    pub fn decide(&self, retries: u32, outcome: &Outcome<'_>) -> RetryDecision {
        if retries >= self.max_retries {
            return RetryDecision::Failed;
        }

        let reason = match outcome {
            Outcome::TransportError(err) if is_retryable_transport(err) => {
                format!("Connection error: {err}")
            }
            Outcome::TransportError(_) => return RetryDecision::Failed,
            Outcome::Response(response) if is_retryable_status(response.status().as_u16()) => {
                format!(
                    "HTTP error {}:\n{}",
                    response.status().as_u16(),
                    response.body_snippet(BODY_SNIPPET_LEN)
                )
            }
            Outcome::Response(_) => return RetryDecision::Succeeded,
        };

        warn!("{reason}");
        if retries > 0 {
            warn!("Retry {retries}…");
        }

        RetryDecision::Retrying {
            delay: self.delay(retries + 1, outcome.status()),
        }
    }

    /// Delay before the `retry_number`-th retry (1-based)
    ///
    /// Zero after a 429, otherwise `base_delay * retry_number`.
    pub fn delay(&self, retry_number: u32, status: Option<StatusCode>) -> Duration {
        if status == Some(StatusCode::TOO_MANY_REQUESTS) {
            return Duration::ZERO;
        }
        self.base_delay.saturating_mul(retry_number)
    }
}
