//! Shared rate-limit state
//!
//! One store per client. The limiter reads it before every attempt and the
//! observer replaces it after every response. Locks are held only for the
//! read or write itself, never across a sleep or network call.

use super::types::RateLimitState;
use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Lock-guarded rate-limit state shared by the pipeline stages
#[derive(Debug, Clone, Default)]
pub struct RateLimitStore {
    state: Arc<RwLock<RateLimitState>>,
}

impl RateLimitStore {
    /// Create a store with the default window counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with the given state
    pub fn with_state(state: RateLimitState) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Get a copy of the current state
    pub async fn snapshot(&self) -> RateLimitState {
        self.state.read().await.clone()
    }

    /// Compute how long the next request should wait
    pub async fn throttle_delay(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.state.read().await.throttle_delay(now)
    }

    /// Record a completed response
    pub async fn observe(&self, headers: &HeaderMap, now: DateTime<Utc>) -> bool {
        let mut state = self.state.write().await;
        let replaced = state.update_from_headers(headers, now);
        if replaced {
            debug!(
                remaining = ?state.remaining,
                reset = ?state.reset_seconds,
                "Rate limit state updated"
            );
        }
        replaced
    }

    /// Replace the state wholesale
    pub async fn replace(&self, new_state: RateLimitState) {
        *self.state.write().await = new_state;
    }
}
