//! Client-side throttle driven by observed rate-limit windows
//!
//! Best effort and local to one client: it only knows what the last response
//! told it and does not coordinate with other processes.

use super::sleeper::Sleeper;
use super::stage::Stage;
use crate::error::{Error, Result};
use crate::state::RateLimitStore;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Request;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Holds requests back while a rate-limit window is exhausted
#[derive(Debug, Clone)]
pub struct RateLimiter {
    store: RateLimitStore,
    sleeper: Arc<dyn Sleeper>,
    /// Longest wait allowed before failing fast; `None` waits indefinitely
    max_wait: Option<Duration>,
}

impl RateLimiter {
    /// Create a limiter over the given state
    pub fn new(store: RateLimitStore, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            store,
            sleeper,
            max_wait: None,
        }
    }

    /// Refuse to wait longer than `max_wait`
    #[must_use]
    pub fn max_wait(mut self, max_wait: Option<Duration>) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Wait until the exhausted windows have reset
    ///
    /// Returns the delay that was slept, if any. Fails with
    /// [`Error::RateLimited`] when the delay exceeds the configured maximum.
    pub async fn wait(&self) -> Result<Option<Duration>> {
        let Some(delay) = self.store.throttle_delay(Utc::now()).await else {
            return Ok(None);
        };

        if let Some(max_wait) = self.max_wait {
            if delay > max_wait {
                return Err(Error::RateLimited {
                    retry_after_seconds: delay.as_secs_f64().ceil() as u64,
                });
            }
        }

        info!("Rate limit window exhausted, sleeping {:.1}s", delay.as_secs_f64());
        self.sleeper.sleep(delay).await;
        Ok(Some(delay))
    }

    /// Get the shared state this limiter reads
    pub fn store(&self) -> &RateLimitStore {
        &self.store
    }
}

#[async_trait]
impl Stage for RateLimiter {
    fn name(&self) -> &'static str {
        "rate_limiter"
    }

    async fn on_request(&self, request: &mut Request) -> Result<()> {
        if let Some(delay) = self.wait().await? {
            debug!("Held {} {} for {:?}", request.method(), request.url(), delay);
        }
        Ok(())
    }
}
