//! Response observer feeding the rate-limit state

use super::stage::Stage;
use crate::error::Result;
use crate::http::ApiResponse;
use crate::state::RateLimitStore;
use async_trait::async_trait;
use chrono::Utc;

/// Reads `X-RateLimit-*` headers from every response, errors included
#[derive(Debug, Clone)]
pub struct ResponseObserver {
    store: RateLimitStore,
}

impl ResponseObserver {
    pub fn new(store: RateLimitStore) -> Self {
        Self { store }
    }

    /// Record the response; returns `true` if the window counters changed
    pub async fn observe(&self, response: &ApiResponse) -> bool {
        self.store.observe(response.headers(), Utc::now()).await
    }
}

#[async_trait]
impl Stage for ResponseObserver {
    fn name(&self) -> &'static str {
        "response_observer"
    }

    async fn on_response(&self, response: &ApiResponse) -> Result<()> {
        self.observe(response).await;
        Ok(())
    }
}
