//! Pipeline stage trait

use crate::error::Result;
use crate::http::ApiResponse;
use async_trait::async_trait;
use reqwest::Request;

/// One step of the request pipeline
///
/// Stages may rewrite the outgoing request, suspend before it is sent, or
/// inspect the response. Both hooks default to doing nothing. An error from
/// either hook aborts the logical request without retrying.
#[async_trait]
pub trait Stage: Send + Sync + std::fmt::Debug {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Called before every attempt, in pipeline order
    async fn on_request(&self, _request: &mut Request) -> Result<()> {
        Ok(())
    }

    /// Called after every response, in reverse pipeline order
    async fn on_response(&self, _response: &ApiResponse) -> Result<()> {
        Ok(())
    }
}
