//! Transport boundary
//!
//! The pipeline hands fully built requests to a [`Transport`] and gets back a
//! buffered response or the connection-level error. Connection handling, TLS
//! and DNS all live behind this trait.

use super::response::ApiResponse;
use async_trait::async_trait;
use reqwest::{Client, Request};

/// Sends a single attempt
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    async fn send(&self, request: Request) -> reqwest::Result<ApiResponse>;
}

/// Transport backed by a reqwest client
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: Request) -> reqwest::Result<ApiResponse> {
        let response = self.client.execute(request).await?;
        ApiResponse::from_reqwest(response).await
    }
}
