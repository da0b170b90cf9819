//! HTTP client module
//!
//! Provides the eCom API client and the transport boundary it sends through.
//!
//! # Features
//!
//! - **Automatic Retries**: Connection errors, 429 and 502/503/504 with linear backoff
//! - **Rate Limiting**: Throttles on the server's `X-RateLimit-*` windows
//! - **Authentication**: HTTP Basic with the shop's API key and secret
//! - **Buffered Responses**: Status, headers and body available after the call

mod client;
mod response;
mod transport;

pub use client::{EcomClient, EcomClientBuilder, RequestOptions};
pub use response::ApiResponse;
pub use transport::{ReqwestTransport, Transport};
