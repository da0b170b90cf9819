// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

//! # Lightspeed eCom client
//!
//! A REST client for the Lightspeed eCom API that takes care of
//! authentication, the API's three-window rate limits and transient failures,
//! so callers only ever see the final response.
//!
//! ## Features
//!
//! - **Static Auth**: HTTP Basic with the shop's API key and secret
//! - **Rate Limit Awareness**: Reads `X-RateLimit-Remaining`/`X-RateLimit-Reset`
//!   and holds requests while a window is exhausted
//! - **Automatic Retries**: Connection errors, 429 and 502/503/504, up to 5 retries
//!   with linear backoff
//! - **Pluggable Pipeline**: Ordered stages around a swappable transport
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use lightspeed_ecom::{EcomClient, RequestOptions, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = EcomClient::new("us1", "us", "key", "secret")?;
//!
//!     let customers: serde_json::Value = client
//!         .request_json(
//!             reqwest::Method::GET,
//!             "customers",
//!             RequestOptions::new().query("since_id", 1),
//!         )
//!         .await?;
//!
//!     println!("{customers}");
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  EcomClient: request(method, resource, options)              │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │
//! ┌──────────────────────────────┴───────────────────────────────┐
//! │  RetryPolicy  (attempt loop, linear backoff, 5 retries)      │
//! │  ┌────────────────┬─────────────┬────────────┬────────────┐  │
//! │  │RequestDecorator│ RateLimiter │ Transport  │ Response   │  │
//! │  │ .json + auth   │ window wait │ send       │ Observer   │  │
//! │  └────────────────┴──────┬──────┴────────────┴─────┬──────┘  │
//! │                          └──── RateLimitStore ─────┘         │
//! └──────────────────────────────────────────────────────────────┘
//! ```

#![warn(clippy::all)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Client configuration
pub mod config;

/// Authentication
pub mod auth;

/// Rate-limit window state
pub mod state;

/// Request pipeline stages and retry loop
pub mod pipeline;

/// HTTP client and transport
pub mod http;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::ClientConfig;
pub use error::{Error, Result};
pub use http::{ApiResponse, EcomClient, RequestOptions};
pub use types::Cluster;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
