//! Rate-limit state module
//!
//! Tracks the API's three request windows (5 minutes, 1 hour, 24 hours) as
//! reported by the `X-RateLimit-Remaining` and `X-RateLimit-Reset` response
//! headers.
//!
//! # Overview
//!
//! The state module provides:
//! - `RateLimitState` - Remaining/reset counters plus the last request time
//! - `RateLimitStore` - Shared, lock-guarded handle used by the pipeline

mod manager;
mod types;

pub use manager::RateLimitStore;
pub use types::{
    parse_window_list, RateLimitState, DEFAULT_REMAINING, REMAINING_HEADER, RESET_HEADER,
};
