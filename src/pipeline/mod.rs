//! Request pipeline
//!
//! Every logical request runs through the same ordered set of stages:
//!
//! ```text
//! RetryPolicy (around the whole attempt loop)
//!   └─ RequestDecorator   path suffix + Basic auth
//!       └─ RateLimiter    wait out exhausted windows
//!           └─ [transport send]
//!       ┌─ ResponseObserver  read X-RateLimit-* headers
//! ```
//!
//! Request hooks run front to back before the send; response hooks run back
//! to front after it. The retry policy inspects each outcome and either hands
//! it to the caller or starts another attempt.
//!
//! All waiting goes through a [`Sleeper`], which parks the calling task
//! rather than blocking a thread. Tests swap in [`TrackingSleeper`] to assert
//! exact delays without waiting for them.

mod decorator;
mod executor;
mod limiter;
mod observer;
mod retry;
mod sleeper;
mod stage;

pub use decorator::{RequestDecorator, JSON_SUFFIX};
pub use executor::{Pipeline, PipelineBuilder};
pub use limiter::RateLimiter;
pub use observer::ResponseObserver;
pub use retry::{
    Outcome, RetryDecision, RetryPolicy, DEFAULT_BASE_DELAY, DEFAULT_MAX_RETRIES,
    RETRYABLE_STATUSES,
};
pub use sleeper::{InstantSleeper, Sleeper, TokioSleeper, TrackingSleeper};
pub use stage::Stage;

#[cfg(test)]
mod tests;
