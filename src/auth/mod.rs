//! Authentication module
//!
//! The eCom API authenticates every request with HTTP Basic auth built from
//! the shop's static API key and secret. There is no token exchange or
//! refresh; the `Authenticator` only stamps the header onto outgoing requests.

mod authenticator;
mod types;

pub use authenticator::Authenticator;
pub use types::Credentials;
