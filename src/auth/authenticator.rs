//! Authenticator implementation
//!
//! Applies HTTP Basic authentication to already-built requests so it can run
//! as a pipeline step on every attempt.

use super::types::Credentials;
use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::Request;

/// Authenticator handles applying authentication to HTTP requests
#[derive(Clone)]
pub struct Authenticator {
    credentials: Credentials,
    /// Pre-encoded `Authorization` value
    header: HeaderValue,
}

impl Authenticator {
    /// Create a new authenticator for the given credentials
    pub fn new(credentials: Credentials) -> Result<Self> {
        let encoded = STANDARD.encode(format!("{}:{}", credentials.key, credentials.secret));
        let mut header = HeaderValue::from_str(&format!("Basic {encoded}"))
            .map_err(|e| Error::invalid_value("api_key", e.to_string()))?;
        header.set_sensitive(true);

        Ok(Self {
            credentials,
            header,
        })
    }

    /// Apply authentication to a request
    ///
    /// Replaces any existing `Authorization` header, so applying twice is a
    /// no-op.
    pub fn apply(&self, request: &mut Request) {
        request
            .headers_mut()
            .insert(AUTHORIZATION, self.header.clone());
    }

    /// Get the configured credentials
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}
