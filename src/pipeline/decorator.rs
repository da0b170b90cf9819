//! Request decoration: resource suffix and credentials

use super::stage::Stage;
use crate::auth::Authenticator;
use crate::error::Result;
use async_trait::async_trait;
use reqwest::Request;

/// Suffix the API expects on every resource path
pub const JSON_SUFFIX: &str = ".json";

/// Appends the format suffix to the request path and attaches credentials
#[derive(Debug, Clone)]
pub struct RequestDecorator {
    suffix: String,
    authenticator: Authenticator,
}

impl RequestDecorator {
    /// Create a decorator using the `.json` suffix
    pub fn new(authenticator: Authenticator) -> Self {
        Self::with_suffix(authenticator, JSON_SUFFIX)
    }

    /// Create a decorator with a custom path suffix
    pub fn with_suffix(authenticator: Authenticator, suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
            authenticator,
        }
    }

    /// Rewrite the request in place
    ///
    /// `customers` and `customers/` become `customers.json`. Trailing slashes
    /// are always dropped and a path that already carries the suffix keeps
    /// it, so decorating twice is the same as once.
    pub fn decorate(&self, request: &mut Request) {
        let path = request.url().path();
        let trimmed = path.trim_end_matches('/');
        let decorated = if trimmed.ends_with(&self.suffix) {
            trimmed.to_string()
        } else {
            format!("{trimmed}{}", self.suffix)
        };
        if decorated != path {
            request.url_mut().set_path(&decorated);
        }

        self.authenticator.apply(request);
    }
}

#[async_trait]
impl Stage for RequestDecorator {
    fn name(&self) -> &'static str {
        "decorator"
    }

    async fn on_request(&self, request: &mut Request) -> Result<()> {
        self.decorate(request);
        Ok(())
    }
}
