//! Credential types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Static API key/secret pair issued for a shop
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// API key (Basic auth username)
    pub key: String,
    /// API secret (Basic auth password)
    pub secret: String,
}

impl Credentials {
    /// Create a new credential pair
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &self.key)
            .field("secret", &"***")
            .finish()
    }
}
