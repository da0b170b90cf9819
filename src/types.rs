//! Common types used throughout the client
//!
//! This module contains shared type definitions and type aliases
//! used across multiple modules.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// Ordered list of query parameters
pub type QueryPairs = Vec<(String, String)>;

// ============================================================================
// HTTP Types
// ============================================================================

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    GET,
    POST,
    PUT,
    DELETE,
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::GET => reqwest::Method::GET,
            Method::POST => reqwest::Method::POST,
            Method::PUT => reqwest::Method::PUT,
            Method::DELETE => reqwest::Method::DELETE,
        }
    }
}

// ============================================================================
// Cluster
// ============================================================================

/// API cluster hosting the shop
///
/// Each cluster has its own API host; the shop language segment is appended
/// to it to form the base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Cluster {
    /// European cluster
    Eu1,
    /// North American cluster
    Us1,
}

impl Cluster {
    /// API host for this cluster, with trailing slash
    pub fn base_url(self) -> &'static str {
        match self {
            Cluster::Eu1 => "https://api.webshopapp.com/",
            Cluster::Us1 => "https://api.shoplightspeed.com/",
        }
    }

    /// Canonical upper-case name
    pub fn as_str(self) -> &'static str {
        match self {
            Cluster::Eu1 => "EU1",
            Cluster::Us1 => "US1",
        }
    }
}

impl FromStr for Cluster {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EU1" => Ok(Cluster::Eu1),
            "US1" => Ok(Cluster::Us1),
            _ => Err(Error::UnknownCluster {
                cluster: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Cluster {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Cluster> for String {
    fn from(cluster: Cluster) -> Self {
        cluster.as_str().to_string()
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
