//! Buffered API response

use crate::error::{Error, Result};
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use url::Url;

/// A fully read response
///
/// The body is read before the pipeline inspects the response so that the
/// retry policy can log it and the caller still gets it afterwards.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    url: Url,
}

impl ApiResponse {
    /// Create a response from its parts
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes, url: Url) -> Self {
        Self {
            status,
            headers,
            body,
            url,
        }
    }

    /// Read a reqwest response to completion
    pub async fn from_reqwest(response: reqwest::Response) -> reqwest::Result<Self> {
        let status = response.status();
        let headers = response.headers().clone();
        let url = response.url().clone();
        let body = response.bytes().await?;

        Ok(Self::new(status, headers, body, url))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Final URL of the request
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Check for a 2xx status
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Body as text, replacing invalid UTF-8
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// First `max_chars` characters of the body
    pub fn body_snippet(&self, max_chars: usize) -> String {
        let text = self.text();
        match text.char_indices().nth(max_chars) {
            Some((idx, _)) => format!("{}…", &text[..idx]),
            None => text.into_owned(),
        }
    }

    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Turn a non-2xx response into [`Error::HttpStatus`]
    pub fn error_for_status(self) -> Result<Self> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(Error::http_status(self.status.as_u16(), self.text()))
        }
    }
}
