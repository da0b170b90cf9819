//! eCom API client
//!
//! Thin front over the request pipeline:
//! - Builds the request URL from the cluster, language and resource path
//! - Serializes query parameters and JSON bodies
//! - Runs every request through decoration, throttling, observation and retry

use super::response::ApiResponse;
use super::transport::{ReqwestTransport, Transport};
use crate::auth::Authenticator;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::pipeline::{
    Pipeline, RateLimiter, RequestDecorator, ResponseObserver, RetryPolicy, Sleeper, Stage,
    TokioSleeper,
};
use crate::state::{RateLimitState, RateLimitStore};
use crate::types::{Cluster, JsonValue, Method, QueryPairs};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Options for a single request
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Query parameters, sent in insertion order
    pub query: QueryPairs,
    /// Extra request headers
    pub headers: Vec<(String, String)>,
    /// Request body (JSON)
    pub json: Option<JsonValue>,
}

impl RequestOptions {
    /// Create empty request options
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter; repeated keys are kept
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Set JSON body
    #[must_use]
    pub fn json(mut self, body: JsonValue) -> Self {
        self.json = Some(body);
        self
    }
}

/// Lightspeed eCom API client
///
/// Cheap to clone; clones share the connection pool and rate-limit state.
#[derive(Debug, Clone)]
pub struct EcomClient {
    client: Client,
    endpoint: Url,
    pipeline: Arc<Pipeline>,
    store: RateLimitStore,
}

impl EcomClient {
    /// Create a client with default settings
    ///
    /// `cluster` is `eu1` or `us1` (case-insensitive); `language` is the shop
    /// language segment of the URL.
    pub fn new(
        cluster: &str,
        language: &str,
        key: impl Into<String>,
        secret: impl Into<String>,
    ) -> Result<Self> {
        let cluster: Cluster = cluster.parse()?;
        Self::from_config(ClientConfig::new(cluster, language, key, secret))
    }

    /// Create a client from a config
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    /// Start building a client
    pub fn builder(config: ClientConfig) -> EcomClientBuilder {
        EcomClientBuilder::new(config)
    }

    /// Base URL including the language segment
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Copy of the current rate-limit state
    pub async fn rate_limit_state(&self) -> RateLimitState {
        self.store.snapshot().await
    }

    /// Get the request pipeline
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Make a GET request
    pub async fn get(&self, resource: &str) -> Result<ApiResponse> {
        self.request(Method::GET, resource, RequestOptions::default())
            .await
    }

    /// Make a GET request with options
    pub async fn get_with_options(
        &self,
        resource: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse> {
        self.request(Method::GET, resource, options).await
    }

    /// Make a POST request
    pub async fn post(&self, resource: &str, body: JsonValue) -> Result<ApiResponse> {
        self.request(Method::POST, resource, RequestOptions::default().json(body))
            .await
    }

    /// Make a PUT request
    pub async fn put(&self, resource: &str, body: JsonValue) -> Result<ApiResponse> {
        self.request(Method::PUT, resource, RequestOptions::default().json(body))
            .await
    }

    /// Make a DELETE request
    pub async fn delete(&self, resource: &str) -> Result<ApiResponse> {
        self.request(Method::DELETE, resource, RequestOptions::default())
            .await
    }

    /// Make a generic request
    ///
    /// Returns the final response whatever its status; only transport
    /// failures and pipeline errors surface as `Err`.
    pub async fn request(
        &self,
        method: impl Into<reqwest::Method>,
        resource: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse> {
        let url = self.build_url(resource)?;
        let mut req = self.client.request(method.into(), url);

        for (key, value) in &options.headers {
            req = req.header(key.as_str(), value.as_str());
        }

        if !options.query.is_empty() {
            req = req.query(&options.query);
        }

        if let Some(ref body) = options.json {
            req = req.json(body);
        }

        let request = req.build()?;
        debug!("Request {} {}", request.method(), request.url());
        self.pipeline.execute(request).await
    }

    /// Make a request and parse the JSON response
    ///
    /// Non-2xx responses become [`Error::HttpStatus`](crate::Error::HttpStatus).
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: impl Into<reqwest::Method>,
        resource: &str,
        options: RequestOptions,
    ) -> Result<T> {
        self.request(method, resource, options)
            .await?
            .error_for_status()?
            .json()
    }

    /// Make a GET request and parse the JSON response
    pub async fn get_json<T: DeserializeOwned>(&self, resource: &str) -> Result<T> {
        self.request_json(Method::GET, resource, RequestOptions::default())
            .await
    }

    /// Make a POST request and parse the JSON response
    pub async fn post_json<T: DeserializeOwned>(
        &self,
        resource: &str,
        body: JsonValue,
    ) -> Result<T> {
        self.request_json(Method::POST, resource, RequestOptions::default().json(body))
            .await
    }

    /// Build full URL from a resource path
    fn build_url(&self, resource: &str) -> Result<Url> {
        if resource.starts_with("http://") || resource.starts_with("https://") {
            return Ok(Url::parse(resource)?);
        }

        Ok(self.endpoint.join(resource.trim_start_matches('/'))?)
    }
}

/// Builder for [`EcomClient`]
///
/// Defaults to a reqwest transport and real sleeps; tests swap both out.
pub struct EcomClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    sleeper: Arc<dyn Sleeper>,
    state: RateLimitState,
    extra_stages: Vec<Arc<dyn Stage>>,
}

impl EcomClientBuilder {
    /// Create a builder from a config
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            transport: None,
            sleeper: Arc::new(TokioSleeper),
            state: RateLimitState::default(),
            extra_stages: Vec::new(),
        }
    }

    /// Send through a custom transport
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use a custom sleeper for throttle and backoff waits
    #[must_use]
    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Start from a known rate-limit state
    #[must_use]
    pub fn rate_limit_state(mut self, state: RateLimitState) -> Self {
        self.state = state;
        self
    }

    /// Append a stage after the built-in ones
    #[must_use]
    pub fn stage(mut self, stage: impl Stage + 'static) -> Self {
        self.extra_stages.push(Arc::new(stage));
        self
    }

    /// Build the client
    pub fn build(self) -> Result<EcomClient> {
        self.config.validate()?;

        let client = Client::builder()
            .timeout(self.config.timeout())
            .user_agent(&self.config.user_agent)
            .build()?;

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(client.clone())),
        };

        let store = RateLimitStore::with_state(self.state);
        let authenticator = Authenticator::new(self.config.credentials())?;

        let mut builder = Pipeline::builder(transport)
            .standard_stages(
                RequestDecorator::new(authenticator),
                RateLimiter::new(store.clone(), self.sleeper.clone())
                    .max_wait(self.config.max_throttle_wait()),
                ResponseObserver::new(store.clone()),
            )
            .retry_policy(RetryPolicy::from(&self.config.retry))
            .sleeper(self.sleeper);

        for stage in self.extra_stages {
            builder = builder.shared_stage(stage);
        }

        Ok(EcomClient {
            client,
            endpoint: self.config.endpoint()?,
            pipeline: Arc::new(builder.build()),
            store,
        })
    }
}
