//! Tests for the request pipeline

use super::*;
use crate::auth::{Authenticator, Credentials};
use crate::error::{Error, Result};
use crate::http::{ApiResponse, ReqwestTransport, Transport};
use crate::state::{RateLimitState, RateLimitStore, REMAINING_HEADER, RESET_HEADER};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use pretty_assertions::assert_eq;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Request, StatusCode};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Helpers
// ============================================================================

/// Transport that replays canned responses and records what it was sent
#[derive(Debug, Default)]
struct ScriptedTransport {
    responses: Mutex<VecDeque<(u16, HeaderMap)>>,
    sent: Mutex<Vec<(String, Option<String>)>>,
}

impl ScriptedTransport {
    fn with_statuses(statuses: &[u16]) -> Self {
        let transport = Self::default();
        for status in statuses {
            transport.push(*status, HeaderMap::new());
        }
        transport
    }

    fn push(&self, status: u16, headers: HeaderMap) {
        self.responses.lock().unwrap().push_back((status, headers));
    }

    fn sent_urls(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    fn sent_auth(&self) -> Vec<Option<String>> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, auth)| auth.clone())
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: Request) -> reqwest::Result<ApiResponse> {
        let auth = request
            .headers()
            .get(AUTHORIZATION)
            .map(|v| v.to_str().unwrap().to_string());
        self.sent
            .lock()
            .unwrap()
            .push((request.url().to_string(), auth));

        let (status, headers) = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("transport script exhausted");

        Ok(ApiResponse::new(
            StatusCode::from_u16(status).unwrap(),
            headers,
            Bytes::from(format!("{{\"status\":{status}}}")),
            request.url().clone(),
        ))
    }
}

/// Stage that records hook calls into a shared log
#[derive(Debug)]
struct RecordingStage {
    label: &'static str,
    log: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Stage for RecordingStage {
    fn name(&self) -> &'static str {
        self.label
    }

    async fn on_request(&self, _request: &mut Request) -> Result<()> {
        self.log.lock().unwrap().push(format!("{}:request", self.label));
        Ok(())
    }

    async fn on_response(&self, _response: &ApiResponse) -> Result<()> {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:response", self.label));
        Ok(())
    }
}

/// Stage that refuses every request
#[derive(Debug)]
struct RejectingStage;

#[async_trait]
impl Stage for RejectingStage {
    fn name(&self) -> &'static str {
        "reject"
    }

    async fn on_request(&self, _request: &mut Request) -> Result<()> {
        Err(Error::Other("rejected".to_string()))
    }
}

fn authenticator() -> Authenticator {
    Authenticator::new(Credentials::new("user", "pass")).unwrap()
}

fn request(url: &str) -> Request {
    reqwest::Client::new().get(url).build().unwrap()
}

fn rate_headers(remaining: &str, reset: &str) -> HeaderMap {
    let mut map = HeaderMap::new();
    map.insert(REMAINING_HEADER, HeaderValue::from_str(remaining).unwrap());
    map.insert(RESET_HEADER, HeaderValue::from_str(reset).unwrap());
    map
}

fn standard_pipeline(
    transport: Arc<dyn Transport>,
    store: &RateLimitStore,
    sleeper: &TrackingSleeper,
) -> Pipeline {
    let sleeper: Arc<dyn Sleeper> = Arc::new(sleeper.clone());
    Pipeline::builder(transport)
        .standard_stages(
            RequestDecorator::new(authenticator()),
            RateLimiter::new(store.clone(), sleeper.clone()),
            ResponseObserver::new(store.clone()),
        )
        .sleeper(sleeper)
        .build()
}

// ============================================================================
// RequestDecorator
// ============================================================================

#[test]
fn test_decorator_appends_suffix_and_auth() {
    let decorator = RequestDecorator::new(authenticator());
    let mut req = request("https://api.shoplightspeed.com/us/customers");

    decorator.decorate(&mut req);

    assert_eq!(
        req.url().as_str(),
        "https://api.shoplightspeed.com/us/customers.json"
    );
    assert_eq!(
        req.headers().get(AUTHORIZATION).unwrap(),
        "Basic dXNlcjpwYXNz"
    );
}

#[test]
fn test_decorator_is_idempotent() {
    let decorator = RequestDecorator::new(authenticator());
    let mut req = request("https://api.shoplightspeed.com/us/customers");

    decorator.decorate(&mut req);
    decorator.decorate(&mut req);

    assert_eq!(
        req.url().as_str(),
        "https://api.shoplightspeed.com/us/customers.json"
    );
    assert_eq!(req.headers().get_all(AUTHORIZATION).iter().count(), 1);
}

#[test]
fn test_decorator_keeps_query_and_nested_path() {
    let decorator = RequestDecorator::new(authenticator());
    let mut req = request("https://api.webshopapp.com/nl/products/12/images/?since_id=1");

    decorator.decorate(&mut req);

    assert_eq!(req.url().path(), "/nl/products/12/images.json");
    assert_eq!(req.url().query(), Some("since_id=1"));
}

#[test]
fn test_decorator_drops_trailing_slash_after_suffix() {
    let decorator = RequestDecorator::new(authenticator());
    let mut req = request("https://api.shoplightspeed.com/us/customers.json/");

    decorator.decorate(&mut req);

    assert_eq!(req.url().path(), "/us/customers.json");

    decorator.decorate(&mut req);
    assert_eq!(req.url().path(), "/us/customers.json");
}

#[test]
fn test_decorator_custom_suffix() {
    let decorator = RequestDecorator::with_suffix(authenticator(), ".xml");
    let mut req = request("https://api.webshopapp.com/nl/orders");

    decorator.decorate(&mut req);

    assert_eq!(req.url().path(), "/nl/orders.xml");
}

// ============================================================================
// RateLimiter
// ============================================================================

#[tokio::test]
async fn test_limiter_sleeps_until_window_resets() {
    let store = RateLimitStore::with_state(RateLimitState {
        remaining: vec![0, 10, 10],
        reset_seconds: vec![30, 3600, 86000],
        last_request_time: Some(Utc::now() - chrono::Duration::seconds(5)),
    });
    let sleeper = TrackingSleeper::new();
    let limiter = RateLimiter::new(store, Arc::new(sleeper.clone()));

    let slept = limiter.wait().await.unwrap().unwrap();

    assert!(slept <= Duration::from_secs(25));
    assert!(slept > Duration::from_secs(24));
    assert_eq!(sleeper.calls(), vec![slept]);
}

#[tokio::test]
async fn test_limiter_passes_when_windows_available() {
    let store = RateLimitStore::with_state(RateLimitState {
        remaining: vec![5, 10, 10],
        reset_seconds: vec![30, 3600, 86000],
        last_request_time: Some(Utc::now() - chrono::Duration::seconds(5)),
    });
    let sleeper = TrackingSleeper::new();
    let limiter = RateLimiter::new(store, Arc::new(sleeper.clone()));

    assert_eq!(limiter.wait().await.unwrap(), None);
    assert!(sleeper.calls().is_empty());
}

#[tokio::test]
async fn test_limiter_never_blocks_before_first_response() {
    let sleeper = TrackingSleeper::new();
    let limiter = RateLimiter::new(RateLimitStore::new(), Arc::new(sleeper.clone()));

    assert_eq!(limiter.wait().await.unwrap(), None);
    assert!(sleeper.calls().is_empty());
}

#[tokio::test]
async fn test_limiter_fails_fast_past_max_wait() {
    let store = RateLimitStore::with_state(RateLimitState {
        remaining: vec![10, 0, 10],
        reset_seconds: vec![30, 1200, 86000],
        last_request_time: Some(Utc::now()),
    });
    let sleeper = TrackingSleeper::new();
    let limiter = RateLimiter::new(store, Arc::new(sleeper.clone()))
        .max_wait(Some(Duration::from_secs(60)));

    let err = limiter.wait().await.unwrap_err();

    assert!(matches!(
        err,
        Error::RateLimited {
            retry_after_seconds: 1200
        }
    ));
    assert!(sleeper.calls().is_empty());
}

// ============================================================================
// ResponseObserver
// ============================================================================

#[tokio::test]
async fn test_observer_updates_store() {
    let store = RateLimitStore::new();
    let observer = ResponseObserver::new(store.clone());
    let response = ApiResponse::new(
        StatusCode::OK,
        rate_headers("200/2500/11000", "120/3600/86000"),
        Bytes::new(),
        "https://api.shoplightspeed.com/us/customers.json"
            .parse()
            .unwrap(),
    );

    observer.on_response(&response).await.unwrap();

    let state = store.snapshot().await;
    assert_eq!(state.remaining, vec![200, 2500, 11000]);
    assert_eq!(state.reset_seconds, vec![120, 3600, 86000]);
    assert!(state.last_request_time.is_some());
}

#[tokio::test]
async fn test_observer_records_time_on_error_response() {
    let store = RateLimitStore::new();
    let observer = ResponseObserver::new(store.clone());
    let response = ApiResponse::new(
        StatusCode::SERVICE_UNAVAILABLE,
        HeaderMap::new(),
        Bytes::new(),
        "https://api.shoplightspeed.com/us/customers.json"
            .parse()
            .unwrap(),
    );

    assert!(!observer.observe(&response).await);

    let state = store.snapshot().await;
    assert_eq!(state.remaining, vec![300, 3000, 12000]);
    assert!(state.last_request_time.is_some());
}

// ============================================================================
// Pipeline
// ============================================================================

#[tokio::test]
async fn test_pipeline_stage_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let transport = Arc::new(ScriptedTransport::with_statuses(&[200]));
    let pipeline = Pipeline::builder(transport)
        .stage(RecordingStage {
            label: "first",
            log: log.clone(),
        })
        .stage(RecordingStage {
            label: "second",
            log: log.clone(),
        })
        .build();

    assert_eq!(pipeline.stage_names(), vec!["first", "second"]);
    pipeline
        .execute(request("https://example.com/a"))
        .await
        .unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "first:request",
            "second:request",
            "second:response",
            "first:response"
        ]
    );
}

#[tokio::test]
async fn test_pipeline_retries_then_succeeds() {
    let transport = Arc::new(ScriptedTransport::with_statuses(&[503, 503, 200]));
    let store = RateLimitStore::new();
    let sleeper = TrackingSleeper::new();
    let pipeline = standard_pipeline(transport.clone(), &store, &sleeper);

    let response = pipeline
        .execute(request("https://api.shoplightspeed.com/us/customers"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        sleeper.calls(),
        vec![Duration::from_millis(1000), Duration::from_millis(2000)]
    );
    assert_eq!(
        transport.sent_urls(),
        vec!["https://api.shoplightspeed.com/us/customers.json"; 3]
    );
    assert!(transport
        .sent_auth()
        .iter()
        .all(|auth| auth.as_deref() == Some("Basic dXNlcjpwYXNz")));
}

#[tokio::test]
async fn test_pipeline_exhausts_after_five_retries() {
    let transport = Arc::new(ScriptedTransport::with_statuses(&[503; 6]));
    let store = RateLimitStore::new();
    let sleeper = TrackingSleeper::new();
    let pipeline = standard_pipeline(transport.clone(), &store, &sleeper);

    let response = pipeline
        .execute(request("https://api.shoplightspeed.com/us/customers"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(transport.sent_urls().len(), 6);
    assert_eq!(
        sleeper.calls(),
        (1..=5)
            .map(|n| Duration::from_millis(1000 * n))
            .collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_pipeline_429_retries_without_delay() {
    let transport = Arc::new(ScriptedTransport::with_statuses(&[429, 429, 200]));
    let store = RateLimitStore::new();
    let sleeper = TrackingSleeper::new();
    let pipeline = standard_pipeline(transport.clone(), &store, &sleeper);

    let response = pipeline
        .execute(request("https://api.shoplightspeed.com/us/orders"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(transport.sent_urls().len(), 3);
    assert!(sleeper.calls().is_empty());
}

#[tokio::test]
async fn test_pipeline_returns_non_retryable_status() {
    let transport = Arc::new(ScriptedTransport::with_statuses(&[404]));
    let store = RateLimitStore::new();
    let sleeper = TrackingSleeper::new();
    let pipeline = standard_pipeline(transport.clone(), &store, &sleeper);

    let response = pipeline
        .execute(request("https://api.shoplightspeed.com/us/customers/9"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(transport.sent_urls().len(), 1);
    assert!(sleeper.calls().is_empty());
}

#[tokio::test]
async fn test_pipeline_state_follows_final_response() {
    let transport = Arc::new(ScriptedTransport::default());
    transport.push(503, HeaderMap::new());
    transport.push(200, rate_headers("200/2500/11000", "120/3600/86000"));

    let store = RateLimitStore::new();
    let sleeper = TrackingSleeper::new();
    let pipeline = standard_pipeline(transport, &store, &sleeper);

    pipeline
        .execute(request("https://api.shoplightspeed.com/us/customers"))
        .await
        .unwrap();

    let state = store.snapshot().await;
    assert_eq!(state.remaining, vec![200, 2500, 11000]);
    assert_eq!(state.reset_seconds, vec![120, 3600, 86000]);
}

#[tokio::test]
async fn test_pipeline_throttles_after_exhausting_window() {
    let transport = Arc::new(ScriptedTransport::default());
    transport.push(200, rate_headers("0/2500/11000", "30/3600/86000"));
    transport.push(200, rate_headers("299/2499/10999", "300/3599/85999"));

    let store = RateLimitStore::new();
    let sleeper = TrackingSleeper::new();
    let pipeline = standard_pipeline(transport, &store, &sleeper);

    pipeline
        .execute(request("https://api.shoplightspeed.com/us/customers"))
        .await
        .unwrap();
    assert!(sleeper.calls().is_empty());

    pipeline
        .execute(request("https://api.shoplightspeed.com/us/customers"))
        .await
        .unwrap();

    let calls = sleeper.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0] > Duration::from_secs(29));
    assert!(calls[0] <= Duration::from_secs(30));
}

#[tokio::test]
async fn test_pipeline_stage_error_aborts_without_sending() {
    let transport = Arc::new(ScriptedTransport::with_statuses(&[200]));
    let pipeline = Pipeline::builder(transport.clone())
        .stage(RejectingStage)
        .build();

    let err = pipeline
        .execute(request("https://example.com/a"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Other(ref msg) if msg == "rejected"));
    assert!(transport.sent_urls().is_empty());
}

#[tokio::test]
async fn test_pipeline_connection_errors_are_retried_then_surfaced() {
    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(2))
        .build()
        .unwrap();
    let sleeper = TrackingSleeper::new();
    let pipeline = Pipeline::builder(Arc::new(ReqwestTransport::new(client)))
        .stage(RequestDecorator::new(authenticator()))
        .retry_policy(RetryPolicy::new(2, Duration::from_millis(10)))
        .sleeper(Arc::new(sleeper.clone()))
        .build();

    let err = pipeline
        .execute(request("http://127.0.0.1:1/us/customers"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Http(ref e) if e.is_connect()));
    assert_eq!(
        sleeper.calls(),
        vec![Duration::from_millis(10), Duration::from_millis(20)]
    );
}

#[tokio::test]
async fn test_pipeline_retries_connections_closed_without_response() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = accepted.clone();
    tokio::spawn(async move {
        use tokio::io::AsyncReadExt;
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            counter.fetch_add(1, Ordering::SeqCst);
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
        }
    });

    let sleeper = TrackingSleeper::new();
    let pipeline = Pipeline::builder(Arc::new(ReqwestTransport::default()))
        .stage(RequestDecorator::new(authenticator()))
        .retry_policy(RetryPolicy::new(2, Duration::from_millis(10)))
        .sleeper(Arc::new(sleeper.clone()))
        .build();

    let err = pipeline
        .execute(request(&format!("http://{addr}/us/customers")))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Http(ref e) if e.is_request()));
    assert!(err.is_retryable());
    assert_eq!(
        sleeper.calls(),
        vec![Duration::from_millis(10), Duration::from_millis(20)]
    );
    assert!(accepted.load(Ordering::SeqCst) >= 3);
}
