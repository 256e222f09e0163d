//! In-process API stand-in for integration tests.
//!
//! Binds an axum server to an ephemeral loopback port. Every request is
//! recorded and answered by a test-supplied responder.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use softlayer_session::{RetryPolicy, Session, SessionBuilder};

/// One request as the server saw it.
#[derive(Clone, Debug)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: BTreeMap<String, String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The REST `parameters` array, empty when there is no body.
    pub fn rest_parameters(&self) -> Vec<serde_json::Value> {
        if self.body.is_empty() {
            return Vec::new();
        }
        let body: serde_json::Value = serde_json::from_slice(&self.body).unwrap();
        body["parameters"].as_array().cloned().unwrap_or_default()
    }

    /// The XML-RPC method name and parameters.
    pub fn xmlrpc_call(&self) -> (String, Vec<softlayer_core::Value>) {
        softlayer_core::xmlrpc::decode_method_call(&self.body).unwrap()
    }
}

/// What the responder sends back.
pub struct Reply {
    pub status: StatusCode,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
    pub delay: Option<Duration>,
}

impl Reply {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
            delay: None,
        }
    }

    pub fn json(value: serde_json::Value) -> Self {
        Self::new(StatusCode::OK, value.to_string()).header("content-type", "application/json")
    }

    pub fn xml(body: Vec<u8>) -> Self {
        Self::new(StatusCode::OK, body).header("content-type", "text/xml")
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

type Responder = Arc<dyn Fn(&Recorded, usize) -> Reply + Send + Sync>;

#[derive(Clone)]
struct AppState {
    responder: Responder,
    log: Arc<Mutex<Vec<Recorded>>>,
}

/// A running test server.
pub struct TestServer {
    pub base_url: String,
    log: Arc<Mutex<Vec<Recorded>>>,
}

impl TestServer {
    /// Start a server. The responder gets each request and its zero-based
    /// sequence number.
    pub async fn start<F>(responder: F) -> Self
    where
        F: Fn(&Recorded, usize) -> Reply + Send + Sync + 'static,
    {
        init_tracing();

        let log = Arc::new(Mutex::new(Vec::new()));
        let state = AppState {
            responder: Arc::new(responder),
            log: log.clone(),
        };
        let app = Router::new().fallback(handle).with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            log,
        }
    }

    pub fn rest_endpoint(&self) -> String {
        format!("{}/rest/v3.1", self.base_url)
    }

    pub fn xmlrpc_endpoint(&self) -> String {
        format!("{}/xmlrpc/v3.1", self.base_url)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.log.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.log.lock().unwrap().len()
    }

    pub fn last(&self) -> Recorded {
        self.requests().pop().expect("no request recorded")
    }
}

async fn handle(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let query = uri
        .query()
        .map(|q| serde_qs::from_str::<BTreeMap<String, String>>(q).unwrap())
        .unwrap_or_default();
    let recorded = Recorded {
        method,
        path: uri.path().to_string(),
        query,
        headers,
        body,
    };

    let seq = {
        let mut log = state.log.lock().unwrap();
        log.push(recorded.clone());
        log.len() - 1
    };

    let reply = (state.responder)(&recorded, seq);
    if let Some(delay) = reply.delay {
        tokio::time::sleep(delay).await;
    }

    let mut response = (reply.status, reply.body).into_response();
    for (name, value) in reply.headers {
        response.headers_mut().insert(name, value.parse().unwrap());
    }
    response
}

/// Route `sl.call` spans and retry events to the test output.
/// Filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A retry policy with millisecond backoff so tests stay fast.
pub fn quick_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new()
        .max_attempts(max_attempts)
        .base_delay(Duration::from_millis(5))
        .max_delay(Duration::from_millis(20))
        .jitter(0.0)
}

pub fn session(endpoint: String) -> SessionBuilder {
    Session::builder()
        .endpoint(endpoint)
        .api_key("user", "secret-key")
        .retry_policy(quick_retry(3))
        .timeout(Duration::from_secs(5))
}

/// A loopback port with nothing listening on it.
pub fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}
