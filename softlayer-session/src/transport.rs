//! HTTP transport layer.
//!
//! A session sends every attempt through an [`HttpTransport`]. The default is
//! [`HyperTransport`], built on hyper_util's pooled legacy client:
//!
//! - HTTP/1.1 and HTTP/2 with ALPN negotiation
//! - TLS with rustls (feature-gated)
//! - Connection pooling shared by every clone of the session
//!
//! Tests and custom stacks can supply their own implementation through
//! [`SessionBuilder::transport`](crate::SessionBuilder::transport).
//!
//! # Feature Flags
//!
//! - `tls` (default) - Enables `tls-ring` + `tls-native-roots`
//! - `tls-ring` / `tls-aws-lc` - Crypto providers
//! - `tls-native-roots` / `tls-webpki-roots` - Root certificates

mod connector;
mod hyper;

use bytes::Bytes;
use futures::future::BoxFuture;
use http_body_util::Full;

use crate::SessionError;

pub use connector::{build_https_connector, default_tls_config, has_tls_support};
pub use self::hyper::{HyperTransport, HyperTransportBuilder};

// Re-export rustls types that users might need for TLS configuration
pub use rustls::ClientConfig as TlsClientConfig;

/// Request type every transport accepts.
pub type TransportRequest = http::Request<Full<Bytes>>;

/// A fully buffered HTTP response.
#[derive(Clone, Debug)]
pub struct RawResponse {
    pub status: http::StatusCode,
    pub headers: http::HeaderMap,
    pub body: Bytes,
}

impl RawResponse {
    pub fn new(status: http::StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: http::HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Add a response header. Invalid names or values are ignored.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            http::HeaderName::from_bytes(name.as_bytes()),
            http::HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }
}

/// Sends one HTTP request and buffers the whole response.
///
/// Implementations report network-level failures as
/// [`SessionError::Transport`]; any HTTP status, including errors, is a
/// successful exchange.
pub trait HttpTransport: Send + Sync + 'static {
    fn send(&self, request: TransportRequest) -> BoxFuture<'_, Result<RawResponse, SessionError>>;
}
