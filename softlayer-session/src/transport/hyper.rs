//! Hyper-based HTTP transport.
//!
//! This module provides [`HyperTransport`], the default transport, using
//! hyper_util's legacy pooled client.

use std::time::Duration;

use bytes::Bytes;
use futures::future::BoxFuture;
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::{Client, connect::HttpConnector};
use hyper_util::rt::{TokioExecutor, TokioTimer};
use rustls::ClientConfig;

use super::connector::{build_https_connector, default_tls_config};
use super::{HttpTransport, RawResponse, TransportRequest};
use crate::SessionError;

type HyperClient = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

/// HTTP transport using hyper_util's legacy client.
///
/// Cloning is cheap and clones share one connection pool.
///
/// # Example
///
/// ```ignore
/// use softlayer_session::{Session, transport::HyperTransport};
/// use std::time::Duration;
///
/// let transport = HyperTransport::builder()
///     .pool_idle_timeout(Duration::from_secs(30))
///     .build()?;
///
/// let session = Session::builder()
///     .api_key("user", "key")
///     .transport(transport)
///     .build()?;
/// ```
#[derive(Clone)]
pub struct HyperTransport {
    client: HyperClient,
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport").finish_non_exhaustive()
    }
}

impl HyperTransport {
    pub fn builder() -> HyperTransportBuilder {
        HyperTransportBuilder::new()
    }

    /// Create a transport with default settings.
    pub fn new() -> Result<Self, String> {
        Self::builder().build()
    }

    /// Send a request and buffer the response body.
    pub async fn request(&self, request: TransportRequest) -> Result<RawResponse, SessionError> {
        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| SessionError::transport(format!("request failed: {e}")))?;

        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| SessionError::transport(format!("failed to read response body: {e}")))?
            .to_bytes();

        Ok(RawResponse {
            status: parts.status,
            headers: parts.headers,
            body,
        })
    }
}

impl HttpTransport for HyperTransport {
    fn send(&self, request: TransportRequest) -> BoxFuture<'_, Result<RawResponse, SessionError>> {
        Box::pin(self.request(request))
    }
}

/// Builder for [`HyperTransport`].
pub struct HyperTransportBuilder {
    /// Custom TLS configuration.
    tls_config: Option<ClientConfig>,
    /// Connection pool idle timeout.
    pool_idle_timeout: Option<Duration>,
    /// Maximum idle connections per host.
    pool_max_idle_per_host: usize,
    /// TCP connect timeout.
    connect_timeout: Option<Duration>,
    /// Force HTTP/2 without negotiation.
    http2_only: bool,
}

impl Default for HyperTransportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HyperTransportBuilder {
    pub fn new() -> Self {
        Self {
            tls_config: None,
            pool_idle_timeout: Some(Duration::from_secs(90)),
            pool_max_idle_per_host: 32,
            connect_timeout: Some(Duration::from_secs(30)),
            http2_only: false,
        }
    }

    /// Use a custom TLS configuration (private roots, client certificates).
    pub fn tls_config(mut self, config: ClientConfig) -> Self {
        self.tls_config = Some(config);
        self
    }

    /// Close pooled connections idle for longer than `timeout`.
    ///
    /// Default: 90 seconds.
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = Some(timeout);
        self
    }

    /// Keep idle pooled connections open indefinitely.
    pub fn pool_idle_timeout_none(mut self) -> Self {
        self.pool_idle_timeout = None;
        self
    }

    /// Default: 32.
    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Bound the TCP connect phase. Default: 30 seconds.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Speak HTTP/2 without ALPN or upgrade.
    pub fn http2_only(mut self, enabled: bool) -> Self {
        self.http2_only = enabled;
        self
    }

    /// Build the transport.
    pub fn build(self) -> Result<HyperTransport, String> {
        let tls_config = match self.tls_config {
            Some(config) => config,
            None => default_tls_config()?,
        };

        let connector = build_https_connector(tls_config, self.connect_timeout);

        let mut builder = Client::builder(TokioExecutor::new());

        // Required for pool_idle_timeout to take effect
        builder.pool_timer(TokioTimer::new());

        if let Some(timeout) = self.pool_idle_timeout {
            builder.pool_idle_timeout(timeout);
        }
        builder.pool_max_idle_per_host(self.pool_max_idle_per_host);

        if self.http2_only {
            builder.http2_only(true);
        }

        Ok(HyperTransport {
            client: builder.build(connector),
        })
    }
}

impl std::fmt::Debug for HyperTransportBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransportBuilder")
            .field("tls_config", &self.tls_config.is_some())
            .field("pool_idle_timeout", &self.pool_idle_timeout)
            .field("pool_max_idle_per_host", &self.pool_max_idle_per_host)
            .field("connect_timeout", &self.connect_timeout)
            .field("http2_only", &self.http2_only)
            .finish()
    }
}
