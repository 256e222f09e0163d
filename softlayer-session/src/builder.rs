//! Session builder.
//!
//! Provides a fluent API for configuring and validating a [`Session`].

use std::sync::Arc;
use std::time::Duration;

use crate::config::RetryPolicy;
use crate::credentials::Credentials;
use crate::error::SessionBuildError;
use crate::request::Protocol;
use crate::session::{Inner, Session};
use crate::transport::{HttpTransport, HyperTransport};

/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Environment variables read by [`SessionBuilder::from_env`].
pub mod env {
    pub const USERNAME: &str = "SL_USERNAME";
    pub const API_KEY: &str = "SL_API_KEY";
    pub const ENDPOINT_URL: &str = "SL_ENDPOINT_URL";
    /// Per-attempt timeout in whole seconds.
    pub const TIMEOUT: &str = "SL_TIMEOUT";
    pub const ACCESS_TOKEN: &str = "SL_ACCESS_TOKEN";
}

/// Builder for creating a [`Session`].
///
/// Everything is validated in [`build`](Self::build); a built session is
/// immutable.
///
/// # Example
///
/// ```no_run
/// use softlayer_session::{Protocol, RetryPolicy, Session};
/// use std::time::Duration;
///
/// let session = Session::builder()
///     .protocol(Protocol::XmlRpc)
///     .api_key("alice", "0123456789abcdef")
///     .timeout(Duration::from_secs(30))
///     .retry_policy(RetryPolicy::aggressive())
///     .build()?;
///
/// assert_eq!(session.endpoint(), "https://api.softlayer.com/xmlrpc/v3.1");
/// # Ok::<(), softlayer_session::SessionBuildError>(())
/// ```
pub struct SessionBuilder {
    /// Explicit protocol; inferred from the endpoint when unset.
    protocol: Option<Protocol>,
    endpoint: Option<String>,
    credentials: Option<Credentials>,
    /// Per-attempt timeout.
    timeout: Duration,
    /// A timeout value from the environment that failed to parse.
    timeout_error: Option<String>,
    retry: RetryPolicy,
    user_agent: String,
    transport: Option<Arc<dyn HttpTransport>>,
}

impl std::fmt::Debug for SessionBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionBuilder")
            .field("protocol", &self.protocol)
            .field("endpoint", &self.endpoint)
            .field("credentials", &self.credentials)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .field("user_agent", &self.user_agent)
            .field("transport", &self.transport.is_some())
            .finish()
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self {
            protocol: None,
            endpoint: None,
            credentials: None,
            timeout: DEFAULT_TIMEOUT,
            timeout_error: None,
            retry: RetryPolicy::default(),
            user_agent: concat!("softlayer-session/", env!("CARGO_PKG_VERSION")).to_string(),
            transport: None,
        }
    }

    /// Start from the `SL_*` environment variables.
    ///
    /// Reads [`env::USERNAME`], [`env::API_KEY`], [`env::ENDPOINT_URL`],
    /// [`env::TIMEOUT`] and [`env::ACCESS_TOKEN`]. An access token wins over
    /// an API key. Later builder calls override what was read.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut builder = Self::new();

        if let Some(endpoint) = get(env::ENDPOINT_URL) {
            builder = builder.endpoint(endpoint);
        }

        if let Some(token) = get(env::ACCESS_TOKEN) {
            builder = builder.bearer_token(token);
        } else if let (Some(username), Some(api_key)) = (get(env::USERNAME), get(env::API_KEY)) {
            builder = builder.api_key(username, api_key);
        }

        if let Some(timeout) = get(env::TIMEOUT) {
            match timeout.trim().parse::<u64>() {
                Ok(secs) => builder.timeout = Duration::from_secs(secs),
                Err(_) => {
                    builder.timeout_error = Some(format!(
                        "{} is not a number of seconds: {timeout:?}",
                        env::TIMEOUT
                    ))
                }
            }
        }

        builder
    }

    /// Select the wire protocol.
    ///
    /// When never called, the protocol is inferred from the endpoint, and a
    /// session without an endpoint speaks REST.
    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = Some(protocol);
        self
    }

    /// Set the base endpoint URL, e.g. `https://api.softlayer.com/rest/v3.1`.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Authenticate with a username and API key.
    pub fn api_key(self, username: impl Into<String>, api_key: impl Into<String>) -> Self {
        self.credentials(Credentials::api_key(username, api_key))
    }

    /// Authenticate with a bearer token.
    pub fn bearer_token(self, token: impl Into<String>) -> Self {
        self.credentials(Credentials::bearer(token))
    }

    /// Set the per-attempt timeout. Each retry gets a fresh budget.
    ///
    /// Default: 120 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.timeout_error = None;
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Send requests through a custom transport instead of [`HyperTransport`].
    pub fn transport<T: HttpTransport>(mut self, transport: T) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Validate the configuration and build the session.
    pub fn build(self) -> Result<Session, SessionBuildError> {
        let protocol = match (self.protocol, &self.endpoint) {
            (Some(protocol), _) => protocol,
            (None, Some(endpoint)) => Protocol::infer(endpoint),
            (None, None) => Protocol::default(),
        };

        let endpoint = self
            .endpoint
            .unwrap_or_else(|| protocol.default_endpoint().to_string());
        validate_endpoint(&endpoint)?;

        let credentials = self
            .credentials
            .ok_or(SessionBuildError::MissingCredentials("no API key or token configured"))?;
        if !credentials.is_complete() {
            return Err(SessionBuildError::MissingCredentials(
                "username, API key and token must not be empty",
            ));
        }

        if let Some(reason) = self.timeout_error {
            return Err(SessionBuildError::InvalidTimeout(reason));
        }
        if self.timeout.is_zero() {
            return Err(SessionBuildError::InvalidTimeout("timeout must be positive".into()));
        }

        self.retry
            .validate()
            .map_err(SessionBuildError::InvalidRetryPolicy)?;

        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HyperTransport::new().map_err(SessionBuildError::Transport)?),
        };

        Ok(Session::from_inner(Inner {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            protocol,
            credentials,
            transport,
            timeout: self.timeout,
            retry: self.retry,
            user_agent: self.user_agent,
        }))
    }
}

fn validate_endpoint(endpoint: &str) -> Result<(), SessionBuildError> {
    let invalid = |reason: &str| SessionBuildError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason: reason.to_string(),
    };

    let uri: http::Uri = endpoint.parse().map_err(|_| invalid("not a valid URL"))?;
    match uri.scheme_str() {
        Some("http") | Some("https") => {}
        _ => return Err(invalid("scheme must be http or https")),
    }
    if uri.host().is_none_or(str::is_empty) {
        return Err(invalid("missing host"));
    }
    if uri.query().is_some() {
        return Err(invalid("must not carry a query string"));
    }
    Ok(())
}
