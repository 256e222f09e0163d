//! Credentials attached to every outbound request.

use std::fmt;

use base64::Engine;
use zeroize::Zeroize;

/// A secret string that never exposes its value in logs or debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret {
    inner: String,
}

impl Secret {
    /// Wrap a secret value.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            inner: value.into(),
        }
    }

    /// Get the actual value for transmission.
    ///
    /// Only call this when writing the value onto the wire.
    #[inline]
    pub fn expose(&self) -> &str {
        &self.inner
    }

    /// Get the length (safe to log).
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret([REDACTED])")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}

/// How a session authenticates.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Username plus API key.
    ///
    /// Sent as HTTP Basic auth over REST and as the `authenticate` header
    /// struct over XML-RPC.
    ApiKey { username: String, api_key: Secret },

    /// An access token, sent as `Authorization: Bearer <token>`.
    BearerToken(Secret),
}

impl Credentials {
    /// Username plus API key credentials.
    pub fn api_key(username: impl Into<String>, api_key: impl Into<String>) -> Self {
        Credentials::ApiKey {
            username: username.into(),
            api_key: Secret::new(api_key),
        }
    }

    /// Bearer token credentials.
    pub fn bearer(token: impl Into<String>) -> Self {
        Credentials::BearerToken(Secret::new(token))
    }

    /// The username, if these are API key credentials.
    pub fn username(&self) -> Option<&str> {
        match self {
            Credentials::ApiKey { username, .. } => Some(username),
            Credentials::BearerToken(_) => None,
        }
    }

    pub(crate) fn is_complete(&self) -> bool {
        match self {
            Credentials::ApiKey { username, api_key } => !username.is_empty() && !api_key.is_empty(),
            Credentials::BearerToken(token) => !token.is_empty(),
        }
    }

    /// Value for the `Authorization` header.
    ///
    /// `basic` selects HTTP Basic auth for API key credentials; XML-RPC sends
    /// those in the call headers instead, so it passes `false` and gets `None`.
    pub(crate) fn authorization(&self, basic: bool) -> Option<String> {
        match self {
            Credentials::ApiKey { username, api_key } if basic => {
                let mut pair = format!("{username}:{}", api_key.expose());
                let encoded = base64::engine::general_purpose::STANDARD.encode(pair.as_bytes());
                pair.zeroize();
                Some(format!("Basic {encoded}"))
            }
            Credentials::ApiKey { .. } => None,
            Credentials::BearerToken(token) => Some(format!("Bearer {}", token.expose())),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::ApiKey { username, api_key } => f
                .debug_struct("ApiKey")
                .field("username", username)
                .field("api_key", api_key)
                .finish(),
            Credentials::BearerToken(token) => f.debug_tuple("BearerToken").field(token).finish(),
        }
    }
}
