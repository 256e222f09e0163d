//! Session error types.
//!
//! This module provides [`SessionError`], the error every call returns, and
//! [`SessionBuildError`], returned when a session cannot be constructed.

use softlayer_core::{Code, EncodeError, Fault};

/// A failed call.
///
/// Each variant matches the stage of the call that failed. Only `Transport`
/// and retryable `Fault`s are ever retried.
#[derive(Clone, Debug, thiserror::Error)]
pub enum SessionError {
    /// An argument has no wire representation.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    /// The network exchange failed (connection refused, TLS failure, timeout).
    #[error("transport error: {message}")]
    Transport { code: Code, message: String },

    /// The API reported a fault.
    #[error("{0}")]
    Fault(Fault),

    /// A successful response could not be mapped into the requested type.
    #[error("decode error: {0}")]
    Decode(String),
}

impl SessionError {
    /// A network-level failure.
    pub fn transport<S: Into<String>>(message: S) -> Self {
        SessionError::Transport {
            code: Code::Unavailable,
            message: message.into(),
        }
    }

    /// A per-attempt timeout.
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        SessionError::Transport {
            code: Code::DeadlineExceeded,
            message: message.into(),
        }
    }

    /// Get the error code.
    ///
    /// Encode and decode errors map to `InvalidArgument` and `Internal`.
    pub fn code(&self) -> Code {
        match self {
            SessionError::Encode(_) => Code::InvalidArgument,
            SessionError::Transport { code, .. } => *code,
            SessionError::Fault(fault) => fault.kind(),
            SessionError::Decode(_) => Code::Internal,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            SessionError::Encode(err) => err.to_string(),
            SessionError::Transport { message, .. } | SessionError::Decode(message) => {
                message.clone()
            }
            SessionError::Fault(fault) => fault.message().to_string(),
        }
    }

    /// The classified fault, if the API reported one.
    pub fn fault(&self) -> Option<&Fault> {
        match self {
            SessionError::Fault(fault) => Some(fault),
            _ => None,
        }
    }

    /// Returns whether retrying the call may succeed.
    ///
    /// For faults this is the flag the classifier computed, so the retry loop
    /// and callers never disagree.
    ///
    /// ```
    /// use softlayer_session::SessionError;
    ///
    /// assert!(SessionError::transport("connection reset").is_retryable());
    /// assert!(!SessionError::Decode("expected a sequence".into()).is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        match self {
            SessionError::Transport { code, .. } => code.is_retryable(),
            SessionError::Fault(fault) => fault.is_retryable(),
            SessionError::Encode(_) | SessionError::Decode(_) => false,
        }
    }
}

impl From<Fault> for SessionError {
    fn from(fault: Fault) -> Self {
        SessionError::Fault(fault)
    }
}

/// Why a session could not be built.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SessionBuildError {
    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("missing credentials: {0}")]
    MissingCredentials(&'static str),

    #[error("invalid retry policy: {0}")]
    InvalidRetryPolicy(&'static str),

    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),

    #[error("failed to build transport: {0}")]
    Transport(String),
}
