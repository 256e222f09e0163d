//! Fault codes and error types.
//!
//! This module provides the core error types shared by both wire bindings:
//! - [`Code`]: Classification of a failed call
//! - [`Fault`]: A classified fault reported by the remote API
//! - [`EncodeError`]: An argument that has no wire representation

use std::str::FromStr;

use serde::Serialize;

/// Classification of a failed call.
///
/// Every fault the API reports is mapped onto one of these kinds, either from
/// the exception class named in the fault envelope or, failing that, from the
/// HTTP status of the response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Code {
    Canceled,
    Unknown,
    InvalidArgument,
    DeadlineExceeded,
    NotFound,
    AlreadyExists,
    PermissionDenied,
    ResourceExhausted,
    FailedPrecondition,
    OutOfRange,
    Unimplemented,
    Internal,
    Unavailable,
    Unauthenticated,
}

impl Code {
    /// Get the string representation of this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Code::Canceled => "canceled",
            Code::Unknown => "unknown",
            Code::InvalidArgument => "invalid_argument",
            Code::DeadlineExceeded => "deadline_exceeded",
            Code::NotFound => "not_found",
            Code::AlreadyExists => "already_exists",
            Code::PermissionDenied => "permission_denied",
            Code::ResourceExhausted => "resource_exhausted",
            Code::FailedPrecondition => "failed_precondition",
            Code::OutOfRange => "out_of_range",
            Code::Unimplemented => "unimplemented",
            Code::Internal => "internal",
            Code::Unavailable => "unavailable",
            Code::Unauthenticated => "unauthenticated",
        }
    }

    /// Returns whether this code indicates a transient condition that may be
    /// resolved by retrying.
    ///
    /// The following codes are considered retryable:
    /// - [`Unavailable`](Code::Unavailable): 502/503/504, connection failures
    /// - [`ResourceExhausted`](Code::ResourceExhausted): rate limited (429)
    /// - [`DeadlineExceeded`](Code::DeadlineExceeded): an attempt timed out
    ///
    /// ```
    /// use softlayer_core::Code;
    ///
    /// assert!(Code::Unavailable.is_retryable());
    /// assert!(Code::ResourceExhausted.is_retryable());
    /// assert!(!Code::NotFound.is_retryable());
    /// assert!(!Code::Internal.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Code::Unavailable | Code::ResourceExhausted | Code::DeadlineExceeded
        )
    }

    /// Map an HTTP status to a code.
    ///
    /// Used when the response does not name an exception class the API is
    /// known to use.
    pub fn from_http_status(status: u16) -> Code {
        match status {
            400 => Code::InvalidArgument,
            401 => Code::Unauthenticated,
            403 => Code::PermissionDenied,
            404 => Code::NotFound,
            408 => Code::DeadlineExceeded,
            409 => Code::AlreadyExists,
            412 => Code::FailedPrecondition,
            416 => Code::OutOfRange,
            429 => Code::ResourceExhausted,
            499 => Code::Canceled,
            500 => Code::Internal,
            501 => Code::Unimplemented,
            502..=504 => Code::Unavailable,
            _ => Code::Unknown,
        }
    }

    /// Map an API exception class (e.g. `SoftLayer_Exception_ObjectNotFound`)
    /// to a code.
    ///
    /// Returns `None` for exception classes that say nothing about the kind
    /// of failure, such as the generic `SoftLayer_Exception_Public`.
    pub fn from_exception(exception: &str) -> Option<Code> {
        const TABLE: &[(&str, Code)] = &[
            ("ObjectNotFound", Code::NotFound),
            ("NotFound", Code::NotFound),
            ("InvalidLegacyToken", Code::Unauthenticated),
            ("InvalidCredentials", Code::Unauthenticated),
            ("AuthenticationRequired", Code::Unauthenticated),
            ("NotAuthorized", Code::PermissionDenied),
            ("PermissionDenied", Code::PermissionDenied),
            ("AccessDenied", Code::PermissionDenied),
            ("RateLimit", Code::ResourceExhausted),
            ("TooManyRequests", Code::ResourceExhausted),
            ("InvalidValue", Code::InvalidArgument),
            ("InvalidParameter", Code::InvalidArgument),
            ("MissingCreationProperty", Code::InvalidArgument),
            ("InvalidArgument", Code::InvalidArgument),
            ("Duplicate", Code::AlreadyExists),
            ("AlreadyExists", Code::AlreadyExists),
            ("Unavailable", Code::Unavailable),
            ("Timeout", Code::DeadlineExceeded),
            ("NotImplemented", Code::Unimplemented),
        ];

        let class = exception.rsplit('_').next().unwrap_or(exception);
        TABLE
            .iter()
            .find(|(needle, _)| class.contains(needle))
            .map(|(_, code)| *code)
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a [`Code`] from a string fails.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseCodeError(());

impl std::fmt::Display for ParseCodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown fault code")
    }
}

impl std::error::Error for ParseCodeError {}

impl FromStr for Code {
    type Err = ParseCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "canceled" | "cancelled" => Ok(Code::Canceled),
            "unknown" => Ok(Code::Unknown),
            "invalid_argument" => Ok(Code::InvalidArgument),
            "deadline_exceeded" => Ok(Code::DeadlineExceeded),
            "not_found" => Ok(Code::NotFound),
            "already_exists" => Ok(Code::AlreadyExists),
            "permission_denied" => Ok(Code::PermissionDenied),
            "resource_exhausted" => Ok(Code::ResourceExhausted),
            "failed_precondition" => Ok(Code::FailedPrecondition),
            "out_of_range" => Ok(Code::OutOfRange),
            "unimplemented" => Ok(Code::Unimplemented),
            "internal" => Ok(Code::Internal),
            "unavailable" => Ok(Code::Unavailable),
            "unauthenticated" => Ok(Code::Unauthenticated),
            _ => Err(ParseCodeError(())),
        }
    }
}

// ============================================================================
// Fault - a classified error reported by the remote API
// ============================================================================

/// A fault reported by the remote API, already classified.
///
/// `retryable` is computed once, when the fault is built, from the same rule
/// the session's retry loop uses ([`Code::is_retryable`]); callers never
/// re-derive it.
///
/// # Example
///
/// ```
/// use softlayer_core::{Code, Fault};
///
/// let fault = Fault::new(Code::NotFound, "Unable to find object with id of '7'.")
///     .with_code("SoftLayer_Exception_ObjectNotFound")
///     .with_http_status(404);
///
/// assert_eq!(fault.kind(), Code::NotFound);
/// assert_eq!(fault.code(), "SoftLayer_Exception_ObjectNotFound");
/// assert!(!fault.is_retryable());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Fault {
    kind: Code,
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    http_status: Option<u16>,
    retryable: bool,
}

impl Fault {
    /// Create a fault whose code is the name of `kind`.
    pub fn new<S: Into<String>>(kind: Code, message: S) -> Self {
        Self {
            kind,
            code: kind.as_str().to_string(),
            message: message.into(),
            http_status: None,
            retryable: kind.is_retryable(),
        }
    }

    /// Replace the machine readable code (usually the API exception class).
    pub fn with_code<S: Into<String>>(mut self, code: S) -> Self {
        self.code = code.into();
        self
    }

    /// Record the HTTP status the fault arrived with.
    pub fn with_http_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    /// The classification of this fault.
    pub fn kind(&self) -> Code {
        self.kind
    }

    /// The machine readable fault code.
    ///
    /// This is the exception class from the fault envelope when the server
    /// sent one, otherwise the name of [`kind`](Self::kind).
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The human readable fault message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP status of the faulted response, if the fault came off the wire.
    pub fn http_status(&self) -> Option<u16> {
        self.http_status
    }

    /// Whether the condition is transient.
    pub fn is_retryable(&self) -> bool {
        self.retryable
    }
}

impl std::fmt::Display for Fault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some(status) = self.http_status {
            write!(f, " (HTTP {status})")?;
        }
        Ok(())
    }
}

impl std::error::Error for Fault {}

/// An argument that cannot be represented on the wire.
///
/// This is a programming error on the caller's side and is never retried.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    /// The value has no mapping to either wire representation.
    #[error("unsupported value: {0}")]
    Unsupported(String),

    /// Serializing the argument failed.
    #[error("failed to serialize argument: {0}")]
    Serialize(String),

    /// The service, method or endpoint does not form a valid request target.
    #[error("invalid call target: {0}")]
    Target(String),
}
