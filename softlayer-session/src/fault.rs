//! Fault classification.
//!
//! Both bindings report failures in their own envelope: REST answers with an
//! object like `{"error": "...", "code": "SoftLayer_Exception_..."}`, XML-RPC
//! with a `fault` struct carrying `faultCode` and `faultString`. Each decoder
//! extracts a [`FaultEnvelope`]; [`classify`] turns it plus the HTTP status
//! into a [`Fault`], the same way for both.

use http::StatusCode;
use softlayer_core::{Code, Fault};

/// Maximum number of body bytes kept as the message of an unparseable fault.
pub const MAX_RAW_MESSAGE_BYTES: usize = 256;

/// The code/message pair a fault envelope carries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FaultEnvelope {
    /// Provider exception class, e.g. `SoftLayer_Exception_ObjectNotFound`.
    pub code: Option<String>,
    pub message: Option<String>,
}

impl FaultEnvelope {
    pub fn new(code: Option<String>, message: Option<String>) -> Self {
        Self {
            code: code.filter(|c| !c.is_empty()),
            message: message.filter(|m| !m.is_empty()),
        }
    }
}

/// Classify a failed response.
///
/// - The kind comes from the envelope's exception class when it names a known
///   one, otherwise from the HTTP status.
/// - The code is the exception class when present, else the kind's name.
/// - The message is the envelope's message, else the body truncated to
///   [`MAX_RAW_MESSAGE_BYTES`], else the status reason.
///
/// Total and deterministic: the same inputs always give the same fault.
pub fn classify(status: StatusCode, envelope: Option<&FaultEnvelope>, body: &[u8]) -> Fault {
    let exception = envelope.and_then(|e| e.code.as_deref());

    let kind = exception
        .and_then(Code::from_exception)
        .unwrap_or_else(|| kind_from_status(status));

    let message = envelope
        .and_then(|e| e.message.clone())
        .or_else(|| raw_message(body))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown server error")
                .to_string()
        });

    let fault = Fault::new(kind, message).with_http_status(status.as_u16());
    match exception {
        Some(code) => fault.with_code(code),
        None => fault,
    }
}

fn kind_from_status(status: StatusCode) -> Code {
    if status.is_success() {
        // A fault envelope in a 2xx response with no recognizable class
        Code::Unknown
    } else {
        Code::from_http_status(status.as_u16())
    }
}

fn raw_message(body: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(truncate(text, MAX_RAW_MESSAGE_BYTES).to_string())
}

/// Cut `s` to at most `max` bytes without splitting a character.
fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
