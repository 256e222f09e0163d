//! REST/JSON response parsing.

use super::Payload;
use crate::fault::FaultEnvelope;

/// Parse a REST body.
///
/// An empty body is `null`. An object holding only an `error` string and an
/// optional `code` is a fault envelope.
pub(crate) fn parse(body: &[u8]) -> Result<Payload, String> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Payload::Value(serde_json::Value::Null));
    }

    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| format!("invalid JSON response: {e}"))?;

    Ok(match fault_envelope(&value) {
        Some(envelope) => Payload::Fault(envelope),
        None => Payload::Value(value),
    })
}

fn fault_envelope(value: &serde_json::Value) -> Option<FaultEnvelope> {
    let object = value.as_object()?;
    let message = object.get("error")?.as_str()?;
    if object.keys().any(|k| k != "error" && k != "code") {
        return None;
    }

    let code = match object.get("code") {
        Some(serde_json::Value::String(code)) => Some(code.clone()),
        Some(serde_json::Value::Number(code)) => Some(code.to_string()),
        _ => None,
    };
    Some(FaultEnvelope::new(code, Some(message.to_string())))
}
