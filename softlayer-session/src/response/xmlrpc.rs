//! XML-RPC response parsing.

use softlayer_core::Value;
use softlayer_core::xmlrpc::{MethodResponse, decode_method_response};

use super::Payload;
use crate::fault::FaultEnvelope;

/// Parse a `methodResponse` body.
///
/// The result parameter is converted into the JSON data model: `dateTime`
/// values become strings and `base64` values standard base64 strings.
pub(crate) fn parse(body: &[u8]) -> Result<Payload, String> {
    match decode_method_response(body).map_err(|e| e.to_string())? {
        MethodResponse::Success(value) => value
            .to_json()
            .map(Payload::Value)
            .map_err(|e| format!("invalid xml-rpc result: {e}")),
        MethodResponse::Fault(fault) => Ok(Payload::Fault(FaultEnvelope::new(
            fault.get("faultCode").and_then(scalar_text),
            fault.get("faultString").and_then(scalar_text),
        ))),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) | Value::DateTime(s) => Some(s.clone()),
        Value::Int(i) => Some(i.to_string()),
        _ => None,
    }
}
