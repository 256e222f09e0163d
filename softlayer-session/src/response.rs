//! Response decoding.
//!
//! Each protocol parses its body into a [`Payload`]: either a result in the
//! JSON data model or a [`FaultEnvelope`]. [`interpret`] then applies the same
//! rules to both: non-2xx statuses and fault envelopes go through the
//! classifier, everything else is a result.

mod rest;
mod xmlrpc;

use http::HeaderMap;
use serde::de::DeserializeOwned;

use crate::SessionError;
use crate::fault::{FaultEnvelope, classify};
use crate::request::Protocol;
use crate::transport::RawResponse;

/// Header carrying the total size of a paginated result.
pub const TOTAL_ITEMS_HEADER: &str = "softlayer-total-items";

/// A parsed response body.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Payload {
    Value(serde_json::Value),
    Fault(FaultEnvelope),
}

impl Protocol {
    pub(crate) fn parse(&self, body: &[u8]) -> Result<Payload, String> {
        match self {
            Protocol::Rest => rest::parse(body),
            Protocol::XmlRpc => xmlrpc::parse(body),
        }
    }
}

/// Turn a raw response into a result value or a classified error.
pub(crate) fn interpret(
    protocol: Protocol,
    response: &RawResponse,
) -> Result<serde_json::Value, SessionError> {
    let parsed = protocol.parse(&response.body);

    if !response.status.is_success() {
        let envelope = match &parsed {
            Ok(Payload::Fault(envelope)) => Some(envelope),
            _ => None,
        };
        return Err(classify(response.status, envelope, &response.body).into());
    }

    match parsed {
        Ok(Payload::Value(value)) => Ok(value),
        Ok(Payload::Fault(envelope)) => {
            Err(classify(response.status, Some(&envelope), &response.body).into())
        }
        Err(message) => Err(SessionError::Decode(message)),
    }
}

/// Map a result value into the caller's type.
pub(crate) fn decode_value<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, SessionError> {
    serde_json::from_value(value).map_err(|e| SessionError::Decode(e.to_string()))
}

/// Read the total item count a paginated call reports.
pub(crate) fn total_items(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(TOTAL_ITEMS_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// A decoded result together with response metadata.
#[derive(Clone, Debug)]
pub struct SessionResponse<T> {
    value: T,
    total_items: Option<u64>,
    headers: HeaderMap,
}

impl<T> SessionResponse<T> {
    pub(crate) fn new(value: T, headers: HeaderMap) -> Self {
        Self {
            value,
            total_items: total_items(&headers),
            headers,
        }
    }

    pub fn get_ref(&self) -> &T {
        &self.value
    }

    pub fn into_inner(self) -> T {
        self.value
    }

    /// Total number of results across all pages, when the API reports it.
    ///
    /// Independent of how many items this response decoded.
    pub fn total_items(&self) -> Option<u64> {
        self.total_items
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Split into value and total item count.
    pub fn into_parts(self) -> (T, Option<u64>) {
        (self.value, self.total_items)
    }
}

/// Items collected by [`Session::pages`](crate::Session::pages).
#[derive(Clone, Debug, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// The last total item count the API reported.
    pub total_items: Option<u64>,
}
