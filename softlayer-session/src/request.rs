//! Request encoding.
//!
//! A call is encoded once into an [`EncodedRequest`] and replayed for every
//! retry attempt, so all attempts send identical bytes.

mod rest;
mod xmlrpc;

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method, Uri, header};
use http_body_util::Full;
use softlayer_core::{EncodeError, Value};

use crate::credentials::Credentials;
use crate::options::Options;
use crate::transport::TransportRequest;

/// Wire protocol a session speaks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// JSON over HTTP with the service in the URL path.
    #[default]
    Rest,
    /// XML-RPC `methodCall`s posted to one endpoint.
    XmlRpc,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Rest => "rest",
            Protocol::XmlRpc => "xmlrpc",
        }
    }

    /// Guess the protocol from an endpoint URL: anything with an `/xmlrpc/`
    /// path segment is XML-RPC, everything else REST.
    pub fn infer(endpoint: &str) -> Protocol {
        if endpoint.contains("/xmlrpc/") || endpoint.trim_end_matches('/').ends_with("/xmlrpc") {
            Protocol::XmlRpc
        } else {
            Protocol::Rest
        }
    }

    /// Default API endpoint for this protocol.
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Protocol::Rest => "https://api.softlayer.com/rest/v3.1",
            Protocol::XmlRpc => "https://api.softlayer.com/xmlrpc/v3.1",
        }
    }

    pub(crate) fn encode(
        &self,
        target: &Target<'_>,
        call: &Call<'_>,
    ) -> Result<EncodedRequest, EncodeError> {
        match self {
            Protocol::Rest => rest::encode(target, call),
            Protocol::XmlRpc => xmlrpc::encode(target, call),
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where and as whom a call is sent.
pub(crate) struct Target<'a> {
    pub endpoint: &'a str,
    pub credentials: &'a Credentials,
    pub user_agent: &'a str,
}

/// One remote call.
#[derive(Debug)]
pub(crate) struct Call<'a> {
    pub service: &'a str,
    pub method: &'a str,
    pub args: &'a [Value],
    pub options: &'a Options,
}

impl<'a> Call<'a> {
    /// Assemble a call, rejecting service or method names that cannot appear
    /// in a URL path or an XML-RPC method name.
    pub fn new(
        service: &'a str,
        method: &'a str,
        args: &'a [Value],
        options: &'a Options,
    ) -> Result<Self, EncodeError> {
        validate_identifier("service", service)?;
        validate_identifier("method", method)?;
        Ok(Self {
            service,
            method,
            args,
            options,
        })
    }

    /// The object mask to send, normalized.
    pub fn mask(&self) -> Option<String> {
        self.options
            .get_mask()
            .filter(|m| !m.is_empty())
            .map(softlayer_core::normalize_mask)
    }

    pub fn filter(&self) -> Option<&str> {
        self.options.get_filter().filter(|f| !f.is_empty())
    }

    /// `(offset, limit)` when a limit is set. An offset alone is not sent.
    pub fn result_limit(&self) -> Option<(u32, u32)> {
        self.options
            .get_limit()
            .map(|limit| (self.options.get_offset().unwrap_or(0), limit))
    }
}

fn validate_identifier(what: &str, name: &str) -> Result<(), EncodeError> {
    if name.is_empty() {
        return Err(EncodeError::Target(format!("{what} name is empty")));
    }
    if let Some(c) = name.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
        return Err(EncodeError::Target(format!(
            "{what} name {name:?} contains {c:?}"
        )));
    }
    Ok(())
}

/// A fully encoded HTTP request that can be replayed.
#[derive(Clone, Debug)]
pub(crate) struct EncodedRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl EncodedRequest {
    /// Start a request with the headers every call carries.
    pub fn new(
        method: Method,
        uri: &str,
        target: &Target<'_>,
        authorization: Option<String>,
    ) -> Result<Self, EncodeError> {
        let uri: Uri = uri
            .parse()
            .map_err(|e| EncodeError::Target(format!("invalid request uri: {e}")))?;

        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(target.user_agent) {
            headers.insert(header::USER_AGENT, value);
        }
        if let Some(authorization) = authorization {
            let mut value = HeaderValue::from_str(&authorization)
                .map_err(|_| EncodeError::Target("credentials are not valid header text".into()))?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }

        Ok(Self {
            method,
            uri,
            headers,
            body: Bytes::new(),
        })
    }

    pub fn with_body(mut self, content_type: &'static str, body: Vec<u8>) -> Self {
        self.headers
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        self.body = Bytes::from(body);
        self
    }

    pub fn accept(mut self, content_type: &'static str) -> Self {
        self.headers
            .insert(header::ACCEPT, HeaderValue::from_static(content_type));
        self
    }

    /// Build a fresh HTTP request for one attempt.
    pub fn to_http(&self) -> TransportRequest {
        let mut request = http::Request::new(Full::new(self.body.clone()));
        *request.method_mut() = self.method.clone();
        *request.uri_mut() = self.uri.clone();
        *request.headers_mut() = self.headers.clone();
        request
    }
}

/// Join the endpoint and a path without doubling slashes.
pub(crate) fn join_path(endpoint: &str, path: &str) -> String {
    format!("{}/{}", endpoint.trim_end_matches('/'), path)
}
