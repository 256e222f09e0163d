//! REST/JSON request encoding.
//!
//! A call becomes `<endpoint>/<service>[/<id>][/<method>].json` with the
//! positional arguments in a `{"parameters": [...]}` body and the mask,
//! filter and result window as query parameters.

use http::Method;
use serde::Serialize;
use softlayer_core::{EncodeError, Value};

use super::{Call, EncodedRequest, Target, join_path};

const JSON: &str = "application/json";

/// Methods addressed by HTTP verb alone, without a method path segment.
const BASIC_VERBS: &[&str] = &[
    "getObject",
    "createObject",
    "createObjects",
    "editObject",
    "editObjects",
    "deleteObject",
];

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Query<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    object_mask: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    object_filter: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result_limit: Option<String>,
}

#[derive(Serialize)]
struct Body {
    parameters: Vec<serde_json::Value>,
}

pub(crate) fn encode(target: &Target<'_>, call: &Call<'_>) -> Result<EncodedRequest, EncodeError> {
    let mut uri = join_path(target.endpoint, &path(call));

    let mask = call.mask();
    let query = Query {
        object_mask: mask.as_deref(),
        object_filter: call.filter(),
        result_limit: call
            .result_limit()
            .map(|(offset, limit)| format!("{offset},{limit}")),
    };
    let query = serde_qs::to_string(&query)
        .map_err(|e| EncodeError::Serialize(format!("query string: {e}")))?;
    if !query.is_empty() {
        uri.push('?');
        uri.push_str(&query);
    }

    let request = EncodedRequest::new(
        http_method(call.method, !call.args.is_empty()),
        &uri,
        target,
        target.credentials.authorization(true),
    )?
    .accept(JSON);

    if call.args.is_empty() {
        return Ok(request);
    }

    let body = Body {
        parameters: call
            .args
            .iter()
            .map(Value::to_json)
            .collect::<Result<_, _>>()?,
    };
    let body = serde_json::to_vec(&body).map_err(|e| EncodeError::Serialize(e.to_string()))?;
    Ok(request.with_body(JSON, body))
}

fn path(call: &Call<'_>) -> String {
    let mut path = call.service.to_string();
    if let Some(id) = call.options.get_id() {
        path.push('/');
        path.push_str(&id.to_string());
    }
    if !BASIC_VERBS.contains(&call.method) {
        path.push('/');
        path.push_str(call.method);
    }
    path.push_str(".json");
    path
}

fn http_method(method: &str, has_args: bool) -> Method {
    match method {
        "deleteObject" => Method::DELETE,
        "createObject" | "createObjects" => Method::POST,
        "editObject" | "editObjects" => Method::PUT,
        _ if has_args => Method::POST,
        _ => Method::GET,
    }
}
