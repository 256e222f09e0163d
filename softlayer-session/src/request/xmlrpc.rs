//! XML-RPC request encoding.
//!
//! Every call is a `methodCall` named `<service>.<method>` posted to the
//! endpoint. The first parameter is a headers struct carrying the
//! authentication and per-call options that are set; the positional
//! arguments follow.

use http::Method;
use softlayer_core::{EncodeError, Value, xmlrpc};

use super::{Call, EncodedRequest, Target};
use crate::credentials::Credentials;

const XML: &str = "text/xml";

pub(crate) fn encode(target: &Target<'_>, call: &Call<'_>) -> Result<EncodedRequest, EncodeError> {
    let method_name = format!("{}.{}", call.service, call.method);

    let mut params = Vec::with_capacity(call.args.len() + 1);
    params.push(headers(target.credentials, call));
    params.extend(call.args.iter().cloned());

    let body = xmlrpc::encode_method_call(&method_name, &params).map_err(|e| match e {
        xmlrpc::XmlRpcError::Unsupported(msg) => EncodeError::Unsupported(msg),
        other => EncodeError::Serialize(other.to_string()),
    })?;

    Ok(EncodedRequest::new(
        Method::POST,
        target.endpoint,
        target,
        target.credentials.authorization(false),
    )?
    .accept(XML)
    .with_body(XML, body))
}

/// The call headers struct, holding only what is set.
fn headers(credentials: &Credentials, call: &Call<'_>) -> Value {
    let mut members = Vec::new();

    if let Credentials::ApiKey { username, api_key } = credentials {
        members.push((
            "authenticate".to_string(),
            Value::structure([
                ("username", Value::from(username.as_str())),
                ("apiKey", Value::from(api_key.expose())),
            ]),
        ));
    }

    if let Some(id) = call.options.get_id() {
        members.push((
            format!("{}InitParameters", call.service),
            Value::structure([("id", id)]),
        ));
    }

    if let Some(mask) = call.mask() {
        members.push((
            "SoftLayer_ObjectMask".to_string(),
            Value::structure([("mask", mask)]),
        ));
    }

    if let Some(filter) = call.filter() {
        members.push((
            format!("{}ObjectFilter", call.service),
            Value::from(filter),
        ));
    }

    if let Some((offset, limit)) = call.result_limit() {
        members.push((
            "resultLimit".to_string(),
            Value::structure([("limit", limit), ("offset", offset)]),
        ));
    }

    Value::Struct(members)
}
