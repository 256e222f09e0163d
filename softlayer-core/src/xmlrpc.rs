//! XML-RPC codec.
//!
//! Writes `methodCall` documents and reads `methodResponse` documents, mapping
//! XML-RPC's typed values onto [`Value`]:
//!
//! | XML-RPC | [`Value`] |
//! |---------|-----------|
//! | `int`, `i4`, `i8` | `Int` |
//! | `boolean` | `Bool` |
//! | `double` | `Double` |
//! | `string`, untyped | `String` |
//! | `dateTime.iso8601` | `DateTime` |
//! | `base64` | `Base64` |
//! | `nil` | `Null` |
//! | `struct` | `Struct` |
//! | `array` | `Array` |
//!
//! The reverse direction (reading calls, writing responses) exists so that
//! test servers can speak the same dialect.

use base64::Engine;
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::Value;

/// XML-RPC encoding or decoding failure.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum XmlRpcError {
    /// The underlying XML reader or writer failed.
    #[error("xml error: {0}")]
    Xml(String),

    /// The document is well-formed XML but not valid XML-RPC.
    #[error("malformed xml-rpc document: {0}")]
    Malformed(String),

    /// A value cannot be written as XML-RPC.
    #[error("unsupported value: {0}")]
    Unsupported(String),
}

/// A decoded `methodResponse`.
#[derive(Clone, Debug, PartialEq)]
pub enum MethodResponse {
    /// The single result parameter (`Null` when the response carried none).
    Success(Value),
    /// The value of the `fault` member, normally a struct with `faultCode`
    /// and `faultString`.
    Fault(Value),
}

/// Encode a `methodCall` document.
pub fn encode_method_call(method_name: &str, params: &[Value]) -> Result<Vec<u8>, XmlRpcError> {
    let mut w = XmlWriter::new();
    w.decl()?;
    w.start("methodCall")?;
    w.element("methodName", method_name)?;
    w.params(params)?;
    w.end("methodCall")?;
    Ok(w.finish())
}

/// Encode a successful `methodResponse` carrying `value`.
pub fn encode_method_response(value: &Value) -> Result<Vec<u8>, XmlRpcError> {
    let mut w = XmlWriter::new();
    w.decl()?;
    w.start("methodResponse")?;
    w.params(std::slice::from_ref(value))?;
    w.end("methodResponse")?;
    Ok(w.finish())
}

/// Encode a fault `methodResponse`.
pub fn encode_fault(fault_code: impl Into<Value>, fault_string: &str) -> Result<Vec<u8>, XmlRpcError> {
    let fault = Value::structure([
        ("faultCode", fault_code.into()),
        ("faultString", Value::from(fault_string)),
    ]);

    let mut w = XmlWriter::new();
    w.decl()?;
    w.start("methodResponse")?;
    w.start("fault")?;
    w.value(&fault)?;
    w.end("fault")?;
    w.end("methodResponse")?;
    Ok(w.finish())
}

/// Decode a `methodCall` document into its method name and parameters.
pub fn decode_method_call(body: &[u8]) -> Result<(String, Vec<Value>), XmlRpcError> {
    let root = parse_document(body)?;
    root.expect_name("methodCall")?;

    let method_name = root
        .child("methodName")
        .ok_or_else(|| XmlRpcError::Malformed("methodCall without methodName".into()))?
        .text()
        .trim()
        .to_string();

    let params = match root.child("params") {
        Some(params) => params
            .children_named("param")
            .map(param_value)
            .collect::<Result<_, _>>()?,
        None => Vec::new(),
    };

    Ok((method_name, params))
}

/// Decode a `methodResponse` document.
pub fn decode_method_response(body: &[u8]) -> Result<MethodResponse, XmlRpcError> {
    let root = parse_document(body)?;
    root.expect_name("methodResponse")?;

    if let Some(fault) = root.child("fault") {
        let value = fault
            .child("value")
            .ok_or_else(|| XmlRpcError::Malformed("fault without value".into()))?;
        return Ok(MethodResponse::Fault(parse_value(value)?));
    }

    let params = root
        .child("params")
        .ok_or_else(|| XmlRpcError::Malformed("methodResponse without params or fault".into()))?;

    match params.children_named("param").next() {
        Some(param) => Ok(MethodResponse::Success(param_value(param)?)),
        None => Ok(MethodResponse::Success(Value::Null)),
    }
}

// ============================================================================
// Writing
// ============================================================================

struct XmlWriter {
    inner: Writer<Vec<u8>>,
}

impl XmlWriter {
    fn new() -> Self {
        Self {
            inner: Writer::new(Vec::new()),
        }
    }

    fn finish(self) -> Vec<u8> {
        self.inner.into_inner()
    }

    fn event(&mut self, event: Event<'_>) -> Result<(), XmlRpcError> {
        self.inner
            .write_event(event)
            .map_err(|e| XmlRpcError::Xml(e.to_string()))
    }

    fn decl(&mut self) -> Result<(), XmlRpcError> {
        self.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
    }

    fn start(&mut self, name: &str) -> Result<(), XmlRpcError> {
        self.event(Event::Start(BytesStart::new(name)))
    }

    fn end(&mut self, name: &str) -> Result<(), XmlRpcError> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn empty(&mut self, name: &str) -> Result<(), XmlRpcError> {
        self.event(Event::Empty(BytesStart::new(name)))
    }

    fn element(&mut self, name: &str, text: &str) -> Result<(), XmlRpcError> {
        self.start(name)?;
        if !text.is_empty() {
            self.event(Event::Text(BytesText::new(text)))?;
        }
        self.end(name)
    }

    fn params(&mut self, params: &[Value]) -> Result<(), XmlRpcError> {
        self.start("params")?;
        for param in params {
            self.start("param")?;
            self.value(param)?;
            self.end("param")?;
        }
        self.end("params")
    }

    fn value(&mut self, value: &Value) -> Result<(), XmlRpcError> {
        self.start("value")?;
        match value {
            Value::Null => self.empty("nil")?,
            Value::Bool(b) => self.element("boolean", if *b { "1" } else { "0" })?,
            Value::Int(i) => self.element("int", &i.to_string())?,
            Value::Double(d) => {
                if !d.is_finite() {
                    return Err(XmlRpcError::Unsupported(format!("non-finite double {d}")));
                }
                self.element("double", &d.to_string())?
            }
            Value::String(s) => self.element("string", s)?,
            Value::DateTime(s) => self.element("dateTime.iso8601", s)?,
            Value::Base64(bytes) => self.element(
                "base64",
                &base64::engine::general_purpose::STANDARD.encode(bytes),
            )?,
            Value::Array(items) => {
                self.start("array")?;
                self.start("data")?;
                for item in items {
                    self.value(item)?;
                }
                self.end("data")?;
                self.end("array")?;
            }
            Value::Struct(members) => {
                self.start("struct")?;
                for (name, member) in members {
                    self.start("member")?;
                    self.element("name", name)?;
                    self.value(member)?;
                    self.end("member")?;
                }
                self.end("struct")?;
            }
        }
        self.end("value")
    }
}

// ============================================================================
// Reading
// ============================================================================

#[derive(Debug)]
struct Element {
    name: String,
    children: Vec<Node>,
}

#[derive(Debug)]
enum Node {
    Element(Element),
    Text(String),
}

impl Element {
    fn new(name: String) -> Self {
        Self {
            name,
            children: Vec::new(),
        }
    }

    fn expect_name(&self, name: &str) -> Result<(), XmlRpcError> {
        if self.name == name {
            Ok(())
        } else {
            Err(XmlRpcError::Malformed(format!(
                "expected <{name}>, found <{}>",
                self.name
            )))
        }
    }

    fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        })
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.elements().filter(move |el| el.name == name)
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|el| el.name == name)
    }

    fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(t) => Some(t.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }
}

fn parse_document(body: &[u8]) -> Result<Element, XmlRpcError> {
    let mut reader = Reader::from_reader(body);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| XmlRpcError::Xml(e.to_string()))?;
        match event {
            Event::Start(start) => stack.push(Element::new(element_name(&start)?)),
            Event::Empty(start) => {
                let element = Element::new(element_name(&start)?);
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| XmlRpcError::Malformed("unbalanced end tag".into()))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                if let Some(parent) = stack.last_mut() {
                    let text = text
                        .unescape()
                        .map_err(|e| XmlRpcError::Xml(e.to_string()))?;
                    parent.children.push(Node::Text(text.into_owned()));
                }
            }
            Event::CData(data) => {
                if let Some(parent) = stack.last_mut() {
                    let text = String::from_utf8(data.into_inner().into_owned())
                        .map_err(|e| XmlRpcError::Xml(e.to_string()))?;
                    parent.children.push(Node::Text(text));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(XmlRpcError::Malformed("unexpected end of document".into()));
    }
    root.ok_or_else(|| XmlRpcError::Malformed("empty document".into()))
}

fn element_name(start: &BytesStart<'_>) -> Result<String, XmlRpcError> {
    std::str::from_utf8(start.local_name().as_ref())
        .map(str::to_string)
        .map_err(|e| XmlRpcError::Xml(e.to_string()))
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), XmlRpcError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None if root.is_none() => *root = Some(element),
        None => return Err(XmlRpcError::Malformed("multiple root elements".into())),
    }
    Ok(())
}

fn param_value(param: &Element) -> Result<Value, XmlRpcError> {
    let value = param
        .child("value")
        .ok_or_else(|| XmlRpcError::Malformed("param without value".into()))?;
    parse_value(value)
}

fn parse_value(value: &Element) -> Result<Value, XmlRpcError> {
    let Some(typed) = value.elements().next() else {
        return Ok(Value::String(value.text()));
    };

    let malformed = |what: &str| XmlRpcError::Malformed(format!("invalid <{}>: {what}", typed.name));

    match typed.name.as_str() {
        "int" | "i4" | "i8" => typed
            .text()
            .trim()
            .parse()
            .map(Value::Int)
            .map_err(|_| malformed(&typed.text())),
        "boolean" => match typed.text().trim() {
            "1" | "true" => Ok(Value::Bool(true)),
            "0" | "false" => Ok(Value::Bool(false)),
            other => Err(malformed(other)),
        },
        "double" => typed
            .text()
            .trim()
            .parse()
            .map(Value::Double)
            .map_err(|_| malformed(&typed.text())),
        "string" => Ok(Value::String(typed.text())),
        "dateTime.iso8601" => Ok(Value::DateTime(typed.text().trim().to_string())),
        "base64" => {
            let encoded: String = typed.text().split_whitespace().collect();
            base64::engine::general_purpose::STANDARD
                .decode(encoded)
                .map(Value::Base64)
                .map_err(|e| malformed(&e.to_string()))
        }
        "nil" => Ok(Value::Null),
        "struct" => {
            let mut members = Vec::new();
            for member in typed.children_named("member") {
                let name = member
                    .child("name")
                    .ok_or_else(|| malformed("member without name"))?
                    .text();
                let value = member
                    .child("value")
                    .ok_or_else(|| malformed("member without value"))?;
                members.push((name, parse_value(value)?));
            }
            Ok(Value::Struct(members))
        }
        "array" => match typed.child("data") {
            Some(data) => Ok(Value::Array(
                data.children_named("value")
                    .map(parse_value)
                    .collect::<Result<_, _>>()?,
            )),
            None => Ok(Value::Array(Vec::new())),
        },
        other => Err(XmlRpcError::Malformed(format!("unknown value type <{other}>"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Value {
        Value::structure([
            ("id", Value::Int(42)),
            ("hostname", Value::from("web<1>&co")),
            ("active", Value::Bool(true)),
            ("ratio", Value::Double(0.25)),
            ("notes", Value::Null),
            ("created", Value::DateTime("2024-05-01T10:00:00-05:00".into())),
            ("blob", Value::Base64(vec![0, 255, 7])),
            (
                "tags",
                Value::Array(vec![Value::from("a"), Value::Int(-1), Value::Array(vec![])]),
            ),
        ])
    }

    #[test]
    fn test_method_call_round_trip() {
        let params = vec![Value::Null, Value::Int(7), sample()];
        let body = encode_method_call("SoftLayer_Account.getObject", &params).unwrap();

        let (method, decoded) = decode_method_call(&body).unwrap();
        assert_eq!(method, "SoftLayer_Account.getObject");
        assert_eq!(decoded, params);
    }

    #[test]
    fn test_method_call_layout() {
        let body = encode_method_call("Foo.bar", &[Value::Null, Value::Int(1)]).unwrap();
        let text = String::from_utf8(body).unwrap();
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(text.contains("<methodName>Foo.bar</methodName>"));
        assert!(text.contains(
            "<params><param><value><nil/></value></param><param><value><int>1</int></value></param></params>"
        ));
    }

    #[test]
    fn test_text_is_escaped() {
        let body = encode_method_call("Foo.bar", &[Value::from("a<b & c>")]).unwrap();
        let text = String::from_utf8(body).unwrap();
        assert!(text.contains("<string>a&lt;b &amp; c&gt;</string>"));
    }

    #[test]
    fn test_method_response_round_trip() {
        let body = encode_method_response(&sample()).unwrap();
        assert_eq!(
            decode_method_response(&body).unwrap(),
            MethodResponse::Success(sample())
        );
    }

    #[test]
    fn test_fault_round_trip() {
        let body = encode_fault("SoftLayer_Exception_ObjectNotFound", "Unable to find object").unwrap();
        match decode_method_response(&body).unwrap() {
            MethodResponse::Fault(fault) => {
                assert_eq!(
                    fault.get("faultCode").and_then(Value::as_str),
                    Some("SoftLayer_Exception_ObjectNotFound")
                );
                assert_eq!(
                    fault.get("faultString").and_then(Value::as_str),
                    Some("Unable to find object")
                );
            }
            other => panic!("expected fault, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_loose_document() {
        let body = br#"<?xml version="1.0"?>
            <methodResponse>
              <params>
                <param>
                  <value>
                    <struct>
                      <member><name>id</name><value><i4> 12 </i4></value></member>
                      <member><name>name</name><value>untyped text</value></member>
                      <member><name>big</name><value><i8>9000000000</i8></value></member>
                      <member><name>flag</name><value><boolean>0</boolean></value></member>
                      <member><name>data</name><value><base64>AQID
                        BA==</base64></value></member>
                    </struct>
                  </value>
                </param>
              </params>
            </methodResponse>"#;

        let MethodResponse::Success(value) = decode_method_response(body).unwrap() else {
            panic!("expected success");
        };
        assert_eq!(value.get("id"), Some(&Value::Int(12)));
        assert_eq!(value.get("name"), Some(&Value::from("untyped text")));
        assert_eq!(value.get("big"), Some(&Value::Int(9_000_000_000)));
        assert_eq!(value.get("flag"), Some(&Value::Bool(false)));
        assert_eq!(value.get("data"), Some(&Value::Base64(vec![1, 2, 3, 4])));
    }

    #[test]
    fn test_decode_empty_params_is_null() {
        let body = b"<methodResponse><params></params></methodResponse>";
        assert_eq!(
            decode_method_response(body).unwrap(),
            MethodResponse::Success(Value::Null)
        );
    }

    #[test]
    fn test_decode_cdata_string() {
        let body = b"<methodResponse><params><param><value><string><![CDATA[a<b]]></string></value></param></params></methodResponse>";
        assert_eq!(
            decode_method_response(body).unwrap(),
            MethodResponse::Success(Value::from("a<b"))
        );
    }

    #[test]
    fn test_decode_rejects_wrong_root() {
        let err = decode_method_response(b"<html><body>502 Bad Gateway</body></html>").unwrap_err();
        assert!(matches!(err, XmlRpcError::Malformed(_)));
    }

    #[test]
    fn test_decode_rejects_unknown_type() {
        let body = b"<methodResponse><params><param><value><float>1</float></value></param></params></methodResponse>";
        assert!(matches!(
            decode_method_response(body),
            Err(XmlRpcError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_rejects_bad_int() {
        let body = b"<methodResponse><params><param><value><int>twelve</int></value></param></params></methodResponse>";
        assert!(decode_method_response(body).is_err());
    }

    #[test]
    fn test_decode_rejects_truncated_document() {
        assert!(decode_method_response(b"<methodResponse><params>").is_err());
        assert!(decode_method_response(b"").is_err());
    }

    #[test]
    fn test_child_lookup_with_borrowed_name() {
        let root = parse_document(b"<fault><value>x</value><name>y</name></fault>").unwrap();
        let wanted = String::from("name");
        let found = root.child(&wanted);
        drop(wanted);
        assert_eq!(found.map(Element::text).as_deref(), Some("y"));
        assert!(root.child("missing").is_none());
    }

    #[test]
    fn test_encode_rejects_nan() {
        let err = encode_method_call("Foo.bar", &[Value::Double(f64::NAN)]).unwrap_err();
        assert!(matches!(err, XmlRpcError::Unsupported(_)));
    }
}
