//! The argument model shared by both wire bindings.
//!
//! Generated bindings pass loosely typed, positional argument lists. Rather
//! than reflecting over arbitrary types at encode time, every argument is
//! converted up front into [`Value`], a small closed set of variants that both
//! the JSON and the XML-RPC encoders know how to write.

use base64::Engine;
use serde::Serialize;

use crate::EncodeError;
use crate::finite::FiniteError;

/// A single call argument (or any nested part of one).
///
/// `Struct` keeps its members in insertion order, so encoding the same value
/// twice always yields the same bytes.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    /// An ISO 8601 timestamp, sent as `dateTime.iso8601` over XML-RPC.
    DateTime(String),
    /// Raw bytes, sent as `base64`.
    Base64(Vec<u8>),
    Array(Vec<Value>),
    Struct(Vec<(String, Value)>),
}

impl Value {
    /// Build a struct value from `(name, value)` pairs, keeping their order.
    pub fn structure<K, V, I>(members: I) -> Value
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Struct(
            members
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Whether this is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Look up a struct member by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Struct(members) => members.iter().find(|(k, _)| k == name).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Borrow the string content of `String` and `DateTime` values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::DateTime(s) => Some(s),
            _ => None,
        }
    }

    /// Convert into the JSON data model.
    ///
    /// `DateTime` becomes a string and `Base64` a standard base64 string.
    /// Fails for non-finite doubles, which JSON cannot carry.
    pub fn to_json(&self) -> Result<serde_json::Value, EncodeError> {
        Ok(match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Double(d) => serde_json::Number::from_f64(*d)
                .map(serde_json::Value::Number)
                .ok_or_else(|| EncodeError::Unsupported(format!("non-finite double {d}")))?,
            Value::String(s) | Value::DateTime(s) => serde_json::Value::String(s.clone()),
            Value::Base64(bytes) => serde_json::Value::String(
                base64::engine::general_purpose::STANDARD.encode(bytes),
            ),
            Value::Array(items) => serde_json::Value::Array(
                items.iter().map(Value::to_json).collect::<Result<_, _>>()?,
            ),
            Value::Struct(members) => {
                let mut map = serde_json::Map::with_capacity(members.len());
                for (name, value) in members {
                    map.insert(name.clone(), value.to_json()?);
                }
                serde_json::Value::Object(map)
            }
        })
    }
}

impl TryFrom<serde_json::Value> for Value {
    type Error = EncodeError;

    fn try_from(json: serde_json::Value) -> Result<Self, Self::Error> {
        Ok(match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if n.is_u64() {
                    return Err(EncodeError::Unsupported(format!(
                        "integer {n} does not fit in 64 signed bits"
                    )));
                } else {
                    Value::Double(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(Value::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            serde_json::Value::Object(map) => Value::Struct(
                map.into_iter()
                    .map(|(k, v)| Value::try_from(v).map(|v| (k, v)))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }
}

/// Convert any serializable argument into a [`Value`].
///
/// Goes through the JSON data model, so object members come out key-sorted
/// and `Option::None` becomes [`Value::Null`]. Fails for types JSON cannot
/// express, such as maps keyed by non-strings or integers above `i64::MAX`.
/// NaN and infinite floats are rejected, as they are for [`Value::Double`].
///
/// ```
/// use serde::Serialize;
/// use softlayer_core::{to_value, Value};
///
/// #[derive(Serialize)]
/// struct Record {
///     host: String,
///     ttl: Option<i32>,
/// }
///
/// let value = to_value(&Record { host: "www".into(), ttl: None }).unwrap();
/// assert_eq!(value.get("host"), Some(&Value::String("www".into())));
/// assert_eq!(value.get("ttl"), Some(&Value::Null));
/// ```
pub fn to_value<T>(value: &T) -> Result<Value, EncodeError>
where
    T: Serialize + ?Sized,
{
    crate::finite::check(value).map_err(|e| match e {
        FiniteError::NonFinite(_) => EncodeError::Unsupported(e.to_string()),
        FiniteError::Custom(msg) => EncodeError::Serialize(msg),
    })?;
    let json = serde_json::to_value(value).map_err(|e| EncodeError::Serialize(e.to_string()))?;
    Value::try_from(json)
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use std::collections::HashMap;

    #[derive(Serialize)]
    struct Domain {
        name: String,
        ttl: Option<i32>,
        records: Vec<Record>,
    }

    #[derive(Serialize)]
    struct Record {
        host: String,
        data: String,
    }

    #[test]
    fn test_option_converts_to_null() {
        let host: Option<String> = None;
        assert_eq!(Value::from(host), Value::Null);
        assert_eq!(Value::from(Some(3)), Value::Int(3));
    }

    #[test]
    fn test_to_value_nested_struct() {
        let domain = Domain {
            name: "example.com".into(),
            ttl: None,
            records: vec![Record {
                host: "www".into(),
                data: "10.0.0.1".into(),
            }],
        };

        let value = to_value(&domain).unwrap();
        assert_eq!(value.get("name").and_then(Value::as_str), Some("example.com"));
        assert_eq!(value.get("ttl"), Some(&Value::Null));
        match value.get("records") {
            Some(Value::Array(items)) => {
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].get("host").and_then(Value::as_str), Some("www"));
            }
            other => panic!("expected array, got {other:?}"),
        }
    }

    #[test]
    fn test_to_value_is_deterministic() {
        let mut map = HashMap::new();
        for key in ["zeta", "alpha", "mid", "beta"] {
            map.insert(key.to_string(), key.len() as i64);
        }

        let first = to_value(&map).unwrap();
        for _ in 0..8 {
            assert_eq!(to_value(&map).unwrap(), first);
        }
        match first {
            Value::Struct(members) => {
                let keys: Vec<_> = members.iter().map(|(k, _)| k.as_str()).collect();
                assert_eq!(keys, ["alpha", "beta", "mid", "zeta"]);
            }
            other => panic!("expected struct, got {other:?}"),
        }
    }

    #[test]
    fn test_to_value_rejects_non_string_keys() {
        let mut map = HashMap::new();
        map.insert(vec![1u8], 1);
        let err = to_value(&map).unwrap_err();
        assert!(matches!(err, EncodeError::Serialize(_)));
    }

    #[test]
    fn test_to_value_rejects_huge_unsigned() {
        let err = to_value(&u64::MAX).unwrap_err();
        assert!(matches!(err, EncodeError::Unsupported(_)));
    }

    #[test]
    fn test_to_value_rejects_non_finite_floats() {
        #[derive(Serialize)]
        struct Reading {
            label: &'static str,
            level: Option<f64>,
            samples: Vec<f32>,
        }

        let nan = Reading {
            label: "a",
            level: Some(f64::NAN),
            samples: vec![],
        };
        let err = to_value(&nan).unwrap_err();
        assert!(matches!(err, EncodeError::Unsupported(ref msg) if msg.contains("non-finite")));

        let inf = Reading {
            label: "b",
            level: None,
            samples: vec![1.0, f32::INFINITY],
        };
        assert!(matches!(to_value(&inf), Err(EncodeError::Unsupported(_))));
        assert!(matches!(to_value(&f64::NEG_INFINITY), Err(EncodeError::Unsupported(_))));

        let fine = Reading {
            label: "c",
            level: Some(0.5),
            samples: vec![1.5],
        };
        let value = to_value(&fine).unwrap();
        assert_eq!(value.get("level"), Some(&Value::Double(0.5)));
    }

    #[test]
    fn test_to_json_special_variants() {
        let value = Value::structure([
            ("when", Value::DateTime("2024-01-02T03:04:05Z".into())),
            ("blob", Value::Base64(vec![1, 2, 3])),
        ]);
        let json = value.to_json().unwrap();
        assert_eq!(json["when"], "2024-01-02T03:04:05Z");
        assert_eq!(json["blob"], "AQID");
    }

    #[test]
    fn test_to_json_rejects_nan() {
        assert!(Value::Double(f64::NAN).to_json().is_err());
        assert!(Value::Array(vec![Value::Double(f64::INFINITY)]).to_json().is_err());
    }

    #[test]
    fn test_structure_keeps_order() {
        let value = Value::structure([("b", 1), ("a", 2)]);
        assert_eq!(
            value,
            Value::Struct(vec![
                ("b".to_string(), Value::Int(1)),
                ("a".to_string(), Value::Int(2)),
            ])
        );
    }
}
