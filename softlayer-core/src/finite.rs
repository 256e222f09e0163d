//! Rejects non-finite floats before a value enters the JSON data model.
//!
//! `serde_json` silently maps NaN and infinities to `null`, which would turn
//! a bad argument into a different, valid one.

use std::fmt;

use serde::Serialize;
use serde::ser;

#[derive(Debug)]
pub(crate) enum FiniteError {
    NonFinite(f64),
    Custom(String),
}

impl fmt::Display for FiniteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FiniteError::NonFinite(d) => write!(f, "non-finite double {d}"),
            FiniteError::Custom(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for FiniteError {}

impl ser::Error for FiniteError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        FiniteError::Custom(msg.to_string())
    }
}

/// Walk `value` and fail on the first NaN or infinity.
pub(crate) fn check<T>(value: &T) -> Result<(), FiniteError>
where
    T: Serialize + ?Sized,
{
    value.serialize(FiniteCheck)
}

struct FiniteCheck;

fn float(d: f64) -> Result<(), FiniteError> {
    if d.is_finite() {
        Ok(())
    } else {
        Err(FiniteError::NonFinite(d))
    }
}

impl ser::Serializer for FiniteCheck {
    type Ok = ();
    type Error = FiniteError;
    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = Self;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    fn serialize_bool(self, _: bool) -> Result<(), FiniteError> {
        Ok(())
    }
    fn serialize_i8(self, _: i8) -> Result<(), FiniteError> {
        Ok(())
    }
    fn serialize_i16(self, _: i16) -> Result<(), FiniteError> {
        Ok(())
    }
    fn serialize_i32(self, _: i32) -> Result<(), FiniteError> {
        Ok(())
    }
    fn serialize_i64(self, _: i64) -> Result<(), FiniteError> {
        Ok(())
    }
    fn serialize_i128(self, _: i128) -> Result<(), FiniteError> {
        Ok(())
    }
    fn serialize_u8(self, _: u8) -> Result<(), FiniteError> {
        Ok(())
    }
    fn serialize_u16(self, _: u16) -> Result<(), FiniteError> {
        Ok(())
    }
    fn serialize_u32(self, _: u32) -> Result<(), FiniteError> {
        Ok(())
    }
    fn serialize_u64(self, _: u64) -> Result<(), FiniteError> {
        Ok(())
    }
    fn serialize_u128(self, _: u128) -> Result<(), FiniteError> {
        Ok(())
    }

    fn serialize_f32(self, v: f32) -> Result<(), FiniteError> {
        float(f64::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<(), FiniteError> {
        float(v)
    }

    fn serialize_char(self, _: char) -> Result<(), FiniteError> {
        Ok(())
    }
    fn serialize_str(self, _: &str) -> Result<(), FiniteError> {
        Ok(())
    }
    fn serialize_bytes(self, _: &[u8]) -> Result<(), FiniteError> {
        Ok(())
    }
    fn serialize_none(self) -> Result<(), FiniteError> {
        Ok(())
    }

    fn serialize_some<T>(self, value: &T) -> Result<(), FiniteError>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<(), FiniteError> {
        Ok(())
    }
    fn serialize_unit_struct(self, _: &'static str) -> Result<(), FiniteError> {
        Ok(())
    }
    fn serialize_unit_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
    ) -> Result<(), FiniteError> {
        Ok(())
    }

    fn serialize_newtype_struct<T>(self, _: &'static str, value: &T) -> Result<(), FiniteError>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        value: &T,
    ) -> Result<(), FiniteError>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    fn serialize_seq(self, _: Option<usize>) -> Result<Self, FiniteError> {
        Ok(self)
    }
    fn serialize_tuple(self, _: usize) -> Result<Self, FiniteError> {
        Ok(self)
    }
    fn serialize_tuple_struct(self, _: &'static str, _: usize) -> Result<Self, FiniteError> {
        Ok(self)
    }
    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self, FiniteError> {
        Ok(self)
    }
    fn serialize_map(self, _: Option<usize>) -> Result<Self, FiniteError> {
        Ok(self)
    }
    fn serialize_struct(self, _: &'static str, _: usize) -> Result<Self, FiniteError> {
        Ok(self)
    }
    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self, FiniteError> {
        Ok(self)
    }
}

impl ser::SerializeSeq for FiniteCheck {
    type Ok = ();
    type Error = FiniteError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), FiniteError>
    where
        T: Serialize + ?Sized,
    {
        check(value)
    }

    fn end(self) -> Result<(), FiniteError> {
        Ok(())
    }
}

impl ser::SerializeTuple for FiniteCheck {
    type Ok = ();
    type Error = FiniteError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), FiniteError>
    where
        T: Serialize + ?Sized,
    {
        check(value)
    }

    fn end(self) -> Result<(), FiniteError> {
        Ok(())
    }
}

impl ser::SerializeTupleStruct for FiniteCheck {
    type Ok = ();
    type Error = FiniteError;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), FiniteError>
    where
        T: Serialize + ?Sized,
    {
        check(value)
    }

    fn end(self) -> Result<(), FiniteError> {
        Ok(())
    }
}

impl ser::SerializeTupleVariant for FiniteCheck {
    type Ok = ();
    type Error = FiniteError;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), FiniteError>
    where
        T: Serialize + ?Sized,
    {
        check(value)
    }

    fn end(self) -> Result<(), FiniteError> {
        Ok(())
    }
}

// Keys are left to serde_json.
impl ser::SerializeMap for FiniteCheck {
    type Ok = ();
    type Error = FiniteError;

    fn serialize_key<T>(&mut self, _: &T) -> Result<(), FiniteError>
    where
        T: Serialize + ?Sized,
    {
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<(), FiniteError>
    where
        T: Serialize + ?Sized,
    {
        check(value)
    }

    fn end(self) -> Result<(), FiniteError> {
        Ok(())
    }
}

impl ser::SerializeStruct for FiniteCheck {
    type Ok = ();
    type Error = FiniteError;

    fn serialize_field<T>(&mut self, _: &'static str, value: &T) -> Result<(), FiniteError>
    where
        T: Serialize + ?Sized,
    {
        check(value)
    }

    fn end(self) -> Result<(), FiniteError> {
        Ok(())
    }
}

impl ser::SerializeStructVariant for FiniteCheck {
    type Ok = ();
    type Error = FiniteError;

    fn serialize_field<T>(&mut self, _: &'static str, value: &T) -> Result<(), FiniteError>
    where
        T: Serialize + ?Sized,
    {
        check(value)
    }

    fn end(self) -> Result<(), FiniteError> {
        Ok(())
    }
}
