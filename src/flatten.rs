//! Custom serde Serializer that turns any `Serialize` value into option-map
//! pairs, keeping integer and float widths and reporting `Option::None`
//! without requiring `#[serde(skip_serializing_if)]`.

use serde::ser::{self, Serialize};

use crate::types::Value;

/// Flatten a `Serialize` value into `(key, value)` pairs.
///
/// `None` values (from `Option::None` fields) are represented as `(key, None)`.
/// Present values are `(key, Some(Value))`.
///
/// Structs and maps are recursed into, and every leaf is keyed by its own
/// field name, the way `#[command(flatten)]` groups clap arguments:
/// `Outer { limits: Inner { burst: 2i64 } }` → `[("burst", Some(Int64(2)))]`.
/// Option keys are matched against top-level record fields only, so nesting
/// carries no meaning beyond grouping.
///
/// Unsigned integers widen to the next signed width (`u8` → `Int16`, `u16` →
/// `Int32`, `u32` → `Int64`); a `u64` or `usize` beyond `i64::MAX` is an
/// error. Sequences and byte strings have no option representation and are
/// rejected.
pub fn flatten<S: Serialize + ?Sized>(
    source: &S,
) -> Result<Vec<(String, Option<Value>)>, FlattenError> {
    let mut out = Vec::new();
    let serializer = FlattenSerializer {
        key: String::new(),
        out: &mut out,
    };
    source.serialize(serializer)?;
    Ok(out)
}

#[derive(Debug)]
pub struct FlattenError(String);

impl std::fmt::Display for FlattenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cannot build options: {}", self.0)
    }
}

impl std::error::Error for FlattenError {}

impl ser::Error for FlattenError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        FlattenError(msg.to_string())
    }
}

struct FlattenSerializer<'a> {
    key: String,
    out: &'a mut Vec<(String, Option<Value>)>,
}

impl FlattenSerializer<'_> {
    fn emit(self, value: Value) -> Result<(), FlattenError> {
        self.out.push((self.key, Some(value)));
        Ok(())
    }

    fn unsupported(&self, what: &str) -> FlattenError {
        FlattenError(format!("{what} not supported (at '{}')", self.key))
    }
}

type Impossible = ser::Impossible<(), FlattenError>;

impl<'a> ser::Serializer for FlattenSerializer<'a> {
    type Ok = ();
    type Error = FlattenError;
    type SerializeSeq = Impossible;
    type SerializeTuple = Impossible;
    type SerializeTupleStruct = Impossible;
    type SerializeTupleVariant = Impossible;
    type SerializeMap = FlattenMapSerializer<'a>;
    type SerializeStruct = FlattenStructSerializer<'a>;
    type SerializeStructVariant = FlattenStructSerializer<'a>;

    fn serialize_bool(self, v: bool) -> Result<(), Self::Error> {
        self.emit(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<(), Self::Error> {
        self.emit(Value::Int8(v))
    }

    fn serialize_i16(self, v: i16) -> Result<(), Self::Error> {
        self.emit(Value::Int16(v))
    }

    fn serialize_i32(self, v: i32) -> Result<(), Self::Error> {
        self.emit(Value::Int32(v))
    }

    fn serialize_i64(self, v: i64) -> Result<(), Self::Error> {
        self.emit(Value::Int64(v))
    }

    fn serialize_u8(self, v: u8) -> Result<(), Self::Error> {
        self.emit(Value::Int16(v.into()))
    }

    fn serialize_u16(self, v: u16) -> Result<(), Self::Error> {
        self.emit(Value::Int32(v.into()))
    }

    fn serialize_u32(self, v: u32) -> Result<(), Self::Error> {
        self.emit(Value::Int64(v.into()))
    }

    fn serialize_u64(self, v: u64) -> Result<(), Self::Error> {
        match i64::try_from(v) {
            Ok(n) => self.emit(Value::Int64(n)),
            Err(_) => Err(FlattenError(format!(
                "{v} at '{}' does not fit a signed 64-bit integer",
                self.key
            ))),
        }
    }

    fn serialize_f32(self, v: f32) -> Result<(), Self::Error> {
        self.emit(Value::Float32(v))
    }

    fn serialize_f64(self, v: f64) -> Result<(), Self::Error> {
        self.emit(Value::Float64(v))
    }

    fn serialize_char(self, v: char) -> Result<(), Self::Error> {
        self.emit(Value::Text(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<(), Self::Error> {
        self.emit(Value::Text(v.to_string()))
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<(), Self::Error> {
        Err(self.unsupported("bytes"))
    }

    fn serialize_none(self) -> Result<(), Self::Error> {
        self.out.push((self.key, None));
        Ok(())
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<(), Self::Error> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<(), Self::Error> {
        Ok(())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<(), Self::Error> {
        self.serialize_str(variant)
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<(), Self::Error> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        value: &T,
    ) -> Result<(), Self::Error> {
        value.serialize(self)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq, Self::Error> {
        Err(self.unsupported("sequences"))
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple, Self::Error> {
        Err(self.unsupported("tuples"))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct, Self::Error> {
        Err(self.unsupported("tuple structs"))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant, Self::Error> {
        Err(self.unsupported("tuple variants"))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, Self::Error> {
        Ok(FlattenMapSerializer {
            out: self.out,
            current_key: None,
        })
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStruct, Self::Error> {
        Ok(FlattenStructSerializer {
            out: self.out,
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, Self::Error> {
        Ok(FlattenStructSerializer {
            out: self.out,
        })
    }
}

// --- SerializeStruct ---

struct FlattenStructSerializer<'a> {
    out: &'a mut Vec<(String, Option<Value>)>,
}

impl ser::SerializeStruct for FlattenStructSerializer<'_> {
    type Ok = ();
    type Error = FlattenError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), Self::Error> {
        value.serialize(FlattenSerializer {
            key: key.to_string(),
            out: self.out,
        })
    }

    fn end(self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl ser::SerializeStructVariant for FlattenStructSerializer<'_> {
    type Ok = ();
    type Error = FlattenError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), Self::Error> {
        ser::SerializeStruct::serialize_field(self, key, value)
    }

    fn end(self) -> Result<(), Self::Error> {
        Ok(())
    }
}

// --- SerializeMap ---

struct FlattenMapSerializer<'a> {
    out: &'a mut Vec<(String, Option<Value>)>,
    current_key: Option<String>,
}

impl ser::SerializeMap for FlattenMapSerializer<'_> {
    type Ok = ();
    type Error = FlattenError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), Self::Error> {
        self.current_key = Some(key.serialize(KeySerializer)?);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Self::Error> {
        let key = self
            .current_key
            .take()
            .ok_or_else(|| FlattenError("map value without a key".into()))?;
        value.serialize(FlattenSerializer {
            key,
            out: self.out,
        })
    }

    fn end(self) -> Result<(), Self::Error> {
        Ok(())
    }
}

// --- Key serializer (extracts string keys from map keys) ---

struct KeySerializer;

type KeyImpossible = ser::Impossible<String, FlattenError>;

fn non_string_key() -> FlattenError {
    FlattenError("map keys must be strings".into())
}

macro_rules! reject_key {
    ($($method:ident($ty:ty)),* $(,)?) => {
        $(
            fn $method(self, _: $ty) -> Result<String, Self::Error> {
                Err(non_string_key())
            }
        )*
    };
}

impl ser::Serializer for KeySerializer {
    type Ok = String;
    type Error = FlattenError;
    type SerializeSeq = KeyImpossible;
    type SerializeTuple = KeyImpossible;
    type SerializeTupleStruct = KeyImpossible;
    type SerializeTupleVariant = KeyImpossible;
    type SerializeMap = KeyImpossible;
    type SerializeStruct = KeyImpossible;
    type SerializeStructVariant = KeyImpossible;

    fn serialize_str(self, v: &str) -> Result<String, Self::Error> {
        Ok(v.to_string())
    }

    fn serialize_char(self, v: char) -> Result<String, Self::Error> {
        Ok(v.to_string())
    }

    reject_key! {
        serialize_bool(bool),
        serialize_i8(i8),
        serialize_i16(i16),
        serialize_i32(i32),
        serialize_i64(i64),
        serialize_u8(u8),
        serialize_u16(u16),
        serialize_u32(u32),
        serialize_u64(u64),
        serialize_f32(f32),
        serialize_f64(f64),
        serialize_bytes(&[u8]),
        serialize_unit_struct(&'static str),
    }

    fn serialize_none(self) -> Result<String, Self::Error> {
        Err(non_string_key())
    }

    fn serialize_some<T: Serialize + ?Sized>(self, _: &T) -> Result<String, Self::Error> {
        Err(non_string_key())
    }

    fn serialize_unit(self) -> Result<String, Self::Error> {
        Err(non_string_key())
    }

    fn serialize_unit_variant(
        self,
        _: &'static str,
        _: u32,
        v: &'static str,
    ) -> Result<String, Self::Error> {
        Ok(v.to_string())
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _: &'static str,
        v: &T,
    ) -> Result<String, Self::Error> {
        v.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: &T,
    ) -> Result<String, Self::Error> {
        Err(non_string_key())
    }

    fn serialize_seq(self, _: Option<usize>) -> Result<Self::SerializeSeq, Self::Error> {
        Err(non_string_key())
    }

    fn serialize_tuple(self, _: usize) -> Result<Self::SerializeTuple, Self::Error> {
        Err(non_string_key())
    }

    fn serialize_tuple_struct(
        self,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeTupleStruct, Self::Error> {
        Err(non_string_key())
    }

    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeTupleVariant, Self::Error> {
        Err(non_string_key())
    }

    fn serialize_map(self, _: Option<usize>) -> Result<Self::SerializeMap, Self::Error> {
        Err(non_string_key())
    }

    fn serialize_struct(
        self,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeStruct, Self::Error> {
        Err(non_string_key())
    }

    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeStructVariant, Self::Error> {
        Err(non_string_key())
    }
}
