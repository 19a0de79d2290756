//! Optional primitives that remember whether a value was ever supplied.
//!
//! `Nullable<T>` differs from `Option<T>` in two ways that matter for
//! configuration: it always carries a `T` (the zero value while absent), and
//! it encodes absence as an explicit `null` instead of dropping the key.
//!
//! | Source        | Absent                     | Present                         |
//! |---------------|----------------------------|---------------------------------|
//! | JSON decode   | `null`                     | any literal `T` accepts         |
//! | JSON encode   | `null`                     | plain `T` encoding, finite only |
//! | Environment   | never (empty text = unset) | `T`'s textual grammar           |
//! | Option map    | never                      | a [`Value`] of exactly type `T` |

use std::fmt;

use serde::de::DeserializeOwned;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::coerce;
use crate::error::{BoxError, ConversionError, DecodeError};
use crate::field::{ConsumesEnvironmentText, ConsumesOption, Delegate, Field, Slot};
use crate::types::Value;

/// A primitive that can live inside a [`Nullable`].
pub trait Primitive: Clone + Default + fmt::Debug + Serialize + DeserializeOwned + 'static {
    /// Name used in mismatch errors.
    const NAME: &'static str;

    /// Parse environment text with this type's grammar and width.
    fn parse_text(text: &str) -> Result<Self, ConversionError>;

    /// Extract a value of exactly this type, following one `Ref`.
    fn from_value(value: &Value) -> Option<Self>;

    /// Whether the value has a JSON encoding that decodes back to itself.
    fn is_encodable(&self) -> bool {
        true
    }
}

macro_rules! primitive {
    ($ty:ty, $name:literal, $variant:ident, $parse:expr) => {
        primitive!($ty, $name, $variant, $parse, |_: &$ty| true);
    };
    ($ty:ty, $name:literal, $variant:ident, $parse:expr, $encodable:expr) => {
        impl Primitive for $ty {
            const NAME: &'static str = $name;

            fn parse_text(text: &str) -> Result<Self, ConversionError> {
                $parse(text)
            }

            fn from_value(value: &Value) -> Option<Self> {
                match value.deref_once() {
                    Value::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn is_encodable(&self) -> bool {
                $encodable(self)
            }
        }
    };
}

primitive!(bool, "bool", Bool, coerce::parse_bool);
primitive!(isize, "isize", Int, coerce::parse_int::<isize>);
primitive!(i8, "i8", Int8, coerce::parse_int::<i8>);
primitive!(i16, "i16", Int16, coerce::parse_int::<i16>);
primitive!(i32, "i32", Int32, coerce::parse_int::<i32>);
primitive!(i64, "i64", Int64, coerce::parse_int::<i64>);
primitive!(f32, "f32", Float32, coerce::parse_float::<f32>, |v: &f32| v.is_finite());
primitive!(f64, "f64", Float64, coerce::parse_float::<f64>, |v: &f64| v.is_finite());
primitive!(String, "text", Text, |text: &str| Ok::<_, ConversionError>(text.to_string()));

/// A `T` plus a presence flag.
///
/// `Default` is the absent state. [`Nullable::new`] is always present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Nullable<T> {
    value: T,
    present: bool,
}

pub type NullBool = Nullable<bool>;
pub type NullString = Nullable<String>;
pub type NullInt = Nullable<isize>;
pub type NullInt8 = Nullable<i8>;
pub type NullInt16 = Nullable<i16>;
pub type NullInt32 = Nullable<i32>;
pub type NullInt64 = Nullable<i64>;
pub type NullFloat32 = Nullable<f32>;
pub type NullFloat64 = Nullable<f64>;

impl<T: Primitive> Nullable<T> {
    pub fn new(value: T) -> Self {
        Nullable {
            value,
            present: true,
        }
    }

    /// The absent state: zero value, not present.
    pub fn absent() -> Self {
        Self::default()
    }

    /// The raw value, whether or not it is present. Check
    /// [`is_present`](Self::is_present) when the difference matters.
    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn is_present(&self) -> bool {
        self.present
    }

    /// `Some(&value)` when present.
    pub fn get(&self) -> Option<&T> {
        self.present.then_some(&self.value)
    }

    /// Encode as JSON: `null` when absent, the plain `T` otherwise.
    ///
    /// A present NaN or infinity has no JSON literal and fails instead of
    /// turning into `null`.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode a single JSON literal.
    pub fn from_json(bytes: &[u8]) -> Result<Self, DecodeError> {
        serde_json::from_slice(bytes).map_err(|source| DecodeError {
            bytes: String::from_utf8_lossy(bytes).into_owned(),
            source,
        })
    }

    fn set(&mut self, value: T) {
        self.value = value;
        self.present = true;
    }
}

impl<T: Primitive> From<Option<T>> for Nullable<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Nullable::new(v),
            None => Nullable::absent(),
        }
    }
}

impl<T: Primitive> From<Nullable<T>> for Option<T> {
    fn from(value: Nullable<T>) -> Self {
        value.present.then_some(value.value)
    }
}

impl<T: Primitive + fmt::Display> fmt::Display for Nullable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(v) => write!(f, "{v}"),
            None => write!(f, "null"),
        }
    }
}

impl<T: Primitive> Serialize for Nullable<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.get() {
            Some(v) if !v.is_encodable() => Err(S::Error::custom(format!(
                "{} value {v:?} has no JSON encoding",
                T::NAME
            ))),
            Some(v) => serializer.serialize_some(v),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Primitive> Deserialize<'de> for Nullable<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Option::<T>::deserialize(deserializer)?.into())
    }
}

impl<T: Primitive> ConsumesEnvironmentText for Nullable<T> {
    fn consume_env_text(&mut self, text: &str) -> Result<(), BoxError> {
        let parsed = T::parse_text(text)?;
        self.set(parsed);
        Ok(())
    }
}

impl<T: Primitive> ConsumesOption for Nullable<T> {
    fn consume_option(&mut self, value: &Value) -> Result<(), BoxError> {
        let v = T::from_value(value).ok_or_else(|| ConversionError::Mismatch {
            expected: T::NAME,
            found: value.type_name(),
        })?;
        self.set(v);
        Ok(())
    }
}

impl<T: Primitive> Delegate for Nullable<T> {
    fn as_option_consumer(&mut self) -> Option<&mut dyn ConsumesOption> {
        Some(self)
    }

    fn as_env_consumer(&mut self) -> Option<&mut dyn ConsumesEnvironmentText> {
        Some(self)
    }
}

impl<T: Primitive> Field for Nullable<T> {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Aggregate(self)
    }
}
