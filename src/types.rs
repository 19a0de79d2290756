//! Dynamic option values and the small enums shared across the crate.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde::Serialize;

use crate::error::ConfbindError;
use crate::flatten;

/// A dynamically typed option value.
///
/// Integer and float variants keep their width so that a source can say
/// "this is an `i32`" and a `Nullable<i32>` can insist on exactly that.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    /// Native-width integer.
    Int(isize),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Text(String),
    /// One level of indirection, read when the option is bound.
    Ref(ValueRef),
}

impl Value {
    /// Short name of the runtime type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "isize",
            Value::Int8(_) => "i8",
            Value::Int16(_) => "i16",
            Value::Int32(_) => "i32",
            Value::Int64(_) => "i64",
            Value::Float32(_) => "f32",
            Value::Float64(_) => "f64",
            Value::Text(_) => "text",
            Value::Ref(_) => "ref",
        }
    }

    /// The value itself, or the current contents of a `Ref`.
    ///
    /// Only one level is followed: a `Ref` holding another `Ref` comes back
    /// as that inner `Ref`.
    pub fn deref_once(&self) -> Value {
        match self {
            Value::Ref(cell) => cell.get(),
            other => other.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Int8(i) => write!(f, "{i}"),
            Value::Int16(i) => write!(f, "{i}"),
            Value::Int32(i) => write!(f, "{i}"),
            Value::Int64(i) => write!(f, "{i}"),
            Value::Float32(x) => write!(f, "{x}"),
            Value::Float64(x) => write!(f, "{x}"),
            Value::Text(s) => write!(f, "{s:?}"),
            Value::Ref(cell) => write!(f, "&{}", cell.get()),
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    isize => Int,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    f32 => Float32,
    f64 => Float64,
    String => Text,
    ValueRef => Ref,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

/// A shared cell standing in for "a pointer to a value".
///
/// Clones share the same storage, so a caller can hand a `ValueRef` to an
/// [`Options`] map, fill it in later (e.g. after parsing flags) and have
/// the binder observe the final contents.
#[derive(Debug, Clone)]
pub struct ValueRef(Rc<RefCell<Value>>);

impl ValueRef {
    pub fn new(value: impl Into<Value>) -> Self {
        ValueRef(Rc::new(RefCell::new(value.into())))
    }

    /// Snapshot of the current contents.
    pub fn get(&self) -> Value {
        self.0.borrow().clone()
    }

    /// Replace the contents; every clone observes the change.
    pub fn set(&self, value: impl Into<Value>) {
        *self.0.borrow_mut() = value.into();
    }
}

impl PartialEq for ValueRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0) || self.get() == other.get()
    }
}

/// Option-map source: field identifier → dynamic value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options(BTreeMap<String, Value>);

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning the one it replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Build options from any serializable source, e.g. a clap-derived
    /// args struct.
    ///
    /// Field names become keys. `None` fields are skipped, so unset optional
    /// flags never shadow lower layers. Integer and float widths are
    /// preserved; unsigned integers widen to the next signed width that holds
    /// them.
    ///
    /// Two things do not survive the trip through serde:
    ///
    /// - Nested structs are groups, not paths. Their fields become keys under
    ///   their own names, and a later key with the same name wins.
    /// - serde has no native-width integer, so an `isize` flag arrives as
    ///   [`Value::Int64`]. Plain integer fields accept it, but a `NullInt`
    ///   field does not; insert a [`Value::Int`] by hand for those.
    pub fn from_serialize<S: Serialize + ?Sized>(source: &S) -> Result<Self, ConfbindError> {
        let pairs = flatten::flatten(source).map_err(|e| ConfbindError::Shape {
            record: std::any::type_name::<S>(),
            reason: e.to_string(),
        })?;
        Ok(pairs
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key, v)))
            .collect())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Options {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Options(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Textual document formats understood by the loader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Json,
    Toml,
}

impl Format {
    /// Pick a format from a file extension. Anything but `.toml` is JSON.
    pub fn from_path(path: &std::path::Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Format::Toml,
            _ => Format::Json,
        }
    }
}
