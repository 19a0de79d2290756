//! Field descriptors: how the binder reaches into a destination record.
//!
//! There is no runtime reflection. A record implements [`Record`] and lists
//! its bindable fields once through [`FieldTable`]. Each field type
//! implements [`Field`], handing the binder a typed mutable [`Slot`] to
//! write into. Types that want to ingest raw values themselves return
//! [`Slot::Aggregate`] and opt into [`ConsumesOption`] and/or
//! [`ConsumesEnvironmentText`] through [`Delegate`].
//!
//! Document layers also go through the table: each registered field decodes
//! its own document entry with serde, so fields a document does not name are
//! never touched.
//!
//! ```ignore
//! #[derive(Default)]
//! struct Config {
//!     host: String,
//!     port: i64,
//!     timeout: Option<NullFloat64>,
//! }
//!
//! impl Record for Config {
//!     fn fields() -> FieldTable<Self> {
//!         FieldTable::<Self>::new()
//!             .field("Host", |c| &mut c.host)
//!             .env("APP_HOST")
//!             .field("Port", |c| &mut c.port)
//!             .env("APP_PORT")
//!             .optional("Timeout", |c| &mut c.timeout)
//!     }
//! }
//! ```

use std::collections::HashSet;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::document;
use crate::error::{BoxError, ConfbindError};
use crate::types::Value;

/// Typed mutable access to one field's storage.
pub enum Slot<'a> {
    Bool(&'a mut bool),
    Isize(&'a mut isize),
    I8(&'a mut i8),
    I16(&'a mut i16),
    I32(&'a mut i32),
    I64(&'a mut i64),
    F32(&'a mut f32),
    F64(&'a mut f64),
    Text(&'a mut String),
    /// A composite type. It is written only through the capabilities it
    /// opts into; without them the field is left alone.
    Aggregate(&'a mut dyn Delegate),
    /// A type the binder has no rule for, named for the error message.
    Unsupported(&'static str),
}

impl Slot<'_> {
    /// Name of the declared kind, used in errors and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Slot::Bool(_) => "bool",
            Slot::Isize(_) => "isize",
            Slot::I8(_) => "i8",
            Slot::I16(_) => "i16",
            Slot::I32(_) => "i32",
            Slot::I64(_) => "i64",
            Slot::F32(_) => "f32",
            Slot::F64(_) => "f64",
            Slot::Text(_) => "text",
            Slot::Aggregate(_) => "aggregate",
            Slot::Unsupported(kind) => kind,
        }
    }
}

/// A type that can sit in a bindable field.
pub trait Field {
    fn slot(&mut self) -> Slot<'_>;
}

macro_rules! field_slot {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Field for $ty {
                fn slot(&mut self) -> Slot<'_> {
                    Slot::$variant(self)
                }
            }
        )*
    };
}

field_slot! {
    bool => Bool,
    isize => Isize,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    String => Text,
}

macro_rules! field_unsupported {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Field for $ty {
                fn slot(&mut self) -> Slot<'_> {
                    Slot::Unsupported(stringify!($ty))
                }
            }
        )*
    };
}

field_unsupported!(u8, u16, u32, u64, usize, char);

/// Ingest a raw option value.
pub trait ConsumesOption {
    fn consume_option(&mut self, value: &Value) -> Result<(), BoxError>;
}

/// Ingest the raw text of an environment variable.
///
/// The binder never calls this with an empty string; an empty variable is
/// treated as unset.
pub trait ConsumesEnvironmentText {
    fn consume_env_text(&mut self, text: &str) -> Result<(), BoxError>;
}

/// Capability lookup for [`Slot::Aggregate`] fields.
///
/// Both methods default to `None`, meaning "not supported from this source";
/// the binder then skips the field without error.
pub trait Delegate {
    fn as_option_consumer(&mut self) -> Option<&mut dyn ConsumesOption> {
        None
    }

    fn as_env_consumer(&mut self) -> Option<&mut dyn ConsumesEnvironmentText> {
        None
    }
}

/// Callback the binder passes in to receive a field's slot.
pub(crate) type SlotVisitor<'v> = &'v mut dyn for<'s> FnMut(Slot<'s>) -> Result<(), ConfbindError>;

type Access<T> = Box<dyn for<'r, 'v> Fn(&'r mut T, SlotVisitor<'v>) -> Result<(), ConfbindError>>;

/// A decoded document entry, waiting to be written into the record.
pub(crate) type Commit<T> = Box<dyn FnOnce(&mut T)>;

/// Receives the path of every nested document key serde skipped.
pub(crate) type IgnoredKeys<'i> = &'i mut dyn FnMut(String);

type Decoder<T> = Box<
    dyn for<'r, 'i> Fn(
        &'r mut T,
        serde_json::Value,
        IgnoredKeys<'i>,
    ) -> Result<Commit<T>, serde_json::Error>,
>;

/// One registered field.
pub struct FieldDescriptor<T> {
    name: &'static str,
    env: Option<&'static str>,
    indirect: bool,
    access: Access<T>,
    decoder: Decoder<T>,
}

impl<T> FieldDescriptor<T> {
    /// Key matched against option maps.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Environment variable name, if annotated.
    pub fn env(&self) -> Option<&'static str> {
        self.env
    }

    /// `true` for `Option<_>` fields registered with [`FieldTable::optional`].
    pub fn is_indirect(&self) -> bool {
        self.indirect
    }

    /// Hand this field's slot to `visit`.
    ///
    /// For an unset optional field a fresh default value is bound first and
    /// only stored when `visit` succeeds, so failures never leave a
    /// half-initialised `Some` behind.
    pub(crate) fn visit(&self, record: &mut T, visit: SlotVisitor<'_>) -> Result<(), ConfbindError> {
        (self.access)(record, visit)
    }

    /// Decode one document entry for this field without writing it.
    ///
    /// `null` stages the field type's `Default`. An object is merged onto the
    /// field's current value first, so nested keys the entry omits survive.
    pub(crate) fn decode(
        &self,
        record: &mut T,
        entry: serde_json::Value,
        ignored: IgnoredKeys<'_>,
    ) -> Result<Commit<T>, serde_json::Error> {
        (self.decoder)(record, entry, ignored)
    }
}

/// The descriptor table for a record type.
pub struct FieldTable<T> {
    fields: Vec<FieldDescriptor<T>>,
    problems: Vec<String>,
}

impl<T: 'static> FieldTable<T> {
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            problems: Vec::new(),
        }
    }

    /// Register a field stored directly in the record.
    pub fn field<F>(mut self, name: &'static str, access: fn(&mut T) -> &mut F) -> Self
    where
        F: Field + Serialize + DeserializeOwned + Default + 'static,
    {
        self.fields.push(FieldDescriptor {
            name,
            env: None,
            indirect: false,
            access: Box::new(move |record: &mut T, visit: SlotVisitor<'_>| {
                visit(access(record).slot())
            }),
            decoder: Box::new(
                move |record: &mut T, entry: serde_json::Value, ignored: IgnoredKeys<'_>| {
                    let value: F = document::decode_entry(Some(&*access(record)), entry, ignored)?;
                    let commit: Commit<T> = Box::new(move |record: &mut T| *access(record) = value);
                    Ok(commit)
                },
            ),
        });
        self
    }

    /// Register an `Option<F>` field, materialised on first write.
    ///
    /// A document `null` resets it to `None`.
    pub fn optional<F>(
        mut self,
        name: &'static str,
        access: fn(&mut T) -> &mut Option<F>,
    ) -> Self
    where
        F: Field + Serialize + DeserializeOwned + Default + 'static,
    {
        self.fields.push(FieldDescriptor {
            name,
            env: None,
            indirect: true,
            access: Box::new(move |record: &mut T, visit: SlotVisitor<'_>| {
                let target = access(record);
                if let Some(existing) = target.as_mut() {
                    return visit(existing.slot());
                }
                let mut fresh = F::default();
                visit(fresh.slot())?;
                *target = Some(fresh);
                Ok(())
            }),
            decoder: Box::new(
                move |record: &mut T, entry: serde_json::Value, ignored: IgnoredKeys<'_>| {
                    if entry.is_null() {
                        let commit: Commit<T> = Box::new(move |record: &mut T| *access(record) = None);
                        return Ok(commit);
                    }
                    let value: F = document::decode_entry(access(record).as_ref(), entry, ignored)?;
                    let commit: Commit<T> =
                        Box::new(move |record: &mut T| *access(record) = Some(value));
                    Ok(commit)
                },
            ),
        });
        self
    }

    /// Annotate the most recently registered field with an environment key.
    pub fn env(mut self, key: &'static str) -> Self {
        match self.fields.last_mut() {
            Some(field) => field.env = Some(key),
            None => self
                .problems
                .push(format!("env key '{key}' declared before any field")),
        }
        self
    }

    /// The field a document key refers to: an exact name match, or failing
    /// that the first name equal to `key` ignoring ASCII case.
    pub fn document_field(&self, key: &str) -> Option<&FieldDescriptor<T>> {
        self.fields
            .iter()
            .find(|f| f.name == key)
            .or_else(|| self.fields.iter().find(|f| f.name.eq_ignore_ascii_case(key)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor<T>> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Reject malformed tables before anything is written.
    pub fn validate(&self) -> Result<(), ConfbindError> {
        let shape = |reason: String| ConfbindError::Shape {
            record: std::any::type_name::<T>(),
            reason,
        };
        if let Some(problem) = self.problems.first() {
            return Err(shape(problem.clone()));
        }

        let mut names = HashSet::new();
        let mut env_keys = HashSet::new();
        for field in &self.fields {
            if field.name.is_empty() {
                return Err(shape("field with an empty key".into()));
            }
            if !names.insert(field.name) {
                return Err(shape(format!("duplicate field key '{}'", field.name)));
            }
            if let Some(env) = field.env {
                if env.is_empty() {
                    return Err(shape(format!("field '{}' has an empty env key", field.name)));
                }
                if !env_keys.insert(env) {
                    return Err(shape(format!("duplicate env key '{env}'")));
                }
            }
        }
        Ok(())
    }
}

impl<T: 'static> Default for FieldTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A destination record.
pub trait Record: Sized + 'static {
    /// Describe the bindable fields. Called at the start of every bind and
    /// every document decode.
    fn fields() -> FieldTable<Self>;
}
