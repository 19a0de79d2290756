//! Bind option maps, environment variables and JSON/TOML documents onto
//! typed configuration records.
//!
//! Confbind fills the fields of a record you already own from several
//! heterogeneous sources, converting each raw value to the field's declared
//! type and reporting exactly which field failed and why.
//!
//! ```ignore
//! let mut config = AppConfig::default();
//! confbind::load_configuration(&std::fs::read("app.json")?, &mut config)?;
//! ```
//!
//! That single call decodes the JSON document onto `config`, then overrides
//! any field annotated with an environment key from the process environment.
//!
//! # Describing a record
//!
//! There is no runtime reflection. A record implements [`Record`] and lists
//! its bindable fields once through a [`FieldTable`]:
//!
//! ```ignore
//! #[derive(Default)]
//! struct AppConfig {
//!     host: String,
//!     port: i64,
//!     timeout: NullFloat64,
//!     workers: Option<i32>,
//! }
//!
//! impl Record for AppConfig {
//!     fn fields() -> FieldTable<Self> {
//!         FieldTable::<Self>::new()
//!             .field("Host", |c| &mut c.host)
//!             .field("Port", |c| &mut c.port)
//!             .env("APP_PORT")
//!             .field("Timeout", |c| &mut c.timeout)
//!             .env("APP_TIMEOUT")
//!             .optional("Workers", |c| &mut c.workers)
//!     }
//! }
//! ```
//!
//! - The **name** is the key matched against option maps, exactly and
//!   case-sensitively. Document keys match it exactly first, then ignoring
//!   ASCII case.
//! - **`.env(key)`** annotates the preceding field with an environment
//!   variable. Fields without one are never read from the environment.
//! - **`.optional(...)`** registers an `Option<F>` field. It stays `None`
//!   until a source supplies a value, and is only set to `Some` when that
//!   value binds successfully.
//!
//! Malformed tables (empty or duplicate keys) are rejected with
//! [`ConfbindError::Shape`] before any field is written.
//!
//! Every registered field type is `Serialize + Deserialize + Default`:
//! documents decode each named entry into its own field with serde. The
//! record type itself needs no serde impls, and fields left out of the table
//! are never touched by any layer.
//!
//! # Field kinds
//!
//! | Field type | From an option map | From the environment |
//! |------------|--------------------|----------------------|
//! | `bool` | `Value::Bool` | `1 t T TRUE true True` / `0 f F FALSE false False` |
//! | `isize`, `i8`..`i64` | any integer width, range checked | base-10, at the field's width |
//! | `f32`, `f64` | either float width | float literal, at the field's width |
//! | `String` | `Value::Text` | the text as is |
//! | [`Nullable<T>`] | a value of exactly `T` | `T`'s textual grammar |
//! | custom [`Delegate`] | [`ConsumesOption`], if implemented | [`ConsumesEnvironmentText`], if implemented |
//! | unsigned, `char` | [`ConfbindError::UnsupportedKind`] | same |
//!
//! Text is never coerced into numbers on the option-map path. Each source
//! value may be wrapped once in a [`ValueRef`], read at bind time, which
//! lets option maps point at values filled in later (for instance by a
//! flag parser).
//!
//! A composite field that implements neither capability is left alone: it
//! can still be filled by documents, which go through serde.
//!
//! # Nullable values
//!
//! [`Nullable<T>`] (aliases [`NullBool`], [`NullString`], [`NullInt`],
//! [`NullInt8`]..[`NullInt64`], [`NullFloat32`], [`NullFloat64`]) carries a
//! value plus a presence flag. Absent encodes as an explicit `null` and a
//! `null` decodes as absent, so documents can say "unset" as opposed to
//! "not mentioned".
//!
//! # Layer precedence
//!
//! ```text
//! Current record        whatever `dest` already holds
//!        ↑ overridden by
//! Documents             .document() / .file(), later documents win
//!        ↑ overridden by
//! Environment vars      per-field env keys
//!        ↑ overridden by
//! Options               .options(), opt-in
//! ```
//!
//! Every layer is **sparse**: a key missing from a source leaves the field
//! as it was. An empty environment variable counts as unset. An explicit
//! `null` in a document resets the field to its type's `Default` value, and
//! a nested object is merged onto the field's current value.
//!
//! [`load_configuration`] wires the first two layers with the process
//! environment. [`Loader`] exposes all of them, plus TOML documents, files,
//! a replaceable [`EnvSource`] and strict mode.
//!
//! # Failure and partial mutation
//!
//! The first error stops binding and is returned as a [`ConfbindError`]
//! naming the field. Fields bound before it stay bound. When that is not
//! acceptable, use [`bind_options_atomic`], [`bind_env_atomic`] or
//! [`Loader::load_into_atomic`], which work on a copy and commit only on
//! success.
//!
//! # Strict mode
//!
//! With [`.strict(true)`](Loader::strict), a document key that the record
//! does not consume fails the load before anything is written:
//!
//! ```text
//! Unknown key 'Prot' in /etc/myapp/app.json (line 3)
//! ```
//!
//! # Logging
//!
//! Confbind emits [`tracing`](https://docs.rs/tracing) events: `debug` for
//! each layer and each skipped pass-through field, `trace` for every bound
//! field. It never installs a subscriber.

pub mod coerce;
pub mod error;
pub mod types;

mod bind;
mod builder;
mod document;
mod env;
mod field;
mod flatten;
pub(crate) mod merge;
mod nullable;
mod resolve;
mod validate;

#[cfg(test)]
mod fixtures;

pub use bind::{bind_env, bind_env_atomic, bind_env_from, bind_options, bind_options_atomic};
pub use builder::{Loader, load_configuration};
pub use env::{EnvSource, ProcessEnv};
pub use error::{BoxError, ConfbindError, ConversionError, DecodeError};
pub use field::{
    ConsumesEnvironmentText, ConsumesOption, Delegate, Field, FieldDescriptor, FieldTable, Record,
    Slot,
};
pub use nullable::{
    NullBool, NullFloat32, NullFloat64, NullInt, NullInt8, NullInt16, NullInt32, NullInt64,
    NullString, Nullable, Primitive,
};
pub use resolve::Loadable;
pub use types::{Format, Options, Value, ValueRef};
