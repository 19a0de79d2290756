//! The field binder: write option-map values and environment text into a
//! record through its [`FieldTable`](crate::FieldTable).
//!
//! Both entry points walk the table in declaration order:
//!
//! 1. Look the field's key up in the source. Missing keys are skipped and the
//!    field keeps whatever it held.
//! 2. Resolve the field's slot. An unset `Option<_>` field is materialised
//!    here, and only kept if the write succeeds.
//! 3. Dispatch on the slot's kind: convert and assign, delegate to the
//!    field's own ingestion hook, or fail with the field's name.
//!
//! The first error stops the walk. Fields bound before it stay bound; use
//! the `_atomic` variants when that is not acceptable.

use tracing::{debug, trace};

use crate::coerce;
use crate::env::{EnvSource, ProcessEnv};
use crate::error::{ConfbindError, ConversionError};
use crate::field::{Record, Slot};
use crate::types::{Options, Value};

/// Bind option-map values onto `dest`.
///
/// Keys match each field's registered name exactly (case-sensitive). Numeric
/// fields accept any value of the same family and are range checked on the
/// way in; no text is ever parsed into a number.
pub fn bind_options<T: Record>(options: &Options, dest: &mut T) -> Result<(), ConfbindError> {
    let table = T::fields();
    table.validate()?;

    for field in table.iter() {
        let name = field.name();
        let Some(value) = options.get(name) else {
            continue;
        };
        trace!(field = name, value = %value, "binding option");
        field.visit(dest, &mut |slot| assign_option(name, slot, value))?;
    }
    Ok(())
}

/// Bind environment variables from the process environment onto `dest`.
pub fn bind_env<T: Record>(dest: &mut T) -> Result<(), ConfbindError> {
    bind_env_from(&ProcessEnv, dest)
}

/// Bind environment variables from `env` onto `dest`.
///
/// Only fields annotated with [`env`](crate::FieldTable::env) take part.
/// An unset or empty variable leaves the field untouched.
pub fn bind_env_from<T: Record, E: EnvSource + ?Sized>(
    env: &E,
    dest: &mut T,
) -> Result<(), ConfbindError> {
    let table = T::fields();
    table.validate()?;

    for field in table.iter() {
        let Some(key) = field.env() else {
            continue;
        };
        let text = match env.var(key) {
            Some(text) if !text.is_empty() => text,
            _ => continue,
        };
        let name = field.name();
        trace!(field = name, env = key, "binding environment variable");
        field.visit(dest, &mut |slot| assign_env_text(name, slot, &text))?;
    }
    Ok(())
}

/// Like [`bind_options`], but `dest` is only replaced when every field binds.
pub fn bind_options_atomic<T: Record + Clone>(
    options: &Options,
    dest: &mut T,
) -> Result<(), ConfbindError> {
    let mut scratch = dest.clone();
    bind_options(options, &mut scratch)?;
    *dest = scratch;
    Ok(())
}

/// Like [`bind_env_from`], but `dest` is only replaced when every field binds.
pub fn bind_env_atomic<T: Record + Clone, E: EnvSource + ?Sized>(
    env: &E,
    dest: &mut T,
) -> Result<(), ConfbindError> {
    let mut scratch = dest.clone();
    bind_env_from(env, &mut scratch)?;
    *dest = scratch;
    Ok(())
}

fn assign_option(name: &str, slot: Slot<'_>, value: &Value) -> Result<(), ConfbindError> {
    let conversion = |source: ConversionError| ConfbindError::Conversion {
        field: name.to_string(),
        source,
    };
    let mismatch = |expected: &'static str| ConfbindError::TypeMismatch {
        field: name.to_string(),
        expected,
        found: value.type_name(),
    };

    match slot {
        Slot::Bool(target) => match value.deref_once() {
            Value::Bool(b) => *target = b,
            _ => return Err(mismatch("bool")),
        },
        Slot::Text(target) => match value.deref_once() {
            Value::Text(s) => *target = s,
            _ => return Err(mismatch("text")),
        },
        Slot::Isize(target) => *target = widen_int(value, "isize").map_err(conversion)?,
        Slot::I8(target) => *target = widen_int(value, "i8").map_err(conversion)?,
        Slot::I16(target) => *target = widen_int(value, "i16").map_err(conversion)?,
        Slot::I32(target) => *target = widen_int(value, "i32").map_err(conversion)?,
        Slot::I64(target) => *target = coerce::to_i64(value).map_err(conversion)?,
        Slot::F32(target) => {
            let wide = coerce::to_f64(value).map_err(conversion)?;
            *target = coerce::narrow_f32(wide).map_err(conversion)?;
        }
        Slot::F64(target) => *target = coerce::to_f64(value).map_err(conversion)?,
        Slot::Aggregate(delegate) => match delegate.as_option_consumer() {
            Some(consumer) => {
                consumer
                    .consume_option(value)
                    .map_err(|source| ConfbindError::Delegation {
                        field: name.to_string(),
                        source,
                    })?;
            }
            None => debug!(field = name, "aggregate field takes no options, leaving it as is"),
        },
        Slot::Unsupported(kind) => {
            return Err(ConfbindError::UnsupportedKind {
                field: name.to_string(),
                kind,
            });
        }
    }
    Ok(())
}

fn widen_int<N: TryFrom<i64>>(
    value: &Value,
    target: &'static str,
) -> Result<N, ConversionError> {
    let wide = coerce::to_i64(value)?;
    coerce::narrow_int(wide, target)
}

fn assign_env_text(name: &str, slot: Slot<'_>, text: &str) -> Result<(), ConfbindError> {
    let conversion = |source: ConversionError| ConfbindError::Conversion {
        field: name.to_string(),
        source,
    };

    match slot {
        Slot::Bool(target) => *target = coerce::parse_bool(text).map_err(conversion)?,
        Slot::Text(target) => *target = text.to_string(),
        Slot::Isize(target) => *target = coerce::parse_int(text).map_err(conversion)?,
        Slot::I8(target) => *target = coerce::parse_int(text).map_err(conversion)?,
        Slot::I16(target) => *target = coerce::parse_int(text).map_err(conversion)?,
        Slot::I32(target) => *target = coerce::parse_int(text).map_err(conversion)?,
        Slot::I64(target) => *target = coerce::parse_int(text).map_err(conversion)?,
        Slot::F32(target) => *target = coerce::parse_float(text).map_err(conversion)?,
        Slot::F64(target) => *target = coerce::parse_float(text).map_err(conversion)?,
        Slot::Aggregate(delegate) => match delegate.as_env_consumer() {
            Some(consumer) => {
                consumer
                    .consume_env_text(text)
                    .map_err(|source| ConfbindError::Delegation {
                        field: name.to_string(),
                        source,
                    })?;
            }
            None => debug!(
                field = name,
                "aggregate field takes no environment text, leaving it as is"
            ),
        },
        Slot::Unsupported(kind) => {
            return Err(ConfbindError::UnsupportedKind {
                field: name.to_string(),
                kind,
            });
        }
    }
    Ok(())
}
