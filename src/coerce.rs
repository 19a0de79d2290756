//! Numeric family checks and the widening/narrowing funnel.
//!
//! Every numeric binding path goes through [`to_i64`] or [`to_f64`], so the
//! rules for what counts as "an integer" or "a float" live here and nowhere
//! else. Widening is lossless. Narrowing back to the field's width is range
//! checked for integers; floats narrowed to `f32` round, but a finite value
//! that would become infinite is rejected.

use crate::error::ConversionError;
use crate::types::Value;

/// `true` for any signed integer width, directly or behind one `Ref`.
pub fn is_integer_like(v: &Value) -> bool {
    match v {
        Value::Int(_) | Value::Int8(_) | Value::Int16(_) | Value::Int32(_) | Value::Int64(_) => {
            true
        }
        Value::Ref(cell) => matches!(
            cell.get(),
            Value::Int(_) | Value::Int8(_) | Value::Int16(_) | Value::Int32(_) | Value::Int64(_)
        ),
        _ => false,
    }
}

/// `true` for `f32`/`f64`, directly or behind one `Ref`.
pub fn is_float_like(v: &Value) -> bool {
    match v {
        Value::Float32(_) | Value::Float64(_) => true,
        Value::Ref(cell) => matches!(cell.get(), Value::Float32(_) | Value::Float64(_)),
        _ => false,
    }
}

/// Widen an integer-family value to `i64`.
///
/// Fails without converting anything when `v` is not integer-like; text is
/// never parsed here.
pub fn to_i64(v: &Value) -> Result<i64, ConversionError> {
    if !is_integer_like(v) {
        return Err(ConversionError::NotInteger {
            found: found_name(v),
        });
    }
    match v.deref_once() {
        Value::Int(n) => Ok(n as i64),
        Value::Int8(n) => Ok(n.into()),
        Value::Int16(n) => Ok(n.into()),
        Value::Int32(n) => Ok(n.into()),
        Value::Int64(n) => Ok(n),
        other => Err(ConversionError::NotInteger {
            found: other.type_name(),
        }),
    }
}

/// Widen a float-family value to `f64`.
pub fn to_f64(v: &Value) -> Result<f64, ConversionError> {
    if !is_float_like(v) {
        return Err(ConversionError::NotFloat {
            found: found_name(v),
        });
    }
    match v.deref_once() {
        Value::Float32(x) => Ok(x.into()),
        Value::Float64(x) => Ok(x),
        other => Err(ConversionError::NotFloat {
            found: other.type_name(),
        }),
    }
}

fn found_name(v: &Value) -> &'static str {
    match v {
        Value::Ref(cell) => match cell.get() {
            Value::Ref(_) => "ref to ref",
            _ => "ref",
        },
        other => other.type_name(),
    }
}

/// Narrow a widened integer into a field of type `T`.
pub fn narrow_int<T: TryFrom<i64>>(n: i64, target: &'static str) -> Result<T, ConversionError> {
    T::try_from(n).map_err(|_| ConversionError::OutOfRange {
        value: n.to_string(),
        target,
    })
}

/// Narrow a widened float into an `f32` field.
pub fn narrow_f32(x: f64) -> Result<f32, ConversionError> {
    let narrowed = x as f32;
    if x.is_finite() && narrowed.is_infinite() {
        return Err(ConversionError::OutOfRange {
            value: x.to_string(),
            target: "f32",
        });
    }
    Ok(narrowed)
}

/// Parse a boolean literal.
///
/// Accepts `1 t T TRUE true True` and `0 f F FALSE false False`.
pub fn parse_bool(text: &str) -> Result<bool, ConversionError> {
    match text {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(ConversionError::ParseBool {
            text: text.to_string(),
        }),
    }
}

/// Parse a base-10 integer at the width of `T`; overflow is a parse error.
pub fn parse_int<T>(text: &str) -> Result<T, ConversionError>
where
    T: std::str::FromStr<Err = std::num::ParseIntError>,
{
    text.parse::<T>().map_err(|source| ConversionError::ParseInt {
        text: text.to_string(),
        source,
    })
}

/// Parse a float at the width of `T`.
pub fn parse_float<T>(text: &str) -> Result<T, ConversionError>
where
    T: std::str::FromStr<Err = std::num::ParseFloatError>,
{
    text.parse::<T>().map_err(|source| ConversionError::ParseFloat {
        text: text.to_string(),
        source,
    })
}
