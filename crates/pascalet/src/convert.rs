//! Explicit value conversion (`ToInt`/`ToFloat`/`ToString`/`ToBool` and the
//! named-target `ConvertTo`).
//!
//! Conversions are identity for the same type, lossy-but-defined between
//! the numeric types, parsing for string sources, and the documented
//! keyword table for string-to-boolean. Every other combination fails with
//! a [`ConversionError`](crate::error::RunError::Conversion).

use crate::{
    error::{RunError, RunResult},
    ident,
    value::Value,
};

/// Integer view with parsing: integers and integer variants pass through,
/// floats truncate, strings parse.
pub fn to_int(value: &Value) -> RunResult<i64> {
    if let Some(n) = value.as_int() {
        return Ok(n);
    }
    match value {
        Value::Float(x) => {
            if x.is_finite() && *x >= i64::MIN as f64 && *x <= i64::MAX as f64 {
                Ok(x.trunc() as i64)
            } else {
                Err(RunError::conversion("FLOAT", "INTEGER", value.to_string()))
            }
        }
        Value::Str(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| RunError::conversion("STRING", "INTEGER", &**s)),
        other => Err(RunError::conversion(other.type_name(), "INTEGER", other.to_string())),
    }
}

/// Float view with parsing: numbers widen, strings parse (the `INF`/`NaN`
/// spellings round-trip through the standard parser).
pub fn to_float(value: &Value) -> RunResult<f64> {
    if let Some(x) = value.as_float() {
        return Ok(x);
    }
    match value {
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| RunError::conversion("STRING", "FLOAT", &**s)),
        other => Err(RunError::conversion(other.type_name(), "FLOAT", other.to_string())),
    }
}

/// Boolean view. Strings accept `True`/`False`/`Yes`/`No`/`1`/`0`/`T`/`F`/
/// `Y`/`N` case-insensitively, with the empty string reading as false;
/// integers map non-zero to true.
pub fn to_bool(value: &Value) -> RunResult<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
            "" | "false" | "no" | "n" | "f" | "0" => Ok(false),
            "true" | "yes" | "y" | "t" | "1" => Ok(true),
            _ => Err(RunError::conversion("STRING", "BOOLEAN", &**s)),
        },
        Value::Variant(v) => to_bool(&v.unwrap_variant()),
        other => match other.as_int() {
            Some(n) => Ok(n != 0),
            None => Err(RunError::conversion(other.type_name(), "BOOLEAN", other.to_string())),
        },
    }
}

/// String view — defined for every value (its display form).
#[must_use]
pub fn to_display_string(value: &Value) -> String {
    value.to_string()
}

/// Conversion to a named target type. The target name is matched
/// case-insensitively against the built-in type names.
pub fn convert_to(value: &Value, target: &str) -> RunResult<Value> {
    // Identity conversion for an exact tag match (covers record type
    // names, enum tags, and the rest of the non-convertible family).
    if ident::eq_ignore_case(&value.type_name(), target) {
        return Ok(value.clone());
    }
    match ident::normalize(target).as_str() {
        "integer" => to_int(value).map(Value::Int),
        "float" => to_float(value).map(Value::Float),
        "boolean" => to_bool(value).map(Value::Bool),
        "string" => Ok(Value::string(value.to_string())),
        _ => Err(RunError::conversion(value.type_name(), target, value.to_string())),
    }
}
