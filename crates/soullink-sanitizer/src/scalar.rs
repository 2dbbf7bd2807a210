//! Strict scalar checks for untrusted JSON values

use serde_json::{Map, Value};

/// Largest pair id accepted from external input (2^53 - 1)
pub(crate) const MAX_PAIR_ID: u64 = 9_007_199_254_740_991;

/// Non-negative finite number as `u64`; fractions are floored
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn as_count_u64(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    if f.is_finite() && f >= 0.0 {
        Some(f.floor() as u64)
    } else {
        None
    }
}

/// Non-negative finite number as `u32`, saturating at `u32::MAX`
pub(crate) fn as_count(value: &Value) -> Option<u32> {
    as_count_u64(value).map(|n| u32::try_from(n).unwrap_or(u32::MAX))
}

/// Finite number as `i64` (timestamps), fractions floored
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub(crate) fn as_timestamp(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    if f.is_finite() && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f.floor() as i64)
    } else {
        None
    }
}

/// Display value: strings as is, numbers rendered
pub(crate) fn as_display(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Field lookup on an optional object
pub(crate) fn field<'v>(obj: Option<&'v Map<String, Value>>, key: &str) -> Option<&'v Value> {
    obj.and_then(|o| o.get(key))
}

/// String field
pub(crate) fn str_field(obj: Option<&Map<String, Value>>, key: &str) -> Option<String> {
    field(obj, key).and_then(Value::as_str).map(str::to_string)
}

/// Truthiness of any JSON value: `false`, `0`, `""` and `null` are false
pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
