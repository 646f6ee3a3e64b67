//! Lenient accessors for upstream JSON
//!
//! Upstream feeds are inconsistent about numbers vs numeric strings, so every
//! numeric read goes through these helpers.

use serde_json::Value;

/// Integer from a JSON number or a numeric string. Floats are truncated.
pub fn json_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
        }
        _ => None,
    }
}

/// Float from a JSON number or a numeric string
pub fn json_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Non-empty trimmed string field
pub fn json_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// `obj.<outer>.<inner>` as a non-empty string
pub fn nested_str<'a>(value: &'a Value, outer: &str, inner: &str) -> Option<&'a str> {
    value.get(outer).and_then(|o| json_str(o, inner))
}

/// Identifier that may arrive as a number or a string
pub fn json_id(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                Some(s.to_string())
            }
        }
        _ => None,
    }
}

/// A non-negative counter that fits in `u32`; anything else is malformed
pub fn count(raw: i64) -> Option<u32> {
    u32::try_from(raw).ok()
}

/// `obj.<key>` as a goal count; missing or malformed reads as zero
pub fn goals(value: &Value, key: &str) -> u32 {
    value.get(key).and_then(json_i64).and_then(count).unwrap_or(0)
}
