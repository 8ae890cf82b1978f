//! Response envelope normalization
//!
//! The backend wraps payloads inconsistently: some endpoints return the
//! record directly, others nest it under `data`, a few under `data.data`.
//! Every call site goes through [`normalize`] instead of probing the
//! nesting itself.

use serde_json::Value;

/// Unwrap `data` envelopes until the innermost payload is reached.
///
/// A `data` member only counts as an envelope when it holds an object or an
/// array; `{"data": null}` or `{"data": 3}` are returned as-is. Unwrapping runs
/// to a fixpoint so `normalize(normalize(x)) == normalize(x)` for every `x`.
pub fn normalize(body: Value) -> Value {
    let mut current = body;
    while let Some(inner) = take_envelope(&mut current) {
        current = inner;
    }
    current
}

/// Decode a raw transport body and normalize it.
///
/// Empty bodies (204, or a blank 200) yield `None`: "no payload", which is
/// not an error by itself. Bodies that are not JSON are kept as a string so
/// error messages can still surface them.
pub fn normalize_bytes(bytes: &[u8]) -> Option<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return None;
    }

    match serde_json::from_slice::<Value>(bytes) {
        Ok(value) => Some(normalize(value)),
        Err(_) => Some(Value::String(String::from_utf8_lossy(bytes).trim().to_string())),
    }
}

fn take_envelope(value: &mut Value) -> Option<Value> {
    let map = value.as_object_mut()?;
    match map.get("data") {
        Some(Value::Object(_)) | Some(Value::Array(_)) => map.remove("data"),
        _ => None,
    }
}

/// Best-effort human message from an error body.
pub(crate) fn error_message(body: Option<&Value>) -> Option<String> {
    match body? {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Object(map) => map
            .get("message")
            .or_else(|| map.get("error").and_then(|e| e.get("message")))
            .or_else(|| map.get("error"))
            .and_then(|m| match m {
                Value::String(s) => Some(s.clone()),
                Value::Array(parts) => Some(
                    parts
                        .iter()
                        .map(|p| p.as_str().map(str::to_string).unwrap_or_else(|| p.to_string()))
                        .collect::<Vec<_>>()
                        .join("; "),
                ),
                _ => None,
            }),
        _ => None,
    }
}
