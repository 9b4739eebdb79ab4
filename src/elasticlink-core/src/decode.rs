//! Response decoding.
//!
//! Bodies are decoded twice: into the typed [`Response`] envelope and into
//! an untyped [`Value`] tree stored in `Response::raw`. The typed pass is
//! best-effort per field: a field whose shape does not match keeps its
//! zero value instead of failing the whole decode.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::models::Response;

/// Decode a response body.
///
/// An empty body yields an envelope holding only `status`. A body that is
/// not JSON at all is an error.
pub fn decode_response(status: u16, body: &[u8]) -> Result<Response, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Response {
            status,
            ..Response::default()
        });
    }

    let raw: Value = serde_json::from_slice(body)?;

    // Repeated keys are already collapsed in the tree, last one wins
    let mut response = match Response::deserialize(&raw) {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!(error = %e, "body does not fit the envelope, keeping raw tree only");
            Response::default()
        }
    };

    if response.status == 0 {
        response.status = status;
    }
    response.raw = raw;

    Ok(response)
}

/// Deserialize `T`, falling back to `T::default()` on a shape mismatch
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    match T::deserialize(value) {
        Ok(parsed) => Ok(parsed),
        Err(e) => {
            tracing::debug!(error = %e, "dropping field with unexpected shape");
            Ok(T::default())
        }
    }
}

fn value_as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        // {"value": 12, "relation": "eq"}
        Value::Object(map) => map.get("value").and_then(value_as_u64),
        _ => None,
    }
}

/// Unsigned integer given as a number, a numeric string, or `{"value": n}`
pub(crate) fn number_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_as_u64(&value).unwrap_or_default())
}

pub(crate) fn number_u16<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_as_u64(&value)
        .and_then(|n| u16::try_from(n).ok())
        .unwrap_or_default())
}

/// Float that may be `null` or a numeric string
pub(crate) fn optional_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Error message given either as a string or as a structured object.
///
/// Objects become `"<type>: <reason>"`, or their JSON text when they carry
/// no reason.
pub(crate) fn error_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Object(map) => match (map.get("type"), map.get("reason")) {
            (Some(Value::String(kind)), Some(Value::String(reason))) => {
                format!("{kind}: {reason}")
            }
            (_, Some(Value::String(reason))) => reason.clone(),
            _ => Value::Object(map).to_string(),
        },
        other => other.to_string(),
    })
}
