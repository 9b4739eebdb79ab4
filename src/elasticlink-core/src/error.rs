use thiserror::Error;

/// Caller-supplied data that cannot be turned into a request.
///
/// Always raised before anything reaches the network.
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("document fields must be a key/value record, got {found}")]
    InvalidFields { found: &'static str },

    #[error("document has no index")]
    MissingIndex,

    #[error("document has no explicit id")]
    MissingId,

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Typed read of an untyped response node that did not match.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("missing entry `{key}`")]
    Missing { key: String },

    #[error("entry `{key}` is not {expected}")]
    TypeMismatch { key: String, expected: &'static str },
}

/// Human readable name of a JSON value's variant, used in error messages.
pub fn kind_of(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
