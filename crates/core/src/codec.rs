//! Content encoding
//!
//! Content is stored as UTF-8 JSON text. Decoding insists on a top-level
//! object; anything else in storage means corruption or an encoding mismatch.

use crate::error::{Error, Result};
use crate::types::Content;
use serde_json::Value;

/// Encode content for storage
pub fn encode_content(content: &Content) -> Result<String> {
    Ok(serde_json::to_string(content)?)
}

/// Decode stored content
pub fn decode_content(encoded: &str) -> Result<Content> {
    match serde_json::from_str::<Value>(encoded)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::Encoding(format!(
            "stored content is not an object: {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
