//! Size limits for namespaces, keys and content
//!
//! Limits are checked before any backend round-trip. Violations surface as
//! [`Error::Validation`](crate::Error::Validation).

use crate::error::{Error, Result};
use crate::types::Content;
use serde_json::Value;

/// Size limits enforced on every write
#[derive(Debug, Clone)]
pub struct Limits {
    /// Maximum namespace length in bytes (default: 256)
    pub max_namespace_bytes: usize,

    /// Maximum key length in bytes (default: 1024)
    pub max_key_bytes: usize,

    /// Maximum encoded content size in bytes (default: 16MB)
    pub max_content_bytes: usize,

    /// Maximum nesting depth of content values (default: 128)
    pub max_nesting_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_namespace_bytes: 256,
            max_key_bytes: 1024,
            max_content_bytes: 16 * 1024 * 1024, // 16MB
            max_nesting_depth: 128,
        }
    }
}

impl Limits {
    /// Create limits with small values for testing
    pub fn with_small_limits() -> Self {
        Limits {
            max_namespace_bytes: 16,
            max_key_bytes: 32,
            max_content_bytes: 256,
            max_nesting_depth: 4,
        }
    }

    /// Validate a namespace name
    pub fn validate_namespace(&self, namespace: &str) -> Result<()> {
        validate_identifier("namespace", namespace, self.max_namespace_bytes)
    }

    /// Validate a key within a namespace
    pub fn validate_key(&self, key: &str) -> Result<()> {
        validate_identifier("key", key, self.max_key_bytes)
    }

    /// Validate content structure (nesting depth)
    ///
    /// Does NOT validate encoded size; see [`Limits::validate_encoded_len`].
    pub fn validate_content(&self, content: &Content) -> Result<()> {
        for value in content.values() {
            self.validate_value(value, 1)?;
        }
        Ok(())
    }

    /// Validate the size of encoded content
    pub fn validate_encoded_len(&self, len: usize) -> Result<()> {
        if len > self.max_content_bytes {
            return Err(Error::validation(format!(
                "content encodes to {} bytes, limit is {}",
                len, self.max_content_bytes
            )));
        }
        Ok(())
    }

    fn validate_value(&self, value: &Value, depth: usize) -> Result<()> {
        if depth > self.max_nesting_depth {
            return Err(Error::validation(format!(
                "content nesting depth exceeds {}",
                self.max_nesting_depth
            )));
        }
        match value {
            Value::Array(items) => items
                .iter()
                .try_for_each(|v| self.validate_value(v, depth + 1)),
            Value::Object(map) => map
                .values()
                .try_for_each(|v| self.validate_value(v, depth + 1)),
            _ => Ok(()),
        }
    }
}

fn validate_identifier(what: &str, value: &str, max_bytes: usize) -> Result<()> {
    if value.is_empty() {
        return Err(Error::validation(format!("{} must not be empty", what)));
    }
    if value.len() > max_bytes {
        return Err(Error::validation(format!(
            "{} is {} bytes, limit is {}",
            what,
            value.len(),
            max_bytes
        )));
    }
    if value.contains('\0') {
        return Err(Error::validation(format!("{} must not contain NUL", what)));
    }
    Ok(())
}
