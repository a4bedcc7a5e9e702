//! Record types returned by the store
//!
//! - `DataItem`: one immutable version of a (namespace, key) pair
//! - `NamespaceMostRecentID`: the newest item id seen in a namespace
//! - `Content`: the string-keyed dictionary stored with each version

use crate::id::ItemId;
use crate::timestamp::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;

/// Content of a single version
///
/// Values are arbitrary JSON: nested objects, arrays, strings, numbers,
/// booleans and null.
pub type Content = serde_json::Map<String, serde_json::Value>;

/// Name of the content field matched by author-filtered listings
pub const AUTHOR_FIELD: &str = "author";

/// One immutable version of a key's content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataItem {
    /// Store-wide unique id, strictly increasing in creation order
    pub id: ItemId,
    /// Logical grouping of keys
    pub namespace: String,
    /// Entity within the namespace
    pub key: String,
    /// 1-based version of this (namespace, key) pair
    pub version: u64,
    /// Stored content
    pub content: Content,
    /// Creation time, derived from `id`
    pub event_time: Timestamp,
}

impl DataItem {
    /// Author recorded in the content, as text
    ///
    /// Strings are returned as-is; numbers and booleans in their JSON
    /// rendering (`7`, `1.5`, `true`). Null, objects and arrays have no
    /// author text.
    pub fn author(&self) -> Option<Cow<'_, str>> {
        match self.content.get(AUTHOR_FIELD)? {
            Value::String(s) => Some(Cow::Borrowed(s.as_str())),
            Value::Number(n) => Some(Cow::Owned(n.to_string())),
            Value::Bool(b) => Some(Cow::Borrowed(if *b { "true" } else { "false" })),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Whether the author text equals `author`
    pub fn is_authored_by(&self, author: &str) -> bool {
        self.author().as_deref() == Some(author)
    }
}

/// Most recent item id written to a namespace
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamespaceMostRecentID {
    /// Namespace name
    pub namespace: String,
    /// Id of its newest item
    pub most_recent_id: ItemId,
}
