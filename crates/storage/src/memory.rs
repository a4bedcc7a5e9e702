//! MemoryStore: in-process backend with the same contract as the SQLite store
//!
//! This module implements `DataItemStore` using:
//! - `BTreeMap<ItemId, StoredItem>` as the primary item table
//! - `VersionIndex` and `NamespaceIndex` as secondary indices
//! - `parking_lot::RwLock` for thread-safe access
//!
//! # Design Notes
//!
//! - **Single write lock**: id allocation, version assignment and the
//!   namespace index update happen under one write lock, so concurrent
//!   writers to the same pair get distinct, contiguous versions.
//! - **Encoded content**: content is stored encoded, exactly like the
//!   relational backend, so encoding failures and round-trip behaviour match.
//! - **All-or-nothing**: every check runs before the first mutation.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::debug;

use versakv_core::{
    decode_content, encode_content, next_id, BackendErrorKind, CancellationToken, Clock, Content,
    DataItem, DataItemStore, Deadline, Error, ItemId, Limits, NamespaceMostRecentID, Page,
    Result, Timestamp,
};

use crate::index::{NamespaceIndex, VersionIndex};

#[derive(Debug)]
struct StoredItem {
    namespace: String,
    key: String,
    version: u64,
    encoded: String,
}

#[derive(Debug, Default)]
struct MemoryState {
    items: BTreeMap<ItemId, StoredItem>,
    versions: VersionIndex,
    namespaces: NamespaceIndex,
    last_id: Option<ItemId>,
}

impl MemoryState {
    fn materialize(&self, id: ItemId) -> Result<DataItem> {
        let stored = self.items.get(&id).ok_or_else(|| {
            Error::backend(
                BackendErrorKind::Other,
                format!("index references missing item {}", id),
            )
        })?;
        Ok(DataItem {
            id,
            namespace: stored.namespace.clone(),
            key: stored.key.clone(),
            version: stored.version,
            content: decode_content(&stored.encoded)?,
            event_time: id.timestamp(),
        })
    }
}

/// In-memory `DataItemStore`
///
/// Clones share the same underlying data; per-handle settings (timeout,
/// cancellation) apply only to the handle they were set on.
///
/// # Example
///
/// ```
/// use versakv_core::{DataItemStore, Page};
/// use versakv_storage::MemoryStore;
///
/// let store = MemoryStore::new();
/// let content = serde_json::json!({"author": "a"}).as_object().cloned().unwrap();
/// let item = store.store("n", "k", content).unwrap();
/// assert_eq!(item.version, 1);
/// assert_eq!(store.list_items("n", "k", Page::first(10)).unwrap().len(), 1);
/// ```
#[derive(Clone)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
    limits: Limits,
    clock: Clock,
    timeout: Option<Duration>,
    token: Option<CancellationToken>,
}

impl MemoryStore {
    /// Create a new empty MemoryStore with default limits
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(MemoryState::default())),
            limits: Limits::default(),
            clock: Timestamp::now,
            timeout: None,
            token: None,
        }
    }

    /// Replace the validation limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Replace the clock used for id allocation
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Bound every operation on this handle by `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Abort operations on this handle once `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Total number of stored items
    pub fn len(&self) -> usize {
        self.state.read().items.len()
    }

    /// Check if nothing has been stored yet
    pub fn is_empty(&self) -> bool {
        self.state.read().items.is_empty()
    }

    fn deadline(&self) -> Deadline {
        Deadline::start(self.timeout, self.token.clone())
    }

    fn validate_pair(&self, namespace: &str, key: &str) -> Result<()> {
        self.limits.validate_namespace(namespace)?;
        self.limits.validate_key(key)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("items", &self.len())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl DataItemStore for MemoryStore {
    fn store(&self, namespace: &str, key: &str, content: Content) -> Result<DataItem> {
        let deadline = self.deadline();
        self.validate_pair(namespace, key)?;
        self.limits.validate_content(&content)?;
        let encoded = encode_content(&content)?;
        self.limits.validate_encoded_len(encoded.len())?;

        let mut state = self.state.write();
        deadline.check()?;

        let id = next_id(state.last_id, (self.clock)()).ok_or_else(|| {
            Error::backend(BackendErrorKind::Exhausted, "item id space exhausted")
        })?;
        let version = state.versions.push(namespace, key, id);
        state.items.insert(
            id,
            StoredItem {
                namespace: namespace.to_string(),
                key: key.to_string(),
                version,
                encoded,
            },
        );
        state.namespaces.advance(namespace, id);
        state.last_id = Some(id);
        drop(state);

        debug!(target: "versakv::memory", namespace, key, %id, version, "Stored item");
        Ok(DataItem {
            id,
            namespace: namespace.to_string(),
            key: key.to_string(),
            version,
            content,
            event_time: id.timestamp(),
        })
    }

    fn history_of(&self, namespace: &str, key: &str) -> Result<Vec<DataItem>> {
        let deadline = self.deadline();
        self.validate_pair(namespace, key)?;
        let state = self.state.read();
        deadline.check()?;
        state
            .versions
            .chain(namespace, key)
            .iter()
            .map(|id| state.materialize(*id))
            .collect()
    }

    fn list_items(&self, namespace: &str, key: &str, page: Page) -> Result<Vec<DataItem>> {
        let deadline = self.deadline();
        self.validate_pair(namespace, key)?;
        let bound = page.upper_bound()?;
        let state = self.state.read();
        deadline.check()?;
        state
            .versions
            .newest_below(namespace, key, bound)
            .take(page.limit())
            .map(|id| state.materialize(id))
            .collect()
    }

    fn list_by_author(
        &self,
        namespace: &str,
        key: &str,
        author: &str,
        page: Page,
    ) -> Result<Vec<DataItem>> {
        let deadline = self.deadline();
        self.validate_pair(namespace, key)?;
        let bound = page.upper_bound()?;
        let limit = page.limit();
        let state = self.state.read();
        deadline.check()?;

        let mut matched = Vec::with_capacity(limit.min(64));
        for id in state.versions.newest_below(namespace, key, bound) {
            if matched.len() == limit {
                break;
            }
            let item = state.materialize(id)?;
            if item.is_authored_by(author) {
                matched.push(item);
            }
        }
        Ok(matched)
    }

    fn list_namespaces(&self, page: Page) -> Result<Vec<NamespaceMostRecentID>> {
        let deadline = self.deadline();
        let bound = page.upper_bound()?;
        let state = self.state.read();
        deadline.check()?;
        Ok(state.namespaces.newest_below(bound, page.limit()))
    }
}
