//! Secondary indices for the in-memory backend
//!
//! - VersionIndex: (namespace, key) → ids of its versions, oldest first
//! - NamespaceIndex: namespace ↔ most recent id, ordered by id
//!
//! Both are only mutated under the store's write lock, together with the
//! primary item map.

use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use versakv_core::{ItemId, NamespaceMostRecentID};

/// Secondary index: (namespace, key) → version chain
///
/// Position `i` of a chain holds the id of version `i + 1`, so the chain
/// length is the current version count.
#[derive(Debug, Default)]
pub struct VersionIndex {
    chains: FxHashMap<String, FxHashMap<String, Vec<ItemId>>>,
}

impl VersionIndex {
    /// Create a new empty VersionIndex
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the id of the next version; returns that version number
    pub fn push(&mut self, namespace: &str, key: &str, id: ItemId) -> u64 {
        let chain = self
            .chains
            .entry(namespace.to_string())
            .or_default()
            .entry(key.to_string())
            .or_default();
        debug_assert!(chain.last().map_or(true, |last| *last < id));
        chain.push(id);
        chain.len() as u64
    }

    /// Ids of every version, oldest first
    pub fn chain(&self, namespace: &str, key: &str) -> &[ItemId] {
        self.chains
            .get(namespace)
            .and_then(|keys| keys.get(key))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Ids below `bound` (all when `None`), newest first
    pub fn newest_below(
        &self,
        namespace: &str,
        key: &str,
        bound: Option<ItemId>,
    ) -> impl Iterator<Item = ItemId> + '_ {
        self.chain(namespace, key)
            .iter()
            .rev()
            .copied()
            .filter(move |id| bound.map_or(true, |b| *id < b))
    }
}

/// Secondary index: namespace → most recent id
///
/// `by_id` mirrors `latest` so namespaces can be listed by most recent id.
/// Ids are unique per item and every item belongs to one namespace, so no
/// two namespaces share a most recent id.
#[derive(Debug, Default)]
pub struct NamespaceIndex {
    latest: FxHashMap<String, ItemId>,
    by_id: BTreeMap<ItemId, String>,
}

impl NamespaceIndex {
    /// Create a new empty NamespaceIndex
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a write; the entry only moves forward
    pub fn advance(&mut self, namespace: &str, id: ItemId) {
        match self.latest.get_mut(namespace) {
            Some(current) if *current >= id => {}
            Some(current) => {
                self.by_id.remove(&*current);
                *current = id;
                self.by_id.insert(id, namespace.to_string());
            }
            None => {
                self.latest.insert(namespace.to_string(), id);
                self.by_id.insert(id, namespace.to_string());
            }
        }
    }

    /// Up to `limit` entries below `bound`, newest first
    pub fn newest_below(&self, bound: Option<ItemId>, limit: usize) -> Vec<NamespaceMostRecentID> {
        let range = match bound {
            Some(b) => self.by_id.range(..b),
            None => self.by_id.range(..),
        };
        range
            .rev()
            .take(limit)
            .map(|(id, namespace)| NamespaceMostRecentID {
                namespace: namespace.clone(),
                most_recent_id: *id,
            })
            .collect()
    }
}
