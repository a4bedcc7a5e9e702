//! Core trait for versioned item storage
//!
//! This module defines the `DataItemStore` trait that enables swapping the
//! relational backend for the in-memory test double without changing callers.

use crate::error::Result;
use crate::page::Page;
use crate::types::{Content, DataItem, NamespaceMostRecentID};

/// Append-only, versioned item store
///
/// Every write appends a new immutable version of a (namespace, key) pair.
/// Listings use keyset pagination (see [`Page`]): entries come back ordered
/// by id descending and the id of the last entry is the next cursor.
///
/// Thread safety: all methods must be safe to call concurrently from
/// multiple threads (requires Send + Sync). Concurrent writers to the same
/// pair must receive distinct, contiguous versions.
///
/// # Examples
///
/// ```ignore
/// use versakv_core::{DataItemStore, Page};
///
/// let first = store.store("n", "k", content)?;
/// assert_eq!(first.version, 1);
///
/// let newest = store.list_items("n", "k", Page::first(10))?;
/// ```
pub trait DataItemStore: Send + Sync {
    /// Append a new version of `(namespace, key)`
    ///
    /// Assigns the next version and a fresh id, and advances the namespace's
    /// most recent id, all in one atomic step.
    ///
    /// # Errors
    ///
    /// `Validation` for bad identifiers or oversized content, `Encoding` if
    /// the content cannot be serialized, `Backend` if the write fails. A
    /// failed write leaves no trace.
    fn store(&self, namespace: &str, key: &str, content: Content) -> Result<DataItem>;

    /// Every stored version of `(namespace, key)`
    ///
    /// Unpaginated. The order of the returned items is unspecified.
    fn history_of(&self, namespace: &str, key: &str) -> Result<Vec<DataItem>>;

    /// Versions of `(namespace, key)` below the page cursor, newest first
    fn list_items(&self, namespace: &str, key: &str, page: Page) -> Result<Vec<DataItem>>;

    /// Like [`DataItemStore::list_items`], restricted to items whose
    /// `content.author` is the string `author`
    ///
    /// The filter applies before the page limit: each page holds up to
    /// `page.limit()` matching items.
    fn list_by_author(
        &self,
        namespace: &str,
        key: &str,
        author: &str,
        page: Page,
    ) -> Result<Vec<DataItem>>;

    /// Namespaces ordered by most recent id descending, below the page cursor
    fn list_namespaces(&self, page: Page) -> Result<Vec<NamespaceMostRecentID>>;
}
