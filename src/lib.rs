//! versakv - Append-only versioned key-value store
//!
//! Every write to a `(namespace, key)` pair creates a new immutable version.
//! Items carry a store-wide, time-ordered id from which their event time is
//! derived, and every listing is keyset-paginated newest first.
//!
//! # Quick Start
//!
//! ```ignore
//! use versakv::{DataItemStore, Page, SqliteStore};
//!
//! let store = SqliteStore::open_dir("./data")?;
//! let content = serde_json::json!({"author": "a", "foo": "bar"});
//! let item = store.store("n", "k", content.as_object().cloned().unwrap())?;
//!
//! let newest = store.list_items("n", "k", Page::first(10))?;
//! if let Some(next) = Page::first(10).following(&newest) {
//!     let older = store.list_items("n", "k", next)?;
//! }
//! ```
//!
//! # Backends
//!
//! - [`SqliteStore`]: pooled SQLite database, configured via `versakv.toml`
//! - [`MemoryStore`]: in-process store with identical semantics, for tests
//!   and embedding

pub use versakv_core::*;
pub use versakv_engine::{schema, SqliteStore, StoreConfig, CONFIG_FILE_NAME, DATABASE_FILE_NAME};
pub use versakv_storage::MemoryStore;
