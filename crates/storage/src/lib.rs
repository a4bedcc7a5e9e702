//! In-memory storage backend for versakv
//!
//! This crate implements `DataItemStore` without a relational engine:
//! - MemoryStore: BTreeMap-based item table behind a `parking_lot::RwLock`
//! - VersionIndex: per-(namespace, key) version chains
//! - NamespaceIndex: most recent id per namespace, ordered for listing
//!
//! It honours the same versioning and keyset pagination invariants as the
//! SQLite backend and is the reference double in the conformance suite.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod index;
pub mod memory;

pub use index::{NamespaceIndex, VersionIndex};
pub use memory::MemoryStore;
