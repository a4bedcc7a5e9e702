//! Core types and traits for versakv
//!
//! This crate defines the foundational types shared by every backend:
//! - ItemId: store-wide unique, time-ordered item identity
//! - Timestamp: event time derived from item ids
//! - DataItem / NamespaceMostRecentID: records returned by the store
//! - Page: keyset pagination window
//! - Limits: identifier and content validation
//! - Error: error taxonomy (validation, encoding, backend)
//! - DataItemStore: the store trait implemented by each backend

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cancel;
pub mod codec;
pub mod error;
pub mod id;
pub mod limits;
pub mod page;
pub mod timestamp;
pub mod traits;
pub mod types;

pub use cancel::{CancellationToken, Deadline};
pub use codec::{decode_content, encode_content};
pub use error::{BackendErrorKind, Error, Result};
pub use id::{next_id, timestamp_from_id, Clock, ItemId, ID_EPOCH_MILLIS, SEQUENCE_BITS};
pub use limits::Limits;
pub use page::{Keyed, Page, DEFAULT_PAGE_SIZE};
pub use timestamp::Timestamp;
pub use traits::DataItemStore;
pub use types::{Content, DataItem, NamespaceMostRecentID, AUTHOR_FIELD};
