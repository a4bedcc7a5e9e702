//! Item identity and ordering
//!
//! Every stored item gets an id that is unique across the store, strictly
//! increasing in creation order, and carries its creation time:
//!
//! ```text
//!  63        22 21        0
//! +------------+-----------+
//! | ms - epoch |  sequence |
//! +------------+-----------+
//! ```
//!
//! The upper bits hold milliseconds since [`ID_EPOCH_MILLIS`]; the low
//! [`SEQUENCE_BITS`] bits order items created within the same millisecond.
//! Allocation always yields `max(floor(now), last + 1)`, so a stalled or
//! rewound clock keeps ids increasing and derived timestamps non-decreasing.
//!
//! Allocation itself is not thread safe: backends call [`next_id`] while
//! holding their write lock (an exclusive SQLite transaction, or the
//! in-memory store's mutex).

use crate::timestamp::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Custom epoch for the id layout: 2020-01-01T00:00:00Z
pub const ID_EPOCH_MILLIS: u64 = 1_577_836_800_000;

/// Number of low bits reserved for the per-millisecond sequence
pub const SEQUENCE_BITS: u32 = 22;

/// Source of wall-clock time used for id allocation
pub type Clock = fn() -> Timestamp;

const MAX_MILLIS: u64 = (i64::MAX as u64) >> SEQUENCE_BITS;

/// Store-wide unique, strictly increasing item identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(i64);

impl ItemId {
    /// Wrap a raw id
    #[inline]
    pub const fn new(raw: i64) -> Self {
        ItemId(raw)
    }

    /// Raw integer value, as stored by the backend
    #[inline]
    pub const fn as_i64(self) -> i64 {
        self.0
    }

    /// The smallest id that can be allocated at `ts`
    pub fn floor_for(ts: Timestamp) -> Self {
        let millis = ts.as_millis().saturating_sub(ID_EPOCH_MILLIS).min(MAX_MILLIS);
        ItemId((millis << SEQUENCE_BITS) as i64)
    }

    /// Creation time encoded in this id
    #[inline]
    pub fn timestamp(self) -> Timestamp {
        timestamp_from_id(self)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ItemId> for i64 {
    fn from(id: ItemId) -> Self {
        id.0
    }
}

/// Derive the event time of an item from its id
///
/// Only the millisecond part of the id is meaningful; the sequence bits are
/// discarded. Negative ids (never allocated) map to the id epoch.
pub fn timestamp_from_id(id: ItemId) -> Timestamp {
    let millis = (id.0.max(0) as u64) >> SEQUENCE_BITS;
    Timestamp::from_millis(millis + ID_EPOCH_MILLIS)
}

/// Allocate the id following `last` at time `now`
///
/// Returns `None` once the id space is exhausted.
pub fn next_id(last: Option<ItemId>, now: Timestamp) -> Option<ItemId> {
    let successor = match last {
        Some(last) => last.0.checked_add(1)?,
        None => 1,
    };
    Some(ItemId(ItemId::floor_for(now).0.max(successor)))
}
