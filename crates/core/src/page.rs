//! Keyset pagination
//!
//! Every listing is "the newest `size` entries with id below `cursor`",
//! ordered by id descending. A cursor of 0 means "start from the newest".
//! The next page starts at the id of the last entry returned, so inserts
//! above the cursor never shift pages already handed out. A page shorter
//! than the requested size is the last one.

use crate::error::{Error, Result};
use crate::id::ItemId;
use crate::types::{DataItem, NamespaceMostRecentID};

/// Page size used when the caller asks for 0
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Position and size of one page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Page {
    cursor_id: i64,
    page_size: usize,
}

impl Page {
    /// Build a page from a raw cursor and size
    ///
    /// `cursor_id == 0` starts from the newest entry; `page_size == 0`
    /// selects [`DEFAULT_PAGE_SIZE`]. Negative cursors are rejected when the
    /// page is resolved by a store.
    pub const fn new(cursor_id: i64, page_size: usize) -> Self {
        Page {
            cursor_id,
            page_size,
        }
    }

    /// The newest `page_size` entries
    pub const fn first(page_size: usize) -> Self {
        Page::new(0, page_size)
    }

    /// Entries strictly older than `cursor`
    pub const fn after(cursor: ItemId, page_size: usize) -> Self {
        Page::new(cursor.as_i64(), page_size)
    }

    /// Raw cursor as supplied by the caller
    pub const fn cursor_id(&self) -> i64 {
        self.cursor_id
    }

    /// Effective number of entries per page
    pub const fn limit(&self) -> usize {
        if self.page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            self.page_size
        }
    }

    /// Exclusive upper bound on ids, or `None` for an unbounded first page
    pub fn upper_bound(&self) -> Result<Option<ItemId>> {
        match self.cursor_id {
            0 => Ok(None),
            c if c < 0 => Err(Error::validation(format!(
                "cursor must not be negative, got {}",
                c
            ))),
            c => Ok(Some(ItemId::new(c))),
        }
    }

    /// Page that follows `entries`, or `None` if `entries` was the last page
    pub fn following<T: Keyed>(&self, entries: &[T]) -> Option<Page> {
        if entries.len() < self.limit() {
            return None;
        }
        entries
            .last()
            .map(|last| Page::after(last.cursor_key(), self.page_size))
    }
}

/// Entries that can be used as keyset cursors
pub trait Keyed {
    /// Id to pass as the next page's cursor
    fn cursor_key(&self) -> ItemId;
}

impl Keyed for DataItem {
    fn cursor_key(&self) -> ItemId {
        self.id
    }
}

impl Keyed for NamespaceMostRecentID {
    fn cursor_key(&self) -> ItemId {
        self.most_recent_id
    }
}
