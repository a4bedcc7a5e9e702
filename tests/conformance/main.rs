//! Backend conformance suite
//!
//! Every check in `scenarios` runs against each `DataItemStore` backend.
//! `differential` replays one random workload on both backends and
//! compares what they return.

mod differential;
mod scenarios;

use tempfile::TempDir;
use versakv::{DataItemStore, MemoryStore, SqliteStore};

/// A backend under test plus whatever keeps it alive
pub struct Fixture {
    pub store: Box<dyn DataItemStore>,
    _dir: Option<TempDir>,
}

pub fn memory() -> Fixture {
    Fixture {
        store: Box::new(MemoryStore::new()),
        _dir: None,
    }
}

pub fn sqlite() -> Fixture {
    let dir = TempDir::new().unwrap();
    let store = SqliteStore::open_dir(dir.path()).unwrap();
    Fixture {
        store: Box::new(store),
        _dir: Some(dir),
    }
}

macro_rules! conformance {
    ($($scenario:ident),* $(,)?) => {
        mod memory_backend {
            $(
                #[test]
                fn $scenario() {
                    let fixture = crate::memory();
                    crate::scenarios::$scenario(fixture.store.as_ref());
                }
            )*
        }

        mod sqlite_backend {
            $(
                #[test]
                fn $scenario() {
                    let fixture = crate::sqlite();
                    crate::scenarios::$scenario(fixture.store.as_ref());
                }
            )*
        }
    };
}

conformance!(
    store_then_history,
    versions_are_per_pair,
    ids_increase_across_namespaces,
    event_time_matches_id,
    list_items_walks_every_version_once,
    list_by_author_matches_author_text,
    list_namespaces_walks_by_recent_activity,
    default_page_size,
    cursor_is_exclusive,
    rejected_writes_leave_no_trace,
    negative_cursor_is_rejected,
    content_round_trips,
);
