//! SqliteStore: the relational `DataItemStore`
//!
//! This module provides the production backend:
//! - Connection pooling (`r2d2` + `r2d2_sqlite`), one checkout per operation
//! - Schema initialization on open
//! - The atomic write path: id allocation, version assignment and namespace
//!   tracking inside one `BEGIN IMMEDIATE` transaction
//! - Keyset listings executed as single statements
//!
//! ## Timeouts and cancellation
//!
//! Each operation runs under a `Deadline` built from the handle's timeout
//! and cancellation token. While it is in flight, a SQLite progress handler
//! polls the deadline and interrupts the statement once it fires, and the
//! busy handler gives up waiting on another writer's lock. Either way the
//! open transaction rolls back and the caller gets a `Timeout` or
//! `Cancelled` backend error.

pub mod config;
mod connection;
pub mod schema;

pub use config::{StoreConfig, CONFIG_FILE_NAME, DATABASE_FILE_NAME};

use std::path::Path;
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, Row, TransactionBehavior};
use tracing::{debug, info};

use versakv_core::{
    decode_content, encode_content, next_id, BackendErrorKind, CancellationToken, Clock, Content,
    DataItem, DataItemStore, Deadline, Error, ItemId, Limits, NamespaceMostRecentID, Page,
    Result, Timestamp,
};

use crate::error::OpError;
use connection::WatchedConnection;

/// Row shape shared by every item query
struct ItemRow {
    id: i64,
    namespace: String,
    key: String,
    version: i64,
    content: String,
}

impl ItemRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(ItemRow {
            id: row.get(0)?,
            namespace: row.get(1)?,
            key: row.get(2)?,
            version: row.get(3)?,
            content: row.get(4)?,
        })
    }

    fn into_item(self) -> Result<DataItem> {
        let id = ItemId::new(self.id);
        let version = u64::try_from(self.version).map_err(|_| {
            Error::Encoding(format!("item {} has invalid version {}", id, self.version))
        })?;
        Ok(DataItem {
            id,
            namespace: self.namespace,
            key: self.key,
            version,
            content: decode_content(&self.content)?,
            event_time: id.timestamp(),
        })
    }
}

/// SQLite-backed `DataItemStore`
///
/// Cloning is cheap: clones share the connection pool. Per-handle settings
/// (`with_timeout`, `with_cancellation`) only affect the returned handle.
///
/// # Example
///
/// ```text
/// use versakv_engine::SqliteStore;
/// use versakv_core::{DataItemStore, Page};
///
/// let store = SqliteStore::open_dir("/path/to/data")?;
/// let item = store.store("n", "k", content)?;
/// let page = store.list_items("n", "k", Page::first(10))?;
/// ```
#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<SqliteConnectionManager>,
    limits: Limits,
    clock: Clock,
    busy_timeout: Duration,
    timeout: Option<Duration>,
    token: Option<CancellationToken>,
}

impl SqliteStore {
    /// Open (or create) the store in a data directory
    ///
    /// Loads `versakv.toml` from the directory, creating it with defaults on
    /// first open, and uses `versakv.db` as the database file.
    pub fn open_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| {
            Error::backend(
                BackendErrorKind::Connection,
                format!("Failed to create data directory '{}': {}", dir.display(), e),
            )
        })?;
        let config = StoreConfig::load_or_create(dir)?;
        Self::open(dir.join(DATABASE_FILE_NAME), config)
    }

    /// Open (or create) the database file at `path`
    pub fn open<P: AsRef<Path>>(path: P, config: StoreConfig) -> Result<Self> {
        config.validate()?;
        let path = path.as_ref();
        let journal_mode = config.journal_mode_pragma()?;
        let synchronous = config.synchronous_pragma()?;
        let busy_timeout = config.busy_timeout();

        let manager = SqliteConnectionManager::file(path).with_init(move |conn| {
            conn.busy_timeout(busy_timeout)?;
            conn.pragma_update(None, "journal_mode", journal_mode)?;
            conn.pragma_update(None, "synchronous", synchronous)?;
            Ok(())
        });
        let pool = Pool::builder()
            .max_size(config.pool_size)
            .connection_timeout(config.connection_timeout())
            .build(manager)
            .map_err(|e| {
                Error::backend(
                    BackendErrorKind::Connection,
                    format!("Failed to open database '{}': {}", path.display(), e),
                )
            })?;

        info!(
            target: "versakv::sqlite",
            path = %path.display(),
            pool_size = config.pool_size,
            journal_mode,
            "Opened store"
        );
        Self::with_pool(pool, &config)
    }

    /// Build a store over an existing pool
    ///
    /// The pool is shared, not owned: its lifecycle stays with the caller.
    /// Creates the schema if it is missing.
    pub fn with_pool(pool: Pool<SqliteConnectionManager>, config: &StoreConfig) -> Result<Self> {
        let store = SqliteStore {
            pool,
            limits: Limits::default(),
            clock: Timestamp::now,
            busy_timeout: config.busy_timeout(),
            timeout: config.operation_timeout(),
            token: None,
        };
        store.run("initialize", &Deadline::unbounded(), |conn| {
            schema::initialize(conn)?;
            Ok(())
        })?;
        Ok(store)
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

    /// The shared connection pool
    pub fn pool(&self) -> &Pool<SqliteConnectionManager> {
        &self.pool
    }

    fn deadline(&self) -> Deadline {
        Deadline::start(self.timeout, self.token.clone())
    }

    fn validate_pair(&self, namespace: &str, key: &str) -> Result<()> {
        self.limits.validate_namespace(namespace)?;
        self.limits.validate_key(key)
    }

    /// Run one backend round-trip on a pooled connection
    fn run<T>(
        &self,
        operation: &'static str,
        deadline: &Deadline,
        f: impl FnOnce(&mut Connection) -> std::result::Result<T, OpError>,
    ) -> Result<T> {
        deadline.check()?;
        let mut conn = WatchedConnection::checkout(&self.pool, deadline, self.busy_timeout)?;
        f(&mut *conn).map_err(|e| e.resolve(operation, deadline))
    }

    fn query_items(
        &self,
        operation: &'static str,
        deadline: &Deadline,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<DataItem>> {
        let rows = self.run(operation, deadline, |conn| {
            let mut stmt = conn.prepare_cached(sql)?;
            let rows = stmt
                .query_map(params, ItemRow::read)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })?;
        rows.into_iter().map(ItemRow::into_item).collect()
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("pool_size", &self.pool.max_size())
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn limit_param(page: &Page) -> i64 {
    i64::try_from(page.limit()).unwrap_or(i64::MAX)
}

impl DataItemStore for SqliteStore {
    fn store(&self, namespace: &str, key: &str, content: Content) -> Result<DataItem> {
        let deadline = self.deadline();
        self.validate_pair(namespace, key)?;
        self.limits.validate_content(&content)?;
        let encoded = encode_content(&content)?;
        self.limits.validate_encoded_len(encoded.len())?;

        let (id, version) = self.run("store", &deadline, |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let last: Option<i64> = tx.query_row(schema::SELECT_LAST_ID, [], |row| row.get(0))?;
            let id = next_id(last.map(ItemId::new), (self.clock)()).ok_or_else(|| {
                Error::backend(BackendErrorKind::Exhausted, "item id space exhausted")
            })?;

            let version: i64 = tx.query_row(
                schema::INSERT_ITEM,
                params![id.as_i64(), namespace, key, encoded],
                |row| row.get(0),
            )?;
            tx.execute(schema::UPSERT_NAMESPACE, params![namespace, id.as_i64()])?;
            tx.commit()?;
            Ok((id, version))
        })?;

        let version = u64::try_from(version).map_err(|_| {
            Error::Encoding(format!("item {} has invalid version {}", id, version))
        })?;
        debug!(target: "versakv::sqlite", namespace, key, %id, version, "Stored item");
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
        let items = self.query_items(
            "history_of",
            &deadline,
            schema::SELECT_HISTORY,
            params![namespace, key],
        )?;
        debug!(target: "versakv::sqlite", namespace, key, count = items.len(), "Read history");
        Ok(items)
    }

    fn list_items(&self, namespace: &str, key: &str, page: Page) -> Result<Vec<DataItem>> {
        let deadline = self.deadline();
        self.validate_pair(namespace, key)?;
        let limit = limit_param(&page);
        let items = match page.upper_bound()? {
            None => self.query_items(
                "list_items",
                &deadline,
                schema::SELECT_ITEMS,
                params![namespace, key, limit],
            )?,
            Some(bound) => self.query_items(
                "list_items",
                &deadline,
                schema::SELECT_ITEMS_BEFORE,
                params![namespace, key, bound.as_i64(), limit],
            )?,
        };
        debug!(
            target: "versakv::sqlite",
            namespace,
            key,
            cursor = page.cursor_id(),
            limit,
            count = items.len(),
            "Listed items"
        );
        Ok(items)
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
        let limit = limit_param(&page);
        let items = match page.upper_bound()? {
            None => self.query_items(
                "list_by_author",
                &deadline,
                schema::SELECT_ITEMS_BY_AUTHOR,
                params![namespace, key, author, limit],
            )?,
            Some(bound) => self.query_items(
                "list_by_author",
                &deadline,
                schema::SELECT_ITEMS_BY_AUTHOR_BEFORE,
                params![namespace, key, author, bound.as_i64(), limit],
            )?,
        };
        debug!(
            target: "versakv::sqlite",
            namespace,
            key,
            author,
            cursor = page.cursor_id(),
            limit,
            count = items.len(),
            "Listed items by author"
        );
        Ok(items)
    }

    fn list_namespaces(&self, page: Page) -> Result<Vec<NamespaceMostRecentID>> {
        let deadline = self.deadline();
        let limit = limit_param(&page);
        let bound = page.upper_bound()?;
        let rows = self.run("list_namespaces", &deadline, |conn| {
            let read = |row: &Row<'_>| -> rusqlite::Result<(String, i64)> {
                Ok((row.get(0)?, row.get(1)?))
            };
            let rows = match bound {
                None => {
                    let mut stmt = conn.prepare_cached(schema::SELECT_NAMESPACES)?;
                    let rows = stmt.query_map(params![limit], read)?;
                    rows.collect::<rusqlite::Result<Vec<_>>>()?
                }
                Some(bound) => {
                    let mut stmt = conn.prepare_cached(schema::SELECT_NAMESPACES_BEFORE)?;
                    let rows = stmt.query_map(params![bound.as_i64(), limit], read)?;
                    rows.collect::<rusqlite::Result<Vec<_>>>()?
                }
            };
            Ok(rows)
        })?;
        debug!(
            target: "versakv::sqlite",
            cursor = page.cursor_id(),
            limit,
            count = rows.len(),
            "Listed namespaces"
        );
        Ok(rows
            .into_iter()
            .map(|(namespace, id)| NamespaceMostRecentID {
                namespace,
                most_recent_id: ItemId::new(id),
            })
            .collect())
    }
}
