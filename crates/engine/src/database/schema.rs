//! Relational schema and statements
//!
//! Two tables:
//! - `data_items`: one row per immutable version. `id` is the rowid alias
//!   and carries the creation time (see `versakv_core::id`).
//! - `namespace_most_recent_ids`: newest item id per namespace, maintained
//!   by the write path in the same transaction as the insert.
//!
//! Versions are assigned by the insert statement itself, counting existing
//! versions of the pair, so no caller-side read-then-write is involved.
//! `UNIQUE (namespace, key, version)` backs this up at the storage level.

use rusqlite::Connection;

/// Schema creation, idempotent
pub const CREATE_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS data_items (
    id        INTEGER PRIMARY KEY,
    namespace TEXT    NOT NULL CHECK (length(namespace) > 0),
    key       TEXT    NOT NULL CHECK (length(key) > 0),
    version   INTEGER NOT NULL CHECK (version > 0),
    content   TEXT    NOT NULL,
    UNIQUE (namespace, key, version)
);

CREATE INDEX IF NOT EXISTS data_items_by_pair
    ON data_items (namespace, key, id);

CREATE TABLE IF NOT EXISTS namespace_most_recent_ids (
    namespace      TEXT    PRIMARY KEY,
    most_recent_id INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS namespace_most_recent_ids_by_id
    ON namespace_most_recent_ids (most_recent_id);
";

/// Highest allocated id, NULL on an empty store
pub const SELECT_LAST_ID: &str = "SELECT MAX(id) FROM data_items";

/// Insert a version, computing its number in the same statement
pub const INSERT_ITEM: &str = "
INSERT INTO data_items (id, namespace, key, version, content)
SELECT ?1, ?2, ?3, COUNT(*) + 1, ?4
FROM data_items
WHERE namespace = ?2 AND key = ?3
RETURNING version";

/// Create or advance a namespace's most recent id
pub const UPSERT_NAMESPACE: &str = "
INSERT INTO namespace_most_recent_ids (namespace, most_recent_id)
VALUES (?1, ?2)
ON CONFLICT (namespace) DO UPDATE
    SET most_recent_id = excluded.most_recent_id
    WHERE excluded.most_recent_id > namespace_most_recent_ids.most_recent_id";

/// Every version of a pair, in no particular order
pub const SELECT_HISTORY: &str = "
SELECT id, namespace, key, version, content
FROM data_items
WHERE namespace = ?1 AND key = ?2";

/// Newest versions of a pair
pub const SELECT_ITEMS: &str = "
SELECT id, namespace, key, version, content
FROM data_items
WHERE namespace = ?1 AND key = ?2
ORDER BY id DESC
LIMIT ?3";

/// Newest versions of a pair below a cursor
pub const SELECT_ITEMS_BEFORE: &str = "
SELECT id, namespace, key, version, content
FROM data_items
WHERE namespace = ?1 AND key = ?2 AND id < ?3
ORDER BY id DESC
LIMIT ?4";

/// Newest versions of a pair written by an author
///
/// The author is compared as text: strings as-is, numbers and booleans in
/// their JSON rendering. Null, objects and arrays never match.
pub const SELECT_ITEMS_BY_AUTHOR: &str = "
SELECT id, namespace, key, version, content
FROM data_items
WHERE namespace = ?1 AND key = ?2
  AND CASE json_type(content, '$.author')
        WHEN 'text' THEN json_extract(content, '$.author')
        WHEN 'integer' THEN content -> '$.author'
        WHEN 'real' THEN content -> '$.author'
        WHEN 'true' THEN 'true'
        WHEN 'false' THEN 'false'
      END = ?3
ORDER BY id DESC
LIMIT ?4";

/// Newest versions of a pair written by an author, below a cursor
pub const SELECT_ITEMS_BY_AUTHOR_BEFORE: &str = "
SELECT id, namespace, key, version, content
FROM data_items
WHERE namespace = ?1 AND key = ?2
  AND CASE json_type(content, '$.author')
        WHEN 'text' THEN json_extract(content, '$.author')
        WHEN 'integer' THEN content -> '$.author'
        WHEN 'real' THEN content -> '$.author'
        WHEN 'true' THEN 'true'
        WHEN 'false' THEN 'false'
      END = ?3
  AND id < ?4
ORDER BY id DESC
LIMIT ?5";

/// Most recently written namespaces
pub const SELECT_NAMESPACES: &str = "
SELECT namespace, most_recent_id
FROM namespace_most_recent_ids
ORDER BY most_recent_id DESC
LIMIT ?1";

/// Most recently written namespaces below a cursor
pub const SELECT_NAMESPACES_BEFORE: &str = "
SELECT namespace, most_recent_id
FROM namespace_most_recent_ids
WHERE most_recent_id < ?1
ORDER BY most_recent_id DESC
LIMIT ?2";

/// Create tables and indices if they do not exist
pub fn initialize(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(CREATE_SCHEMA)
}
