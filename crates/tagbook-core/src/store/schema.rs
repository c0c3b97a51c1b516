//! SQLite schema for one user-data partition, versioned via
//! `PRAGMA user_version`.

use rusqlite::Connection;

use crate::error::CoreError;

pub const SCHEMA_VERSION: i64 = 1;

// No uniqueness constraint on display_order or name: both are convention
// checked at write time, and concurrent appends may legitimately collide.
const SCHEMA_V1: &str = "
CREATE TABLE IF NOT EXISTS item_groups (
    group_id        INTEGER PRIMARY KEY NOT NULL,
    uid             INTEGER NOT NULL,
    deleted         INTEGER NOT NULL DEFAULT 0,
    name            TEXT NOT NULL,
    display_order   INTEGER NOT NULL,
    created_at      INTEGER NOT NULL,
    updated_at      INTEGER NOT NULL,
    deleted_at      INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_item_groups_uid_deleted_order
    ON item_groups(uid, deleted, display_order);

CREATE TABLE IF NOT EXISTS items (
    item_id         INTEGER PRIMARY KEY NOT NULL,
    uid             INTEGER NOT NULL,
    deleted         INTEGER NOT NULL DEFAULT 0,
    group_id        INTEGER NOT NULL DEFAULT 0,
    name            TEXT NOT NULL,
    display_order   INTEGER NOT NULL,
    hidden          INTEGER NOT NULL DEFAULT 0,
    created_at      INTEGER NOT NULL,
    updated_at      INTEGER NOT NULL,
    deleted_at      INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_items_uid_deleted_group_order
    ON items(uid, deleted, group_id, display_order);
CREATE INDEX IF NOT EXISTS idx_items_uid_deleted_name
    ON items(uid, deleted, name);

CREATE TABLE IF NOT EXISTS item_indexes (
    index_id          INTEGER PRIMARY KEY NOT NULL,
    uid               INTEGER NOT NULL,
    deleted           INTEGER NOT NULL DEFAULT 0,
    transaction_id    INTEGER NOT NULL,
    item_id           INTEGER NOT NULL,
    transaction_time  INTEGER NOT NULL,
    created_at        INTEGER NOT NULL,
    updated_at        INTEGER NOT NULL,
    deleted_at        INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_item_indexes_uid_deleted_item_tx
    ON item_indexes(uid, deleted, item_id, transaction_id);
CREATE INDEX IF NOT EXISTS idx_item_indexes_uid_deleted_time_item
    ON item_indexes(uid, deleted, transaction_time, item_id);
CREATE INDEX IF NOT EXISTS idx_item_indexes_uid_deleted_tx
    ON item_indexes(uid, deleted, transaction_id);
";

pub fn schema_version(conn: &Connection) -> Result<i64, CoreError> {
    Ok(conn.query_row("PRAGMA user_version", [], |row| row.get(0))?)
}

pub fn migrate(conn: &Connection) -> Result<(), CoreError> {
    let current = schema_version(conn)?;
    if current > SCHEMA_VERSION {
        return Err(CoreError::UnsupportedSchemaVersion {
            found: current,
            supported: SCHEMA_VERSION,
        });
    }

    if current < 1 {
        conn.execute_batch(SCHEMA_V1)?;
        conn.execute_batch("PRAGMA user_version = 1")?;
        tracing::debug!(version = 1, "applied user data schema");
    }

    Ok(())
}
