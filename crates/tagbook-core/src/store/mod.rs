//! Partitioned SQLite storage for user data.
//!
//! Every user's rows live in exactly one partition, chosen by
//! `uid % partitions`. Each partition is a single connection behind an async
//! mutex, so all work for a partition is serialized in-process; SQLite's own
//! locking covers other processes sharing the files.

mod guard;
mod ordered;
mod rows;
pub mod schema;

pub(crate) use ordered::{
    delete_all, find_by_names, get, get_many, list, max_display_order, name_exists,
    next_display_orders, reorder, soft_delete, update_fields, Field, IN_CHUNK_SIZE,
};
pub use ordered::{sort_for_display, Dependent, OrderedEntity};

use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, Transaction, TransactionBehavior};
use tokio::sync::{Mutex, MutexGuard};

use crate::error::CoreError;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Datastore {
    partitions: Vec<Mutex<Connection>>,
}

impl Datastore {
    /// Open (or create) `partitions` database files under `dir`, named
    /// `user_data_<n>.db`, migrating each to the current schema.
    pub fn open(dir: &Path, partitions: usize) -> Result<Self, CoreError> {
        std::fs::create_dir_all(dir)?;

        let partitions = (0..partitions.max(1))
            .map(|n| {
                let conn = Connection::open(dir.join(format!("user_data_{n}.db")))?;
                conn.busy_timeout(BUSY_TIMEOUT)?;
                schema::migrate(&conn)?;
                Ok(Mutex::new(conn))
            })
            .collect::<Result<Vec<_>, CoreError>>()?;

        tracing::info!(path = %dir.display(), partitions = partitions.len(), "opened user data store");
        Ok(Self { partitions })
    }

    /// Purely in-memory partitions, lost on drop.
    pub fn open_in_memory(partitions: usize) -> Result<Self, CoreError> {
        let partitions = (0..partitions.max(1))
            .map(|_| {
                let conn = Connection::open_in_memory()?;
                schema::migrate(&conn)?;
                Ok(Mutex::new(conn))
            })
            .collect::<Result<Vec<_>, CoreError>>()?;

        Ok(Self { partitions })
    }

    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// Lock the partition holding `uid`'s data.
    pub(crate) async fn user_data(&self, uid: i64) -> MutexGuard<'_, Connection> {
        let index = uid.rem_euclid(self.partitions.len() as i64) as usize;
        self.partitions[index].lock().await
    }
}

/// Run `f` inside an IMMEDIATE transaction, so the write lock is held from
/// the first read. Any error rolls the whole transaction back.
pub(crate) fn write_tx<T>(
    conn: &mut Connection,
    f: impl FnOnce(&Transaction<'_>) -> Result<T, CoreError>,
) -> Result<T, CoreError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let value = f(&tx)?;
    tx.commit()?;
    Ok(value)
}

/// Run read-only `f` against one consistent snapshot.
pub(crate) fn read_tx<T>(
    conn: &mut Connection,
    f: impl FnOnce(&Transaction<'_>) -> Result<T, CoreError>,
) -> Result<T, CoreError> {
    let tx = conn.transaction()?;
    let value = f(&tx)?;
    tx.commit()?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn owners_map_to_stable_partitions() {
        let db = Datastore::open_in_memory(3).unwrap();
        assert_eq!(db.partition_count(), 3);

        {
            let conn = db.user_data(4).await;
            conn.execute(
                "INSERT INTO item_groups (group_id, uid, name, display_order, created_at, updated_at) \
                 VALUES (1, 4, 'g', 1, 0, 0)",
                [],
            )
            .unwrap();
        }

        // uid 7 shares partition 1 with uid 4; uid 5 does not.
        let same: i64 = db
            .user_data(7)
            .await
            .query_row("SELECT COUNT(*) FROM item_groups", [], |row| row.get(0))
            .unwrap();
        let other: i64 = db
            .user_data(5)
            .await
            .query_row("SELECT COUNT(*) FROM item_groups", [], |row| row.get(0))
            .unwrap();
        assert_eq!(same, 1);
        assert_eq!(other, 0);
    }

    #[test]
    fn zero_partitions_means_one() {
        let db = Datastore::open_in_memory(0).unwrap();
        assert_eq!(db.partition_count(), 1);
    }

    #[test]
    fn failed_write_tx_rolls_back() {
        let mut conn = Connection::open_in_memory().unwrap();
        schema::migrate(&conn).unwrap();

        let result: Result<(), CoreError> = write_tx(&mut conn, |tx| {
            tx.execute(
                "INSERT INTO item_groups (group_id, uid, name, display_order, created_at, updated_at) \
                 VALUES (1, 1, 'g', 1, 0, 0)",
                [],
            )?;
            Err(CoreError::ItemGroupNotFound(2))
        });
        assert!(result.is_err());

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM item_groups", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn open_creates_partition_files() {
        let dir = tempfile::tempdir().unwrap();
        let db = Datastore::open(dir.path(), 2).unwrap();
        assert_eq!(db.partition_count(), 2);
        assert!(dir.path().join("user_data_0.db").exists());
        assert!(dir.path().join("user_data_1.db").exists());
    }
}
