//! Referential guard run before soft deletes.
//!
//! Both checks must run on the same transaction as the delete they protect.

use rusqlite::{params, Connection};

use crate::error::CoreError;

use super::ordered::OrderedEntity;

/// Fail with `E::in_use(id)` if any live dependent row of `uid` points at `id`.
pub fn ensure_not_referenced<E: OrderedEntity>(
    conn: &Connection,
    uid: i64,
    id: i64,
) -> Result<(), CoreError> {
    let dependent = E::DEPENDENT;
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE uid = ?1 AND deleted = 0 AND {} = ?2)",
        dependent.table, dependent.column
    );
    let referenced: bool = conn.query_row(&sql, params![uid, id], |row| row.get(0))?;
    if referenced {
        tracing::warn!(uid, id, table = E::TABLE, referenced_by = dependent.table, "delete refused, row still referenced");
        return Err(E::in_use(id));
    }
    Ok(())
}

/// Fail with `E::all_in_use()` if any live dependent row of `uid` points at
/// any row of `E` at all. Ungrouped items (`group_id = 0`) do not count.
pub fn ensure_owner_unreferenced<E: OrderedEntity>(
    conn: &Connection,
    uid: i64,
) -> Result<(), CoreError> {
    let dependent = E::DEPENDENT;
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE uid = ?1 AND deleted = 0 AND {} > 0)",
        dependent.table, dependent.column
    );
    let referenced: bool = conn.query_row(&sql, params![uid], |row| row.get(0))?;
    if referenced {
        tracing::warn!(uid, table = E::TABLE, referenced_by = dependent.table, "bulk delete refused, rows still referenced");
        return Err(E::all_in_use());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::schema;
    use crate::types::{Item, ItemGroup};

    fn conn_with(sql: &str) -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        schema::migrate(&conn).unwrap();
        conn.execute_batch(sql).unwrap();
        conn
    }

    #[test]
    fn live_item_blocks_group_delete() {
        let conn = conn_with(
            "INSERT INTO items (item_id, uid, group_id, name, display_order, created_at, updated_at) \
             VALUES (10, 1, 5, 'coffee', 1, 0, 0);",
        );
        assert!(matches!(
            ensure_not_referenced::<ItemGroup>(&conn, 1, 5),
            Err(CoreError::ItemGroupInUse(5))
        ));
        // Other owners and other groups are unaffected.
        assert!(ensure_not_referenced::<ItemGroup>(&conn, 2, 5).is_ok());
        assert!(ensure_not_referenced::<ItemGroup>(&conn, 1, 6).is_ok());
    }

    #[test]
    fn deleted_dependents_do_not_count() {
        let conn = conn_with(
            "INSERT INTO item_indexes (index_id, uid, deleted, transaction_id, item_id, transaction_time, created_at, updated_at) \
             VALUES (1, 1, 1, 100, 10, 0, 0, 0);",
        );
        assert!(ensure_not_referenced::<Item>(&conn, 1, 10).is_ok());
        assert!(ensure_owner_unreferenced::<Item>(&conn, 1).is_ok());
    }

    #[test]
    fn ungrouped_items_do_not_block_deleting_all_groups() {
        let conn = conn_with(
            "INSERT INTO items (item_id, uid, group_id, name, display_order, created_at, updated_at) \
             VALUES (10, 1, 0, 'coffee', 1, 0, 0);",
        );
        assert!(ensure_owner_unreferenced::<ItemGroup>(&conn, 1).is_ok());

        conn.execute("UPDATE items SET group_id = 3 WHERE item_id = 10", [])
            .unwrap();
        assert!(matches!(
            ensure_owner_unreferenced::<ItemGroup>(&conn, 1),
            Err(CoreError::ItemGroupsInUse)
        ));
    }
}
