use rusqlite::{params, Connection, Row};

use crate::error::CoreError;
use crate::types::{Item, ItemGroup, ItemIndex};

use super::ordered::{Dependent, OrderedEntity};

// ==============================================================================
// Item Groups
// ==============================================================================

impl OrderedEntity for ItemGroup {
    const TABLE: &'static str = "item_groups";
    const ID_COLUMN: &'static str = "group_id";
    const COLUMNS: &'static str =
        "group_id, uid, deleted, name, display_order, created_at, updated_at, deleted_at";
    const SCOPE_COLUMN: Option<&'static str> = None;
    const DEPENDENT: Dependent = Dependent {
        table: "items",
        column: "group_id",
    };

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            group_id: row.get(0)?,
            uid: row.get(1)?,
            deleted: row.get(2)?,
            name: row.get(3)?,
            display_order: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
            deleted_at: row.get(7)?,
        })
    }

    fn insert(&self, conn: &Connection) -> Result<(), CoreError> {
        conn.execute(
            "INSERT INTO item_groups \
             (group_id, uid, deleted, name, display_order, created_at, updated_at, deleted_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                self.group_id,
                self.uid,
                self.deleted,
                self.name,
                self.display_order,
                self.created_at,
                self.updated_at,
                self.deleted_at,
            ],
        )?;
        Ok(())
    }

    fn id(&self) -> i64 {
        self.group_id
    }

    fn scope_key(&self) -> i64 {
        0
    }

    fn display_order(&self) -> i32 {
        self.display_order
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn invalid_id(id: i64) -> CoreError {
        CoreError::ItemGroupIdInvalid(id)
    }

    fn not_found(id: i64) -> CoreError {
        CoreError::ItemGroupNotFound(id)
    }

    fn in_use(id: i64) -> CoreError {
        CoreError::ItemGroupInUse(id)
    }

    fn all_in_use() -> CoreError {
        CoreError::ItemGroupsInUse
    }
}

// ==============================================================================
// Items
// ==============================================================================

impl OrderedEntity for Item {
    const TABLE: &'static str = "items";
    const ID_COLUMN: &'static str = "item_id";
    const COLUMNS: &'static str =
        "item_id, uid, deleted, group_id, name, display_order, hidden, created_at, updated_at, deleted_at";
    const SCOPE_COLUMN: Option<&'static str> = Some("group_id");
    const DEPENDENT: Dependent = Dependent {
        table: "item_indexes",
        column: "item_id",
    };

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            item_id: row.get(0)?,
            uid: row.get(1)?,
            deleted: row.get(2)?,
            group_id: row.get(3)?,
            name: row.get(4)?,
            display_order: row.get(5)?,
            hidden: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
            deleted_at: row.get(9)?,
        })
    }

    fn insert(&self, conn: &Connection) -> Result<(), CoreError> {
        conn.execute(
            "INSERT INTO items \
             (item_id, uid, deleted, group_id, name, display_order, hidden, created_at, updated_at, deleted_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                self.item_id,
                self.uid,
                self.deleted,
                self.group_id,
                self.name,
                self.display_order,
                self.hidden,
                self.created_at,
                self.updated_at,
                self.deleted_at,
            ],
        )?;
        Ok(())
    }

    fn id(&self) -> i64 {
        self.item_id
    }

    fn scope_key(&self) -> i64 {
        self.group_id
    }

    fn display_order(&self) -> i32 {
        self.display_order
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn invalid_id(id: i64) -> CoreError {
        CoreError::ItemIdInvalid(id)
    }

    fn not_found(id: i64) -> CoreError {
        CoreError::ItemNotFound(id)
    }

    fn in_use(id: i64) -> CoreError {
        CoreError::ItemInUse(id)
    }

    fn all_in_use() -> CoreError {
        CoreError::ItemsInUse
    }
}

// ==============================================================================
// Item Indexes
// ==============================================================================

impl ItemIndex {
    pub(crate) fn insert(&self, conn: &Connection) -> Result<(), CoreError> {
        conn.execute(
            "INSERT INTO item_indexes \
             (index_id, uid, deleted, transaction_id, item_id, transaction_time, created_at, updated_at, deleted_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                self.index_id,
                self.uid,
                self.deleted,
                self.transaction_id,
                self.item_id,
                self.transaction_time,
                self.created_at,
                self.updated_at,
                self.deleted_at,
            ],
        )?;
        Ok(())
    }
}
