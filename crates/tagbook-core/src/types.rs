//! Domain types for Tagbook's item catalog.
//!
//! Contains the persisted row types (`ItemGroup`, `Item`, `ItemIndex`), the
//! request shapes accepted by [`crate::catalog::ItemCatalog`], and the small
//! validation helpers shared by both.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Longest accepted group or item name, counted in characters.
pub const MAX_NAME_CHARS: usize = 64;

/// Group id stored on items that do not belong to any group.
pub const UNGROUPED: i64 = 0;

// ==============================================================================
// Persisted Rows
// ==============================================================================

/// A flat, user-owned bucket that items can be filed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemGroup {
    pub group_id: i64,
    pub uid: i64,
    pub deleted: bool,
    pub name: String,
    pub display_order: i32,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: i64,
}

/// A label that can be attached to transactions.
///
/// `display_order` is only meaningful among items of the same owner that
/// share `group_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub item_id: i64,
    pub uid: i64,
    pub deleted: bool,
    pub group_id: i64,
    pub name: String,
    pub display_order: i32,
    pub hidden: bool,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: i64,
}

/// Association row linking one transaction to one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemIndex {
    pub index_id: i64,
    pub uid: i64,
    pub deleted: bool,
    pub transaction_id: i64,
    pub item_id: i64,
    pub transaction_time: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: i64,
}

// ==============================================================================
// Requests
// ==============================================================================

/// One item to create. `group_id` of [`UNGROUPED`] files it at the top level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub group_id: i64,
    pub name: String,
}

/// Bulk item creation. Every entry must carry the batch's `group_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemBatch {
    pub group_id: i64,
    pub items: Vec<NewItem>,
    pub skip_existing: bool,
}

/// Full replacement of an item's editable name and group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemChanges {
    pub item_id: i64,
    pub group_id: i64,
    pub name: String,
}

/// One `(id, new display order)` pair of a reorder request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayOrderChange {
    pub id: i64,
    pub display_order: i32,
}

// ==============================================================================
// Validation Helpers
// ==============================================================================

/// Trim and validate a user-supplied name. `empty` is the error reported
/// for blank input, so groups and items keep distinct messages.
pub fn validate_name(raw: &str, empty: CoreError) -> Result<String, CoreError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(empty);
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(CoreError::NameTooLong {
            max: MAX_NAME_CHARS,
        });
    }
    Ok(name.to_string())
}

pub fn ensure_uid(uid: i64) -> Result<(), CoreError> {
    if uid <= 0 {
        return Err(CoreError::UserIdInvalid(uid));
    }
    Ok(())
}

/// Current wall-clock time in unix seconds.
pub fn now_unix() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}
