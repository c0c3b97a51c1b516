use std::collections::HashMap;

use crate::error::CoreError;
use crate::store::{self, sort_for_display, write_tx, Field, OrderedEntity};
use crate::types::{
    ensure_uid, now_unix, validate_name, DisplayOrderChange, Item, ItemChanges, ItemGroup,
    NewItem, UNGROUPED,
};

use super::ItemCatalog;

fn check_group_id(group_id: i64) -> Result<(), CoreError> {
    if group_id < UNGROUPED {
        return Err(CoreError::ItemGroupIdInvalid(group_id));
    }
    Ok(())
}

impl ItemCatalog {
    // ==========================================================================
    // Reads
    // ==========================================================================

    /// All live items of `uid`, ordered by group then `display_order`.
    pub async fn list_items(&self, uid: i64) -> Result<Vec<Item>, CoreError> {
        ensure_uid(uid)?;
        let conn = self.db.user_data(uid).await;
        let mut items = store::list::<Item>(&conn, uid)?;
        sort_for_display(&mut items);
        tracing::debug!(uid, count = items.len(), "listed items");
        Ok(items)
    }

    pub async fn get_item(&self, uid: i64, item_id: i64) -> Result<Item, CoreError> {
        ensure_uid(uid)?;
        let conn = self.db.user_data(uid).await;
        store::get::<Item>(&conn, uid, item_id)
    }

    /// Live items of `uid` keyed by id. Ids that match nothing are omitted.
    pub async fn get_items_by_ids(
        &self,
        uid: i64,
        item_ids: &[i64],
    ) -> Result<HashMap<i64, Item>, CoreError> {
        ensure_uid(uid)?;
        let conn = self.db.user_data(uid).await;
        let items = store::get_many::<Item>(&conn, uid, item_ids)?;
        Ok(items.into_iter().map(|item| (item.item_id, item)).collect())
    }

    pub async fn count_items(&self, uid: i64) -> Result<i64, CoreError> {
        ensure_uid(uid)?;
        let conn = self.db.user_data(uid).await;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM items WHERE uid = ?1 AND deleted = 0",
            [uid],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub async fn max_item_display_order(&self, uid: i64, group_id: i64) -> Result<i32, CoreError> {
        ensure_uid(uid)?;
        check_group_id(group_id)?;
        let conn = self.db.user_data(uid).await;
        store::max_display_order::<Item>(&conn, uid, group_id)
    }

    // ==========================================================================
    // Writes
    // ==========================================================================

    /// Create an item at the end of its group. The name must not be used by
    /// any other live item of the owner, in any group.
    pub async fn create_item(&self, uid: i64, new: NewItem) -> Result<Item, CoreError> {
        ensure_uid(uid)?;
        check_group_id(new.group_id)?;
        let name = validate_name(&new.name, CoreError::ItemNameEmpty)?;
        let item_id = self.next_id().await?;
        let now = now_unix();

        let mut conn = self.db.user_data(uid).await;
        let item = write_tx(&mut conn, |tx| {
            if new.group_id != UNGROUPED {
                store::get::<ItemGroup>(tx, uid, new.group_id)?;
            }
            if store::name_exists::<Item>(tx, uid, &name)? {
                return Err(CoreError::NameAlreadyExists(name));
            }
            let display_order = *store::next_display_orders::<Item>(tx, uid, new.group_id, 1)?.start();
            let item = Item {
                item_id,
                uid,
                deleted: false,
                group_id: new.group_id,
                name,
                display_order,
                hidden: false,
                created_at: now,
                updated_at: now,
                deleted_at: 0,
            };
            item.insert(tx)?;
            Ok(item)
        })?;

        tracing::info!(uid, item_id, group_id = item.group_id, "created item");
        Ok(item)
    }

    /// Replace an item's name and group. Moving to another group puts the
    /// item at the end of that group.
    pub async fn modify_item(&self, uid: i64, changes: ItemChanges) -> Result<Item, CoreError> {
        ensure_uid(uid)?;
        if changes.item_id <= 0 {
            return Err(CoreError::ItemIdInvalid(changes.item_id));
        }
        check_group_id(changes.group_id)?;
        let name = validate_name(&changes.name, CoreError::ItemNameEmpty)?;
        let now = now_unix();

        let mut conn = self.db.user_data(uid).await;
        let item = write_tx(&mut conn, |tx| {
            let mut item = store::get::<Item>(tx, uid, changes.item_id)?;
            let name_changed = item.name != name;
            let group_changed = item.group_id != changes.group_id;
            if !name_changed && !group_changed {
                return Err(CoreError::NothingWillBeUpdated);
            }

            if group_changed {
                if changes.group_id != UNGROUPED {
                    store::get::<ItemGroup>(tx, uid, changes.group_id)?;
                }
                item.display_order =
                    *store::next_display_orders::<Item>(tx, uid, changes.group_id, 1)?.start();
            }
            if name_changed && store::name_exists::<Item>(tx, uid, &name)? {
                return Err(CoreError::NameAlreadyExists(name));
            }

            let fields = [
                Field::Name(&name),
                Field::GroupId(changes.group_id),
                Field::DisplayOrder(item.display_order),
            ];
            if store::update_fields::<Item>(tx, uid, &[item.item_id], &fields, now)? == 0 {
                return Err(CoreError::ItemNotFound(item.item_id));
            }
            item.name = name;
            item.group_id = changes.group_id;
            item.updated_at = now;
            Ok(item)
        })?;

        tracing::info!(
            uid,
            item_id = item.item_id,
            group_id = item.group_id,
            display_order = item.display_order,
            "modified item"
        );
        Ok(item)
    }

    /// Set the hidden flag on every listed item. Fails with `ItemNotFound`
    /// only when none of them is a live item of `uid`.
    pub async fn hide_items(&self, uid: i64, item_ids: &[i64], hidden: bool) -> Result<(), CoreError> {
        ensure_uid(uid)?;
        let Some(&first) = item_ids.first() else {
            return Err(CoreError::ItemIdListInvalid("no item ids given".to_string()));
        };
        let now = now_unix();

        let mut conn = self.db.user_data(uid).await;
        let updated = write_tx(&mut conn, |tx| {
            store::update_fields::<Item>(tx, uid, item_ids, &[Field::Hidden(hidden)], now)
        })?;
        if updated == 0 {
            return Err(CoreError::ItemNotFound(first));
        }

        tracing::info!(uid, count = updated, hidden, "changed item visibility");
        Ok(())
    }

    pub async fn hide_item(&self, uid: i64, item_id: i64, hidden: bool) -> Result<(), CoreError> {
        self.hide_items(uid, &[item_id], hidden).await
    }

    /// Apply new display orders. Either every pair is applied or none is.
    pub async fn reorder_items(
        &self,
        uid: i64,
        changes: &[DisplayOrderChange],
    ) -> Result<(), CoreError> {
        ensure_uid(uid)?;
        if changes.is_empty() {
            return Err(CoreError::EmptyDisplayOrders);
        }
        let now = now_unix();

        let mut conn = self.db.user_data(uid).await;
        write_tx(&mut conn, |tx| store::reorder::<Item>(tx, uid, changes, now))?;

        tracing::info!(uid, count = changes.len(), "reordered items");
        Ok(())
    }

    /// Soft-delete an item. Refused while any live transaction link points at it.
    pub async fn delete_item(&self, uid: i64, item_id: i64) -> Result<(), CoreError> {
        ensure_uid(uid)?;
        let now = now_unix();

        let mut conn = self.db.user_data(uid).await;
        write_tx(&mut conn, |tx| store::soft_delete::<Item>(tx, uid, item_id, now))?;

        tracing::info!(uid, item_id, "deleted item");
        Ok(())
    }

    /// Soft-delete every item of `uid`. Refused while any live transaction
    /// link exists for the owner.
    pub async fn delete_all_items(&self, uid: i64) -> Result<usize, CoreError> {
        ensure_uid(uid)?;
        let now = now_unix();

        let mut conn = self.db.user_data(uid).await;
        let deleted = write_tx(&mut conn, |tx| store::delete_all::<Item>(tx, uid, now))?;

        tracing::info!(uid, deleted, "deleted all items");
        Ok(deleted)
    }
}
