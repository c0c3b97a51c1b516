use crate::error::CoreError;
use crate::store::{self, sort_for_display, write_tx, Field, OrderedEntity};
use crate::types::{ensure_uid, now_unix, validate_name, DisplayOrderChange, ItemGroup};

use super::ItemCatalog;

impl ItemCatalog {
    /// All live groups of `uid`, ordered by `display_order`.
    pub async fn list_groups(&self, uid: i64) -> Result<Vec<ItemGroup>, CoreError> {
        ensure_uid(uid)?;
        let conn = self.db.user_data(uid).await;
        let mut groups = store::list::<ItemGroup>(&conn, uid)?;
        sort_for_display(&mut groups);
        tracing::debug!(uid, count = groups.len(), "listed item groups");
        Ok(groups)
    }

    pub async fn get_group(&self, uid: i64, group_id: i64) -> Result<ItemGroup, CoreError> {
        ensure_uid(uid)?;
        let conn = self.db.user_data(uid).await;
        store::get::<ItemGroup>(&conn, uid, group_id)
    }

    pub async fn max_group_display_order(&self, uid: i64) -> Result<i32, CoreError> {
        ensure_uid(uid)?;
        let conn = self.db.user_data(uid).await;
        store::max_display_order::<ItemGroup>(&conn, uid, 0)
    }

    /// Create a group at the end of the owner's list.
    pub async fn create_group(&self, uid: i64, name: &str) -> Result<ItemGroup, CoreError> {
        ensure_uid(uid)?;
        let name = validate_name(name, CoreError::ItemGroupNameEmpty)?;
        let group_id = self.next_id().await?;
        let now = now_unix();

        let mut conn = self.db.user_data(uid).await;
        let group = write_tx(&mut conn, |tx| {
            let display_order = *store::next_display_orders::<ItemGroup>(tx, uid, 0, 1)?.start();
            let group = ItemGroup {
                group_id,
                uid,
                deleted: false,
                name,
                display_order,
                created_at: now,
                updated_at: now,
                deleted_at: 0,
            };
            group.insert(tx)?;
            Ok(group)
        })?;

        tracing::info!(uid, group_id, display_order = group.display_order, "created item group");
        Ok(group)
    }

    /// Rename a group. Renaming to the current name is `NothingWillBeUpdated`.
    pub async fn modify_group(
        &self,
        uid: i64,
        group_id: i64,
        name: &str,
    ) -> Result<ItemGroup, CoreError> {
        ensure_uid(uid)?;
        if group_id <= 0 {
            return Err(CoreError::ItemGroupIdInvalid(group_id));
        }
        let name = validate_name(name, CoreError::ItemGroupNameEmpty)?;
        let now = now_unix();

        let mut conn = self.db.user_data(uid).await;
        let group = write_tx(&mut conn, |tx| {
            let mut group = store::get::<ItemGroup>(tx, uid, group_id)?;
            if group.name == name {
                return Err(CoreError::NothingWillBeUpdated);
            }
            if store::update_fields::<ItemGroup>(tx, uid, &[group_id], &[Field::Name(&name)], now)?
                == 0
            {
                return Err(CoreError::ItemGroupNotFound(group_id));
            }
            group.name = name;
            group.updated_at = now;
            Ok(group)
        })?;

        tracing::info!(uid, group_id, "renamed item group");
        Ok(group)
    }

    /// Apply new display orders. Either every pair is applied or none is.
    pub async fn reorder_groups(
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
        write_tx(&mut conn, |tx| store::reorder::<ItemGroup>(tx, uid, changes, now))?;

        tracing::info!(uid, count = changes.len(), "reordered item groups");
        Ok(())
    }

    /// Soft-delete a group. Refused while any live item is filed under it.
    pub async fn delete_group(&self, uid: i64, group_id: i64) -> Result<(), CoreError> {
        ensure_uid(uid)?;
        let now = now_unix();

        let mut conn = self.db.user_data(uid).await;
        write_tx(&mut conn, |tx| {
            store::soft_delete::<ItemGroup>(tx, uid, group_id, now)
        })?;

        tracing::info!(uid, group_id, "deleted item group");
        Ok(())
    }

    /// Soft-delete every group of `uid`. Refused while any live item is in a group.
    pub async fn delete_all_groups(&self, uid: i64) -> Result<usize, CoreError> {
        ensure_uid(uid)?;
        let now = now_unix();

        let mut conn = self.db.user_data(uid).await;
        let deleted = write_tx(&mut conn, |tx| store::delete_all::<ItemGroup>(tx, uid, now))?;

        tracing::info!(uid, deleted, "deleted all item groups");
        Ok(deleted)
    }
}
