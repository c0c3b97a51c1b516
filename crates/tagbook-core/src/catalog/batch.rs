use std::collections::{HashMap, HashSet};

use crate::error::CoreError;
use crate::store::{self, sort_for_display, write_tx, OrderedEntity};
use crate::types::{ensure_uid, now_unix, validate_name, Item, ItemBatch, ItemGroup, UNGROUPED};

use super::ItemCatalog;

/// Where one batch entry's result comes from.
enum Slot {
    /// A live item with the same name already existed.
    Stored(Item),
    /// Index into the rows created by this batch.
    Created(usize),
}

impl ItemCatalog {
    /// Create many items in one group, reconciling by name.
    ///
    /// Entries whose name matches a live item of the owner (or an earlier
    /// entry of the same batch) are not inserted: with `skip_existing` they
    /// resolve to the stored row, without it the whole batch fails with
    /// `NameAlreadyExists`. New rows take consecutive display orders after
    /// the group's current maximum, in request order.
    ///
    /// The result lists one item per entry, sorted by group then display order.
    pub async fn create_items_batch(&self, uid: i64, batch: ItemBatch) -> Result<Vec<Item>, CoreError> {
        ensure_uid(uid)?;
        if batch.group_id < UNGROUPED {
            return Err(CoreError::ItemGroupIdInvalid(batch.group_id));
        }
        let names = batch
            .items
            .iter()
            .map(|entry| {
                if entry.group_id != batch.group_id {
                    return Err(CoreError::BatchGroupMismatch {
                        batch: batch.group_id,
                        entry: entry.group_id,
                    });
                }
                validate_name(&entry.name, CoreError::ItemNameEmpty)
            })
            .collect::<Result<Vec<_>, _>>()?;
        if names.is_empty() {
            return Ok(Vec::new());
        }

        // One id per distinct name. Ids left over after reconciliation are
        // never used.
        let distinct = names.iter().collect::<HashSet<_>>().len();
        let ids = self.next_ids(distinct).await?;
        let now = now_unix();

        let mut conn = self.db.user_data(uid).await;
        let (slots, created) = write_tx(&mut conn, |tx| {
            if batch.group_id != UNGROUPED {
                store::get::<ItemGroup>(tx, uid, batch.group_id)?;
            }
            let stored: HashMap<String, Item> = store::find_by_names::<Item>(tx, uid, &names)?
                .into_iter()
                .map(|item| (item.name().to_string(), item))
                .collect();

            let mut slots = Vec::with_capacity(names.len());
            let mut fresh: Vec<String> = Vec::new();
            let mut fresh_slots: HashMap<String, usize> = HashMap::new();
            for name in names {
                let slot = if let Some(item) = stored.get(&name) {
                    Slot::Stored(item.clone())
                } else if let Some(&index) = fresh_slots.get(&name) {
                    Slot::Created(index)
                } else {
                    fresh_slots.insert(name.clone(), fresh.len());
                    fresh.push(name);
                    slots.push(Slot::Created(fresh.len() - 1));
                    continue;
                };
                if !batch.skip_existing {
                    tracing::warn!(uid, group_id = batch.group_id, %name, "batch refused, name already exists");
                    return Err(CoreError::NameAlreadyExists(name));
                }
                slots.push(slot);
            }
            if fresh.is_empty() {
                return Ok((slots, Vec::new()));
            }

            let orders =
                store::next_display_orders::<Item>(tx, uid, batch.group_id, fresh.len())?;
            let mut created = Vec::with_capacity(fresh.len());
            for ((name, item_id), display_order) in fresh.into_iter().zip(ids).zip(orders) {
                let item = Item {
                    item_id,
                    uid,
                    deleted: false,
                    group_id: batch.group_id,
                    name,
                    display_order,
                    hidden: false,
                    created_at: now,
                    updated_at: now,
                    deleted_at: 0,
                };
                item.insert(tx)?;
                created.push(item);
            }
            Ok((slots, created))
        })?;
        drop(conn);

        tracing::info!(
            uid,
            group_id = batch.group_id,
            requested = slots.len(),
            created = created.len(),
            "created item batch"
        );

        let mut items: Vec<Item> = slots
            .into_iter()
            .map(|slot| match slot {
                Slot::Stored(item) => item,
                Slot::Created(index) => created[index].clone(),
            })
            .collect();
        sort_for_display(&mut items);
        Ok(items)
    }
}
