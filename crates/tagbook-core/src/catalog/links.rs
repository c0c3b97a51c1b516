use std::collections::{HashMap, HashSet};

use rusqlite::params;
use rusqlite::params_from_iter;
use rusqlite::types::Value;

use crate::error::CoreError;
use crate::store::{self, read_tx, write_tx, IN_CHUNK_SIZE};
use crate::types::{ensure_uid, now_unix, Item, ItemIndex};

use super::ItemCatalog;

/// Parse a comma-separated item id filter such as `"12,7,12"`.
///
/// `""` and `"0"` mean "no filter" and yield `None`. Any entry that is not a
/// positive integer rejects the whole list.
pub fn parse_item_ids(raw: &str) -> Result<Option<Vec<i64>>, CoreError> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "0" {
        return Ok(None);
    }

    raw.split(',')
        .map(|part| match part.trim().parse::<i64>() {
            Ok(id) if id > 0 => Ok(id),
            _ => Err(CoreError::ItemIdListInvalid(raw.to_string())),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

fn check_transaction_id(transaction_id: i64) -> Result<(), CoreError> {
    if transaction_id <= 0 {
        return Err(CoreError::TransactionIdInvalid(transaction_id));
    }
    Ok(())
}

impl ItemCatalog {
    /// Item ids linked to each of `transaction_ids`, ascending per
    /// transaction. Transactions without live links are absent from the map.
    pub async fn get_item_ids_for_transactions(
        &self,
        uid: i64,
        transaction_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<i64>>, CoreError> {
        ensure_uid(uid)?;
        for &transaction_id in transaction_ids {
            check_transaction_id(transaction_id)?;
        }
        if transaction_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut seen = HashSet::new();
        let transaction_ids: Vec<i64> = transaction_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();

        let mut conn = self.db.user_data(uid).await;
        let pairs = read_tx(&mut conn, |tx| {
            let mut pairs = Vec::new();
            for chunk in transaction_ids.chunks(IN_CHUNK_SIZE) {
                let sql = format!(
                    "SELECT transaction_id, item_id FROM item_indexes \
                     WHERE uid = ? AND deleted = 0 AND transaction_id IN ({})",
                    vec!["?"; chunk.len()].join(", ")
                );
                let values = std::iter::once(Value::Integer(uid))
                    .chain(chunk.iter().map(|&id| Value::Integer(id)));
                let mut stmt = tx.prepare(&sql)?;
                for pair in stmt.query_map(params_from_iter(values), |row| {
                    Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
                })? {
                    pairs.push(pair?);
                }
            }
            Ok(pairs)
        })?;
        drop(conn);

        let mut linked: HashMap<i64, Vec<i64>> = HashMap::new();
        for (transaction_id, item_id) in pairs {
            linked.entry(transaction_id).or_default().push(item_id);
        }
        for item_ids in linked.values_mut() {
            item_ids.sort_unstable();
        }
        tracing::debug!(uid, transactions = linked.len(), "loaded transaction item ids");
        Ok(linked)
    }

    /// Link live items of `uid` to a transaction. Unknown or deleted items
    /// fail the call; items already linked to the transaction are left as is.
    /// Returns the links created.
    pub async fn link_transaction_items(
        &self,
        uid: i64,
        transaction_id: i64,
        transaction_time: i64,
        item_ids: &[i64],
    ) -> Result<Vec<ItemIndex>, CoreError> {
        ensure_uid(uid)?;
        check_transaction_id(transaction_id)?;
        let mut seen = HashSet::new();
        let item_ids: Vec<i64> = item_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();
        if item_ids.is_empty() {
            return Err(CoreError::ItemIdListInvalid("no item ids given".to_string()));
        }
        let index_ids = self.next_ids(item_ids.len()).await?;
        let now = now_unix();

        let mut conn = self.db.user_data(uid).await;
        let created = write_tx(&mut conn, |tx| {
            let found: HashSet<i64> = store::get_many::<Item>(tx, uid, &item_ids)?
                .into_iter()
                .map(|item| item.item_id)
                .collect();
            if let Some(&missing) = item_ids.iter().find(|&&id| !found.contains(&id)) {
                return Err(CoreError::ItemNotFound(missing));
            }

            let mut stmt = tx.prepare(
                "SELECT item_id FROM item_indexes WHERE uid = ?1 AND deleted = 0 AND transaction_id = ?2",
            )?;
            let already: HashSet<i64> = stmt
                .query_map(params![uid, transaction_id], |row| row.get(0))?
                .collect::<Result<_, _>>()?;

            let mut created = Vec::new();
            for (&item_id, index_id) in item_ids.iter().zip(index_ids) {
                if already.contains(&item_id) {
                    continue;
                }
                let link = ItemIndex {
                    index_id,
                    uid,
                    deleted: false,
                    transaction_id,
                    item_id,
                    transaction_time,
                    created_at: now,
                    updated_at: now,
                    deleted_at: 0,
                };
                link.insert(tx)?;
                created.push(link);
            }
            Ok(created)
        })?;

        tracing::info!(uid, transaction_id, linked = created.len(), "linked items to transaction");
        Ok(created)
    }

    /// Soft-delete every live link of one transaction.
    pub async fn unlink_transaction_items(
        &self,
        uid: i64,
        transaction_id: i64,
    ) -> Result<usize, CoreError> {
        ensure_uid(uid)?;
        check_transaction_id(transaction_id)?;
        let now = now_unix();

        let mut conn = self.db.user_data(uid).await;
        let removed = write_tx(&mut conn, |tx| {
            Ok(tx.execute(
                "UPDATE item_indexes SET deleted = 1, deleted_at = ?1, updated_at = ?1 \
                 WHERE uid = ?2 AND deleted = 0 AND transaction_id = ?3",
                params![now, uid, transaction_id],
            )?)
        })?;
        if removed == 0 {
            return Err(CoreError::ItemIndexNotFound(transaction_id));
        }

        tracing::info!(uid, transaction_id, removed, "unlinked items from transaction");
        Ok(removed)
    }

    /// Soft-delete every live transaction link of `uid`.
    pub async fn delete_all_item_indexes(&self, uid: i64) -> Result<usize, CoreError> {
        ensure_uid(uid)?;
        let now = now_unix();

        let mut conn = self.db.user_data(uid).await;
        let deleted = write_tx(&mut conn, |tx| {
            Ok(tx.execute(
                "UPDATE item_indexes SET deleted = 1, deleted_at = ?1, updated_at = ?1 \
                 WHERE uid = ?2 AND deleted = 0",
                params![now, uid],
            )?)
        })?;

        tracing::info!(uid, deleted, "deleted all item indexes");
        Ok(deleted)
    }
}
