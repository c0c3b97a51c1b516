//! The item catalog: every public read and write on groups, items and
//! transaction links.
//!
//! Each operation locks the owner's partition, runs in a single SQLite
//! transaction and reports failures as [`CoreError`]. Identities come from
//! the injected [`IdGenerator`]; nothing here is a global.

mod batch;
mod groups;
mod items;
mod links;

pub use links::parse_item_ids;

use std::sync::Arc;

use crate::error::CoreError;
use crate::idgen::IdGenerator;
use crate::store::Datastore;

pub struct ItemCatalog {
    db: Arc<Datastore>,
    ids: Arc<dyn IdGenerator>,
}

impl ItemCatalog {
    pub fn new(db: Arc<Datastore>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { db, ids }
    }

    async fn next_id(&self) -> Result<i64, CoreError> {
        self.ids.next_id().await.inspect_err(|err| {
            tracing::warn!(%err, "failed to generate id");
        })
    }

    /// Exactly `count` fresh ids, or `SystemBusy` if the generator came up short.
    async fn next_ids(&self, count: usize) -> Result<Vec<i64>, CoreError> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let ids = self.ids.next_ids(count).await.inspect_err(|err| {
            tracing::warn!(count, %err, "failed to generate ids");
        })?;
        if ids.len() < count {
            tracing::warn!(requested = count, granted = ids.len(), "id generator returned too few ids");
            return Err(CoreError::SystemBusy(format!(
                "requested {count} ids, got {}",
                ids.len()
            )));
        }
        Ok(ids)
    }
}
