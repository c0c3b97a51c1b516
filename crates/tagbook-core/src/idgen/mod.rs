//! Identity generation for new rows.
//!
//! Defines the [`IdGenerator`] trait consumed by the catalog and provides a
//! time-sequenced implementation ([`SequenceIdGenerator`]) plus a test mock
//! (`mock::MockIdGenerator`).

#[cfg(test)]
pub mod mock;
mod sequence;

pub use sequence::{SequenceIdGenerator, MAX_BATCH, MAX_NODE_ID};

use async_trait::async_trait;

use crate::error::CoreError;

/// Source of unique, roughly increasing 64-bit row identities.
///
/// Both methods may fail with [`CoreError::SystemBusy`] when the generator
/// cannot hand out ids right now; callers surface that to the user instead
/// of retrying.
#[async_trait]
pub trait IdGenerator: Send + Sync {
    /// Produce one identity.
    async fn next_id(&self) -> Result<i64, CoreError>;

    /// Produce `count` identities. Implementations may return fewer than
    /// requested; callers must check the length.
    async fn next_ids(&self, count: usize) -> Result<Vec<i64>, CoreError> {
        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            ids.push(self.next_id().await?);
        }
        Ok(ids)
    }
}
