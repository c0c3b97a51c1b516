use std::ops::Range;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::CoreError;
use crate::types::now_unix;

use super::IdGenerator;

// ==============================================================================
// Id Layout
// ==============================================================================
//
// | 40 bits seconds since ID_EPOCH | 4 bits node | 19 bits sequence |
//
// The sign bit stays clear so every id is a positive i64.

/// 2024-01-01T00:00:00Z.
const ID_EPOCH_SECS: i64 = 1_704_067_200;
const NODE_BITS: u32 = 4;
const SEQUENCE_BITS: u32 = 19;
const MAX_SEQUENCE: i64 = (1 << SEQUENCE_BITS) - 1;

pub const MAX_NODE_ID: u8 = (1 << NODE_BITS) - 1;

/// Per-call ceiling for [`IdGenerator::next_ids`].
pub const MAX_BATCH: usize = u16::MAX as usize;

/// Issues ids from a per-second sequence counter.
///
/// Ids from one generator are strictly increasing. If the wall clock steps
/// backwards the generator keeps counting inside the last second it saw.
pub struct SequenceIdGenerator {
    node_id: i64,
    state: Mutex<SequenceState>,
}

#[derive(Debug, Default)]
struct SequenceState {
    second: i64,
    next_sequence: i64,
}

impl SequenceState {
    /// Claim `count` consecutive sequence numbers at `second`.
    fn take(&mut self, second: i64, count: usize) -> Result<Range<i64>, CoreError> {
        if second > self.second {
            self.second = second;
            self.next_sequence = 0;
        }

        let start = self.next_sequence;
        let end = start + count as i64;
        if end - 1 > MAX_SEQUENCE {
            return Err(CoreError::SystemBusy(format!(
                "id sequence exhausted for second {}",
                self.second
            )));
        }
        self.next_sequence = end;
        Ok(start..end)
    }
}

impl SequenceIdGenerator {
    pub fn new(node_id: u8) -> Result<Self, CoreError> {
        if node_id > MAX_NODE_ID {
            return Err(CoreError::NodeIdOutOfRange(node_id));
        }
        Ok(Self {
            node_id: i64::from(node_id),
            state: Mutex::new(SequenceState::default()),
        })
    }

    async fn reserve(&self, count: usize) -> Result<Vec<i64>, CoreError> {
        if count == 0 {
            return Ok(Vec::new());
        }
        if count > MAX_BATCH {
            return Err(CoreError::SystemBusy(format!(
                "requested {count} ids, at most {MAX_BATCH} per call"
            )));
        }

        let second = now_unix() - ID_EPOCH_SECS;
        if second < 0 {
            return Err(CoreError::SystemBusy(
                "system clock is earlier than the id epoch".to_string(),
            ));
        }

        let mut state = self.state.lock().await;
        let range = state.take(second, count).inspect_err(|err| {
            tracing::warn!(node_id = self.node_id, count, %err, "id generation refused");
        })?;
        let base = (state.second << (NODE_BITS + SEQUENCE_BITS)) | (self.node_id << SEQUENCE_BITS);
        Ok(range.map(|sequence| base | sequence).collect())
    }
}

#[async_trait]
impl IdGenerator for SequenceIdGenerator {
    async fn next_id(&self) -> Result<i64, CoreError> {
        let ids = self.reserve(1).await?;
        ids.into_iter()
            .next()
            .ok_or_else(|| CoreError::SystemBusy("no id generated".to_string()))
    }

    async fn next_ids(&self, count: usize) -> Result<Vec<i64>, CoreError> {
        self.reserve(count).await
    }
}
