use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;

use crate::error::CoreError;

use super::IdGenerator;

/// A mock id generator for testing. Hands out consecutive ids from a
/// starting value, and can be configured via the builder to fail or to
/// return short batches.
pub struct MockIdGenerator {
    next: AtomicI64,
    busy: bool,
    short_by: usize,
}

impl MockIdGenerator {
    pub fn builder() -> MockIdGeneratorBuilder {
        MockIdGeneratorBuilder {
            start: 1,
            busy: false,
            short_by: 0,
        }
    }
}

pub struct MockIdGeneratorBuilder {
    start: i64,
    busy: bool,
    short_by: usize,
}

impl MockIdGeneratorBuilder {
    pub fn starting_at(mut self, start: i64) -> Self {
        self.start = start;
        self
    }

    /// Every call fails with `SystemBusy`.
    pub fn busy(mut self) -> Self {
        self.busy = true;
        self
    }

    /// Batch calls return `n` fewer ids than requested.
    pub fn short_by(mut self, n: usize) -> Self {
        self.short_by = n;
        self
    }

    pub fn build(self) -> MockIdGenerator {
        MockIdGenerator {
            next: AtomicI64::new(self.start),
            busy: self.busy,
            short_by: self.short_by,
        }
    }
}

#[async_trait]
impl IdGenerator for MockIdGenerator {
    async fn next_id(&self) -> Result<i64, CoreError> {
        if self.busy {
            return Err(CoreError::SystemBusy("mock generator is busy".to_string()));
        }
        Ok(self.next.fetch_add(1, Ordering::SeqCst))
    }

    async fn next_ids(&self, count: usize) -> Result<Vec<i64>, CoreError> {
        if self.busy {
            return Err(CoreError::SystemBusy("mock generator is busy".to_string()));
        }
        let granted = count.saturating_sub(self.short_by);
        let start = self.next.fetch_add(granted as i64, Ordering::SeqCst);
        Ok((start..start + granted as i64).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn short_by_truncates_batches_only() {
        let ids = MockIdGenerator::builder().starting_at(50).short_by(2).build();
        assert_eq!(ids.next_ids(5).await.unwrap(), vec![50, 51, 52]);
        assert_eq!(ids.next_id().await.unwrap(), 53);
    }

    #[tokio::test]
    async fn busy_fails_both_forms() {
        let ids = MockIdGenerator::builder().busy().build();
        assert!(matches!(ids.next_id().await, Err(CoreError::SystemBusy(_))));
        assert!(matches!(ids.next_ids(3).await, Err(CoreError::SystemBusy(_))));
    }
}
