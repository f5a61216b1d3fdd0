use async_trait::async_trait;
use dashmap::DashMap;
use field_service_sdk::SequenceKey;

use crate::domain::repo::{CounterStore, StoreError};

/// Process-local counters. Each key's increment runs under its shard lock.
#[derive(Default)]
pub struct InMemoryCounterStore {
    counters: DashMap<SequenceKey, u64>,
}

impl InMemoryCounterStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last value handed out for `key`, 0 if none.
    #[must_use]
    pub fn last_value(&self, key: &SequenceKey) -> u64 {
        self.counters.get(key).map_or(0, |value| *value)
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn increment_counter(&self, key: &SequenceKey) -> Result<u64, StoreError> {
        let mut value = self.counters.entry(*key).or_insert(0);
        *value += 1;
        Ok(*value)
    }
}
