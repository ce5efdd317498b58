//! In-memory ProcessedEventStore.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::foundation::{DomainError, EventId, Timestamp};
use crate::ports::ProcessedEventStore;

/// Tracks (event, handler) completion in a map; single-node dev and tests.
#[derive(Default)]
pub struct InMemoryProcessedEventStore {
    processed: RwLock<HashMap<(String, String), Timestamp>>,
}

impl InMemoryProcessedEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProcessedEventStore for InMemoryProcessedEventStore {
    async fn contains(
        &self,
        event_id: &EventId,
        handler_name: &str,
    ) -> Result<bool, DomainError> {
        let key = (event_id.as_str().to_string(), handler_name.to_string());
        Ok(self
            .processed
            .read()
            .expect("InMemoryProcessedEventStore: lock poisoned")
            .contains_key(&key))
    }

    async fn mark_processed(
        &self,
        event_id: &EventId,
        handler_name: &str,
    ) -> Result<(), DomainError> {
        let key = (event_id.as_str().to_string(), handler_name.to_string());
        self.processed
            .write()
            .expect("InMemoryProcessedEventStore: lock poisoned")
            .insert(key, Timestamp::now());
        Ok(())
    }

    async fn purge_before(&self, before: Timestamp) -> Result<u64, DomainError> {
        let mut processed = self
            .processed
            .write()
            .expect("InMemoryProcessedEventStore: lock poisoned");
        let len_before = processed.len();
        processed.retain(|_, at| !at.is_before(&before));
        Ok((len_before - processed.len()) as u64)
    }
}
