// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::observation::{Listing, Observation};
use crate::domain::repositories::observation_store::{ObservationStore, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// 内存观测存储
///
/// 无持久化，用于测试和一次性运行
#[derive(Default)]
pub struct MemoryObservationStore {
    observations: Mutex<Vec<Observation>>,
}

impl MemoryObservationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.observations.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.lock().is_empty()
    }
}

#[async_trait]
impl ObservationStore for MemoryObservationStore {
    async fn append(
        &self,
        records: &[Listing],
        source: &str,
        observed_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut observations = self.observations.lock();
        for record in records {
            observations.push(Observation::from_listing(record, source, observed_at));
        }
        Ok(())
    }

    async fn load_history(&self, since: DateTime<Utc>) -> Result<Vec<Observation>, StoreError> {
        let mut history: Vec<Observation> = self
            .observations
            .lock()
            .iter()
            .filter(|o| o.observed_at >= since)
            .cloned()
            .collect();
        history.sort_by_key(|o| o.observed_at);
        Ok(history)
    }
}
