use tokio::sync::RwLock;

use super::{SnapshotStore, StoreError};
use crate::domain::MeasurementRecord;

/// Process-local snapshot, lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: RwLock<Option<Vec<MeasurementRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl SnapshotStore for MemoryStore {
    async fn save(&self, records: &[MeasurementRecord]) -> Result<(), StoreError> {
        *self.snapshot.write().await = Some(records.to_vec());
        Ok(())
    }

    async fn load(&self) -> Result<Vec<MeasurementRecord>, StoreError> {
        self.snapshot.read().await.clone().ok_or(StoreError::NotFound)
    }
}
