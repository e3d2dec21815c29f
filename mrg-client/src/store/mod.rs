pub mod file;
pub mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use crate::domain::MeasurementRecord;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("no snapshot has been written yet")]
    NotFound,
    #[error("snapshot i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Holds exactly one generation of measurement records.
///
/// `save` replaces the previous generation wholesale; `load` returns the last
/// successfully saved generation or [`StoreError::NotFound`].
#[async_trait::async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn save(&self, records: &[MeasurementRecord]) -> Result<(), StoreError>;

    async fn load(&self) -> Result<Vec<MeasurementRecord>, StoreError>;
}
