pub mod domain;
pub mod queries;
pub mod store;

pub use domain::MeasurementRecord;
pub use store::{JsonFileStore, MemoryStore, SnapshotStore, StoreError};
