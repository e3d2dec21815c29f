use std::sync::Arc;

use mrg_client::{JsonFileStore, MeasurementRecord, MemoryStore, SnapshotStore};

use crate::{
    config::{SnapshotBackend, SnapshotConfig},
    pipeline::{Pipeline, PipelineError},
    sinks::SnapshotSink,
    sources::WorkbookSource,
    transform::CoercionAudit,
};

pub fn store_from_config(cfg: &SnapshotConfig) -> Arc<dyn SnapshotStore> {
    match cfg.backend {
        SnapshotBackend::File => Arc::new(JsonFileStore::new(cfg.path.clone())),
        SnapshotBackend::Memory => Arc::new(MemoryStore::new()),
    }
}

/// Normalizes one sheet and replaces the snapshot with the result.
pub async fn ingest_workbook(
    source: WorkbookSource,
    store: Arc<dyn SnapshotStore>,
) -> Result<Vec<MeasurementRecord>, PipelineError> {
    let pipeline: Pipeline<_, MeasurementRecord, _> = Pipeline {
        source,
        transforms: vec![Arc::new(CoercionAudit)],
        sink: SnapshotSink::new(store),
    };

    pipeline.run().await
}
