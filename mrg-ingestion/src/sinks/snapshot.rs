use std::{sync::Arc, time::SystemTime};

use futures::StreamExt;
use mrg_client::{MeasurementRecord, SnapshotStore};

use crate::pipeline::{Envelope, PipelineError, Sink};

fn hash_str(hasher: &mut blake3::Hasher, s: &str) {
    let len = s.len() as u32;
    hasher.update(&len.to_le_bytes());
    hasher.update(s.as_bytes());
}

fn hash_f64(hasher: &mut blake3::Hasher, v: f64) {
    hasher.update(&v.to_bits().to_le_bytes());
}

fn hash_opt_f64(hasher: &mut blake3::Hasher, v: Option<f64>) {
    match v {
        Some(x) => {
            hasher.update(&[1]);
            hash_f64(hasher, x);
        }
        None => {
            hasher.update(&[0]);
        }
    }
}

/// Content digest of a record sequence; order-sensitive.
pub fn snapshot_digest(records: &[MeasurementRecord]) -> String {
    let mut h = blake3::Hasher::new();
    h.update(&(records.len() as u64).to_le_bytes());
    for r in records {
        hash_str(&mut h, &r.name);
        hash_str(&mut h, &r.connection_point);
        hash_f64(&mut h, r.mg);
        hash_opt_f64(&mut h, r.km);
        hash_str(&mut h, &r.period);
        hash_f64(&mut h, r.load_level);
        hash_f64(&mut h, r.actual_flow);
        hash_f64(&mut h, r.technical_flow);
    }
    h.finalize().to_hex().to_string()
}

/// Collects the whole upload and replaces the snapshot with it.
///
/// The first upstream error aborts the run before anything is written.
pub struct SnapshotSink {
    store: Arc<dyn SnapshotStore>,
}

impl SnapshotSink {
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl Sink<MeasurementRecord> for SnapshotSink {
    type Output = Vec<MeasurementRecord>;

    async fn run<S>(&self, mut input: S) -> Result<Vec<MeasurementRecord>, PipelineError>
    where
        S: futures::Stream<Item = Result<Envelope<MeasurementRecord>, PipelineError>> + Send + Unpin + 'static,
    {
        let mut records = Vec::new();
        let mut earliest: Option<SystemTime> = None;

        while let Some(item) = input.next().await {
            let env = match item {
                Ok(env) => env,
                Err(e) => {
                    tracing::error!(error = %e, "upstream failure, snapshot left untouched");
                    return Err(e);
                }
            };

            earliest = Some(earliest.map_or(env.received_at, |t| t.min(env.received_at)));
            records.push(env.payload);
        }

        if let Err(e) = self.store.save(&records).await {
            tracing::error!(error = %e, "snapshot write failed");
            metrics::counter!("mrg_snapshot_write_errors_total").increment(1);
            return Err(e.into());
        }

        metrics::counter!("mrg_snapshot_writes_total").increment(1);
        metrics::counter!("mrg_records_ingested_total").increment(records.len() as u64);
        if let Some(Ok(dur)) = earliest.map(|t| SystemTime::now().duration_since(t)) {
            metrics::histogram!("mrg_ingest_latency_seconds").record(dur.as_secs_f64());
        }

        tracing::info!(
            records = records.len(),
            digest = %snapshot_digest(&records),
            "snapshot replaced"
        );

        Ok(records)
    }
}
