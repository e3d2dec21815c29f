pub mod coerce;
pub mod fields;
pub mod header;
pub mod rows;

pub use coerce::CoercionError;
pub use fields::{Field, FieldMap};
pub use header::{resolve_headers, HeaderRegion};
pub use rows::{CoercionWarning, MappedRow, RowMapper};

use crate::pipeline::{Envelope, PipelineError, Transform};
use mrg_client::MeasurementRecord;

/// Pure validation of a normalized record.
///
/// Rules:
/// - every numeric field must be finite (`km` may be absent).
pub fn validate_measurement(
    env: Envelope<MeasurementRecord>,
) -> Result<Envelope<MeasurementRecord>, PipelineError> {
    if !env.payload.is_finite() {
        return Err(PipelineError::Transform(format!(
            "row {} carries a non-finite number",
            env.row
        )));
    }

    Ok(env)
}

/// Reports the coercion warnings attached to each record and guards the
/// finite-number invariant.
#[derive(Clone, Default)]
pub struct CoercionAudit;

#[async_trait::async_trait]
impl Transform<MeasurementRecord, MeasurementRecord> for CoercionAudit {
    async fn apply(
        &self,
        input: Envelope<MeasurementRecord>,
    ) -> Result<Envelope<MeasurementRecord>, PipelineError> {
        for w in &input.warnings {
            tracing::warn!(
                row = w.row,
                field = %w.field,
                raw = %w.raw,
                reason = %w.reason,
                "cell coercion failed, using default"
            );
        }
        if !input.warnings.is_empty() {
            metrics::counter!("mrg_coercion_warnings_total").increment(input.warnings.len() as u64);
        }

        match validate_measurement(input) {
            Ok(env) => Ok(env),
            Err(e) => {
                metrics::counter!("mrg_validation_rejected_total").increment(1);
                Err(e)
            }
        }
    }
}
