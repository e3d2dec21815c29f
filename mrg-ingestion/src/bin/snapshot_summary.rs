use anyhow::Result;
use mrg_client::queries::{aggregate_by_pipeline, pipeline_profile};
use mrg_ingestion::{config::AppConfig, ingest::store_from_config, observability, sinks::snapshot_digest};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;
    let store = store_from_config(&cfg.snapshot);

    let records = store.load().await?;

    for load in aggregate_by_pipeline(&records) {
        let profile = pipeline_profile(&records, &load.name);
        let first_period = profile.first().map(|r| r.period.as_str()).unwrap_or_default();
        let last_period = profile.last().map(|r| r.period.as_str()).unwrap_or_default();

        tracing::info!(
            pipeline = %load.name,
            points = load.points,
            first_period,
            last_period,
            avg_load_level = load.avg_load_level,
            max_actual_flow = load.max_actual_flow,
            max_technical_flow = load.max_technical_flow,
            "pipeline load"
        );
    }

    tracing::info!(
        records = records.len(),
        digest = %snapshot_digest(&records),
        "snapshot summary"
    );

    Ok(())
}
