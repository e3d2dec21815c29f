use anyhow::{bail, Result};
use mrg_ingestion::{
    config::AppConfig,
    ingest::{ingest_workbook, store_from_config},
    observability,
    sinks::snapshot_digest,
    sources::WorkbookSource,
};
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        bail!("usage: ingest_file <workbook_path>");
    }
    let file_path = &args[1];

    // Same configuration as the server, so the snapshot lands where it reads from.
    let cfg = AppConfig::load()?;

    let store = store_from_config(&cfg.snapshot);
    let source = WorkbookSource::from_path(file_path, cfg.ingest.sheet_options()).await?;

    let records = ingest_workbook(source, store).await?;

    tracing::info!(
        file = %file_path,
        records = records.len(),
        digest = %snapshot_digest(&records),
        "workbook ingested"
    );

    Ok(())
}
