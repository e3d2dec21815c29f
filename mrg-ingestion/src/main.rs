use anyhow::{Context, Result};
use mrg_ingestion::{
    api::{self, AppState},
    config::AppConfig,
    ingest::store_from_config,
    metrics_server,
    observability,
};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    // Load configuration
    let cfg = AppConfig::load()?;

    // Start metrics server if configured
    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    let state = AppState {
        store: store_from_config(&cfg.snapshot),
        sheet: cfg.ingest.sheet_options(),
        max_upload_bytes: cfg.server.max_upload_bytes,
    };

    let listener = tokio::net::TcpListener::bind(&cfg.server.http_bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", cfg.server.http_bind_addr))?;

    tracing::info!(
        addr = %cfg.server.http_bind_addr,
        backend = ?cfg.snapshot.backend,
        snapshot = %cfg.snapshot.path.display(),
        "MRG data API listening"
    );

    api::serve(listener, state).await?;

    Ok(())
}
