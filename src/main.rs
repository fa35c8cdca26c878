//! Learning-Material Curator binary entrypoint.
//! Boots the Axum HTTP server, wiring config, scoring, curator, and metrics.
//!
//! See `README.md` for quickstart.

use std::net::Ipv4Addr;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use learning_material_curator::config::AppConfig;
use learning_material_curator::curator::Curator;
use learning_material_curator::metrics::Metrics;
use learning_material_curator::{api, scoring};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    // This enables SCORING_CONFIG_PATH / SCORE_FLOOR and the backend
    // credentials from .env.
    let _ = dotenvy::dotenv();

    init_tracing();

    let cfg = AppConfig::from_env();

    // Scoring engine: file config when present, compiled-in seed otherwise.
    let scoring_handle = scoring::bootstrap();
    scoring::start_hot_reload_thread(scoring_handle.clone(), scoring::config_path());

    let metrics = Metrics::init(cfg.cache_ttl_secs);

    let curator = Arc::new(Curator::from_config(&cfg, scoring_handle.clone())?);
    let router = api::create_router(curator, scoring_handle).merge(metrics.router());

    let listener = tokio::net::TcpListener::bind((Ipv4Addr::UNSPECIFIED, cfg.port)).await?;
    info!(port = cfg.port, "listening");
    axum::serve(listener, router).await?;
    Ok(())
}
