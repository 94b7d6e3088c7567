//! Portfolio analytics HTTP server
//!
//! Axum-based server exposing snapshot creation, attribution, recommendations
//! and history reads for UI and reporting clients.

mod handlers;
mod routes;
mod state;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use portfolio_analytics::{
    AnalyticsConfig, HoldingsProvider, HttpHoldingsProvider, MemorySnapshotStore,
    PortfolioAnalytics, StaticHoldingsProvider, StaticReferenceData,
};

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    let config = AnalyticsConfig::from_env()?;

    // Holdings collaborator: real chain-scan service when configured
    let provider: Arc<dyn HoldingsProvider> = if std::env::var("HOLDINGS_API_URL").is_ok() {
        let provider = HttpHoldingsProvider::from_env()?;
        tracing::info!("✓ Holdings service configured");
        Arc::new(provider)
    } else {
        tracing::warn!("⚠ HOLDINGS_API_URL not set - serving static demo holdings");
        Arc::new(StaticHoldingsProvider::new())
    };

    let analytics = PortfolioAnalytics::new(
        provider,
        Arc::new(MemorySnapshotStore::new(config.max_snapshots)),
        Arc::new(StaticReferenceData::builtin()),
        &config,
    );

    tracing::info!(
        max_snapshots = config.max_snapshots,
        timeout_secs = config.holdings_timeout_secs,
        provider = analytics.provider_name(),
        "Analytics engine ready"
    );

    let state = AppState {
        analytics: Arc::new(analytics),
    };
    let app = routes::router(state);

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("portfolio analytics server running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                                 - Health check");
    tracing::info!("  POST /api/wallets/{{wallet}}/snapshots         - Create snapshot");
    tracing::info!("  GET  /api/wallets/{{wallet}}/snapshots?limit=N - Recent snapshots");
    tracing::info!("  GET  /api/wallets/{{wallet}}/history           - Historical series");
    tracing::info!("  GET  /api/wallets/{{wallet}}/attribution       - Return attribution");
    tracing::info!("  GET  /api/wallets/{{wallet}}/recommendations   - Rebalancing advice");
    tracing::info!("  GET  /api/wallets/{{wallet}}/summary           - Snapshot + attribution + advice");

    axum::serve(listener, app).await?;

    Ok(())
}
