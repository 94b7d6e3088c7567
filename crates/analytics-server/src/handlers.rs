//! HTTP Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use portfolio_analytics::{
    AnalyticsError, HistoricalPoint, PerformanceAttribution, PortfolioSnapshot, PortfolioSummary,
    RebalancingRecommendation,
};

use crate::state::AppState;

const DEFAULT_SNAPSHOT_LIMIT: usize = 10;
const MAX_SNAPSHOT_LIMIT: usize = 1000;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub holdings_provider: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct SnapshotQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(err: &AnalyticsError) -> ApiError {
    let status = match err {
        AnalyticsError::InvalidWalletId(_) => StatusCode::BAD_REQUEST,
        AnalyticsError::NoSnapshotAvailable(_) => StatusCode::NOT_FOUND,
        AnalyticsError::HoldingsTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        e if e.is_data_unavailable() => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        tracing::error!("Analytics error: {}", err);
    } else {
        tracing::debug!("Rejected request: {}", err);
    }

    (
        status,
        Json(ErrorResponse {
            error: err.user_message(),
            code: err.code().into(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        holdings_provider: state.analytics.provider_name().to_string(),
    })
}

/// Build and record a new snapshot
pub async fn create_snapshot(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
) -> Result<(StatusCode, Json<PortfolioSnapshot>), ApiError> {
    let snapshot = state
        .analytics
        .create_snapshot(&wallet)
        .await
        .map_err(|e| api_error(&e))?;

    Ok((StatusCode::CREATED, Json(PortfolioSnapshot::clone(&snapshot))))
}

/// Recent snapshots, newest first
pub async fn list_snapshots(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
    Query(query): Query<SnapshotQuery>,
) -> Result<Json<Vec<PortfolioSnapshot>>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_SNAPSHOT_LIMIT)
        .min(MAX_SNAPSHOT_LIMIT);

    let snapshots = state
        .analytics
        .get_snapshots(&wallet, limit)
        .map_err(|e| api_error(&e))?;

    Ok(Json(snapshots.iter().map(|s| PortfolioSnapshot::clone(s)).collect()))
}

/// Chronological value and risk series
pub async fn historical_data(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
) -> Result<Json<Vec<HistoricalPoint>>, ApiError> {
    state
        .analytics
        .get_historical_data(&wallet)
        .map(Json)
        .map_err(|e| api_error(&e))
}

/// Return attribution for the latest snapshot
pub async fn attribution(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
) -> Result<Json<PerformanceAttribution>, ApiError> {
    state
        .analytics
        .compute_attribution(&wallet)
        .map(Json)
        .map_err(|e| api_error(&e))
}

/// Rebalancing recommendations for the latest snapshot
pub async fn recommendations(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
) -> Result<Json<Vec<RebalancingRecommendation>>, ApiError> {
    state
        .analytics
        .generate_recommendations(&wallet)
        .map(Json)
        .map_err(|e| api_error(&e))
}

/// Fresh snapshot with attribution and recommendations
pub async fn summary(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
) -> Result<Json<PortfolioSummary>, ApiError> {
    state
        .analytics
        .get_portfolio_summary(&wallet)
        .await
        .map(Json)
        .map_err(|e| api_error(&e))
}
