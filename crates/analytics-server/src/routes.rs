//! Router

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{
    attribution, create_snapshot, health_check, historical_data, list_snapshots,
    recommendations, summary,
};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route(
            "/api/wallets/{wallet}/snapshots",
            post(create_snapshot).get(list_snapshots),
        )
        .route("/api/wallets/{wallet}/history", get(historical_data))
        .route("/api/wallets/{wallet}/attribution", get(attribution))
        .route("/api/wallets/{wallet}/recommendations", get(recommendations))
        .route("/api/wallets/{wallet}/summary", get(summary))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    use portfolio_analytics::{
        AnalyticsConfig, MemorySnapshotStore, PortfolioAnalytics, StaticHoldingsProvider,
        StaticReferenceData,
    };

    use super::*;

    fn app(provider: StaticHoldingsProvider) -> Router {
        let config = AnalyticsConfig::default();
        let analytics = PortfolioAnalytics::new(
            Arc::new(provider),
            Arc::new(MemorySnapshotStore::new(config.max_snapshots)),
            Arc::new(StaticReferenceData::builtin()),
            &config,
        );
        router(AppState { analytics: Arc::new(analytics) })
    }

    async fn send(app: Router, method: &str, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

        (status, json)
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (status, json) = send(app(StaticHoldingsProvider::new()), "GET", "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["holdings_provider"], "StaticHoldings");
    }

    #[tokio::test]
    async fn test_snapshot_then_read_back() {
        let app = app(StaticHoldingsProvider::new());

        let (status, created) = send(app.clone(), "POST", "/api/wallets/0xABC/snapshots").await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["wallet"], "0xabc");

        let (status, listed) = send(app.clone(), "GET", "/api/wallets/0xabc/snapshots?limit=5").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().map(Vec::len), Some(1));

        let (status, recs) = send(app, "GET", "/api/wallets/0xabc/recommendations").await;
        assert_eq!(status, StatusCode::OK);
        assert!(recs.is_array());
    }

    #[tokio::test]
    async fn test_attribution_without_snapshot_is_404() {
        let (status, json) =
            send(app(StaticHoldingsProvider::new()), "GET", "/api/wallets/0xabc/attribution").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["code"], "NO_SNAPSHOT");
    }

    #[tokio::test]
    async fn test_missing_holdings_is_503() {
        let (status, json) =
            send(app(StaticHoldingsProvider::empty()), "POST", "/api/wallets/0xabc/snapshots").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["code"], "DATA_UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_invalid_wallet_is_400() {
        let (status, json) =
            send(app(StaticHoldingsProvider::new()), "GET", "/api/wallets/bad!id/history").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "INVALID_WALLET_ID");
    }
}
