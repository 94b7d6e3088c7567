//! # portfolio-analytics
//!
//! Turns a multi-chain holding list into performance metrics, risk metrics,
//! return attribution and rebalancing recommendations.
//!
//! ## Data flow
//!
//! ```text
//! ┌──────────────────┐   ┌─────────────────┐   ┌──────────────────┐
//! │ HoldingsProvider │──▶│ SnapshotBuilder │──▶│  SnapshotStore   │
//! │  (chain scan)    │   │ perf + risk     │   │ newest first,    │
//! └──────────────────┘   └─────────────────┘   │ capped per wallet│
//!                                              └────────┬─────────┘
//!                          ┌────────────────────────────┼───────────────┐
//!                          ▼                            ▼               ▼
//!                  PerformanceCalculator      AttributionEngine  RecommendationEngine
//! ```
//!
//! Every metric is computed on demand when a snapshot is requested; there is
//! no background scheduler. Snapshots are immutable once built.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use portfolio_analytics::{
//!     AnalyticsConfig, MemorySnapshotStore, PortfolioAnalytics, StaticHoldingsProvider,
//!     StaticReferenceData,
//! };
//!
//! # async fn run() -> portfolio_analytics::Result<()> {
//! let config = AnalyticsConfig::default();
//! let analytics = PortfolioAnalytics::new(
//!     Arc::new(StaticHoldingsProvider::new()),
//!     Arc::new(MemorySnapshotStore::new(config.max_snapshots)),
//!     Arc::new(StaticReferenceData::builtin()),
//!     &config,
//! );
//!
//! let summary = analytics.get_portfolio_summary("0xAbC123").await?;
//! println!("VaR 95%: ${}", summary.current_snapshot.risk.var_95);
//! # Ok(())
//! # }
//! ```

pub mod analytics;
pub mod attribution;
pub mod config;
pub mod error;
pub mod holdings;
pub mod model;
pub mod performance;
pub mod recommendation;
pub mod reference;
pub mod risk;
pub mod snapshot;
pub mod store;

pub use analytics::PortfolioAnalytics;
pub use attribution::AttributionEngine;
pub use config::{AnalyticsConfig, RecommendationRules};
pub use error::{AnalyticsError, Result};
pub use holdings::{HoldingsProvider, HttpHoldingsProvider, StaticHoldingsProvider};
pub use model::{
    AssetPosition, ChainPosition, HeldAsset, HistoricalPoint, Holdings, PerformanceAttribution,
    PerformanceMetrics, PortfolioSnapshot, PortfolioSummary, Priority, RebalancingRecommendation,
    RiskMetrics, WalletId,
};
pub use performance::PerformanceCalculator;
pub use recommendation::RecommendationEngine;
pub use reference::{ReferenceData, StaticReferenceData};
pub use risk::RiskCalculator;
pub use snapshot::SnapshotBuilder;
pub use store::{History, MemorySnapshotStore, SnapshotStore};
