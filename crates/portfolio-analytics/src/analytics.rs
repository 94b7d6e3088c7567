//! Portfolio Analytics Facade
//!
//! Wires the snapshot builder, store and the three read-side engines together
//! behind the operations UI and reporting collaborators call.

use std::sync::Arc;

use crate::attribution::AttributionEngine;
use crate::config::AnalyticsConfig;
use crate::error::Result;
use crate::holdings::HoldingsProvider;
use crate::model::{
    HistoricalPoint, PerformanceAttribution, PortfolioSnapshot, PortfolioSummary,
    RebalancingRecommendation, WalletId,
};
use crate::performance::PerformanceCalculator;
use crate::recommendation::RecommendationEngine;
use crate::reference::ReferenceData;
use crate::risk::RiskCalculator;
use crate::snapshot::SnapshotBuilder;
use crate::store::SnapshotStore;

/// Entry point for every analytics operation
pub struct PortfolioAnalytics {
    builder: SnapshotBuilder,
    store: Arc<dyn SnapshotStore>,
    attribution: AttributionEngine,
    recommendations: RecommendationEngine,
    provider_name: String,
}

impl PortfolioAnalytics {
    pub fn new(
        provider: Arc<dyn HoldingsProvider>,
        store: Arc<dyn SnapshotStore>,
        reference: Arc<dyn ReferenceData>,
        config: &AnalyticsConfig,
    ) -> Self {
        let provider_name = provider.name().to_string();
        let builder = SnapshotBuilder::new(
            provider,
            Arc::clone(&store),
            Arc::clone(&reference),
            PerformanceCalculator::new(config.risk_free_rate),
            RiskCalculator::new(reference, config),
            config.holdings_timeout(),
        );

        Self {
            builder,
            store,
            attribution: AttributionEngine::new(),
            recommendations: RecommendationEngine::new(config),
            provider_name,
        }
    }

    /// Name of the holdings provider in use
    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    /// Fetch holdings and record a new snapshot
    pub async fn create_snapshot(&self, wallet: &str) -> Result<Arc<PortfolioSnapshot>> {
        let wallet = WalletId::parse(wallet)?;
        self.builder.create_snapshot(&wallet).await
    }

    /// Return attribution for the latest snapshot
    pub fn compute_attribution(&self, wallet: &str) -> Result<PerformanceAttribution> {
        let wallet = WalletId::parse(wallet)?;
        let history = self.store.history(&wallet);
        self.attribution.attribute(&wallet, &history)
    }

    /// Rebalancing suggestions for the latest snapshot; empty without history
    pub fn generate_recommendations(&self, wallet: &str) -> Result<Vec<RebalancingRecommendation>> {
        let wallet = WalletId::parse(wallet)?;
        Ok(self
            .store
            .latest(&wallet)
            .map(|snapshot| self.recommendations.recommend(&snapshot))
            .unwrap_or_default())
    }

    /// Fresh snapshot plus its attribution and recommendations
    pub async fn get_portfolio_summary(&self, wallet: &str) -> Result<PortfolioSummary> {
        let wallet = WalletId::parse(wallet)?;
        let snapshot = self.builder.create_snapshot(&wallet).await?;

        // Attribute against the history as it stood right after our append,
        // so a concurrent snapshot cannot shift the comparison pair.
        let mut history: Vec<Arc<PortfolioSnapshot>> = self
            .store
            .history(&wallet)
            .iter()
            .skip_while(|s| s.id != snapshot.id)
            .cloned()
            .collect();
        if history.is_empty() {
            // Already evicted by a later snapshot
            history.push(Arc::clone(&snapshot));
        }
        let performance_attribution = self.attribution.attribute(&wallet, &history)?;
        let recommendations = self.recommendations.recommend(&snapshot);

        Ok(PortfolioSummary {
            current_snapshot: PortfolioSnapshot::clone(&snapshot),
            performance_attribution,
            recommendations,
        })
    }

    /// Up to `limit` snapshots, newest first
    pub fn get_snapshots(&self, wallet: &str, limit: usize) -> Result<Vec<Arc<PortfolioSnapshot>>> {
        let wallet = WalletId::parse(wallet)?;
        Ok(self.store.history(&wallet).iter().take(limit).cloned().collect())
    }

    /// Whole history as a chronological series
    pub fn get_historical_data(&self, wallet: &str) -> Result<Vec<HistoricalPoint>> {
        let wallet = WalletId::parse(wallet)?;
        Ok(self
            .store
            .history(&wallet)
            .iter()
            .rev()
            .map(|s| HistoricalPoint::from(s.as_ref()))
            .collect())
    }
}
