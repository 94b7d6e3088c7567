//! Domain Models
//!
//! Snapshot, metric and recommendation types shared by every component.
//! Money is `rust_decimal::Decimal`; statistics (percent returns, weights,
//! volatility, correlations) are `f64` and always finite.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AnalyticsError, Result};

const MAX_WALLET_ID_LEN: usize = 128;

/// Case-normalized wallet identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletId(String);

impl WalletId {
    /// Trim, lowercase and validate a raw identifier
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = raw.trim().to_lowercase();

        if normalized.is_empty() {
            return Err(AnalyticsError::InvalidWalletId("empty wallet id".into()));
        }
        if normalized.len() > MAX_WALLET_ID_LEN {
            return Err(AnalyticsError::InvalidWalletId(format!(
                "wallet id longer than {MAX_WALLET_ID_LEN} characters"
            )));
        }
        if !normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, ':' | '.' | '_' | '-'))
        {
            return Err(AnalyticsError::InvalidWalletId(raw.trim().to_string()));
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One held asset as reported by the holdings collaborator
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeldAsset {
    pub symbol: String,
    pub name: String,
    pub balance: Decimal,
    pub usd_value: Decimal,
    pub price: Decimal,
    pub chain_id: u64,
    pub chain_name: String,
    #[serde(default)]
    pub change_24h: f64,
    #[serde(default)]
    pub change_7d: f64,
    #[serde(default)]
    pub change_30d: f64,
    /// Annualized volatility (fraction); filled from reference data when absent
    #[serde(default)]
    pub volatility: Option<f64>,
    #[serde(default)]
    pub sharpe_ratio: Option<f64>,
}

/// Point-in-time holdings for one wallet
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holdings {
    pub total_value: Decimal,
    pub assets: Vec<HeldAsset>,
}

/// One held asset on one chain inside a snapshot
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssetPosition {
    /// Ticker symbol (e.g., "ETH", "USDC")
    pub symbol: String,

    pub name: String,

    /// Token balance
    pub balance: Decimal,

    pub usd_value: Decimal,

    /// Unit price in USD
    pub price: Decimal,

    pub chain_id: u64,

    pub chain_name: String,

    /// Share of the snapshot total value (0-100)
    pub weight: f64,

    pub change_24h: f64,
    pub change_7d: f64,
    pub change_30d: f64,

    /// Annualized volatility (fraction)
    pub volatility: f64,

    pub sharpe_ratio: Option<f64>,
}

/// Aggregate of all positions sharing a chain id
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChainPosition {
    pub chain_id: u64,
    pub name: String,

    /// Native token symbol
    pub symbol: String,

    pub total_value: Decimal,

    /// Share of the snapshot total value (0-100)
    pub weight: f64,

    pub asset_count: usize,

    /// Value-weighted 24h change of the chain's assets (percent)
    pub performance_24h: f64,
}

/// Return and volatility statistics (percent unless noted)
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Absolute return in USD
    pub total_return: Decimal,
    pub total_return_percent: f64,
    pub daily_return: f64,
    pub weekly_return: f64,
    pub monthly_return: f64,
    pub yearly_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,

    /// Fraction of positive periods (0-1)
    pub win_rate: f64,
    pub best_day: f64,
    pub worst_day: f64,
}

/// Single-snapshot risk picture
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// Weight-weighted asset volatility (fraction)
    pub portfolio_volatility: f64,

    /// 95% parametric Value-at-Risk in USD
    pub var_95: Decimal,

    /// 99% parametric Value-at-Risk in USD
    pub var_99: Decimal,

    pub beta: f64,

    /// "A-B" symbol pair to correlation; symmetric, no self-pairs
    pub correlation_matrix: BTreeMap<String, f64>,

    pub diversification_ratio: f64,

    /// Herfindahl index over weights (0-1)
    pub concentration_risk: f64,

    pub liquidity_score: f64,
}

/// Immutable point-in-time portfolio record
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub id: Uuid,
    pub wallet: WalletId,
    pub created_at: DateTime<Utc>,
    pub total_value: Decimal,
    pub assets: Vec<AssetPosition>,
    pub chains: Vec<ChainPosition>,
    pub performance: PerformanceMetrics,
    pub risk: RiskMetrics,
}

impl PortfolioSnapshot {
    /// Find a position by symbol and chain
    pub fn asset(&self, symbol: &str, chain_id: u64) -> Option<&AssetPosition> {
        self.assets
            .iter()
            .find(|a| a.chain_id == chain_id && a.symbol.eq_ignore_ascii_case(symbol))
    }

    pub fn chain(&self, chain_id: u64) -> Option<&ChainPosition> {
        self.chains.iter().find(|c| c.chain_id == chain_id)
    }

    /// Position with the highest weight (first one wins on ties)
    pub fn largest_position(&self) -> Option<&AssetPosition> {
        self.assets.iter().fold(None, |best: Option<&AssetPosition>, a| match best {
            Some(b) if b.weight >= a.weight => Some(b),
            _ => Some(a),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationType {
    Rebalance,
    TaxLossHarvest,
    RiskReduction,
    Opportunity,
}

/// Ordered low to critical
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Buy,
    Sell,
    Swap,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

/// A single trade suggestion inside a recommendation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RebalancingAction {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub from_asset: Option<String>,
    pub to_asset: Option<String>,

    /// Token amount
    pub amount: Decimal,

    pub amount_usd: Decimal,
    pub reason: String,
    pub urgency: Urgency,
}

/// Heuristic outcome estimate attached to a recommendation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExpectedImpact {
    /// Percent
    pub risk_reduction: f64,
    /// Percent, negative for a return trade-off
    pub return_improvement: f64,
    pub tax_savings: Option<Decimal>,
    /// USD
    pub cost_estimate: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RebalancingRecommendation {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: RecommendationType,
    pub priority: Priority,
    pub title: String,
    pub description: String,
    pub actions: Vec<RebalancingAction>,
    pub expected_impact: ExpectedImpact,

    /// 0-1
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributionMode {
    /// Only one snapshot exists; contributions come from 24h changes
    SingleSnapshot,
    /// Newest snapshot compared against the one before it
    SnapshotDelta,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssetContribution {
    pub symbol: String,
    pub chain_id: u64,
    pub weight: f64,
    pub asset_return: f64,
    pub contribution: f64,
    pub contribution_percent: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChainContribution {
    pub chain_id: u64,
    pub chain_name: String,
    pub weight: f64,
    pub chain_return: f64,
    pub contribution: f64,
    pub contribution_percent: f64,
}

/// Decomposition of the latest portfolio return
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerformanceAttribution {
    pub wallet: WalletId,
    pub mode: AttributionMode,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub total_return: f64,
    pub asset_contributions: Vec<AssetContribution>,
    pub chain_contributions: Vec<ChainContribution>,
    pub total_attribution: f64,
    pub unexplained_return: f64,
}

/// One chronological point of a wallet's history
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPoint {
    pub timestamp: DateTime<Utc>,
    pub total_value: Decimal,
    pub daily_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub concentration_risk: f64,
}

impl From<&PortfolioSnapshot> for HistoricalPoint {
    fn from(snapshot: &PortfolioSnapshot) -> Self {
        Self {
            timestamp: snapshot.created_at,
            total_value: snapshot.total_value,
            daily_return: snapshot.performance.daily_return,
            volatility: snapshot.performance.volatility,
            sharpe_ratio: snapshot.performance.sharpe_ratio,
            max_drawdown: snapshot.performance.max_drawdown,
            concentration_risk: snapshot.risk.concentration_risk,
        }
    }
}

/// Everything a dashboard needs in one call
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub current_snapshot: PortfolioSnapshot,
    pub performance_attribution: PerformanceAttribution,
    pub recommendations: Vec<RebalancingRecommendation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_id_normalized() {
        let id = WalletId::parse("  0xAbCdEf0123 ").unwrap();
        assert_eq!(id.as_str(), "0xabcdef0123");
    }

    #[test]
    fn test_wallet_id_rejects_garbage() {
        assert!(matches!(WalletId::parse("   "), Err(AnalyticsError::InvalidWalletId(_))));
        assert!(WalletId::parse("0xabc def").is_err());
        assert!(WalletId::parse(&"a".repeat(200)).is_err());
        assert!(WalletId::parse("solana:9xQeWvG816bUx9EP").is_ok());
    }

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Critical > Priority::High);
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
    }

    #[test]
    fn test_recommendation_type_wire_names() {
        let json = serde_json::to_string(&RecommendationType::TaxLossHarvest).unwrap();
        assert_eq!(json, "\"tax_loss_harvest\"");
    }

    #[test]
    fn test_holdings_wire_shape() {
        let json = r#"{
            "totalValue": "8625.00",
            "assets": [{
                "symbol": "ETH",
                "name": "Ethereum",
                "balance": "2.5",
                "usdValue": "8625.00",
                "price": "3450",
                "chainId": 1,
                "chainName": "Ethereum",
                "change24h": 1.8,
                "change7d": 4.2,
                "volatility": 0.55
            }]
        }"#;

        let holdings: Holdings = serde_json::from_str(json).unwrap();
        let eth = &holdings.assets[0];
        assert_eq!(holdings.total_value, rust_decimal_macros::dec!(8625.00));
        assert_eq!(eth.usd_value, rust_decimal_macros::dec!(8625));
        assert_eq!(eth.chain_id, 1);
        assert_eq!(eth.change_24h, 1.8);
        assert_eq!(eth.change_30d, 0.0);
        assert_eq!(eth.volatility, Some(0.55));
        assert_eq!(eth.sharpe_ratio, None);

        let back = serde_json::to_value(&holdings).unwrap();
        assert_eq!(back["totalValue"], "8625.00");
        assert_eq!(back["assets"][0]["usdValue"], "8625.00");
        assert_eq!(back["assets"][0]["chainName"], "Ethereum");
        assert_eq!(back["assets"][0]["change24h"], 1.8);
    }
}
