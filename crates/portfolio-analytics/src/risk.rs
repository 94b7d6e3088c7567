//! Risk Calculator
//!
//! Value-at-Risk, correlation, diversification and concentration for a single
//! snapshot's composition. Portfolio volatility is the weight-weighted average
//! of asset volatilities; only the diversification ratio uses the full
//! pairwise-correlation variance.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::config::AnalyticsConfig;
use crate::model::{AssetPosition, RiskMetrics};
use crate::performance::finite;
use crate::reference::ReferenceData;

/// One-tailed normal z-score at 95%
pub const Z_95: f64 = 1.645;
/// One-tailed normal z-score at 99%
pub const Z_99: f64 = 2.326;

/// Derives `RiskMetrics` from one snapshot's positions
#[derive(Clone)]
pub struct RiskCalculator {
    reference: Arc<dyn ReferenceData>,
    default_correlation: f64,
    market_beta: f64,
    liquidity_score: f64,
}

impl RiskCalculator {
    pub fn new(reference: Arc<dyn ReferenceData>, config: &AnalyticsConfig) -> Self {
        Self {
            reference,
            default_correlation: config.default_correlation,
            market_beta: config.market_beta,
            liquidity_score: config.liquidity_score,
        }
    }

    pub fn compute(&self, assets: &[AssetPosition], total_value: Decimal) -> RiskMetrics {
        let portfolio_volatility = weighted_volatility(assets);

        let metrics = RiskMetrics {
            portfolio_volatility,
            var_95: value_at_risk(total_value, portfolio_volatility, Z_95),
            var_99: value_at_risk(total_value, portfolio_volatility, Z_99),
            beta: self.market_beta,
            correlation_matrix: self.correlation_matrix(assets),
            diversification_ratio: self.diversification_ratio(assets),
            concentration_risk: herfindahl(assets),
            liquidity_score: self.liquidity_score,
        };

        tracing::debug!(
            volatility = metrics.portfolio_volatility,
            hhi = metrics.concentration_risk,
            diversification = metrics.diversification_ratio,
            "Computed risk metrics"
        );

        metrics
    }

    /// Correlation between two symbols; 1 for the same symbol
    pub fn correlation(&self, a: &str, b: &str) -> f64 {
        if a.eq_ignore_ascii_case(b) {
            return 1.0;
        }
        self.reference
            .correlation(a, b)
            .filter(|rho| rho.is_finite())
            .unwrap_or(self.default_correlation)
    }

    /// Every ordered pair of distinct symbols, keyed "A-B"
    fn correlation_matrix(&self, assets: &[AssetPosition]) -> BTreeMap<String, f64> {
        let symbols: BTreeSet<String> = assets.iter().map(|a| a.symbol.to_uppercase()).collect();

        let mut matrix = BTreeMap::new();
        for (i, a) in symbols.iter().enumerate() {
            for b in symbols.iter().skip(i + 1) {
                let rho = self.correlation(a, b);
                matrix.insert(format!("{a}-{b}"), rho);
                matrix.insert(format!("{b}-{a}"), rho);
            }
        }
        matrix
    }

    /// Weighted-average volatility over correlated portfolio volatility.
    /// Zero for an empty or zero-variance portfolio.
    fn diversification_ratio(&self, assets: &[AssetPosition]) -> f64 {
        let mut variance = 0.0;
        for a in assets {
            for b in assets {
                variance += (a.weight / 100.0)
                    * (b.weight / 100.0)
                    * a.volatility
                    * b.volatility
                    * self.correlation(&a.symbol, &b.symbol);
            }
        }

        let correlated = variance.max(0.0).sqrt();
        if correlated > 0.0 {
            finite(weighted_volatility(assets) / correlated)
        } else {
            0.0
        }
    }
}

/// Sum of weight fraction times volatility
pub fn weighted_volatility(assets: &[AssetPosition]) -> f64 {
    finite(assets.iter().map(|a| a.weight / 100.0 * a.volatility).sum())
}

/// Herfindahl index over weight fractions
pub fn herfindahl(assets: &[AssetPosition]) -> f64 {
    finite(assets.iter().map(|a| (a.weight / 100.0).powi(2)).sum())
}

/// Parametric VaR in USD, rounded to cents
fn value_at_risk(total_value: Decimal, volatility: f64, z: f64) -> Decimal {
    Decimal::from_f64_retain(volatility * z)
        .map_or(Decimal::ZERO, |factor| (total_value * factor).round_dp(2))
}
