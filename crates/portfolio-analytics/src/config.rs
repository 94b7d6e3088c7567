//! Analytics Configuration
//!
//! Tunables for the calculators and the recommendation rule set. Defaults are
//! the values the engine ships with; `from_env` lets a deployment override any
//! of them without code changes.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};

/// Engine-wide configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Snapshots retained per wallet (oldest evicted first)
    pub max_snapshots: usize,

    /// Annualized risk-free rate, subtracted from the mean period return as-is
    pub risk_free_rate: f64,

    /// Correlation used when a symbol pair is missing from the reference table
    pub default_correlation: f64,

    /// Beta reported against the market proxy
    pub market_beta: f64,

    /// Liquidity heuristic for the held assets (0-1)
    pub liquidity_score: f64,

    /// Upper bound on the holdings collaborator call
    pub holdings_timeout_secs: u64,

    /// Stable asset used as the sink for concentration trims
    pub stable_asset: String,

    /// Lower-volatility asset used as the sink for volatility trims
    pub low_volatility_asset: String,

    /// Reference asset suggested by the opportunity rule
    pub opportunity_asset: String,

    /// Recommendation rule thresholds
    pub rules: RecommendationRules,
}

/// Thresholds and sizing for the rebalancing rules
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecommendationRules {
    /// Herfindahl index above which the concentration rule fires
    pub concentration_threshold: f64,

    /// Share of the largest position to move into the stable asset
    pub concentration_trim: f64,

    /// Asset volatility above which the high-volatility rule fires
    pub volatility_threshold: f64,

    /// Share of each volatile position to move
    pub volatility_trim: f64,

    /// Sharpe ratio below which the opportunity rule fires
    pub sharpe_threshold: f64,

    /// Share of total value to reallocate toward the opportunity asset
    pub opportunity_allocation: f64,
}

impl Default for RecommendationRules {
    fn default() -> Self {
        Self {
            concentration_threshold: 0.5,
            concentration_trim: 0.20,
            volatility_threshold: 0.7,
            volatility_trim: 0.30,
            sharpe_threshold: 1.0,
            opportunity_allocation: 0.10,
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            max_snapshots: 1000,
            risk_free_rate: 0.05,
            default_correlation: 0.5,
            market_beta: 1.0,
            liquidity_score: 0.85,
            holdings_timeout_secs: 10,
            stable_asset: "USDC".into(),
            low_volatility_asset: "BTC".into(),
            opportunity_asset: "ETH".into(),
            rules: RecommendationRules::default(),
        }
    }
}

impl AnalyticsConfig {
    /// Build from `ANALYTICS_*` environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            max_snapshots: env_or("ANALYTICS_MAX_SNAPSHOTS", defaults.max_snapshots)?,
            risk_free_rate: env_or("ANALYTICS_RISK_FREE_RATE", defaults.risk_free_rate)?,
            default_correlation: env_or(
                "ANALYTICS_DEFAULT_CORRELATION",
                defaults.default_correlation,
            )?,
            market_beta: env_or("ANALYTICS_MARKET_BETA", defaults.market_beta)?,
            liquidity_score: env_or("ANALYTICS_LIQUIDITY_SCORE", defaults.liquidity_score)?,
            holdings_timeout_secs: env_or(
                "ANALYTICS_HOLDINGS_TIMEOUT_SECS",
                defaults.holdings_timeout_secs,
            )?,
            stable_asset: std::env::var("ANALYTICS_STABLE_ASSET")
                .unwrap_or(defaults.stable_asset)
                .to_uppercase(),
            low_volatility_asset: std::env::var("ANALYTICS_LOW_VOL_ASSET")
                .unwrap_or(defaults.low_volatility_asset)
                .to_uppercase(),
            opportunity_asset: std::env::var("ANALYTICS_OPPORTUNITY_ASSET")
                .unwrap_or(defaults.opportunity_asset)
                .to_uppercase(),
            rules: defaults.rules,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject values the calculators cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.max_snapshots == 0 {
            return Err(AnalyticsError::Config("max_snapshots must be at least 1".into()));
        }
        if !(-1.0..=1.0).contains(&self.default_correlation) {
            return Err(AnalyticsError::Config(format!(
                "default_correlation {} outside [-1, 1]",
                self.default_correlation
            )));
        }
        if !(0.0..=1.0).contains(&self.liquidity_score) {
            return Err(AnalyticsError::Config(format!(
                "liquidity_score {} outside [0, 1]",
                self.liquidity_score
            )));
        }
        if !self.risk_free_rate.is_finite() || !self.market_beta.is_finite() {
            return Err(AnalyticsError::Config("rates must be finite".into()));
        }
        if self.holdings_timeout_secs == 0 {
            return Err(AnalyticsError::Config("holdings timeout must be positive".into()));
        }
        Ok(())
    }

    pub const fn holdings_timeout(&self) -> Duration {
        Duration::from_secs(self.holdings_timeout_secs)
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AnalyticsError::Config(format!("{key} has invalid value '{raw}'"))),
        Err(_) => Ok(default),
    }
}
