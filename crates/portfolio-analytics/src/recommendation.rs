//! Recommendation Engine
//!
//! Fixed rule set over the latest snapshot. Each rule is evaluated on its own
//! and several may fire; confidence and expected impact are per-rule
//! constants, not simulated outcomes.

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use crate::config::{AnalyticsConfig, RecommendationRules};
use crate::model::{
    ActionKind, AssetPosition, ExpectedImpact, PortfolioSnapshot, Priority, RebalancingAction,
    RebalancingRecommendation, RecommendationType, Urgency,
};

const CONCENTRATION_CONFIDENCE: f64 = 0.85;
const CONCENTRATION_RISK_REDUCTION: f64 = 25.0;
const CONCENTRATION_RETURN_TRADEOFF: f64 = -2.0;
const CONCENTRATION_COST: Decimal = dec!(25);

const VOLATILITY_CONFIDENCE: f64 = 0.75;
const VOLATILITY_RISK_REDUCTION: f64 = 15.0;
const VOLATILITY_RETURN_TRADEOFF: f64 = -1.0;
const VOLATILITY_COST: Decimal = dec!(15);

const OPPORTUNITY_CONFIDENCE: f64 = 0.6;
const OPPORTUNITY_RISK_REDUCTION: f64 = 5.0;
const OPPORTUNITY_RETURN_IMPROVEMENT: f64 = 3.0;
const OPPORTUNITY_COST: Decimal = dec!(10);

/// Rule-based rebalancing advisor
#[derive(Clone, Debug)]
pub struct RecommendationEngine {
    rules: RecommendationRules,
    stable_asset: String,
    low_volatility_asset: String,
    opportunity_asset: String,
}

impl RecommendationEngine {
    pub fn new(config: &AnalyticsConfig) -> Self {
        Self {
            rules: config.rules.clone(),
            stable_asset: config.stable_asset.to_uppercase(),
            low_volatility_asset: config.low_volatility_asset.to_uppercase(),
            opportunity_asset: config.opportunity_asset.to_uppercase(),
        }
    }

    /// Recommendations for a snapshot, highest priority first
    pub fn recommend(&self, snapshot: &PortfolioSnapshot) -> Vec<RebalancingRecommendation> {
        let mut recommendations: Vec<RebalancingRecommendation> = [
            self.concentration_rule(snapshot),
            self.volatility_rule(snapshot),
            self.sharpe_rule(snapshot),
        ]
        .into_iter()
        .flatten()
        .collect();

        // Stable sort keeps rule order within a tier
        recommendations.sort_by(|a, b| b.priority.cmp(&a.priority));

        tracing::debug!(
            wallet = %snapshot.wallet,
            count = recommendations.len(),
            "Generated recommendations"
        );

        recommendations
    }

    fn concentration_rule(&self, snapshot: &PortfolioSnapshot) -> Option<RebalancingRecommendation> {
        if snapshot.risk.concentration_risk <= self.rules.concentration_threshold {
            return None;
        }
        let largest = snapshot.largest_position()?;

        let target = if largest.symbol == self.stable_asset {
            &self.low_volatility_asset
        } else {
            &self.stable_asset
        };
        let trim = self.rules.concentration_trim;

        Some(recommendation(
            RecommendationType::RiskReduction,
            Priority::High,
            "Reduce portfolio concentration".into(),
            format!(
                "{} makes up {:.1}% of the portfolio (concentration index {:.2}). \
                 Moving {:.0}% of it into {} lowers single-asset exposure.",
                largest.symbol,
                largest.weight,
                snapshot.risk.concentration_risk,
                trim * 100.0,
                target
            ),
            vec![trim_action(
                largest,
                target,
                trim,
                format!("Largest position at {:.1}% weight", largest.weight),
                Urgency::High,
            )],
            ExpectedImpact {
                risk_reduction: CONCENTRATION_RISK_REDUCTION,
                return_improvement: CONCENTRATION_RETURN_TRADEOFF,
                tax_savings: None,
                cost_estimate: CONCENTRATION_COST,
            },
            CONCENTRATION_CONFIDENCE,
        ))
    }

    fn volatility_rule(&self, snapshot: &PortfolioSnapshot) -> Option<RebalancingRecommendation> {
        let trim = self.rules.volatility_trim;

        let actions: Vec<RebalancingAction> = snapshot
            .assets
            .iter()
            .filter(|a| a.volatility > self.rules.volatility_threshold)
            .map(|asset| {
                let target = if asset.symbol == self.low_volatility_asset {
                    &self.stable_asset
                } else {
                    &self.low_volatility_asset
                };
                trim_action(
                    asset,
                    target,
                    trim,
                    format!("Annualized volatility {:.0}%", asset.volatility * 100.0),
                    Urgency::Medium,
                )
            })
            .collect();

        if actions.is_empty() {
            return None;
        }

        let symbols: Vec<&str> = actions
            .iter()
            .filter_map(|a| a.from_asset.as_deref())
            .collect();

        Some(recommendation(
            RecommendationType::RiskReduction,
            Priority::Medium,
            "Trim high-volatility positions".into(),
            format!(
                "{} exceed{} {:.0}% annualized volatility. Trimming {:.0}% of each into {} \
                 smooths portfolio swings.",
                symbols.join(", "),
                if symbols.len() == 1 { "s" } else { "" },
                self.rules.volatility_threshold * 100.0,
                trim * 100.0,
                self.low_volatility_asset
            ),
            actions,
            ExpectedImpact {
                risk_reduction: VOLATILITY_RISK_REDUCTION,
                return_improvement: VOLATILITY_RETURN_TRADEOFF,
                tax_savings: None,
                cost_estimate: VOLATILITY_COST,
            },
            VOLATILITY_CONFIDENCE,
        ))
    }

    fn sharpe_rule(&self, snapshot: &PortfolioSnapshot) -> Option<RebalancingRecommendation> {
        let sharpe = snapshot.performance.sharpe_ratio;
        if sharpe >= self.rules.sharpe_threshold {
            return None;
        }

        let amount_usd = (snapshot.total_value * fraction(self.rules.opportunity_allocation)).round_dp(2);
        let amount = snapshot
            .assets
            .iter()
            .find(|a| a.symbol == self.opportunity_asset && !a.price.is_zero())
            .map_or(Decimal::ZERO, |a| (amount_usd / a.price).round_dp(8));

        Some(recommendation(
            RecommendationType::Opportunity,
            Priority::Medium,
            "Improve risk-adjusted returns".into(),
            format!(
                "Sharpe ratio of {sharpe:.2} is below {:.1}. Reallocating about {:.0}% of the \
                 portfolio toward {} may improve return per unit of risk.",
                self.rules.sharpe_threshold,
                self.rules.opportunity_allocation * 100.0,
                self.opportunity_asset
            ),
            vec![RebalancingAction {
                kind: ActionKind::Buy,
                from_asset: None,
                to_asset: Some(self.opportunity_asset.clone()),
                amount,
                amount_usd,
                reason: format!("Sharpe ratio {sharpe:.2}"),
                urgency: Urgency::Low,
            }],
            ExpectedImpact {
                risk_reduction: OPPORTUNITY_RISK_REDUCTION,
                return_improvement: OPPORTUNITY_RETURN_IMPROVEMENT,
                tax_savings: None,
                cost_estimate: OPPORTUNITY_COST,
            },
            OPPORTUNITY_CONFIDENCE,
        ))
    }
}

fn recommendation(
    kind: RecommendationType,
    priority: Priority,
    title: String,
    description: String,
    actions: Vec<RebalancingAction>,
    expected_impact: ExpectedImpact,
    confidence: f64,
) -> RebalancingRecommendation {
    RebalancingRecommendation {
        id: Uuid::new_v4(),
        kind,
        priority,
        title,
        description,
        actions,
        expected_impact,
        confidence,
        created_at: Utc::now(),
    }
}

/// Swap a share of a position into another asset
fn trim_action(
    asset: &AssetPosition,
    target: &str,
    share: f64,
    reason: String,
    urgency: Urgency,
) -> RebalancingAction {
    let share = fraction(share);
    RebalancingAction {
        kind: ActionKind::Swap,
        from_asset: Some(asset.symbol.clone()),
        to_asset: Some(target.to_string()),
        amount: (asset.balance * share).round_dp(8),
        amount_usd: (asset.usd_value * share).round_dp(2),
        reason,
        urgency,
    }
}

fn fraction(value: f64) -> Decimal {
    Decimal::from_f64_retain(value).map_or(Decimal::ZERO, |d| d.round_dp(6))
}
