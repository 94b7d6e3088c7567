//! Performance Calculator
//!
//! Return and volatility statistics over a wallet's value series. With two or
//! more snapshots the statistics come from snapshot-to-snapshot returns; a
//! wallet with less history falls back to the value-weighted 24h/7d/30d
//! changes of its current assets.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::model::{AssetPosition, PerformanceMetrics, PortfolioSnapshot};

const DAILY_WINDOW: usize = 1;
const WEEKLY_WINDOW: usize = 7;
const MONTHLY_WINDOW: usize = 30;
const YEARLY_WINDOW: usize = 365;

/// Derives `PerformanceMetrics` from a value series
#[derive(Clone, Debug)]
pub struct PerformanceCalculator {
    risk_free_rate: f64,
}

impl PerformanceCalculator {
    pub const fn new(risk_free_rate: f64) -> Self {
        Self { risk_free_rate }
    }

    /// Metrics for an existing history (newest first)
    pub fn compute_for_history<S: AsRef<PortfolioSnapshot>>(
        &self,
        history: &[S],
    ) -> PerformanceMetrics {
        let values: Vec<Decimal> = history.iter().map(|s| s.as_ref().total_value).collect();
        let assets = history.first().map_or(&[][..], |s| s.as_ref().assets.as_slice());
        self.compute(&values, assets)
    }

    /// Metrics for a newest-first value series whose head is the current
    /// portfolio described by `current_assets`.
    pub fn compute(&self, values: &[Decimal], current_assets: &[AssetPosition]) -> PerformanceMetrics {
        if values.len() < 2 {
            let current_value = values.first().copied().unwrap_or(Decimal::ZERO);
            return self.cross_sectional(current_value, current_assets);
        }

        let returns = period_returns(values);
        let volatility = std_dev(&returns);
        let mean_return = mean(&returns);

        let newest = values[0];
        let oldest = values[values.len() - 1];
        let total_return = newest - oldest;

        let metrics = PerformanceMetrics {
            total_return,
            total_return_percent: percent_change(newest, oldest),
            daily_return: window_mean(&returns, DAILY_WINDOW),
            weekly_return: window_mean(&returns, WEEKLY_WINDOW),
            monthly_return: window_mean(&returns, MONTHLY_WINDOW),
            yearly_return: window_mean(&returns, YEARLY_WINDOW),
            volatility,
            sharpe_ratio: self.sharpe(mean_return, volatility),
            max_drawdown: max_drawdown(values),
            win_rate: win_rate(&returns),
            best_day: returns.iter().copied().reduce(f64::max).unwrap_or(0.0),
            worst_day: returns.iter().copied().reduce(f64::min).unwrap_or(0.0),
        };

        tracing::debug!(
            periods = returns.len(),
            daily = metrics.daily_return,
            volatility = metrics.volatility,
            sharpe = metrics.sharpe_ratio,
            "Computed period performance"
        );

        metrics
    }

    /// Single-snapshot proxy built from each asset's own recent changes
    fn cross_sectional(&self, total_value: Decimal, assets: &[AssetPosition]) -> PerformanceMetrics {
        let weighted = |field: fn(&AssetPosition) -> f64| -> f64 {
            finite(assets.iter().map(|a| a.weight / 100.0 * field(a)).sum())
        };

        let daily_return = weighted(|a| a.change_24h);
        let monthly_return = weighted(|a| a.change_30d);
        let volatility = weighted(|a| a.volatility * 100.0);

        let total_return = Decimal::from_f64_retain(daily_return / 100.0)
            .map_or(Decimal::ZERO, |r| (total_value * r).round_dp(2));

        PerformanceMetrics {
            total_return,
            total_return_percent: daily_return,
            daily_return,
            weekly_return: weighted(|a| a.change_7d),
            monthly_return,
            yearly_return: monthly_return * 12.0,
            volatility,
            sharpe_ratio: self.sharpe(daily_return, volatility),
            max_drawdown: 0.0,
            win_rate: 0.0,
            best_day: 0.0,
            worst_day: 0.0,
        }
    }

    /// Zero when there is no volatility to scale by
    fn sharpe(&self, mean_return: f64, volatility: f64) -> f64 {
        if volatility > 0.0 {
            finite((mean_return - self.risk_free_rate) / volatility)
        } else {
            0.0
        }
    }
}

/// Percent returns between adjacent snapshots, most recent period first
pub fn period_returns(values: &[Decimal]) -> Vec<f64> {
    values
        .windows(2)
        .map(|pair| percent_change(pair[0], pair[1]))
        .collect()
}

/// Largest peak-to-trough decline (percent), scanned oldest to newest
pub fn max_drawdown(values: &[Decimal]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }

    let mut peak = Decimal::ZERO;
    let mut worst = 0.0_f64;
    for &value in values.iter().rev() {
        if value > peak {
            peak = value;
        }
        if peak > Decimal::ZERO {
            let drawdown = to_f64((peak - value) / peak) * 100.0;
            worst = worst.max(drawdown);
        }
    }
    worst
}

fn percent_change(newer: Decimal, older: Decimal) -> f64 {
    if older.is_zero() {
        return 0.0;
    }
    to_f64((newer - older) / older) * 100.0
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    finite(values.iter().sum::<f64>() / values.len() as f64)
}

fn window_mean(returns: &[f64], window: usize) -> f64 {
    mean(&returns[..window.min(returns.len())])
}

/// Population standard deviation
fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let avg = mean(values);
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    finite(variance.sqrt())
}

fn win_rate(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    returns.iter().filter(|r| **r > 0.0).count() as f64 / returns.len() as f64
}

pub(crate) fn to_f64(value: Decimal) -> f64 {
    finite(value.to_f64().unwrap_or(0.0))
}

pub(crate) fn finite(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}
