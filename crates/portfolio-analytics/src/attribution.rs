//! Attribution Engine
//!
//! Splits the latest portfolio return into per-asset and per-chain
//! contributions. With a single snapshot the split uses 24h changes; with two
//! or more it compares the newest snapshot with the one before it and reports
//! whatever the weight-based split cannot explain.

use std::sync::Arc;

use chrono::Duration;
use rust_decimal::Decimal;

use crate::error::{AnalyticsError, Result};
use crate::model::{
    AssetContribution, AttributionMode, ChainContribution, PerformanceAttribution,
    PortfolioSnapshot, WalletId,
};
use crate::performance::{finite, to_f64};

/// Return attribution over a wallet's history
#[derive(Clone, Debug, Default)]
pub struct AttributionEngine;

impl AttributionEngine {
    pub const fn new() -> Self {
        Self
    }

    /// Attribute the latest return for a newest-first history
    pub fn attribute(
        &self,
        wallet: &WalletId,
        history: &[Arc<PortfolioSnapshot>],
    ) -> Result<PerformanceAttribution> {
        match history {
            [] => Err(AnalyticsError::NoSnapshotAvailable(wallet.to_string())),
            [latest] => Ok(single_snapshot(latest)),
            [latest, prior, ..] => Ok(snapshot_delta(latest, prior)),
        }
    }
}

fn single_snapshot(snapshot: &PortfolioSnapshot) -> PerformanceAttribution {
    let total_return = snapshot.performance.daily_return;

    let asset_contributions: Vec<AssetContribution> = snapshot
        .assets
        .iter()
        .map(|asset| {
            let contribution = finite(asset.weight / 100.0 * asset.change_24h);
            AssetContribution {
                symbol: asset.symbol.clone(),
                chain_id: asset.chain_id,
                weight: asset.weight,
                asset_return: asset.change_24h,
                contribution,
                contribution_percent: share_of(contribution, total_return),
            }
        })
        .collect();

    let chain_contributions = snapshot
        .chains
        .iter()
        .map(|chain| {
            let contribution = finite(chain.weight / 100.0 * chain.performance_24h);
            ChainContribution {
                chain_id: chain.chain_id,
                chain_name: chain.name.clone(),
                weight: chain.weight,
                chain_return: chain.performance_24h,
                contribution,
                contribution_percent: share_of(contribution, total_return),
            }
        })
        .collect();

    let total_attribution = asset_contributions.iter().map(|c| c.contribution).sum();

    PerformanceAttribution {
        wallet: snapshot.wallet.clone(),
        mode: AttributionMode::SingleSnapshot,
        period_start: snapshot.created_at - Duration::hours(24),
        period_end: snapshot.created_at,
        total_return,
        asset_contributions,
        chain_contributions,
        total_attribution,
        unexplained_return: 0.0,
    }
}

fn snapshot_delta(latest: &PortfolioSnapshot, prior: &PortfolioSnapshot) -> PerformanceAttribution {
    let total_return = percent_change(latest.total_value, prior.total_value);

    let asset_contributions: Vec<AssetContribution> = latest
        .assets
        .iter()
        .map(|asset| {
            // A position with no prior basis contributes nothing
            let asset_return = prior
                .asset(&asset.symbol, asset.chain_id)
                .map_or(0.0, |before| percent_change(asset.usd_value, before.usd_value));
            let contribution = finite(asset.weight / 100.0 * asset_return);
            AssetContribution {
                symbol: asset.symbol.clone(),
                chain_id: asset.chain_id,
                weight: asset.weight,
                asset_return,
                contribution,
                contribution_percent: share_of(contribution, total_return),
            }
        })
        .collect();

    let chain_contributions = latest
        .chains
        .iter()
        .map(|chain| {
            let chain_return = prior
                .chain(chain.chain_id)
                .map_or(0.0, |before| percent_change(chain.total_value, before.total_value));
            let contribution = finite(chain.weight / 100.0 * chain_return);
            ChainContribution {
                chain_id: chain.chain_id,
                chain_name: chain.name.clone(),
                weight: chain.weight,
                chain_return,
                contribution,
                contribution_percent: share_of(contribution, total_return),
            }
        })
        .collect();

    let total_attribution: f64 = asset_contributions.iter().map(|c| c.contribution).sum();
    let unexplained_return = finite(total_return - total_attribution);

    tracing::debug!(
        wallet = %latest.wallet,
        total_return,
        total_attribution,
        unexplained_return,
        "Attributed snapshot delta"
    );

    PerformanceAttribution {
        wallet: latest.wallet.clone(),
        mode: AttributionMode::SnapshotDelta,
        period_start: prior.created_at,
        period_end: latest.created_at,
        total_return,
        asset_contributions,
        chain_contributions,
        total_attribution,
        unexplained_return,
    }
}

fn percent_change(newer: Decimal, older: Decimal) -> f64 {
    if older.is_zero() {
        return 0.0;
    }
    to_f64((newer - older) / older) * 100.0
}

/// Part as a percentage of whole, zero when whole is zero
fn share_of(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    finite(part / whole * 100.0)
}
