//! Snapshot Builder
//!
//! Pulls current holdings from the `HoldingsProvider`, derives positions,
//! chain aggregates, performance and risk, and appends the result to the
//! wallet's history. Nothing is stored unless every step succeeds.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{AnalyticsError, Result};
use crate::holdings::HoldingsProvider;
use crate::model::{AssetPosition, ChainPosition, Holdings, PortfolioSnapshot, WalletId};
use crate::performance::{PerformanceCalculator, to_f64};
use crate::reference::{ReferenceData, UNKNOWN_VOLATILITY, native_symbol};
use crate::risk::RiskCalculator;
use crate::store::SnapshotStore;

/// Tolerated gap between the provider's total and the sum of its assets
const TOTAL_MISMATCH_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Builds and records portfolio snapshots
pub struct SnapshotBuilder {
    provider: Arc<dyn HoldingsProvider>,
    store: Arc<dyn SnapshotStore>,
    reference: Arc<dyn ReferenceData>,
    performance: PerformanceCalculator,
    risk: RiskCalculator,
    timeout: Duration,
    wallet_locks: WalletLocks,
}

impl SnapshotBuilder {
    pub fn new(
        provider: Arc<dyn HoldingsProvider>,
        store: Arc<dyn SnapshotStore>,
        reference: Arc<dyn ReferenceData>,
        performance: PerformanceCalculator,
        risk: RiskCalculator,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            store,
            reference,
            performance,
            risk,
            timeout,
            wallet_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch holdings, build a snapshot and push it onto the wallet's history.
    ///
    /// Calls for the same wallet are serialized; different wallets proceed in
    /// parallel.
    pub async fn create_snapshot(&self, wallet: &WalletId) -> Result<Arc<PortfolioSnapshot>> {
        let lease = self.wallet_lock(wallet);
        let _guard = lease.lock.lock().await;

        let holdings = self.fetch(wallet).await?;
        let history = self.store.history(wallet);
        let snapshot = Arc::new(self.build(wallet, &holdings, &history));

        let evicted = self.store.append(Arc::clone(&snapshot));
        tracing::info!(
            %wallet,
            snapshot = %snapshot.id,
            total_value = %snapshot.total_value,
            assets = snapshot.assets.len(),
            history = history.len() + 1 - evicted,
            "Created portfolio snapshot"
        );

        Ok(snapshot)
    }

    /// Assemble a snapshot from holdings and the prior history (newest first)
    pub fn build(
        &self,
        wallet: &WalletId,
        holdings: &Holdings,
        history: &[Arc<PortfolioSnapshot>],
    ) -> PortfolioSnapshot {
        let (assets, total_value) = self.positions(holdings);
        if (total_value - holdings.total_value).abs() > TOTAL_MISMATCH_TOLERANCE {
            tracing::warn!(
                %wallet,
                reported = %holdings.total_value,
                summed = %total_value,
                "Provider total differs from asset sum; using asset sum"
            );
        }

        let chains = aggregate_chains(&assets, total_value);

        let values: Vec<Decimal> = std::iter::once(total_value)
            .chain(history.iter().map(|s| s.total_value))
            .collect();
        let performance = self.performance.compute(&values, &assets);
        let risk = self.risk.compute(&assets, total_value);

        PortfolioSnapshot {
            id: Uuid::new_v4(),
            wallet: wallet.clone(),
            created_at: Utc::now(),
            total_value,
            assets,
            chains,
            performance,
            risk,
        }
    }

    async fn fetch(&self, wallet: &WalletId) -> Result<Holdings> {
        let holdings = tokio::time::timeout(self.timeout, self.provider.fetch_holdings(wallet))
            .await
            .map_err(|_| {
                tracing::warn!(%wallet, provider = self.provider.name(), "Holdings request timed out");
                AnalyticsError::HoldingsTimeout {
                    wallet: wallet.to_string(),
                    timeout: self.timeout,
                }
            })?
            .inspect_err(|e| {
                tracing::warn!(%wallet, provider = self.provider.name(), error = %e, "Holdings request failed");
            })?;

        if holdings.assets.is_empty() {
            return Err(AnalyticsError::DataUnavailable(format!(
                "{} returned no assets for {wallet}",
                self.provider.name()
            )));
        }

        Ok(holdings)
    }

    /// Positions with weights against the summed asset value
    fn positions(&self, holdings: &Holdings) -> (Vec<AssetPosition>, Decimal) {
        let total_value: Decimal = holdings.assets.iter().map(|a| a.usd_value).sum();

        let assets = holdings
            .assets
            .iter()
            .map(|held| {
                let symbol = held.symbol.trim().to_uppercase();
                let volatility = held
                    .volatility
                    .filter(|v| v.is_finite() && *v >= 0.0)
                    .or_else(|| self.reference.volatility(&symbol))
                    .unwrap_or(UNKNOWN_VOLATILITY);

                AssetPosition {
                    name: held.name.clone(),
                    balance: held.balance,
                    usd_value: held.usd_value,
                    price: held.price,
                    chain_id: held.chain_id,
                    chain_name: held.chain_name.clone(),
                    weight: weight_of(held.usd_value, total_value),
                    change_24h: sanitize(held.change_24h),
                    change_7d: sanitize(held.change_7d),
                    change_30d: sanitize(held.change_30d),
                    volatility,
                    sharpe_ratio: held.sharpe_ratio.filter(|s| s.is_finite()),
                    symbol,
                }
            })
            .collect();

        (assets, total_value)
    }

    fn wallet_lock(&self, wallet: &WalletId) -> WalletLease<'_> {
        let mut locks = self.wallet_locks.lock().unwrap_or_else(PoisonError::into_inner);
        let lock = Arc::clone(locks.entry(wallet.clone()).or_default());
        WalletLease {
            locks: &self.wallet_locks,
            wallet: wallet.clone(),
            lock,
        }
    }
}

type WalletLocks = Mutex<HashMap<WalletId, Arc<tokio::sync::Mutex<()>>>>;

/// Claim on a wallet's lock; the map entry goes away with its last claim.
struct WalletLease<'a> {
    locks: &'a WalletLocks,
    wallet: WalletId,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl Drop for WalletLease<'_> {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Claims are only handed out under the map lock, so the map's entry
        // plus ours means nobody else is waiting.
        let idle = locks
            .get(&self.wallet)
            .is_some_and(|entry| Arc::ptr_eq(entry, &self.lock) && Arc::strong_count(entry) == 2);
        if idle {
            locks.remove(&self.wallet);
        }
    }
}

/// Group positions by chain id, in first-seen order
pub fn aggregate_chains(assets: &[AssetPosition], total_value: Decimal) -> Vec<ChainPosition> {
    let mut chains: Vec<ChainPosition> = Vec::new();
    let mut weighted_change: Vec<Decimal> = Vec::new();
    let mut index: HashMap<u64, usize> = HashMap::new();

    for asset in assets {
        let slot = *index.entry(asset.chain_id).or_insert_with(|| {
            chains.push(ChainPosition {
                chain_id: asset.chain_id,
                name: asset.chain_name.clone(),
                symbol: native_symbol(asset.chain_id, &asset.chain_name),
                total_value: Decimal::ZERO,
                weight: 0.0,
                asset_count: 0,
                performance_24h: 0.0,
            });
            weighted_change.push(Decimal::ZERO);
            chains.len() - 1
        });

        let chain = &mut chains[slot];
        chain.total_value += asset.usd_value;
        chain.asset_count += 1;
        weighted_change[slot] +=
            asset.usd_value * Decimal::from_f64_retain(asset.change_24h).unwrap_or(Decimal::ZERO);
    }

    for (chain, change) in chains.iter_mut().zip(weighted_change) {
        chain.weight = weight_of(chain.total_value, total_value);
        chain.performance_24h = if chain.total_value.is_zero() {
            0.0
        } else {
            to_f64(change / chain.total_value)
        };
    }

    chains
}

/// Percentage of total, zero when the total is zero
fn weight_of(value: Decimal, total: Decimal) -> f64 {
    if total.is_zero() {
        return 0.0;
    }
    to_f64(value / total) * 100.0
}

fn sanitize(change: f64) -> f64 {
    if change.is_finite() { change } else { 0.0 }
}
