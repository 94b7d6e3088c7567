//! End-to-end tests for the analytics facade

use std::collections::HashSet;
use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use portfolio_analytics::model::{AttributionMode, RecommendationType};
use portfolio_analytics::{
    AnalyticsConfig, AnalyticsError, HeldAsset, History, Holdings, MemorySnapshotStore,
    PerformanceCalculator, PortfolioAnalytics, PortfolioSnapshot, Priority, SnapshotStore,
    StaticHoldingsProvider, StaticReferenceData, WalletId,
};

fn held(symbol: &str, chain_id: u64, usd_value: Decimal, change_24h: f64) -> HeldAsset {
    HeldAsset {
        symbol: symbol.into(),
        name: symbol.into(),
        balance: usd_value,
        usd_value,
        price: Decimal::ONE,
        chain_id,
        chain_name: if chain_id == 1 { "Ethereum".into() } else { "Polygon".into() },
        change_24h,
        change_7d: 0.0,
        change_30d: 0.0,
        volatility: None,
        sharpe_ratio: None,
    }
}

fn holdings(assets: Vec<HeldAsset>) -> Holdings {
    let total_value = assets.iter().map(|a| a.usd_value).sum();
    Holdings { total_value, assets }
}

fn setup(config: AnalyticsConfig) -> (Arc<PortfolioAnalytics>, Arc<StaticHoldingsProvider>) {
    let provider = Arc::new(StaticHoldingsProvider::empty());
    let analytics = PortfolioAnalytics::new(
        provider.clone(),
        Arc::new(MemorySnapshotStore::new(config.max_snapshots)),
        Arc::new(StaticReferenceData::builtin()),
        &config,
    );
    (Arc::new(analytics), provider)
}

fn wallet(raw: &str) -> WalletId {
    WalletId::parse(raw).unwrap()
}

#[tokio::test]
async fn test_daily_return_from_two_snapshots() {
    let (analytics, provider) = setup(AnalyticsConfig::default());
    let id = wallet("0xabc");

    provider.set_holdings(&id, holdings(vec![held("ETH", 1, dec!(100), 0.0)]));
    analytics.create_snapshot("0xabc").await.unwrap();

    provider.set_holdings(&id, holdings(vec![held("ETH", 1, dec!(110), 0.0)]));
    let snapshot = analytics.create_snapshot("0xabc").await.unwrap();

    assert!((snapshot.performance.daily_return - 10.0).abs() < 1e-9);
    assert_eq!(snapshot.performance.max_drawdown, 0.0);
    assert_eq!(snapshot.performance.sharpe_ratio, 0.0);
}

#[tokio::test]
async fn test_recomputing_from_history_matches_snapshot() {
    let config = AnalyticsConfig::default();
    let (analytics, provider) = setup(config.clone());
    let id = wallet("0xabc");

    for value in [dec!(1000), dec!(1040), dec!(990)] {
        provider.set_holdings(&id, holdings(vec![held("ETH", 1, value, 1.5)]));
        analytics.create_snapshot("0xabc").await.unwrap();
    }

    let history = analytics.get_snapshots("0xabc", 10).unwrap();
    let recomputed = PerformanceCalculator::new(config.risk_free_rate).compute_for_history(&history);

    assert_eq!(recomputed, history[0].performance);
    assert_eq!(recomputed.total_return, dec!(-10));
    assert!(recomputed.max_drawdown > 0.0);
}

#[tokio::test]
async fn test_identical_holdings_are_deterministic() {
    let (analytics, provider) = setup(AnalyticsConfig::default());
    let id = wallet("0xabc");
    provider.set_holdings(&id, StaticHoldingsProvider::sample_holdings());

    let first = analytics.create_snapshot("0xabc").await.unwrap();
    let second = analytics.create_snapshot("0xabc").await.unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(first.total_value, second.total_value);
    assert_eq!(first.risk, second.risk);
    let weights = |s: &portfolio_analytics::PortfolioSnapshot| -> Vec<f64> {
        s.assets.iter().map(|a| a.weight).collect()
    };
    assert_eq!(weights(&first), weights(&second));
}

#[tokio::test]
async fn test_snapshot_invariants_on_sample_portfolio() {
    let (analytics, provider) = setup(AnalyticsConfig::default());
    provider.set_holdings(&wallet("0xabc"), StaticHoldingsProvider::sample_holdings());

    let snapshot = analytics.create_snapshot("0xABC").await.unwrap();

    let weight_sum: f64 = snapshot.assets.iter().map(|a| a.weight).sum();
    assert!((weight_sum - 100.0).abs() < 0.01);

    let chain_sum: Decimal = snapshot.chains.iter().map(|c| c.total_value).sum();
    assert_eq!(chain_sum, snapshot.total_value);

    let n = snapshot.assets.len() as f64;
    assert!(snapshot.risk.concentration_risk >= 1.0 / n - 1e-12);
    assert!(snapshot.risk.concentration_risk <= 1.0);

    for (pair, rho) in &snapshot.risk.correlation_matrix {
        let (a, b) = pair.split_once('-').unwrap();
        assert_ne!(a, b);
        assert_eq!(snapshot.risk.correlation_matrix[&format!("{b}-{a}")], *rho);
    }
}

#[tokio::test]
async fn test_single_asset_always_gets_concentration_advice() {
    let (analytics, provider) = setup(AnalyticsConfig::default());
    provider.set_holdings(&wallet("0xabc"), holdings(vec![held("ETH", 1, dec!(5000), 1.0)]));

    let snapshot = analytics.create_snapshot("0xabc").await.unwrap();
    assert!((snapshot.risk.concentration_risk - 1.0).abs() < 1e-12);

    let recs = analytics.generate_recommendations("0xabc").unwrap();
    assert!(recs.iter().any(|r| r.kind == RecommendationType::RiskReduction
        && r.priority == Priority::High));
    assert_eq!(recs[0].priority, Priority::High);
}

#[tokio::test]
async fn test_no_history_paths() {
    let (analytics, _) = setup(AnalyticsConfig::default());

    assert!(analytics.generate_recommendations("0xnew").unwrap().is_empty());
    assert!(matches!(
        analytics.compute_attribution("0xnew"),
        Err(AnalyticsError::NoSnapshotAvailable(_))
    ));
    assert!(analytics.get_snapshots("0xnew", 10).unwrap().is_empty());
    assert!(analytics.get_historical_data("0xnew").unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_wallet_rejected_everywhere() {
    let (analytics, _) = setup(AnalyticsConfig::default());

    assert!(matches!(
        analytics.create_snapshot("  ").await,
        Err(AnalyticsError::InvalidWalletId(_))
    ));
    assert!(matches!(
        analytics.generate_recommendations("bad wallet"),
        Err(AnalyticsError::InvalidWalletId(_))
    ));
    assert!(analytics.get_snapshots("", 1).is_err());
}

#[tokio::test]
async fn test_failure_leaves_other_wallets_untouched() {
    let (analytics, provider) = setup(AnalyticsConfig::default());
    provider.set_holdings(&wallet("0xgood"), StaticHoldingsProvider::sample_holdings());

    analytics.create_snapshot("0xgood").await.unwrap();
    let err = analytics.create_snapshot("0xmissing").await.unwrap_err();

    assert!(err.is_data_unavailable());
    assert_eq!(analytics.get_snapshots("0xgood", 10).unwrap().len(), 1);
    assert!(analytics.get_snapshots("0xmissing", 10).unwrap().is_empty());
}

#[tokio::test]
async fn test_history_cap_and_chronology() {
    let config = AnalyticsConfig { max_snapshots: 3, ..Default::default() };
    let (analytics, provider) = setup(config);
    let id = wallet("0xabc");

    for value in [100, 200, 300, 400, 500] {
        provider.set_holdings(&id, holdings(vec![held("ETH", 1, Decimal::from(value), 0.0)]));
        analytics.create_snapshot("0xabc").await.unwrap();
    }

    let newest_first: Vec<Decimal> = analytics
        .get_snapshots("0xabc", 10)
        .unwrap()
        .iter()
        .map(|s| s.total_value)
        .collect();
    assert_eq!(newest_first, vec![dec!(500), dec!(400), dec!(300)]);

    let limited = analytics.get_snapshots("0xabc", 2).unwrap();
    assert_eq!(limited.len(), 2);

    let chronological: Vec<Decimal> = analytics
        .get_historical_data("0xabc")
        .unwrap()
        .iter()
        .map(|p| p.total_value)
        .collect();
    assert_eq!(chronological, vec![dec!(300), dec!(400), dec!(500)]);
}

#[tokio::test]
async fn test_attribution_modes() {
    let (analytics, provider) = setup(AnalyticsConfig::default());
    let id = wallet("0xabc");

    provider.set_holdings(
        &id,
        holdings(vec![held("ETH", 1, dec!(600), 5.0), held("MATIC", 137, dec!(400), -2.5)]),
    );
    analytics.create_snapshot("0xabc").await.unwrap();

    let single = analytics.compute_attribution("0xabc").unwrap();
    assert_eq!(single.mode, AttributionMode::SingleSnapshot);
    assert_eq!(single.unexplained_return, 0.0);

    provider.set_holdings(
        &id,
        holdings(vec![held("ETH", 1, dec!(660), 0.0), held("MATIC", 137, dec!(400), 0.0)]),
    );
    analytics.create_snapshot("0xabc").await.unwrap();

    let delta = analytics.compute_attribution("0xabc").unwrap();
    assert_eq!(delta.mode, AttributionMode::SnapshotDelta);
    assert!((delta.total_return - 6.0).abs() < 1e-9);
    let explained = delta.total_attribution + delta.unexplained_return;
    assert!((explained - delta.total_return).abs() < 1e-9);
}

#[tokio::test]
async fn test_summary_bundles_everything() {
    let (analytics, provider) = setup(AnalyticsConfig::default());
    provider.set_holdings(&wallet("0xabc"), holdings(vec![held("DOGE", 1, dec!(1000), 12.0)]));

    let summary = analytics.get_portfolio_summary("0xabc").await.unwrap();

    assert_eq!(summary.current_snapshot.total_value, dec!(1000));
    assert_eq!(summary.performance_attribution.mode, AttributionMode::SingleSnapshot);
    assert!(!summary.recommendations.is_empty());
    assert_eq!(analytics.get_snapshots("0xabc", 10).unwrap().len(), 1);
}

/// Store that loses every snapshot as soon as it is written
struct EvictingStore;

impl SnapshotStore for EvictingStore {
    fn history(&self, _wallet: &WalletId) -> History {
        Arc::from(Vec::<Arc<PortfolioSnapshot>>::new())
    }

    fn append(&self, _snapshot: Arc<PortfolioSnapshot>) -> usize {
        1
    }

    fn clear(&self, _wallet: &WalletId) {}
}

#[tokio::test]
async fn test_summary_survives_immediate_eviction() {
    let config = AnalyticsConfig::default();
    let provider = Arc::new(StaticHoldingsProvider::new());
    let analytics = PortfolioAnalytics::new(
        provider,
        Arc::new(EvictingStore),
        Arc::new(StaticReferenceData::builtin()),
        &config,
    );

    let summary = analytics.get_portfolio_summary("0xabc").await.unwrap();

    assert_eq!(summary.performance_attribution.mode, AttributionMode::SingleSnapshot);
    assert_eq!(summary.performance_attribution.period_end, summary.current_snapshot.created_at);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_snapshots_for_one_wallet() {
    let (analytics, provider) = setup(AnalyticsConfig::default());
    provider.set_holdings(&wallet("0xabc"), StaticHoldingsProvider::sample_holdings());

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let analytics = Arc::clone(&analytics);
            tokio::spawn(async move { analytics.create_snapshot("0xABC").await })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let history = analytics.get_snapshots("0xabc", 100).unwrap();
    assert_eq!(history.len(), 16);

    let ids: HashSet<_> = history.iter().map(|s| s.id).collect();
    assert_eq!(ids.len(), 16);
    assert!(history.windows(2).all(|w| w[0].created_at >= w[1].created_at));
}
