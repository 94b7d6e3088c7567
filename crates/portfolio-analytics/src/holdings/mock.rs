//! Static Holdings Provider
//!
//! For testing and demo purposes. Returns a fixed multi-chain portfolio unless
//! a wallet has been given its own holdings.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::HoldingsProvider;
use crate::error::{AnalyticsError, Result};
use crate::model::{HeldAsset, Holdings, WalletId};

/// Holdings provider backed by in-memory fixtures
pub struct StaticHoldingsProvider {
    overrides: RwLock<HashMap<WalletId, Holdings>>,
    /// Serve the sample portfolio to wallets without an override
    fallback_to_sample: bool,
}

impl Default for StaticHoldingsProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticHoldingsProvider {
    /// Every wallet gets the sample portfolio
    pub fn new() -> Self {
        Self {
            overrides: RwLock::new(HashMap::new()),
            fallback_to_sample: true,
        }
    }

    /// Only explicitly configured wallets have holdings
    pub fn empty() -> Self {
        Self {
            overrides: RwLock::new(HashMap::new()),
            fallback_to_sample: false,
        }
    }

    /// Replace the holdings reported for a wallet
    pub fn set_holdings(&self, wallet: &WalletId, holdings: Holdings) {
        self.overrides
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(wallet.clone(), holdings);
    }

    /// Stop reporting holdings for a wallet
    pub fn remove_holdings(&self, wallet: &WalletId) {
        self.overrides
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(wallet);
    }

    /// Fixed sample portfolio spread over four chains
    pub fn sample_holdings() -> Holdings {
        // (symbol, name, balance, price, chain id, chain, 24h, 7d, 30d)
        let rows: [(&str, &str, Decimal, Decimal, u64, &str, f64, f64, f64); 6] = [
            ("ETH", "Ethereum", dec!(2.5), dec!(3450), 1, "Ethereum", 1.8, 4.2, 9.5),
            ("USDC", "USD Coin", dec!(5000), dec!(1), 1, "Ethereum", 0.0, 0.0, 0.0),
            ("MATIC", "Polygon", dec!(4000), dec!(0.52), 137, "Polygon", -0.5, -3.1, -12.4),
            ("USDC", "USD Coin", dec!(1500), dec!(1), 137, "Polygon", 0.0, 0.0, 0.0),
            ("LINK", "Chainlink", dec!(100), dec!(24.50), 42161, "Arbitrum", 3.1, 6.8, 14.0),
            ("AVAX", "Avalanche", dec!(50), dec!(42.00), 43114, "Avalanche", 5.5, 2.3, -4.8),
        ];

        let assets: Vec<HeldAsset> = rows
            .into_iter()
            .map(|(symbol, name, balance, price, chain_id, chain, d1, d7, d30)| HeldAsset {
                symbol: symbol.into(),
                name: name.into(),
                balance,
                usd_value: balance * price,
                price,
                chain_id,
                chain_name: chain.into(),
                change_24h: d1,
                change_7d: d7,
                change_30d: d30,
                volatility: None,
                sharpe_ratio: None,
            })
            .collect();

        let total_value = assets.iter().map(|a| a.usd_value).sum();
        Holdings { total_value, assets }
    }
}

#[async_trait]
impl HoldingsProvider for StaticHoldingsProvider {
    async fn fetch_holdings(&self, wallet: &WalletId) -> Result<Holdings> {
        let configured = self
            .overrides
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(wallet)
            .cloned();

        match configured {
            Some(holdings) => Ok(holdings),
            None if self.fallback_to_sample => Ok(Self::sample_holdings()),
            None => Err(AnalyticsError::DataUnavailable(format!(
                "no holdings configured for {wallet}"
            ))),
        }
    }

    fn name(&self) -> &str {
        "StaticHoldings"
    }
}
