//! Holdings Integration
//!
//! The analytics core never scans chains itself. It asks a `HoldingsProvider`
//! for a wallet's current positions and builds everything else from that.

mod http;
mod mock;

pub use http::HttpHoldingsProvider;
pub use mock::StaticHoldingsProvider;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Holdings, WalletId};

/// Holdings collaborator (Strategy pattern)
///
/// Implement this for each chain-scan backend. Valuation and pricing
/// correctness is the provider's responsibility.
#[async_trait]
pub trait HoldingsProvider: Send + Sync {
    /// Current holdings for a wallet.
    /// Fails with `DataUnavailable` when nothing can be reported.
    async fn fetch_holdings(&self, wallet: &WalletId) -> Result<Holdings>;

    /// Provider name
    fn name(&self) -> &str;
}
