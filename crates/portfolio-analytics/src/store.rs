//! Snapshot Store
//!
//! Bounded, newest-first snapshot history per wallet. A history is an
//! immutable shared slice; appending builds a new slice and swaps it in, so a
//! reader holding an older `History` never sees it change underneath.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::model::{PortfolioSnapshot, WalletId};

/// Newest-first, immutable view of a wallet's snapshots
pub type History = Arc<[Arc<PortfolioSnapshot>]>;

/// Snapshot persistence seam
pub trait SnapshotStore: Send + Sync {
    /// Full history, newest first (empty when the wallet is unknown)
    fn history(&self, wallet: &WalletId) -> History;

    /// Push a snapshot to the front, evicting the oldest past the cap.
    /// Returns the number of snapshots evicted.
    fn append(&self, snapshot: Arc<PortfolioSnapshot>) -> usize;

    /// Drop a wallet's history
    fn clear(&self, wallet: &WalletId);

    fn latest(&self, wallet: &WalletId) -> Option<Arc<PortfolioSnapshot>> {
        self.history(wallet).first().cloned()
    }

    fn len(&self, wallet: &WalletId) -> usize {
        self.history(wallet).len()
    }
}

/// In-memory store
pub struct MemorySnapshotStore {
    histories: RwLock<HashMap<WalletId, History>>,
    max_snapshots: usize,
}

impl MemorySnapshotStore {
    pub fn new(max_snapshots: usize) -> Self {
        Self {
            histories: RwLock::new(HashMap::new()),
            max_snapshots: max_snapshots.max(1),
        }
    }

    pub const fn max_snapshots(&self) -> usize {
        self.max_snapshots
    }

    /// Wallets with at least one snapshot
    pub fn wallets(&self) -> Vec<WalletId> {
        let histories = self.histories.read().unwrap_or_else(PoisonError::into_inner);
        histories.keys().cloned().collect()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn history(&self, wallet: &WalletId) -> History {
        let histories = self.histories.read().unwrap_or_else(PoisonError::into_inner);
        histories
            .get(wallet)
            .cloned()
            .unwrap_or_else(|| Arc::from(Vec::new()))
    }

    fn append(&self, snapshot: Arc<PortfolioSnapshot>) -> usize {
        let mut histories = self.histories.write().unwrap_or_else(PoisonError::into_inner);
        let wallet = snapshot.wallet.clone();

        let previous = histories.get(&wallet).map_or(0, |h| h.len());
        let next: Vec<Arc<PortfolioSnapshot>> = std::iter::once(snapshot)
            .chain(histories.get(&wallet).into_iter().flat_map(|h| h.iter().cloned()))
            .take(self.max_snapshots)
            .collect();

        let evicted = (previous + 1).saturating_sub(next.len());
        if evicted > 0 {
            tracing::debug!(%wallet, evicted, "Evicted oldest snapshots");
        }

        histories.insert(wallet, Arc::from(next));
        evicted
    }

    fn clear(&self, wallet: &WalletId) {
        let mut histories = self.histories.write().unwrap_or_else(PoisonError::into_inner);
        histories.remove(wallet);
    }
}
