//! Application State

use std::sync::Arc;

use portfolio_analytics::PortfolioAnalytics;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Analytics facade (holdings provider, snapshot store, engines)
    pub analytics: Arc<PortfolioAnalytics>,
}
