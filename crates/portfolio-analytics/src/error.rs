//! Error Types for Portfolio Analytics

use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalyticsError>;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// Holdings collaborator failed or returned nothing
    #[error("Holdings data unavailable: {0}")]
    DataUnavailable(String),

    /// Holdings collaborator did not answer within the configured timeout
    #[error("Holdings request for {wallet} timed out after {timeout:?}")]
    HoldingsTimeout { wallet: String, timeout: Duration },

    /// Attribution requested before any snapshot exists
    #[error("No snapshot available for wallet {0}")]
    NoSnapshotAvailable(String),

    #[error("Invalid wallet id: {0}")]
    InvalidWalletId(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AnalyticsError {
    /// Holdings could not be obtained, whatever the cause
    pub const fn is_data_unavailable(&self) -> bool {
        matches!(
            self,
            Self::DataUnavailable(_) | Self::HoldingsTimeout { .. } | Self::Network(_)
        )
    }

    /// Check if the caller may reasonably retry
    pub const fn is_retryable(&self) -> bool {
        self.is_data_unavailable()
    }

    /// Stable machine-readable code
    pub const fn code(&self) -> &'static str {
        match self {
            Self::DataUnavailable(_) | Self::Network(_) => "DATA_UNAVAILABLE",
            Self::HoldingsTimeout { .. } => "HOLDINGS_TIMEOUT",
            Self::NoSnapshotAvailable(_) => "NO_SNAPSHOT",
            Self::InvalidWalletId(_) => "INVALID_WALLET_ID",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::DataUnavailable(_) | Self::Network(_) => {
                "Wallet holdings are currently unavailable. Please try again.".into()
            }
            Self::HoldingsTimeout { .. } => {
                "Fetching wallet holdings took too long. Please try again.".into()
            }
            Self::NoSnapshotAvailable(wallet) => {
                format!("No portfolio snapshot exists yet for {wallet}. Create one first.")
            }
            Self::InvalidWalletId(id) => format!("'{id}' is not a valid wallet identifier."),
            _ => "An unexpected error occurred.".into(),
        }
    }
}
