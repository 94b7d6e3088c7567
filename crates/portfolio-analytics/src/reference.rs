//! Reference Data
//!
//! Pairwise correlations and per-asset volatilities the risk calculator reads.
//! Implement `ReferenceData` to plug in a market-data backed source; the
//! built-in table covers the common large caps and nothing more.

use std::collections::HashMap;

/// Symbol-keyed market reference data
pub trait ReferenceData: Send + Sync {
    /// Correlation between two distinct symbols, if known.
    /// Must return the same value for `(a, b)` and `(b, a)`.
    fn correlation(&self, a: &str, b: &str) -> Option<f64>;

    /// Annualized volatility (fraction) for a symbol, if known
    fn volatility(&self, symbol: &str) -> Option<f64>;
}

/// Volatility assumed for symbols the table does not know
pub const UNKNOWN_VOLATILITY: f64 = 1.0;

/// In-memory reference table
#[derive(Clone, Debug)]
pub struct StaticReferenceData {
    correlations: HashMap<(String, String), f64>,
    volatilities: HashMap<String, f64>,
}

impl Default for StaticReferenceData {
    fn default() -> Self {
        Self::builtin()
    }
}

impl StaticReferenceData {
    /// Empty table; every lookup misses
    pub fn empty() -> Self {
        Self {
            correlations: HashMap::new(),
            volatilities: HashMap::new(),
        }
    }

    /// Built-in BTC-pair correlations and 30-day volatilities
    pub fn builtin() -> Self {
        let mut table = Self::empty();

        for (symbol, vol) in [
            ("BTC", 0.45),
            ("ETH", 0.55),
            ("SOL", 0.75),
            ("ADA", 0.70),
            ("DOT", 0.70),
            ("AVAX", 0.70),
            ("LINK", 0.80),
            ("MATIC", 0.80),
            ("ATOM", 0.80),
            ("XRP", 0.80),
            ("DOGE", 1.50),
            ("SHIB", 1.50),
            ("USDC", 0.01),
            ("USDT", 0.01),
            ("DAI", 0.01),
        ] {
            table = table.with_volatility(symbol, vol);
        }

        for (symbol, rho) in [
            ("ETH", 0.85),
            ("SOL", 0.70),
            ("ADA", 0.75),
            ("DOT", 0.75),
            ("AVAX", 0.75),
            ("LINK", 0.65),
            ("MATIC", 0.65),
            ("ATOM", 0.65),
            ("XRP", 0.65),
            ("DOGE", 0.40),
            ("SHIB", 0.40),
        ] {
            table = table.with_correlation("BTC", symbol, rho);
        }

        table
    }

    pub fn with_correlation(mut self, a: &str, b: &str, rho: f64) -> Self {
        self.correlations.insert(pair_key(a, b), rho.clamp(-1.0, 1.0));
        self
    }

    pub fn with_volatility(mut self, symbol: &str, volatility: f64) -> Self {
        self.volatilities.insert(symbol.to_uppercase(), volatility.max(0.0));
        self
    }
}

impl ReferenceData for StaticReferenceData {
    fn correlation(&self, a: &str, b: &str) -> Option<f64> {
        if a.eq_ignore_ascii_case(b) {
            return None;
        }
        self.correlations.get(&pair_key(a, b)).copied()
    }

    fn volatility(&self, symbol: &str) -> Option<f64> {
        self.volatilities.get(&symbol.to_uppercase()).copied()
    }
}

/// Order-independent key for a symbol pair
fn pair_key(a: &str, b: &str) -> (String, String) {
    let (a, b) = (a.to_uppercase(), b.to_uppercase());
    if a <= b { (a, b) } else { (b, a) }
}

/// Native token symbol for well-known chain ids
pub fn native_symbol(chain_id: u64, chain_name: &str) -> String {
    match chain_id {
        1 | 10 | 8453 | 42161 | 324 | 59144 => "ETH".into(),
        56 => "BNB".into(),
        137 => "MATIC".into(),
        43114 => "AVAX".into(),
        250 => "FTM".into(),
        100 => "XDAI".into(),
        _ => chain_name.to_uppercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_is_symmetric() {
        let table = StaticReferenceData::builtin();
        assert_eq!(table.correlation("BTC", "ETH"), Some(0.85));
        assert_eq!(table.correlation("eth", "btc"), Some(0.85));
    }

    #[test]
    fn test_self_pair_has_no_entry() {
        let table = StaticReferenceData::builtin();
        assert_eq!(table.correlation("BTC", "btc"), None);
    }

    #[test]
    fn test_unknown_pair_misses() {
        let table = StaticReferenceData::builtin();
        assert_eq!(table.correlation("ETH", "SOL"), None);
        assert_eq!(table.volatility("PEPE"), None);
    }

    #[test]
    fn test_native_symbol() {
        assert_eq!(native_symbol(42161, "Arbitrum"), "ETH");
        assert_eq!(native_symbol(999_999, "Newchain"), "NEWCHAIN");
    }
}
