use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use chrono::Utc;

use crate::external::quote_provider::{
    PricePoint, QuoteProvider, QuoteProviderError, SymbolMatch,
};

/// Offline quote source for local development. The base price is derived
/// from the symbol itself, so repeated runs stay stable; optional jitter
/// adds intraday-looking movement on top.
pub struct MockQuoteProvider {
    jitter: bool,
}

impl MockQuoteProvider {
    pub fn new(jitter: bool) -> Self {
        Self { jitter }
    }

    fn base_price(symbol: &str) -> f64 {
        let mut hasher = DefaultHasher::new();
        symbol.hash(&mut hasher);
        // Map the hash onto a plausible 10.00 .. 510.00 range
        10.0 + (hasher.finish() % 50_000) as f64 / 100.0
    }
}

#[async_trait]
impl QuoteProvider for MockQuoteProvider {
    async fn latest_quote(&self, symbol: &str) -> Result<PricePoint, QuoteProviderError> {
        let mut price = Self::base_price(symbol);
        if self.jitter {
            price *= 1.0 + (rand::random::<f64>() - 0.5) * 0.02;
        }

        Ok(PricePoint {
            symbol: symbol.to_string(),
            price,
            as_of: Utc::now(),
        })
    }

    async fn search_symbols(
        &self,
        keyword: &str,
    ) -> Result<Vec<SymbolMatch>, QuoteProviderError> {
        let symbol = keyword.to_uppercase();
        Ok(vec![SymbolMatch {
            name: format!("{} Inc (mock)", symbol),
            symbol,
            region: "United States".to_string(),
            currency: "USD".to_string(),
            match_score: 1.0,
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_prices_are_stable_without_jitter() {
        let provider = MockQuoteProvider::new(false);
        let a = provider.latest_quote("AAPL").await.unwrap();
        let b = provider.latest_quote("AAPL").await.unwrap();
        assert_eq!(a.price, b.price);
        assert!(a.price >= 10.0);
    }

    #[tokio::test]
    async fn test_mock_prices_differ_across_symbols() {
        let provider = MockQuoteProvider::new(false);
        let a = provider.latest_quote("AAPL").await.unwrap();
        let b = provider.latest_quote("MSFT").await.unwrap();
        assert_ne!(a.price, b.price);
    }
}
