use async_trait::async_trait;
use tracing::{info, warn};

use crate::external::quote_provider::{
    PricePoint, QuoteProvider, QuoteProviderError, SymbolMatch,
};

/// Quote source with primary → fallback routing.
///
/// Strategy:
/// 1. Ask the primary provider (Alpha Vantage).
/// 2. On rate limit or unknown symbol, try the keyless fallback (Yahoo).
/// 3. Surface the fallback's error if both legs fail.
pub struct MultiProvider {
    primary: Box<dyn QuoteProvider>,
    fallback: Box<dyn QuoteProvider>,
}

impl MultiProvider {
    pub fn new(primary: Box<dyn QuoteProvider>, fallback: Box<dyn QuoteProvider>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl QuoteProvider for MultiProvider {
    async fn latest_quote(&self, symbol: &str) -> Result<PricePoint, QuoteProviderError> {
        match self.primary.latest_quote(symbol).await {
            Ok(quote) => return Ok(quote),
            Err(QuoteProviderError::RateLimited) => {
                info!("⚠️ Primary quote provider rate limited, trying fallback for {}", symbol);
            }
            Err(QuoteProviderError::UnknownSymbol(_)) => {
                info!("⚠️ Symbol {} unknown to primary provider, trying fallback", symbol);
            }
            Err(e) => {
                warn!("Primary quote provider error for {}: {}", symbol, e);
            }
        }

        match self.fallback.latest_quote(symbol).await {
            Ok(quote) => {
                info!("✓ Fetched {} from fallback quote provider", symbol);
                Ok(quote)
            }
            Err(e) => {
                warn!("Fallback quote provider failed for {}: {}", symbol, e);
                Err(e)
            }
        }
    }

    async fn search_symbols(
        &self,
        keyword: &str,
    ) -> Result<Vec<SymbolMatch>, QuoteProviderError> {
        match self.primary.search_symbols(keyword).await {
            Ok(matches) if !matches.is_empty() => Ok(matches),
            Ok(_) => {
                info!("No symbol matches from primary provider for '{}', trying fallback", keyword);
                self.fallback.search_symbols(keyword).await
            }
            Err(e) => {
                warn!("Primary symbol search failed for '{}': {}", keyword, e);
                self.fallback.search_symbols(keyword).await
            }
        }
    }
}
