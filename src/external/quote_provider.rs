use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Live market quote for one symbol. Ephemeral: fetched per request and
/// never persisted, so there is no staleness contract to maintain.
#[derive(Debug, Clone, Serialize)]
pub struct PricePoint {
    pub symbol: String,
    pub price: f64,
    pub as_of: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SymbolMatch {
    pub symbol: String,
    pub name: String,
    pub region: String,
    pub currency: String,
    pub match_score: f64,
}

#[derive(Debug, Error)]
pub enum QuoteProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("rate limited")]
    RateLimited,
}

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Current market price for one symbol. Callers treat a failure as
    /// missing data for the current run; no retry contract is implied.
    async fn latest_quote(&self, symbol: &str) -> Result<PricePoint, QuoteProviderError>;

    /// Keyword search against the provider's symbol directory.
    async fn search_symbols(&self, keyword: &str)
        -> Result<Vec<SymbolMatch>, QuoteProviderError>;
}
