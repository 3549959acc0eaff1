use chrono::Utc;
use serde::Deserialize;

use crate::external::quote_provider::{
    PricePoint, QuoteProvider, QuoteProviderError, SymbolMatch,
};
use async_trait::async_trait;

/// Keyless quote source backed by Yahoo's chart API. Used as the fallback
/// leg of the multi-provider so a missing Alpha Vantage key still yields
/// working quotes in development.
pub struct YahooProvider {
    client: reqwest::Client,
}

impl YahooProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new()
    }
}

// Minimal response structs (only what we need)
#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    meta: YahooMeta,
}

#[derive(Debug, Deserialize)]
struct YahooMeta {
    symbol: String,
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
}

#[async_trait]
impl QuoteProvider for YahooProvider {
    async fn latest_quote(&self, symbol: &str) -> Result<PricePoint, QuoteProviderError> {
        let url = format!(
            "https://query1.finance.yahoo.com/v8/finance/chart/{symbol}?range=1d&interval=1d"
        );

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| QuoteProviderError::Network(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(QuoteProviderError::RateLimited);
        }
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(QuoteProviderError::UnknownSymbol(symbol.to_string()));
        }

        let body = resp
            .json::<YahooChartResponse>()
            .await
            .map_err(|e| QuoteProviderError::Parse(e.to_string()))?;

        let result = body
            .chart
            .result
            .and_then(|mut r| r.pop())
            .ok_or_else(|| QuoteProviderError::BadResponse("missing result".into()))?;

        let price = result
            .meta
            .regular_market_price
            .ok_or_else(|| QuoteProviderError::BadResponse("missing market price".into()))?;

        Ok(PricePoint {
            symbol: result.meta.symbol,
            price,
            as_of: Utc::now(),
        })
    }

    async fn search_symbols(
        &self,
        _keyword: &str,
    ) -> Result<Vec<SymbolMatch>, QuoteProviderError> {
        // The chart API has no search endpoint; the multi-provider routes
        // searches to the primary provider.
        Err(QuoteProviderError::BadResponse(
            "symbol search not supported by this provider".into(),
        ))
    }
}
