use chrono::Utc;
use serde::Deserialize;

use crate::external::quote_provider::{
    PricePoint, QuoteProvider, QuoteProviderError, SymbolMatch,
};
use async_trait::async_trait;

pub struct AlphaVantageProvider {
    client: reqwest::Client,
    api_key: String,
}

impl AlphaVantageProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AvQuoteResponse {
    #[serde(rename = "Global Quote")]
    global_quote: Option<AvGlobalQuote>,

    // When rate-limited Alpha Vantage returns:
    // { "Note": "Thank you for using Alpha Vantage! ... 5 calls per minute ..." }
    #[serde(rename = "Note")]
    note: Option<String>,

    // When invalid:
    // { "Error Message": "Invalid API call. ..." }
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AvGlobalQuote {
    #[serde(rename = "01. symbol")]
    symbol: Option<String>,
    #[serde(rename = "05. price")]
    price: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AvSearchResponse {
    #[serde(rename = "bestMatches")]
    best_matches: Option<Vec<AvSearchMatch>>,

    #[serde(rename = "Note")]
    note: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AvSearchMatch {
    #[serde(rename = "1. symbol")]
    symbol: String,
    #[serde(rename = "2. name")]
    name: String,
    #[serde(rename = "4. region")]
    region: String,
    #[serde(rename = "8. currency")]
    currency: String,
    #[serde(rename = "9. matchScore")]
    match_score: String,
}

#[async_trait]
impl QuoteProvider for AlphaVantageProvider {
    async fn latest_quote(&self, symbol: &str) -> Result<PricePoint, QuoteProviderError> {
        let url = "https://www.alphavantage.co/query";

        let resp = self
            .client
            .get(url)
            .query(&[
                ("function", "GLOBAL_QUOTE"),
                ("symbol", symbol),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| QuoteProviderError::Network(e.to_string()))?;

        let body = resp
            .json::<AvQuoteResponse>()
            .await
            .map_err(|e| QuoteProviderError::Parse(e.to_string()))?;

        if body.note.is_some() {
            // This is the throttle response
            return Err(QuoteProviderError::RateLimited);
        }

        if let Some(msg) = body.error_message {
            return Err(QuoteProviderError::BadResponse(msg));
        }

        let quote = body
            .global_quote
            .ok_or_else(|| QuoteProviderError::BadResponse("missing Global Quote".into()))?;

        // An unknown symbol comes back as an empty Global Quote object
        let price_str = match quote.price {
            Some(p) if !p.is_empty() => p,
            _ => return Err(QuoteProviderError::UnknownSymbol(symbol.to_string())),
        };

        let price = price_str
            .parse::<f64>()
            .map_err(|e| QuoteProviderError::Parse(e.to_string()))?;

        Ok(PricePoint {
            symbol: quote.symbol.unwrap_or_else(|| symbol.to_string()),
            price,
            as_of: Utc::now(),
        })
    }

    async fn search_symbols(
        &self,
        keyword: &str,
    ) -> Result<Vec<SymbolMatch>, QuoteProviderError> {
        let url = "https://www.alphavantage.co/query";

        let resp = self
            .client
            .get(url)
            .query(&[
                ("function", "SYMBOL_SEARCH"),
                ("keywords", keyword),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| QuoteProviderError::Network(e.to_string()))?;

        let body = resp
            .json::<AvSearchResponse>()
            .await
            .map_err(|e| QuoteProviderError::Parse(e.to_string()))?;

        if body.note.is_some() {
            return Err(QuoteProviderError::RateLimited);
        }

        let matches = body
            .best_matches
            .ok_or_else(|| QuoteProviderError::BadResponse("missing bestMatches".into()))?;

        Ok(matches
            .into_iter()
            .map(|m| SymbolMatch {
                symbol: m.symbol,
                name: m.name,
                region: m.region,
                currency: m.currency,
                match_score: m.match_score.parse::<f64>().unwrap_or(0.0),
            })
            .collect())
    }
}
