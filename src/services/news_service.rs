use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::config::NewsConfig;
use crate::errors::AppError;
use crate::models::NewsArticle;

const DEFAULT_MAX_RESULTS: usize = 20;

/// Trait for news providers
#[async_trait]
pub trait NewsProvider: Send + Sync {
    async fn fetch_news(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<NewsArticle>, AppError>;
}

/// Serper API provider (uses Google's news search)
pub struct SerperProvider {
    api_key: String,
    client: Client,
}

impl SerperProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: Client::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    news: Option<Vec<SerperNewsItem>>,
}

#[derive(Debug, Deserialize)]
struct SerperNewsItem {
    title: String,
    link: String,
    source: String,
    date: String,
    snippet: String,
}

#[async_trait]
impl NewsProvider for SerperProvider {
    async fn fetch_news(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<NewsArticle>, AppError> {
        info!("Fetching news from Serper for query: {}", query);

        let request_body = serde_json::json!({
            "q": query,
            "type": "news",
            "num": max_results.min(100), // Serper max is 100
        });

        let response = self
            .client
            .post("https://google.serper.dev/news")
            .header("X-API-KEY", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!("Serper API request failed: {}", e);
                AppError::External(format!("News API error: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(AppError::External(format!(
                "News API returned HTTP {}",
                response.status()
            )));
        }

        let body: SerperResponse = response
            .json()
            .await
            .map_err(|e| AppError::External(format!("News API parse error: {}", e)))?;

        Ok(body
            .news
            .unwrap_or_default()
            .into_iter()
            .map(|item| NewsArticle {
                title: item.title,
                url: item.link,
                source: item.source,
                published: item.date,
                snippet: item.snippet,
            })
            .collect())
    }
}

/// ESG news lookup. With no provider configured the service degrades to an
/// empty feed instead of failing the page.
pub struct NewsService {
    provider: Option<Box<dyn NewsProvider>>,
}

impl NewsService {
    pub fn new(config: &NewsConfig) -> Self {
        let provider: Option<Box<dyn NewsProvider>> = match (config.enabled, &config.api_key) {
            (true, Some(api_key)) if !api_key.is_empty() => {
                info!("News service enabled (Serper)");
                Some(Box::new(SerperProvider::new(api_key.clone())))
            }
            (true, _) => {
                warn!("NEWS_ENABLED is set but NEWS_API_KEY is missing. News disabled.");
                None
            }
            _ => None,
        };
        Self { provider }
    }

    pub async fn esg_news(&self, symbol: Option<&str>) -> Result<Vec<NewsArticle>, AppError> {
        let provider = match &self.provider {
            Some(provider) => provider,
            None => {
                warn!("News requested but no provider configured; returning empty feed");
                return Ok(vec![]);
            }
        };

        let query = match symbol {
            Some(symbol) => format!("{} ESG sustainability", symbol.trim().to_uppercase()),
            None => "ESG sustainable investing".to_string(),
        };

        provider.fetch_news(&query, DEFAULT_MAX_RESULTS).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_service_returns_empty_feed() {
        let service = NewsService::new(&NewsConfig {
            enabled: false,
            api_key: None,
        });
        let articles = service.esg_news(Some("AAPL")).await.unwrap();
        assert!(articles.is_empty());
    }

    #[test]
    fn test_enabled_without_key_disables_provider() {
        let service = NewsService::new(&NewsConfig {
            enabled: true,
            api_key: None,
        });
        assert!(service.provider.is_none());
    }
}
