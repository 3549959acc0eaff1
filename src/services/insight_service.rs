use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::InsightConfig;

#[derive(Debug, Error)]
pub enum InsightError {
    #[error("AI insights are disabled")]
    Disabled,
    #[error("Rate limited")]
    RateLimited,
    #[error("Request timeout")]
    Timeout,
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Trait for narrative-generation providers
#[async_trait]
pub trait InsightProvider: Send + Sync {
    /// Generate a completion from a prompt
    async fn generate_completion(&self, prompt: String) -> Result<String, InsightError>;
}

/// OpenAI API request/response structures
#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    max_tokens: usize,
    temperature: f32,
}

#[derive(Debug, Serialize, Clone)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

/// OpenAI provider implementation
pub struct OpenAiProvider {
    api_key: String,
    model: String,
    max_tokens: usize,
    temperature: f32,
    client: Client,
}

impl OpenAiProvider {
    pub fn new(api_key: String, model: String, max_tokens: usize, temperature: f32) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            api_key,
            model,
            max_tokens,
            temperature,
            client,
        }
    }

    async fn call_openai_with_retry(
        &self,
        request: OpenAiRequest,
    ) -> Result<OpenAiResponse, InsightError> {
        let mut retry_count = 0;
        let max_retries = 3;
        let mut delay = Duration::from_secs(1);

        loop {
            match self.call_openai(&request).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    retry_count += 1;
                    if retry_count >= max_retries {
                        error!("OpenAI API call failed after {} retries: {}", max_retries, e);
                        return Err(e);
                    }

                    warn!(
                        "OpenAI API call failed (attempt {}/{}): {}. Retrying in {:?}...",
                        retry_count, max_retries, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
            }
        }
    }

    async fn call_openai(&self, request: &OpenAiRequest) -> Result<OpenAiResponse, InsightError> {
        let response = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InsightError::Timeout
                } else {
                    InsightError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();

        if status == 429 {
            return Err(InsightError::RateLimited);
        }

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(InsightError::ApiError(format!("HTTP {}: {}", status, error_text)));
        }

        response
            .json::<OpenAiResponse>()
            .await
            .map_err(|e| InsightError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl InsightProvider for OpenAiProvider {
    async fn generate_completion(&self, prompt: String) -> Result<String, InsightError> {
        info!(
            "Generating insight completion (model: {}, max_tokens: {})",
            self.model, self.max_tokens
        );

        let request = OpenAiRequest {
            model: self.model.clone(),
            messages: vec![
                OpenAiMessage {
                    role: "system".to_string(),
                    content: "You are a sustainable-investing assistant. Explain ESG \
                              scores and portfolio composition in plain language. Do NOT \
                              give buy/sell recommendations."
                        .to_string(),
                },
                OpenAiMessage {
                    role: "user".to_string(),
                    content: prompt,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self.call_openai_with_retry(request).await?;

        let content = response
            .choices
            .first()
            .ok_or_else(|| InsightError::InvalidResponse("No choices in response".to_string()))?
            .message
            .content
            .clone();

        if let Some(usage) = response.usage {
            info!(
                "Insight generated. Tokens: {} prompt + {} completion = {} total",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        Ok(content)
    }
}

/// Cached response with expiration
#[derive(Debug, Clone)]
struct CachedResponse {
    content: String,
    created_at: Instant,
}

/// Insight response cache with TTL
pub struct InsightCache {
    cache: Arc<RwLock<HashMap<String, CachedResponse>>>,
    ttl: Duration,
}

impl InsightCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let cache = self.cache.read().await;
        if let Some(cached) = cache.get(key) {
            if cached.created_at.elapsed() < self.ttl {
                info!("Insight cache hit for key: {}", &key[..key.len().min(50)]);
                return Some(cached.content.clone());
            }
        }
        None
    }

    pub async fn set(&self, key: String, value: String) {
        let mut cache = self.cache.write().await;
        cache.insert(
            key,
            CachedResponse {
                content: value,
                created_at: Instant::now(),
            },
        );
    }
}

/// Rate limit tracker for a user
#[derive(Debug, Clone)]
struct RateLimitEntry {
    count: usize,
    window_start: Instant,
}

/// Per-user hourly rate limiter
pub struct RateLimiter {
    limits: DashMap<Uuid, RateLimitEntry>,
    max_requests_per_hour: usize,
    window_duration: Duration,
}

impl RateLimiter {
    pub fn new(max_requests_per_hour: usize) -> Self {
        Self {
            limits: DashMap::new(),
            max_requests_per_hour,
            window_duration: Duration::from_secs(3600),
        }
    }

    pub fn check_and_increment(&self, user_id: Uuid) -> Result<(), InsightError> {
        let now = Instant::now();

        let mut entry = self.limits.entry(user_id).or_insert(RateLimitEntry {
            count: 0,
            window_start: now,
        });

        if now.duration_since(entry.window_start) >= self.window_duration {
            entry.count = 0;
            entry.window_start = now;
        }

        if entry.count >= self.max_requests_per_hour {
            warn!("Insight rate limit exceeded for user: {}", user_id);
            return Err(InsightError::RateLimited);
        }

        entry.count += 1;
        Ok(())
    }
}

/// Insight service with provider abstraction, caching, and rate limiting
pub struct InsightService {
    provider: Option<Arc<dyn InsightProvider>>,
    cache: InsightCache,
    rate_limiter: RateLimiter,
}

impl InsightService {
    pub fn new(config: &InsightConfig) -> Self {
        let provider = if config.enabled {
            match (&config.api_key, config.provider.as_str()) {
                (Some(api_key), "openai") if !api_key.is_empty() => {
                    info!("Initializing insight service with provider: {}", config.provider);
                    let provider = OpenAiProvider::new(
                        api_key.clone(),
                        config.model.clone(),
                        config.max_tokens,
                        config.temperature,
                    );
                    Some(Arc::new(provider) as Arc<dyn InsightProvider>)
                }
                (Some(api_key), _) if api_key.is_empty() => {
                    warn!("Insight API key is empty. AI insights disabled.");
                    None
                }
                (Some(_), other) => {
                    warn!("Unknown insight provider: {}. AI insights disabled.", other);
                    None
                }
                (None, _) => {
                    warn!("Insight API key not configured. AI insights disabled.");
                    None
                }
            }
        } else {
            info!("AI insights are disabled in configuration");
            None
        };

        Self {
            provider,
            cache: InsightCache::new(Duration::from_secs(3600)),
            rate_limiter: RateLimiter::new(50),
        }
    }

    /// Build a service around an explicit provider (used by tests).
    #[cfg(test)]
    pub fn with_provider(provider: Arc<dyn InsightProvider>) -> Self {
        Self {
            provider: Some(provider),
            cache: InsightCache::new(Duration::from_secs(3600)),
            rate_limiter: RateLimiter::new(50),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// Generate a completion for a user, with rate limiting and caching.
    pub async fn generate_for_user(
        &self,
        user_id: Uuid,
        prompt: String,
    ) -> Result<String, InsightError> {
        self.rate_limiter.check_and_increment(user_id)?;

        let cache_key = format!("insight:{}", Self::hash_prompt(&prompt));
        if let Some(cached) = self.cache.get(&cache_key).await {
            return Ok(cached);
        }

        let provider = self.provider.as_ref().ok_or(InsightError::Disabled)?;
        let result = provider.generate_completion(prompt).await?;

        self.cache.set(cache_key, result.clone()).await;
        Ok(result)
    }

    fn hash_prompt(prompt: &str) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        prompt.hash(&mut hasher);
        format!("{:x}", hasher.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl InsightProvider for CountingProvider {
        async fn generate_completion(&self, prompt: String) -> Result<String, InsightError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("echo: {}", prompt))
        }
    }

    #[test]
    fn test_service_disabled_without_key() {
        let config = InsightConfig {
            enabled: true,
            provider: "openai".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            max_tokens: 500,
            temperature: 0.7,
        };
        let service = InsightService::new(&config);
        assert!(!service.is_enabled());
    }

    #[tokio::test]
    async fn test_disabled_service_returns_disabled_error() {
        let config = InsightConfig {
            enabled: false,
            provider: "openai".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            max_tokens: 500,
            temperature: 0.7,
        };
        let service = InsightService::new(&config);
        let result = service
            .generate_for_user(Uuid::new_v4(), "test".to_string())
            .await;
        assert!(matches!(result, Err(InsightError::Disabled)));
    }

    #[tokio::test]
    async fn test_cache_stores_and_retrieves() {
        let cache = InsightCache::new(Duration::from_secs(60));
        cache.set("k".to_string(), "v".to_string()).await;
        assert_eq!(cache.get("k").await, Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_cache_expires() {
        let cache = InsightCache::new(Duration::from_millis(50));
        cache.set("k".to_string(), "v".to_string()).await;
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(cache.get("k").await, None);
    }

    #[test]
    fn test_rate_limiter_allows_within_limit() {
        let limiter = RateLimiter::new(3);
        let user_id = Uuid::new_v4();

        assert!(limiter.check_and_increment(user_id).is_ok());
        assert!(limiter.check_and_increment(user_id).is_ok());
        assert!(limiter.check_and_increment(user_id).is_ok());
    }

    #[test]
    fn test_rate_limiter_blocks_over_limit() {
        let limiter = RateLimiter::new(2);
        let user_id = Uuid::new_v4();

        assert!(limiter.check_and_increment(user_id).is_ok());
        assert!(limiter.check_and_increment(user_id).is_ok());
        assert!(matches!(
            limiter.check_and_increment(user_id),
            Err(InsightError::RateLimited)
        ));
    }

    #[test]
    fn test_rate_limiter_is_per_user() {
        let limiter = RateLimiter::new(1);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        assert!(limiter.check_and_increment(a).is_ok());
        assert!(limiter.check_and_increment(b).is_ok());
    }

    #[tokio::test]
    async fn test_repeat_prompt_is_served_from_cache() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
        });
        let service = InsightService::with_provider(provider.clone());
        let user_id = Uuid::new_v4();

        let first = service
            .generate_for_user(user_id, "same prompt".to_string())
            .await
            .unwrap();
        let second = service
            .generate_for_user(user_id, "same prompt".to_string())
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }
}
