use std::time::Duration;

/// Process-wide configuration, resolved once at startup and passed into the
/// clients that need it. External API keys are never read from ambient
/// globals after this point.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_port: u16,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub quote: QuoteConfig,
    pub news: NewsConfig,
    pub insight: InsightConfig,
}

#[derive(Debug, Clone)]
pub struct QuoteConfig {
    pub provider: String,
    pub alphavantage_api_key: Option<String>,
    /// Bound on every live quote call issued by the dashboard fan-out.
    pub call_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct NewsConfig {
    pub enabled: bool,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct InsightConfig {
    pub enabled: bool,
    pub provider: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: usize,
    pub temperature: f32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL not set".to_string())?;

        let bind_port = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(3000);

        let jwt_secret = std::env::var("JWT_SECRET")
            .map_err(|_| "JWT_SECRET not set".to_string())?;

        let token_ttl_hours = std::env::var("TOKEN_TTL_HOURS")
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(24);

        let quote_timeout_secs = std::env::var("QUOTE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(5);

        Ok(Self {
            database_url,
            bind_port,
            jwt_secret,
            token_ttl_hours,
            quote: QuoteConfig {
                provider: std::env::var("QUOTE_PROVIDER")
                    .unwrap_or_else(|_| "multi".to_string()),
                alphavantage_api_key: std::env::var("ALPHAVANTAGE_API_KEY").ok(),
                call_timeout: Duration::from_secs(quote_timeout_secs),
            },
            news: NewsConfig {
                enabled: std::env::var("NEWS_ENABLED")
                    .ok()
                    .and_then(|s| s.parse::<bool>().ok())
                    .unwrap_or(false),
                api_key: std::env::var("NEWS_API_KEY").ok(),
            },
            insight: InsightConfig {
                enabled: std::env::var("INSIGHT_ENABLED")
                    .ok()
                    .and_then(|s| s.parse::<bool>().ok())
                    .unwrap_or(false),
                provider: std::env::var("INSIGHT_PROVIDER")
                    .unwrap_or_else(|_| "openai".to_string()),
                api_key: std::env::var("OPENAI_API_KEY").ok(),
                model: std::env::var("INSIGHT_MODEL")
                    .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
                max_tokens: std::env::var("INSIGHT_MAX_TOKENS")
                    .ok()
                    .and_then(|s| s.parse::<usize>().ok())
                    .unwrap_or(500),
                temperature: std::env::var("INSIGHT_TEMPERATURE")
                    .ok()
                    .and_then(|s| s.parse::<f32>().ok())
                    .unwrap_or(0.7),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_timeout_default_is_bounded() {
        let cfg = QuoteConfig {
            provider: "multi".to_string(),
            alphavantage_api_key: None,
            call_timeout: Duration::from_secs(5),
        };
        assert!(cfg.call_timeout <= Duration::from_secs(10));
    }
}
