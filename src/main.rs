mod app;
mod auth;
mod config;
mod db;
mod errors;
mod external;
mod logging;
mod models;
mod routes;
mod services;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

use crate::config::AppConfig;
use crate::external::alphavantage::AlphaVantageProvider;
use crate::external::mock::MockQuoteProvider;
use crate::external::multi_provider::MultiProvider;
use crate::external::quote_provider::QuoteProvider;
use crate::external::yahoo::YahooProvider;
use crate::logging::LoggingConfig;
use crate::services::insight_service::InsightService;
use crate::services::news_service::NewsService;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    logging::init_logging(LoggingConfig::from_env())?;

    let config = Arc::new(AppConfig::from_env()?);

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let quotes = build_quote_provider(&config);
    let news = Arc::new(NewsService::new(&config.news));
    let insights = Arc::new(InsightService::new(&config.insight));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.bind_port));

    let state = AppState {
        pool,
        config,
        quotes,
        news,
        insights,
    };
    let app = app::create_app(state);

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🚀 TerraVest backend running at http://{}/", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_quote_provider(config: &AppConfig) -> Arc<dyn QuoteProvider> {
    match config.quote.provider.to_lowercase().as_str() {
        "alphavantage" => {
            tracing::info!("📊 Using quote provider: Alpha Vantage only");
            let api_key = config
                .quote
                .alphavantage_api_key
                .clone()
                .expect("ALPHAVANTAGE_API_KEY must be set for the alphavantage provider");
            Arc::new(AlphaVantageProvider::new(api_key))
        }
        "yahoo" => {
            tracing::info!("📊 Using quote provider: Yahoo only");
            Arc::new(YahooProvider::new())
        }
        "mock" => {
            tracing::info!("📊 Using quote provider: deterministic mock (development)");
            Arc::new(MockQuoteProvider::new(true))
        }
        "multi" => {
            tracing::info!("📊 Using quote provider: Multi (Alpha Vantage + Yahoo fallback)");
            let api_key = config
                .quote
                .alphavantage_api_key
                .clone()
                .expect("ALPHAVANTAGE_API_KEY must be set for the multi provider");
            let primary = Box::new(AlphaVantageProvider::new(api_key));
            let fallback = Box::new(YahooProvider::new());
            Arc::new(MultiProvider::new(primary, fallback))
        }
        other => {
            panic!(
                "Invalid QUOTE_PROVIDER: {}. Must be 'alphavantage', 'yahoo', 'multi', or 'mock'",
                other
            );
        }
    }
}
