use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::external::quote_provider::QuoteProvider;
use crate::services::insight_service::InsightService;
use crate::services::news_service::NewsService;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub quotes: Arc<dyn QuoteProvider>,
    pub news: Arc<NewsService>,
    pub insights: Arc<InsightService>,
}
