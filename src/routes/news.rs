use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::NewsArticle;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/esg", get(esg_news))
}

#[derive(Debug, Deserialize)]
pub struct NewsParams {
    pub symbol: Option<String>,
}

/// GET /api/news/esg?symbol=
/// ESG/sustainability headlines, optionally scoped to one symbol. An
/// unconfigured news provider yields an empty feed rather than an error.
#[axum::debug_handler]
pub async fn esg_news(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<NewsParams>,
) -> Result<Json<Vec<NewsArticle>>, AppError> {
    info!("GET /api/news/esg (symbol: {:?})", params.symbol);
    let articles = state.news.esg_news(params.symbol.as_deref()).await?;
    Ok(Json(articles))
}
