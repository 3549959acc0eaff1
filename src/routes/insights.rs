use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use tracing::{error, info};

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::{AdvisorRequest, AdvisorResponse, InsightRequest, InsightResponse};
use crate::services::narrative_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/esg", post(generate_esg_insight))
        .route("/advisor", post(advisor))
}

/// POST /api/insights/esg
/// Narrative insight about one company's ESG profile.
#[axum::debug_handler]
pub async fn generate_esg_insight(
    State(state): State<AppState>,
    user: AuthUser,
    Json(data): Json<InsightRequest>,
) -> Result<Json<InsightResponse>, AppError> {
    info!("POST /api/insights/esg - {} for {}", user.user_id, data.symbol);
    let insight = narrative_service::company_esg_insight(
        &state.pool,
        &state.insights,
        user.user_id,
        &data.symbol,
    )
    .await
    .map_err(|e| {
        error!("Insight generation failed for {}: {}", data.symbol, e);
        e
    })?;

    Ok(Json(InsightResponse {
        symbol: data.symbol,
        insight,
    }))
}

/// POST /api/insights/advisor
/// Portfolio-aware advisor answer built on the live dashboard aggregate.
#[axum::debug_handler]
pub async fn advisor(
    State(state): State<AppState>,
    user: AuthUser,
    Json(data): Json<AdvisorRequest>,
) -> Result<Json<AdvisorResponse>, AppError> {
    info!("POST /api/insights/advisor - {}", user.user_id);
    let answer = narrative_service::advisor_answer(
        &state.pool,
        state.quotes.as_ref(),
        state.config.quote.call_timeout,
        &state.insights,
        user.user_id,
        &data.question,
    )
    .await
    .map_err(|e| {
        error!("Advisor answer failed for {}: {}", user.user_id, e);
        e
    })?;

    Ok(Json(AdvisorResponse { answer }))
}
