use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use tracing::{error, info};

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::PeerScore;
use crate::services::esg_service::{self, CompanyEsgHistory, HoldingScores};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/portfolio", get(portfolio_scores))
        .route("/company/:ticker", get(company_history))
        .route("/peers/:symbol", get(peer_scores))
}

/// GET /api/esg/portfolio
/// Latest-year score card for every holding the caller owns.
#[axum::debug_handler]
pub async fn portfolio_scores(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<HoldingScores>>, AppError> {
    info!("GET /api/esg/portfolio - {}", user.user_id);
    let scores = esg_service::portfolio_scores(&state.pool, user.user_id)
        .await
        .map_err(|e| {
            error!("Failed to load portfolio ESG scores for {}: {}", user.user_id, e);
            e
        })?;
    Ok(Json(scores))
}

/// GET /api/esg/company/:ticker
/// Full per-year metric history for one company.
#[axum::debug_handler]
pub async fn company_history(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(ticker): Path<String>,
) -> Result<Json<CompanyEsgHistory>, AppError> {
    info!("GET /api/esg/company/{}", ticker);
    let history = esg_service::company_history(&state.pool, &ticker).await?;
    Ok(Json(history))
}

/// GET /api/esg/peers/:symbol
/// Latest-year overall scores of companies sharing the symbol's SIC code.
#[axum::debug_handler]
pub async fn peer_scores(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(symbol): Path<String>,
) -> Result<Json<Vec<PeerScore>>, AppError> {
    info!("GET /api/esg/peers/{}", symbol);
    let peers = esg_service::peer_scores(&state.pool, &symbol).await?;
    Ok(Json(peers))
}
