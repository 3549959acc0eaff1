use axum::extract::{Path, Query, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::external::quote_provider::{PricePoint, SymbolMatch};
use crate::models::{CreateHolding, Holding};
use crate::services::stock_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(add_stock).get(get_portfolio))
        .route("/:id", delete(remove_stock))
        .route("/price/:symbol", get(get_price))
        .route("/search", get(search))
}

#[axum::debug_handler]
pub async fn add_stock(
    State(state): State<AppState>,
    user: AuthUser,
    Json(data): Json<CreateHolding>,
) -> Result<Json<Holding>, AppError> {
    info!("POST /api/stocks - {} buys {}", user.user_id, data.symbol);
    let holding = stock_service::add_stock(&state.pool, user.user_id, data)
        .await
        .map_err(|e| {
            error!("Failed to add stock for {}: {}", user.user_id, e);
            e
        })?;
    Ok(Json(holding))
}

#[axum::debug_handler]
pub async fn get_portfolio(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Holding>>, AppError> {
    info!("GET /api/stocks - {}", user.user_id);
    let holdings = stock_service::get_portfolio(&state.pool, user.user_id).await?;
    Ok(Json(holdings))
}

#[axum::debug_handler]
pub async fn remove_stock(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<()>, AppError> {
    info!("DELETE /api/stocks/{} - {}", id, user.user_id);
    stock_service::remove_stock(&state.pool, user.user_id, id)
        .await
        .map_err(|e| {
            error!("Failed to remove stock {} for {}: {}", id, user.user_id, e);
            e
        })?;
    Ok(Json(()))
}

#[axum::debug_handler]
pub async fn get_price(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(symbol): Path<String>,
) -> Result<Json<PricePoint>, AppError> {
    info!("GET /api/stocks/price/{}", symbol);
    let quote = stock_service::get_price(state.quotes.as_ref(), &symbol)
        .await
        .map_err(|e| {
            error!("Quote lookup failed for {}: {}", symbol, e);
            e
        })?;
    Ok(Json(quote))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: String,
}

#[axum::debug_handler]
pub async fn search(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SymbolMatch>>, AppError> {
    info!("GET /api/stocks/search?query={}", params.query);
    let matches = stock_service::search_symbols(state.quotes.as_ref(), &params.query)
        .await
        .map_err(|e| {
            error!("Symbol search failed for '{}': {}", params.query, e);
            e
        })?;
    Ok(Json(matches))
}
