use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tracing::{error, info};

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::DashboardData;
use crate::services::dashboard_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_dashboard))
}

/// GET /api/dashboard
/// One consistent snapshot of the caller's portfolio value, weighted ESG
/// composition, trend series and performance. Lookup failures degrade the
/// payload instead of failing the request.
#[axum::debug_handler]
pub async fn get_dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<DashboardData>, AppError> {
    info!("GET /api/dashboard - {}", user.user_id);

    let data = dashboard_service::compute_dashboard(
        &state.pool,
        state.quotes.as_ref(),
        state.config.quote.call_timeout,
        user.user_id,
    )
    .await
    .map_err(|e| {
        error!("Dashboard computation failed for {}: {}", user.user_id, e);
        e
    })?;

    Ok(Json(data))
}
