use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use http::StatusCode;
use tracing::{error, info};

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::UpdatePreferences;
use crate::services::user_preference_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_preferences).post(update_preferences))
}

/// GET /api/account/preferences
/// Current preferences, or defaults for a user who has not completed
/// onboarding.
pub async fn get_preferences(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    info!("GET /api/account/preferences - {}", user.user_id);

    let preferences =
        user_preference_service::get_preferences(&state.pool, user.user_id).await?;

    Ok((StatusCode::OK, Json(preferences)))
}

/// POST /api/account/preferences
/// Upsert preferences and mark onboarding complete.
pub async fn update_preferences(
    State(state): State<AppState>,
    user: AuthUser,
    Json(data): Json<UpdatePreferences>,
) -> Result<impl IntoResponse, AppError> {
    info!("POST /api/account/preferences - {}", user.user_id);

    let preferences =
        user_preference_service::update_preferences(&state.pool, user.user_id, data)
            .await
            .map_err(|e| {
                error!("Failed to update preferences for {}: {}", user.user_id, e);
                e
            })?;

    Ok((StatusCode::OK, Json(preferences)))
}
