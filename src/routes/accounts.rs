use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use tracing::{error, info};

use crate::auth::AuthUser;
use crate::db;
use crate::errors::AppError;
use crate::models::{
    CheckUserRequest, LoginRequest, LoginResponse, SignupRequest, UpdateSettingsRequest,
    UserProfile,
};
use crate::services::{auth_service, user_preference_service};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/check-user", post(check_user))
        .route("/logout", post(logout))
        .route("/update-settings", post(update_settings))
}

#[axum::debug_handler]
pub async fn signup(
    State(state): State<AppState>,
    Json(data): Json<SignupRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    info!("POST /api/account/signup");
    auth_service::signup(&state.pool, data).await.map_err(|e| {
        error!("Signup failed: {}", e);
        e
    })?;
    Ok(Json(json!({
        "success": true,
        "message": "Account successfully created! Redirecting..."
    })))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(data): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    info!("POST /api/account/login");
    let response = auth_service::login(&state.pool, &state.config, data)
        .await
        .map_err(|e| {
            error!("Login failed: {}", e);
            e
        })?;
    Ok(Json(response))
}

#[axum::debug_handler]
pub async fn check_user(
    State(state): State<AppState>,
    Json(data): Json<CheckUserRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    info!("POST /api/account/check-user");
    let email = data
        .email
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::Validation("Email is required".into()))?;

    let exists = db::user_queries::email_exists(&state.pool, &email).await?;
    Ok(Json(json!({ "exists": exists })))
}

/// Sessions are stateless JWTs; logout is an acknowledgment and the client
/// discards its token.
pub async fn logout(user: AuthUser) -> Json<serde_json::Value> {
    info!("POST /api/account/logout - {}", user.email);
    Json(json!({ "success": true }))
}

#[axum::debug_handler]
pub async fn update_settings(
    State(state): State<AppState>,
    user: AuthUser,
    Json(data): Json<UpdateSettingsRequest>,
) -> Result<Json<UserProfile>, AppError> {
    info!("POST /api/account/update-settings - {}", user.user_id);
    let updated = db::user_queries::update_settings(&state.pool, user.user_id, data)
        .await
        .map_err(|e| {
            error!("Failed to update settings for {}: {}", user.user_id, e);
            AppError::Db(e)
        })?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    Ok(Json(updated.into()))
}

/// GET /api/app-data
/// Authenticated bootstrap payload: profile plus preferences.
#[axum::debug_handler]
pub async fn app_data(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<serde_json::Value>, AppError> {
    info!("GET /api/app-data - {}", user.user_id);

    let profile = db::user_queries::find_by_id(&state.pool, user.user_id)
        .await?
        .map(UserProfile::from)
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let preferences =
        user_preference_service::get_preferences(&state.pool, user.user_id).await?;

    Ok(Json(json!({
        "user": profile,
        "preferences": preferences,
    })))
}
