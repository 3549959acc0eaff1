use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::db;
use crate::errors::AppError;
use crate::models::{UpdatePreferences, UserPreferences};

/// Current preferences, or the defaults for users who have not completed
/// onboarding yet.
pub async fn get_preferences(pool: &PgPool, user_id: Uuid) -> Result<UserPreferences, AppError> {
    let prefs = db::preferences_queries::get_by_user_id(pool, user_id).await?;
    Ok(prefs.unwrap_or_else(|| UserPreferences::default_for_user(user_id)))
}

/// Apply a (possibly partial) preferences update and mark onboarding done.
pub async fn update_preferences(
    pool: &PgPool,
    user_id: Uuid,
    update: UpdatePreferences,
) -> Result<UserPreferences, AppError> {
    update.validate().map_err(AppError::Validation)?;

    let mut prefs = get_preferences(pool, user_id).await?;
    prefs.user_id = user_id;

    if let Some(risk_level) = update.risk_level {
        prefs.risk_level = risk_level;
    }
    if let Some(strategy) = update.investment_strategy {
        prefs.investment_strategy = strategy;
    }
    if let Some(factors) = update.esg_factors {
        prefs.esg_factors = serde_json::json!(factors);
    }
    if let Some(industries) = update.industry_preferences {
        prefs.industry_preferences = serde_json::json!(industries);
    }
    if let Some(exclusions) = update.exclusions {
        prefs.exclusions = serde_json::json!(exclusions);
    }
    if let Some(sentiment) = update.sentiment_analysis {
        prefs.sentiment_analysis = sentiment;
    }
    if let Some(transparency) = update.transparency_level {
        prefs.transparency_level = transparency;
    }

    let saved = db::preferences_queries::upsert(pool, prefs).await?;
    db::user_queries::set_preferences_completed(pool, user_id).await?;
    info!("Preferences saved for user {}", user_id);

    Ok(saved)
}
