use sqlx::PgPool;
use uuid::Uuid;

use crate::models::UserPreferences;

pub async fn get_by_user_id(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<UserPreferences>, sqlx::Error> {
    sqlx::query_as::<_, UserPreferences>(
        r#"
        SELECT id, user_id, risk_level, investment_strategy, esg_factors,
               industry_preferences, exclusions, sentiment_analysis,
               transparency_level, updated_at
        FROM user_preferences
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn upsert(
    pool: &PgPool,
    prefs: UserPreferences,
) -> Result<UserPreferences, sqlx::Error> {
    sqlx::query_as::<_, UserPreferences>(
        r#"
        INSERT INTO user_preferences (id, user_id, risk_level, investment_strategy,
                                      esg_factors, industry_preferences, exclusions,
                                      sentiment_analysis, transparency_level, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW())
        ON CONFLICT (user_id)
        DO UPDATE SET
            risk_level = EXCLUDED.risk_level,
            investment_strategy = EXCLUDED.investment_strategy,
            esg_factors = EXCLUDED.esg_factors,
            industry_preferences = EXCLUDED.industry_preferences,
            exclusions = EXCLUDED.exclusions,
            sentiment_analysis = EXCLUDED.sentiment_analysis,
            transparency_level = EXCLUDED.transparency_level,
            updated_at = NOW()
        RETURNING id, user_id, risk_level, investment_strategy, esg_factors,
                  industry_preferences, exclusions, sentiment_analysis,
                  transparency_level, updated_at
        "#,
    )
    .bind(prefs.id)
    .bind(prefs.user_id)
    .bind(prefs.risk_level)
    .bind(prefs.investment_strategy)
    .bind(prefs.esg_factors)
    .bind(prefs.industry_preferences)
    .bind(prefs.exclusions)
    .bind(prefs.sentiment_analysis)
    .bind(prefs.transparency_level)
    .fetch_one(pool)
    .await
}
