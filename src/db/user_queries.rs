use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{UpdateSettingsRequest, User};

pub async fn insert(pool: &PgPool, user: User) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, email, password_hash, first_name, middle_name, last_name,
                           country, date_of_birth, preferences_completed, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING id, email, password_hash, first_name, middle_name, last_name,
                  country, date_of_birth, preferences_completed, created_at
        "#,
    )
    .bind(user.id)
    .bind(user.email)
    .bind(user.password_hash)
    .bind(user.first_name)
    .bind(user.middle_name)
    .bind(user.last_name)
    .bind(user.country)
    .bind(user.date_of_birth)
    .bind(user.preferences_completed)
    .bind(user.created_at)
    .fetch_one(pool)
    .await
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, email, password_hash, first_name, middle_name, last_name,
               country, date_of_birth, preferences_completed, created_at
        FROM users
        WHERE email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, email, password_hash, first_name, middle_name, last_name,
               country, date_of_birth, preferences_completed, created_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
    let exists: Option<bool> =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(pool)
            .await?;
    Ok(exists.unwrap_or(false))
}

pub async fn update_settings(
    pool: &PgPool,
    user_id: Uuid,
    update: UpdateSettingsRequest,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET first_name = COALESCE($2, first_name),
            middle_name = COALESCE($3, middle_name),
            last_name = COALESCE($4, last_name),
            country = COALESCE($5, country)
        WHERE id = $1
        RETURNING id, email, password_hash, first_name, middle_name, last_name,
                  country, date_of_birth, preferences_completed, created_at
        "#,
    )
    .bind(user_id)
    .bind(update.first_name)
    .bind(update.middle_name)
    .bind(update.last_name)
    .bind(update.country)
    .fetch_optional(pool)
    .await
}

pub async fn set_preferences_completed(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET preferences_completed = TRUE WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
