use bigdecimal::BigDecimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Holding;

const HOLDING_COLUMNS: &str =
    "id, user_id, symbol, company_name, shares, amount_invested, price_bought_at, added_at";

pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Holding>, sqlx::Error> {
    sqlx::query_as::<_, Holding>(&format!(
        "SELECT {HOLDING_COLUMNS} FROM holdings WHERE user_id = $1 ORDER BY added_at"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn find_by_user_and_symbol(
    pool: &PgPool,
    user_id: Uuid,
    symbol: &str,
) -> Result<Option<Holding>, sqlx::Error> {
    sqlx::query_as::<_, Holding>(&format!(
        "SELECT {HOLDING_COLUMNS} FROM holdings WHERE user_id = $1 AND symbol = $2"
    ))
    .bind(user_id)
    .bind(symbol)
    .fetch_optional(pool)
    .await
}

pub async fn insert(pool: &PgPool, holding: Holding) -> Result<Holding, sqlx::Error> {
    sqlx::query_as::<_, Holding>(&format!(
        r#"
        INSERT INTO holdings (id, user_id, symbol, company_name, shares,
                              amount_invested, price_bought_at, added_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {HOLDING_COLUMNS}
        "#
    ))
    .bind(holding.id)
    .bind(holding.user_id)
    .bind(holding.symbol)
    .bind(holding.company_name)
    .bind(holding.shares)
    .bind(holding.amount_invested)
    .bind(holding.price_bought_at)
    .bind(holding.added_at)
    .fetch_one(pool)
    .await
}

/// Replace the accumulated position fields after a repeat buy.
pub async fn update_position(
    pool: &PgPool,
    id: Uuid,
    shares: BigDecimal,
    amount_invested: Option<BigDecimal>,
    price_bought_at: Option<BigDecimal>,
) -> Result<Option<Holding>, sqlx::Error> {
    sqlx::query_as::<_, Holding>(&format!(
        r#"
        UPDATE holdings
        SET shares = $2, amount_invested = $3, price_bought_at = $4
        WHERE id = $1
        RETURNING {HOLDING_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(shares)
    .bind(amount_invested)
    .bind(price_bought_at)
    .fetch_optional(pool)
    .await
}

pub async fn delete_for_user(
    pool: &PgPool,
    user_id: Uuid,
    id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM holdings WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
