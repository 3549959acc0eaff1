use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{EsgCompany, EsgMetric, PeerScore, FIELD_OVERALL};

pub async fn find_company_by_ticker(
    pool: &PgPool,
    ticker: &str,
) -> Result<Option<EsgCompany>, sqlx::Error> {
    sqlx::query_as::<_, EsgCompany>(
        "SELECT id, org_id, ticker, name, isin, sic_code FROM esg_companies WHERE ticker = $1",
    )
    .bind(ticker)
    .fetch_optional(pool)
    .await
}

/// Full metric history for one company, every year and field.
pub async fn list_metrics(
    pool: &PgPool,
    company_id: Uuid,
) -> Result<Vec<EsgMetric>, sqlx::Error> {
    sqlx::query_as::<_, EsgMetric>(
        r#"
        SELECT id, company_id, year, field_name, pillar, raw_value, score
        FROM esg_metrics
        WHERE company_id = $1
        ORDER BY year, field_name
        "#,
    )
    .bind(company_id)
    .fetch_all(pool)
    .await
}

/// Latest-year overall ESG score for every company sharing a SIC code.
pub async fn peer_scores(
    pool: &PgPool,
    sic_code: &str,
    limit: i64,
) -> Result<Vec<PeerScore>, sqlx::Error> {
    sqlx::query_as::<_, PeerScore>(
        r#"
        SELECT c.ticker, c.name, m.year, m.score
        FROM esg_companies c
        JOIN esg_metrics m ON m.company_id = c.id
        WHERE c.sic_code = $1
          AND m.field_name = $2
          AND m.year = (
              SELECT MAX(m2.year)
              FROM esg_metrics m2
              WHERE m2.company_id = c.id AND m2.field_name = $2
          )
        ORDER BY m.score DESC
        LIMIT $3
        "#,
    )
    .bind(sic_code)
    .bind(FIELD_OVERALL)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Upsert one company by its vendor identifier; returns the row id.
/// Runs inside the import transaction.
pub async fn upsert_company(
    conn: &mut PgConnection,
    org_id: i64,
    ticker: &str,
    name: &str,
    isin: Option<&str>,
    sic_code: Option<&str>,
) -> Result<Uuid, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO esg_companies (id, org_id, ticker, name, isin, sic_code)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (org_id) DO UPDATE
        SET ticker = EXCLUDED.ticker,
            name = EXCLUDED.name,
            isin = EXCLUDED.isin,
            sic_code = EXCLUDED.sic_code
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(org_id)
    .bind(ticker)
    .bind(name)
    .bind(isin)
    .bind(sic_code)
    .fetch_one(conn)
    .await
}

/// Upsert one metric observation; (company, year, field_name) is the key.
pub async fn upsert_metric(
    conn: &mut PgConnection,
    company_id: Uuid,
    year: i32,
    field_name: &str,
    pillar: &str,
    raw_value: &str,
    score: f64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO esg_metrics (id, company_id, year, field_name, pillar, raw_value, score)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (company_id, year, field_name) DO UPDATE
        SET pillar = EXCLUDED.pillar,
            raw_value = EXCLUDED.raw_value,
            score = EXCLUDED.score
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(company_id)
    .bind(year)
    .bind(field_name)
    .bind(pillar)
    .bind(raw_value)
    .bind(score)
    .execute(conn)
    .await?;
    Ok(())
}
