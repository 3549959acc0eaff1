use serde::Serialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::db;
use crate::errors::AppError;
use crate::models::{
    display_score, EsgCompany, EsgMetric, PeerScore, ScoreValue, FIELD_ENVIRONMENT,
    FIELD_GOVERNANCE, FIELD_OVERALL, FIELD_SOCIAL,
};

const PEER_LIMIT: i64 = 10;

/// Full metric history for one company's detail page.
#[derive(Debug, Serialize)]
pub struct CompanyEsgHistory {
    pub company: EsgCompany,
    pub metrics: Vec<MetricEntry>,
}

#[derive(Debug, Serialize)]
pub struct MetricEntry {
    pub year: i32,
    pub field_name: String,
    pub pillar: String,
    pub raw_value: String,
    pub score: f64,
    pub display_score: i32,
}

/// Latest-year score card for one holding in the user's portfolio.
#[derive(Debug, Serialize)]
pub struct HoldingScores {
    pub symbol: String,
    pub company_name: String,
    pub matched: bool,
    pub year: Option<i32>,
    pub overall: ScoreValue,
    pub environmental: ScoreValue,
    pub social: ScoreValue,
    pub governance: ScoreValue,
}

pub async fn company_history(
    pool: &PgPool,
    ticker: &str,
) -> Result<CompanyEsgHistory, AppError> {
    let ticker = ticker.trim().to_uppercase();
    let company = db::esg_queries::find_company_by_ticker(pool, &ticker)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No ESG data for ticker {}", ticker)))?;

    let metrics = db::esg_queries::list_metrics(pool, company.id).await?;
    info!("Loaded {} ESG metric rows for {}", metrics.len(), ticker);

    let metrics = metrics
        .into_iter()
        .map(|m| MetricEntry {
            year: m.year,
            display_score: display_score(m.score),
            field_name: m.field_name,
            pillar: m.pillar,
            raw_value: m.raw_value,
            score: m.score,
        })
        .collect();

    Ok(CompanyEsgHistory { company, metrics })
}

/// Latest-year scores for every holding the user owns. Holdings without a
/// company match come back with matched=false and unavailable scores rather
/// than being dropped, so the portfolio view stays complete.
pub async fn portfolio_scores(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<HoldingScores>, AppError> {
    let holdings = db::holding_queries::list_for_user(pool, user_id).await?;

    let mut out = Vec::with_capacity(holdings.len());
    for holding in holdings {
        let company = db::esg_queries::find_company_by_ticker(pool, &holding.symbol).await?;

        let entry = match company {
            Some(company) => {
                let metrics = db::esg_queries::list_metrics(pool, company.id).await?;
                score_card(holding.symbol, holding.company_name, &metrics)
            }
            None => HoldingScores {
                symbol: holding.symbol,
                company_name: holding.company_name,
                matched: false,
                year: None,
                overall: ScoreValue::missing(),
                environmental: ScoreValue::missing(),
                social: ScoreValue::missing(),
                governance: ScoreValue::missing(),
            },
        };
        out.push(entry);
    }

    Ok(out)
}

pub async fn peer_scores(pool: &PgPool, symbol: &str) -> Result<Vec<PeerScore>, AppError> {
    let symbol = symbol.trim().to_uppercase();
    let company = db::esg_queries::find_company_by_ticker(pool, &symbol)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No ESG data for ticker {}", symbol)))?;

    let sic_code = company.sic_code.ok_or_else(|| {
        AppError::NotFound(format!("No industry classification for ticker {}", symbol))
    })?;

    Ok(db::esg_queries::peer_scores(pool, &sic_code, PEER_LIMIT).await?)
}

fn score_card(symbol: String, company_name: String, metrics: &[EsgMetric]) -> HoldingScores {
    let year = metrics.iter().map(|m| m.year).max();

    let extract = |field: &str| -> ScoreValue {
        year.and_then(|y| {
            metrics
                .iter()
                .find(|m| m.year == y && m.field_name == field)
        })
        .map(|m| ScoreValue::from_normalized(m.score))
        .unwrap_or_else(ScoreValue::missing)
    };

    HoldingScores {
        symbol,
        company_name,
        matched: true,
        year,
        overall: extract(FIELD_OVERALL),
        environmental: extract(FIELD_ENVIRONMENT),
        social: extract(FIELD_SOCIAL),
        governance: extract(FIELD_GOVERNANCE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metric(field: &str, year: i32, score: f64) -> EsgMetric {
        EsgMetric {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            year,
            field_name: field.to_string(),
            pillar: "Test".to_string(),
            raw_value: score.to_string(),
            score,
        }
    }

    #[test]
    fn test_score_card_uses_latest_year() {
        let metrics = vec![
            metric(FIELD_OVERALL, 2023, 0.50),
            metric(FIELD_OVERALL, 2024, 0.75),
            metric(FIELD_ENVIRONMENT, 2024, 0.60),
        ];

        let card = score_card("AAPL".into(), "Apple".into(), &metrics);
        assert_eq!(card.year, Some(2024));
        assert_eq!(card.overall, ScoreValue { score: 75, available: true });
        assert_eq!(card.environmental.score, 60);
    }

    #[test]
    fn test_score_card_flags_missing_fields() {
        let metrics = vec![metric(FIELD_OVERALL, 2024, 0.75)];

        let card = score_card("AAPL".into(), "Apple".into(), &metrics);
        assert!(!card.social.available);
        assert_eq!(card.social.score, 0);
    }

    #[test]
    fn test_score_card_with_no_metrics() {
        let card = score_card("AAPL".into(), "Apple".into(), &[]);
        assert_eq!(card.year, None);
        assert!(!card.overall.available);
    }
}
