use std::fmt::Write as _;
use std::time::Duration;

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::external::quote_provider::QuoteProvider;
use crate::models::DashboardData;
use crate::services::dashboard_service;
use crate::services::esg_service::{self, HoldingScores};
use crate::services::insight_service::{InsightError, InsightService};
use crate::services::user_preference_service;

impl From<InsightError> for AppError {
    fn from(value: InsightError) -> Self {
        match value {
            InsightError::Disabled => {
                AppError::Validation("AI insights are not enabled".to_string())
            }
            InsightError::RateLimited => AppError::RateLimited,
            other => AppError::External(other.to_string()),
        }
    }
}

/// Narrative ESG insight for one company, tailored to the caller's
/// preference profile.
pub async fn company_esg_insight(
    pool: &PgPool,
    insights: &InsightService,
    user_id: Uuid,
    symbol: &str,
) -> Result<String, AppError> {
    let history = esg_service::company_history(pool, symbol).await?;
    let prefs = user_preference_service::get_preferences(pool, user_id).await?;

    let prompt = build_company_prompt(
        &history.company.name,
        &history.company.ticker,
        &prefs.profile_summary(),
        &history
            .metrics
            .iter()
            .map(|m| (m.year, m.field_name.as_str(), m.display_score))
            .collect::<Vec<_>>(),
    );

    info!("Generating ESG insight for {} (user {})", symbol, user_id);
    Ok(insights.generate_for_user(user_id, prompt).await?)
}

/// Portfolio-aware advisor answer: the prompt carries the current dashboard
/// aggregate, the per-holding score cards and the preference profile.
pub async fn advisor_answer(
    pool: &PgPool,
    quotes: &dyn QuoteProvider,
    quote_timeout: Duration,
    insights: &InsightService,
    user_id: Uuid,
    question: &str,
) -> Result<String, AppError> {
    if question.trim().is_empty() {
        return Err(AppError::Validation("Question cannot be empty".into()));
    }

    let dashboard =
        dashboard_service::compute_dashboard(pool, quotes, quote_timeout, user_id).await?;
    let scores = esg_service::portfolio_scores(pool, user_id).await?;
    let prefs = user_preference_service::get_preferences(pool, user_id).await?;

    let prompt = build_advisor_prompt(question, &prefs.profile_summary(), &dashboard, &scores);

    info!("Generating advisor answer for user {}", user_id);
    Ok(insights.generate_for_user(user_id, prompt).await?)
}

fn build_company_prompt(
    name: &str,
    ticker: &str,
    profile: &str,
    metrics: &[(i32, &str, i32)],
) -> String {
    let mut prompt = format!(
        "Summarize the ESG profile of {} ({}) for an investor ({}).\n\
         Scores are on a 0-100 scale.\n",
        name, ticker, profile
    );

    for (year, field, score) in metrics {
        let _ = writeln!(prompt, "- {} {}: {}", year, field, score);
    }

    prompt.push_str(
        "Highlight the strongest and weakest pillar and any notable multi-year movement.",
    );
    prompt
}

fn build_advisor_prompt(
    question: &str,
    profile: &str,
    dashboard: &DashboardData,
    scores: &[HoldingScores],
) -> String {
    let mut prompt = format!(
        "An investor ({}) asks: {}\n\nTheir portfolio snapshot:\n\
         - total value: {:.2}\n- performance vs cost basis: {:.2}%\n",
        profile, question, dashboard.portfolio_value, dashboard.portfolio_performance_change
    );

    match dashboard.overall_esg_score {
        Some(score) => {
            let _ = writeln!(prompt, "- weighted ESG score: {}", score);
        }
        None => prompt.push_str("- weighted ESG score: unavailable\n"),
    }

    prompt.push_str("Holdings:\n");
    for card in scores {
        if card.matched {
            let _ = writeln!(
                prompt,
                "- {} ({}): ESG {} (E {}, S {}, G {})",
                card.company_name,
                card.symbol,
                card.overall.score,
                card.environmental.score,
                card.social.score,
                card.governance.score
            );
        } else {
            let _ = writeln!(
                prompt,
                "- {} ({}): no ESG data available",
                card.company_name, card.symbol
            );
        }
    }

    prompt.push_str("\nAnswer the question using only this data. Do not advise buying or selling.");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EsgBreakdown, ScoreValue};
    use std::collections::BTreeMap;

    #[test]
    fn test_company_prompt_lists_metrics() {
        let prompt = build_company_prompt(
            "Apple Inc",
            "AAPL",
            "risk tolerance: low, strategy: ESG integration",
            &[(2024, "ESGScore", 72), (2023, "ESGScore", 70)],
        );

        assert!(prompt.contains("Apple Inc (AAPL)"));
        assert!(prompt.contains("2024 ESGScore: 72"));
        assert!(prompt.contains("risk tolerance: low"));
    }

    #[test]
    fn test_advisor_prompt_handles_missing_score() {
        let dashboard = DashboardData {
            portfolio_value: 0.0,
            overall_esg_score: None,
            portfolio_performance_change: 0.0,
            esg_breakdown: EsgBreakdown {
                environmental: None,
                social: None,
                governance: None,
            },
            esg_trends: BTreeMap::new(),
            top_holdings: vec![],
        };
        let scores = vec![HoldingScores {
            symbol: "NOCO".to_string(),
            company_name: "NoCo".to_string(),
            matched: false,
            year: None,
            overall: ScoreValue::missing(),
            environmental: ScoreValue::missing(),
            social: ScoreValue::missing(),
            governance: ScoreValue::missing(),
        }];

        let prompt = build_advisor_prompt("How green am I?", "profile", &dashboard, &scores);
        assert!(prompt.contains("weighted ESG score: unavailable"));
        assert!(prompt.contains("NoCo (NOCO): no ESG data available"));
    }
}
