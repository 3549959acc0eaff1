use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use bigdecimal::ToPrimitive;
use futures::future::join_all;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db;
use crate::errors::{AppError, LookupError};
use crate::external::quote_provider::QuoteProvider;
use crate::models::{
    DashboardData, EsgBreakdown, EsgMetric, Holding, ScoreValue, TopHolding, TrendPoint,
    FIELD_ENVIRONMENT, FIELD_GOVERNANCE, FIELD_OVERALL, FIELD_SOCIAL, SCORE_FIELDS,
};

/// Everything the aggregation needs for one holding, gathered up front.
/// A failed price lookup is carried as a value, not an error path; a holding
/// without a company match has `metrics: None`.
#[derive(Debug)]
pub struct HoldingInput {
    pub holding: Holding,
    pub price: Result<f64, LookupError>,
    pub metrics: Option<Vec<EsgMetric>>,
}

/// Per-run lookup diagnostics. The HTTP payload degrades silently; this is
/// what makes the degradation observable in logs and tests.
#[derive(Debug, Default)]
pub struct PartialResult {
    pub holdings_total: usize,
    pub holdings_priced: usize,
    pub price_failures: Vec<(String, LookupError)>,
    pub unmatched_tickers: Vec<String>,
}

impl PartialResult {
    pub fn is_complete(&self) -> bool {
        self.price_failures.is_empty() && self.unmatched_tickers.is_empty()
    }
}

/// One consistent snapshot of portfolio value, weighted ESG composition and
/// trend for one user's holdings.
pub async fn compute_dashboard(
    pool: &PgPool,
    quotes: &dyn QuoteProvider,
    quote_timeout: Duration,
    user_id: Uuid,
) -> Result<DashboardData, AppError> {
    let holdings = db::holding_queries::list_for_user(pool, user_id).await?;
    info!("Computing dashboard for user {} ({} holdings)", user_id, holdings.len());

    let prices = resolve_prices(quotes, quote_timeout, &holdings).await;

    let mut inputs = Vec::with_capacity(holdings.len());
    for (holding, price) in holdings.into_iter().zip(prices) {
        let metrics = match db::esg_queries::find_company_by_ticker(pool, &holding.symbol).await? {
            Some(company) => Some(db::esg_queries::list_metrics(pool, company.id).await?),
            None => None,
        };
        inputs.push(HoldingInput { holding, price, metrics });
    }

    let (data, partial) = aggregate(&inputs);

    if !partial.is_complete() {
        warn!(
            "⚠️ Dashboard for user {} degraded: {}/{} holdings priced, {} price failures, {} tickers without ESG company match",
            user_id,
            partial.holdings_priced,
            partial.holdings_total,
            partial.price_failures.len(),
            partial.unmatched_tickers.len(),
        );
        for (symbol, err) in &partial.price_failures {
            warn!("  price lookup for {} failed: {}", symbol, err);
        }
    }

    Ok(data)
}

/// Fan out one bounded quote call per holding and gather all outcomes.
/// Each call is independent; a failure or timeout on one never cancels the
/// siblings, and the caller only proceeds once every outcome is in, since
/// weights need the total resolved value as a denominator.
pub async fn resolve_prices(
    quotes: &dyn QuoteProvider,
    quote_timeout: Duration,
    holdings: &[Holding],
) -> Vec<Result<f64, LookupError>> {
    let lookups = holdings.iter().map(|holding| {
        let symbol = holding.symbol.clone();
        async move {
            match tokio::time::timeout(quote_timeout, quotes.latest_quote(&symbol)).await {
                Ok(Ok(quote)) => Ok(quote.price),
                Ok(Err(e)) => Err(LookupError::Quote(e.to_string())),
                Err(_) => Err(LookupError::Timeout),
            }
        }
    });

    join_all(lookups).await
}

/// Pure aggregation over gathered inputs; see the module tests for the
/// contract. Holdings without a resolved price are excluded from value and
/// weights but still appear in top_holdings and the invested total.
pub fn aggregate(inputs: &[HoldingInput]) -> (DashboardData, PartialResult) {
    let mut partial = PartialResult {
        holdings_total: inputs.len(),
        ..PartialResult::default()
    };

    // Pass 1: resolved values and the weight denominator.
    let mut stock_values: Vec<Option<f64>> = Vec::with_capacity(inputs.len());
    let mut total_value = 0.0_f64;
    let mut total_invested = 0.0_f64;

    for input in inputs {
        let shares = input.holding.shares.to_f64().unwrap_or(0.0);
        total_invested += input
            .holding
            .amount_invested
            .as_ref()
            .and_then(|a| a.to_f64())
            .unwrap_or(0.0);

        match &input.price {
            Ok(price) => {
                let value = price * shares;
                total_value += value;
                partial.holdings_priced += 1;
                stock_values.push(Some(value));
            }
            Err(e) => {
                partial
                    .price_failures
                    .push((input.holding.symbol.clone(), e.clone()));
                stock_values.push(None);
            }
        }
    }

    // Pass 2: value weights, latest-year scores, and trend accumulation.
    let mut weighted: HashMap<&str, f64> =
        SCORE_FIELDS.iter().map(|f| (*f, 0.0_f64)).collect();
    let mut trends: BTreeMap<String, BTreeMap<i32, f64>> = BTreeMap::new();

    for (input, stock_value) in inputs.iter().zip(&stock_values) {
        let weight = match stock_value {
            Some(value) if total_value > 0.0 => value / total_value,
            _ => 0.0,
        };

        let metrics = match &input.metrics {
            Some(metrics) => metrics,
            None => {
                partial
                    .unmatched_tickers
                    .push(input.holding.symbol.clone());
                continue;
            }
        };

        let latest_year = metrics.iter().map(|m| m.year).max();

        for field in SCORE_FIELDS {
            let latest = latest_year
                .and_then(|year| {
                    metrics
                        .iter()
                        .find(|m| m.year == year && m.field_name == field)
                })
                .map(|m| ScoreValue::from_normalized(m.score))
                .unwrap_or_else(ScoreValue::missing);

            if let Some(total) = weighted.get_mut(field) {
                *total += weight * latest.score as f64;
            }

            // Historical years reuse the current value weight: the trend
            // shows today's allocation replayed against past scores.
            let series = trends.entry(field.to_string()).or_default();
            for metric in metrics.iter().filter(|m| m.field_name == field) {
                *series.entry(metric.year).or_insert(0.0) += weight * metric.score * 100.0;
            }
        }
    }

    // A weighted average over zero resolved value is undefined, not zero.
    let scored = total_value > 0.0;
    let rounded = |field: &str| -> Option<i32> {
        scored.then(|| weighted.get(field).copied().unwrap_or(0.0).round() as i32)
    };

    let esg_trends = trends
        .into_iter()
        .map(|(field, by_year)| {
            let points = by_year
                .into_iter()
                .map(|(year, score)| TrendPoint { year, score })
                .collect();
            (field, points)
        })
        .collect();

    let portfolio_performance_change = if total_invested > 0.0 {
        (total_value - total_invested) / total_invested * 100.0
    } else {
        0.0
    };

    let top_holdings = inputs
        .iter()
        .map(|input| TopHolding {
            company_name: input.holding.company_name.clone(),
            symbol: input.holding.symbol.clone(),
            shares: input.holding.shares.clone(),
            amount_invested: input.holding.amount_invested.clone(),
        })
        .collect();

    let data = DashboardData {
        portfolio_value: total_value,
        overall_esg_score: rounded(FIELD_OVERALL),
        portfolio_performance_change,
        esg_breakdown: EsgBreakdown {
            environmental: rounded(FIELD_ENVIRONMENT),
            social: rounded(FIELD_SOCIAL),
            governance: rounded(FIELD_GOVERNANCE),
        },
        esg_trends,
        top_holdings,
    };

    (data, partial)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use chrono::Utc;
    use std::str::FromStr;

    fn holding(symbol: &str, shares: i64, amount_invested: Option<&str>) -> Holding {
        Holding {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            symbol: symbol.to_string(),
            company_name: format!("{} Inc", symbol),
            shares: BigDecimal::from(shares),
            amount_invested: amount_invested.map(|a| BigDecimal::from_str(a).unwrap()),
            price_bought_at: None,
            added_at: Utc::now(),
        }
    }

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
    fn test_single_holding_scenario() {
        // 10 shares bought for $1000 total, now at $150, env pillar 0.80.
        let inputs = vec![HoldingInput {
            holding: holding("AAPL", 10, Some("1000.00")),
            price: Ok(150.0),
            metrics: Some(vec![
                metric(FIELD_ENVIRONMENT, 2024, 0.80),
                metric(FIELD_OVERALL, 2024, 0.72),
            ]),
        }];

        let (data, partial) = aggregate(&inputs);

        assert_eq!(data.portfolio_value, 1500.0);
        assert_eq!(data.esg_breakdown.environmental, Some(80));
        assert_eq!(data.overall_esg_score, Some(72));
        assert_eq!(data.portfolio_performance_change, 50.0);
        assert!(partial.is_complete());
    }

    #[test]
    fn test_zero_resolved_value_yields_null_scores() {
        let inputs = vec![HoldingInput {
            holding: holding("AAPL", 10, Some("1000.00")),
            price: Err(LookupError::Timeout),
            metrics: Some(vec![metric(FIELD_OVERALL, 2024, 0.9)]),
        }];

        let (data, partial) = aggregate(&inputs);

        assert_eq!(data.portfolio_value, 0.0);
        assert_eq!(data.overall_esg_score, None);
        assert_eq!(data.esg_breakdown.environmental, None);
        // Performance still computed from invested totals: (0 - 1000) / 1000.
        assert_eq!(data.portfolio_performance_change, -100.0);
        assert_eq!(partial.holdings_priced, 0);
        assert_eq!(partial.price_failures.len(), 1);
    }

    #[test]
    fn test_failed_lookup_is_isolated() {
        let inputs = vec![
            HoldingInput {
                holding: holding("AAPL", 10, Some("1000.00")),
                price: Ok(150.0),
                metrics: Some(vec![metric(FIELD_OVERALL, 2024, 0.80)]),
            },
            HoldingInput {
                holding: holding("FAIL", 5, Some("500.00")),
                price: Err(LookupError::Quote("network error".into())),
                metrics: Some(vec![metric(FIELD_OVERALL, 2024, 0.40)]),
            },
        ];

        let (data, partial) = aggregate(&inputs);

        // Only the resolving holding counts toward value and weight.
        assert_eq!(data.portfolio_value, 1500.0);
        assert_eq!(data.overall_esg_score, Some(80));
        // Invested totals include the failing holding.
        assert_eq!(data.portfolio_performance_change, 0.0);
        // The failing holding still appears in the projection.
        assert_eq!(data.top_holdings.len(), 2);
        assert_eq!(data.top_holdings[1].symbol, "FAIL");
        assert_eq!(partial.price_failures.len(), 1);
        assert_eq!(partial.price_failures[0].0, "FAIL");
    }

    #[test]
    fn test_unmatched_ticker_counts_toward_value_only() {
        // Equal values: matched holding scores 80, unmatched contributes 0.
        let inputs = vec![
            HoldingInput {
                holding: holding("AAPL", 10, None),
                price: Ok(100.0),
                metrics: Some(vec![metric(FIELD_OVERALL, 2024, 0.80)]),
            },
            HoldingInput {
                holding: holding("NOCO", 10, None),
                price: Ok(100.0),
                metrics: None,
            },
        ];

        let (data, partial) = aggregate(&inputs);

        assert_eq!(data.portfolio_value, 2000.0);
        assert_eq!(data.overall_esg_score, Some(40));
        assert_eq!(partial.unmatched_tickers, vec!["NOCO".to_string()]);
    }

    #[test]
    fn test_weights_sum_to_one_when_all_resolve() {
        let inputs = vec![
            HoldingInput {
                holding: holding("A", 1, None),
                price: Ok(300.0),
                metrics: Some(vec![metric(FIELD_OVERALL, 2024, 1.0)]),
            },
            HoldingInput {
                holding: holding("B", 1, None),
                price: Ok(100.0),
                metrics: Some(vec![metric(FIELD_OVERALL, 2024, 1.0)]),
            },
        ];

        // Both holdings score 100, so the weighted total equals 100 exactly
        // iff the weights sum to 1.
        let (data, _) = aggregate(&inputs);
        assert_eq!(data.overall_esg_score, Some(100));
    }

    #[test]
    fn test_latest_year_wins() {
        let inputs = vec![HoldingInput {
            holding: holding("AAPL", 1, None),
            price: Ok(100.0),
            metrics: Some(vec![
                metric(FIELD_OVERALL, 2022, 0.20),
                metric(FIELD_OVERALL, 2024, 0.90),
                metric(FIELD_OVERALL, 2023, 0.50),
            ]),
        }];

        let (data, _) = aggregate(&inputs);
        assert_eq!(data.overall_esg_score, Some(90));
    }

    #[test]
    fn test_absent_metric_defaults_to_zero() {
        // Overall present, pillars absent in the latest year.
        let inputs = vec![HoldingInput {
            holding: holding("AAPL", 1, None),
            price: Ok(100.0),
            metrics: Some(vec![metric(FIELD_OVERALL, 2024, 0.60)]),
        }];

        let (data, _) = aggregate(&inputs);
        assert_eq!(data.overall_esg_score, Some(60));
        assert_eq!(data.esg_breakdown.environmental, Some(0));
        assert_eq!(data.esg_breakdown.governance, Some(0));
    }

    #[test]
    fn test_trends_ascend_by_year_without_duplicates() {
        let inputs = vec![HoldingInput {
            holding: holding("AAPL", 1, None),
            price: Ok(100.0),
            metrics: Some(vec![
                metric(FIELD_OVERALL, 2024, 0.90),
                metric(FIELD_OVERALL, 2021, 0.30),
                metric(FIELD_OVERALL, 2023, 0.70),
            ]),
        }];

        let (data, _) = aggregate(&inputs);
        let series = &data.esg_trends[FIELD_OVERALL];

        let years: Vec<i32> = series.iter().map(|p| p.year).collect();
        assert_eq!(years, vec![2021, 2023, 2024]);

        // Single holding with weight 1: trend scores are the raw ×100 values.
        assert_eq!(series[0].score, 30.0);
        assert_eq!(series[2].score, 90.0);
    }

    #[test]
    fn test_trend_uses_current_weight_for_past_years() {
        // 75% / 25% split by value today; 2020 scores 0.4 and 0.8.
        let inputs = vec![
            HoldingInput {
                holding: holding("A", 3, None),
                price: Ok(100.0),
                metrics: Some(vec![
                    metric(FIELD_OVERALL, 2024, 0.50),
                    metric(FIELD_OVERALL, 2020, 0.40),
                ]),
            },
            HoldingInput {
                holding: holding("B", 1, None),
                price: Ok(100.0),
                metrics: Some(vec![
                    metric(FIELD_OVERALL, 2024, 0.50),
                    metric(FIELD_OVERALL, 2020, 0.80),
                ]),
            },
        ];

        let (data, _) = aggregate(&inputs);
        let series = &data.esg_trends[FIELD_OVERALL];
        let y2020 = series.iter().find(|p| p.year == 2020).unwrap();

        // 0.75 × 40 + 0.25 × 80 = 50.
        assert!((y2020.score - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_invested_yields_zero_performance() {
        let inputs = vec![HoldingInput {
            holding: holding("AAPL", 10, None),
            price: Ok(150.0),
            metrics: None,
        }];

        let (data, _) = aggregate(&inputs);
        assert_eq!(data.portfolio_performance_change, 0.0);
    }

    #[test]
    fn test_empty_portfolio() {
        let (data, partial) = aggregate(&[]);

        assert_eq!(data.portfolio_value, 0.0);
        assert_eq!(data.overall_esg_score, None);
        assert_eq!(data.portfolio_performance_change, 0.0);
        assert!(data.top_holdings.is_empty());
        assert!(partial.is_complete());
    }

    #[test]
    fn test_aggregate_is_deterministic() {
        let inputs = vec![
            HoldingInput {
                holding: holding("A", 3, Some("250.00")),
                price: Ok(123.45),
                metrics: Some(vec![
                    metric(FIELD_OVERALL, 2024, 0.755),
                    metric(FIELD_ENVIRONMENT, 2024, 0.31),
                ]),
            },
            HoldingInput {
                holding: holding("B", 7, Some("900.00")),
                price: Err(LookupError::Quote("boom".into())),
                metrics: None,
            },
        ];

        let (first, _) = aggregate(&inputs);
        let (second, _) = aggregate(&inputs);
        assert_eq!(first, second);
    }

    mod price_resolution {
        use super::*;
        use crate::external::quote_provider::{PricePoint, QuoteProviderError, SymbolMatch};
        use async_trait::async_trait;

        struct ScriptedProvider;

        #[async_trait]
        impl QuoteProvider for ScriptedProvider {
            async fn latest_quote(
                &self,
                symbol: &str,
            ) -> Result<PricePoint, QuoteProviderError> {
                match symbol {
                    "SLOW" => {
                        tokio::time::sleep(std::time::Duration::from_secs(60)).await;
                        unreachable!("timed out before completing")
                    }
                    "BAD" => Err(QuoteProviderError::UnknownSymbol(symbol.to_string())),
                    _ => Ok(PricePoint {
                        symbol: symbol.to_string(),
                        price: 42.0,
                        as_of: Utc::now(),
                    }),
                }
            }

            async fn search_symbols(
                &self,
                _keyword: &str,
            ) -> Result<Vec<SymbolMatch>, QuoteProviderError> {
                Ok(vec![])
            }
        }

        #[tokio::test(start_paused = true)]
        async fn test_one_slow_lookup_does_not_stall_the_rest() {
            let holdings = vec![
                holding("OK", 1, None),
                holding("SLOW", 1, None),
                holding("BAD", 1, None),
            ];

            let results = resolve_prices(
                &ScriptedProvider,
                std::time::Duration::from_secs(5),
                &holdings,
            )
            .await;

            assert_eq!(results.len(), 3);
            assert_eq!(results[0], Ok(42.0));
            assert!(matches!(results[1], Err(LookupError::Timeout)));
            assert!(matches!(results[2], Err(LookupError::Quote(_))));
        }
    }
}
