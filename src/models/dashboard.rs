use std::collections::BTreeMap;

use bigdecimal::BigDecimal;
use serde::Serialize;

/// One point of a per-field ESG trend series, ascending by year.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TrendPoint {
    pub year: i32,
    pub score: f64,
}

/// Value-weighted pillar scores on the 0-100 display scale. All three are
/// null when no holding resolved a price, since a weighted average with no
/// weights is undefined rather than zero.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EsgBreakdown {
    pub environmental: Option<i32>,
    pub social: Option<i32>,
    pub governance: Option<i32>,
}

/// Static projection of one holding, emitted in store order.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TopHolding {
    pub company_name: String,
    pub symbol: String,
    pub shares: BigDecimal,
    pub amount_invested: Option<BigDecimal>,
}

/// Per-request dashboard snapshot: portfolio value, weighted ESG
/// composition, historical trend, and performance vs. cost basis.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DashboardData {
    pub portfolio_value: f64,
    pub overall_esg_score: Option<i32>,
    pub portfolio_performance_change: f64,
    pub esg_breakdown: EsgBreakdown,
    pub esg_trends: BTreeMap<String, Vec<TrendPoint>>,
    pub top_holdings: Vec<TopHolding>,
}
