use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Risk tolerance selected during onboarding
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl Default for RiskLevel {
    fn default() -> Self {
        RiskLevel::Medium
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InvestmentStrategy {
    ImpactInvesting,
    EsgIntegration,
    EthicalScreening,
    TraditionalEsg,
}

impl Default for InvestmentStrategy {
    fn default() -> Self {
        InvestmentStrategy::EsgIntegration
    }
}

impl std::fmt::Display for InvestmentStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvestmentStrategy::ImpactInvesting => write!(f, "impact investing"),
            InvestmentStrategy::EsgIntegration => write!(f, "ESG integration"),
            InvestmentStrategy::EthicalScreening => write!(f, "ethical screening"),
            InvestmentStrategy::TraditionalEsg => {
                write!(f, "traditional investing with ESG consideration")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransparencyLevel {
    SimpleSummary,
    DetailedBreakdown,
}

impl Default for TransparencyLevel {
    fn default() -> Self {
        TransparencyLevel::SimpleSummary
    }
}

/// Onboarding preferences used to tailor insights and peer comparisons.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserPreferences {
    pub id: Uuid,
    pub user_id: Uuid,
    pub risk_level: RiskLevel,
    pub investment_strategy: InvestmentStrategy,
    pub esg_factors: sqlx::types::JsonValue,
    pub industry_preferences: sqlx::types::JsonValue,
    pub exclusions: sqlx::types::JsonValue,
    pub sentiment_analysis: bool,
    pub transparency_level: TransparencyLevel,
    pub updated_at: DateTime<Utc>,
}

impl UserPreferences {
    pub fn default_for_user(user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            risk_level: RiskLevel::default(),
            investment_strategy: InvestmentStrategy::default(),
            esg_factors: serde_json::json!([]),
            industry_preferences: serde_json::json!([]),
            exclusions: serde_json::json!([]),
            sentiment_analysis: false,
            transparency_level: TransparencyLevel::default(),
            updated_at: Utc::now(),
        }
    }

    /// Short profile line used when assembling insight prompts.
    pub fn profile_summary(&self) -> String {
        format!(
            "risk tolerance: {}, strategy: {}",
            self.risk_level, self.investment_strategy
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePreferences {
    pub risk_level: Option<RiskLevel>,
    pub investment_strategy: Option<InvestmentStrategy>,
    pub esg_factors: Option<Vec<String>>,
    pub industry_preferences: Option<Vec<String>>,
    pub exclusions: Option<Vec<String>>,
    pub sentiment_analysis: Option<bool>,
    pub transparency_level: Option<TransparencyLevel>,
}

impl UpdatePreferences {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(factors) = &self.esg_factors {
            if factors.len() > 32 {
                return Err(format!(
                    "Too many ESG factors: {} (max 32)",
                    factors.len()
                ));
            }
        }
        Ok(())
    }
}
