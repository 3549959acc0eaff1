mod dashboard;
mod esg;
mod holding;
mod insight;
mod news;
mod preferences;
mod user;

pub use dashboard::{DashboardData, EsgBreakdown, TopHolding, TrendPoint};
pub use esg::{
    display_score, EsgCompany, EsgMetric, PeerScore, ScoreValue, FIELD_ENVIRONMENT,
    FIELD_GOVERNANCE, FIELD_OVERALL, FIELD_SOCIAL, SCORE_FIELDS,
};
pub use holding::{CreateHolding, Holding};
pub use insight::{AdvisorRequest, AdvisorResponse, InsightRequest, InsightResponse};
pub use news::NewsArticle;
pub use preferences::{
    InvestmentStrategy, RiskLevel, TransparencyLevel, UpdatePreferences, UserPreferences,
};
pub use user::{
    CheckUserRequest, LoginRequest, LoginResponse, SignupRequest, UpdateSettingsRequest, User,
    UserProfile,
};
