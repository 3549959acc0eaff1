pub mod auth_service;
pub mod dashboard_service;
pub mod esg_import_service;
pub mod esg_service;
pub mod insight_service;
pub mod narrative_service;
pub mod news_service;
pub mod stock_service;
pub mod user_preference_service;
