use axum::routing::get;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::routes::{accounts, admin, dashboard, esg, health, insights, news, preferences, stocks};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    Router::<AppState>::new()
        .nest("/health", health::router())
        .nest("/api/account", accounts::router())
        .nest("/api/account/preferences", preferences::router())
        .route("/api/app-data", get(accounts::app_data))
        .nest("/api/stocks", stocks::router())
        .nest("/api/dashboard", dashboard::router())
        .nest("/api/esg", esg::router())
        .nest("/api/news", news::router())
        .nest("/api/insights", insights::router())
        .nest("/api/admin", admin::router())
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .with_state(state)
}
