use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct InsightRequest {
    pub symbol: String,
}

#[derive(Debug, Serialize)]
pub struct InsightResponse {
    pub symbol: String,
    pub insight: String,
}

#[derive(Debug, Deserialize)]
pub struct AdvisorRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct AdvisorResponse {
    pub answer: String,
}
