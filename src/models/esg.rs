use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Metric field names used by the dashboard aggregation. The vendor dataset
/// carries many more fields; these four drive the headline and pillar scores.
pub const FIELD_OVERALL: &str = "ESGScore";
pub const FIELD_ENVIRONMENT: &str = "EnvironmentPillarScore";
pub const FIELD_SOCIAL: &str = "SocialPillarScore";
pub const FIELD_GOVERNANCE: &str = "GovernancePillarScore";

pub const SCORE_FIELDS: [&str; 4] = [
    FIELD_OVERALL,
    FIELD_ENVIRONMENT,
    FIELD_SOCIAL,
    FIELD_GOVERNANCE,
];

// One company in the ESG reference dataset. A ticker maps to at most one
// company; org_id is the vendor's stable identifier.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EsgCompany {
    pub id: Uuid,
    pub org_id: i64,
    pub ticker: String,
    pub name: String,
    pub isin: Option<String>,
    pub sic_code: Option<String>,
}

// One metric observation: (company, year, field_name) is unique.
// score is the normalized 0..1 value; raw_value keeps the vendor text.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EsgMetric {
    pub id: Uuid,
    pub company_id: Uuid,
    pub year: i32,
    pub field_name: String,
    pub pillar: String,
    pub raw_value: String,
    pub score: f64,
}

/// Latest-year score of one peer company sharing a SIC code.
#[derive(Debug, Serialize, FromRow)]
pub struct PeerScore {
    pub ticker: String,
    pub name: String,
    pub year: i32,
    pub score: f64,
}

/// Display-scale score with an availability flag. An absent metric is
/// reported as score 0 with available=false, so a genuine zero stays
/// distinguishable from missing data.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ScoreValue {
    pub score: i32,
    pub available: bool,
}

impl ScoreValue {
    pub fn missing() -> Self {
        Self { score: 0, available: false }
    }

    pub fn from_normalized(normalized: f64) -> Self {
        Self { score: display_score(normalized), available: true }
    }
}

/// Display scaling rule: normalized 0..1 value, ×100, rounded half away
/// from zero to an integer percent-like score. 0.755 displays as 76.
pub fn display_score(normalized: f64) -> i32 {
    (normalized * 100.0).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_score_rounds_half_up() {
        assert_eq!(display_score(0.755), 76);
        assert_eq!(display_score(0.80), 80);
        assert_eq!(display_score(0.754), 75);
        assert_eq!(display_score(0.0), 0);
        assert_eq!(display_score(1.0), 100);
    }

    #[test]
    fn test_score_value_missing_is_flagged() {
        let missing = ScoreValue::missing();
        assert_eq!(missing.score, 0);
        assert!(!missing.available);

        let zero = ScoreValue::from_normalized(0.0);
        assert_eq!(zero.score, 0);
        assert!(zero.available);
    }
}
