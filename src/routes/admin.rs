use std::path::PathBuf;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{error, info};

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::services::esg_import_service::{self, ImportSummary};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/import-esg", post(import_esg))
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub file_path: String,
}

/// POST /api/admin/import-esg
/// Bulk-load the vendor ESG dataset from a server-side CSV file.
#[axum::debug_handler]
pub async fn import_esg(
    State(state): State<AppState>,
    user: AuthUser,
    Json(data): Json<ImportRequest>,
) -> Result<Json<ImportSummary>, AppError> {
    info!("POST /api/admin/import-esg - {} imports {}", user.email, data.file_path);

    let file_path = PathBuf::from(&data.file_path);
    if !file_path.exists() {
        error!("ESG import file does not exist: {}", data.file_path);
        return Err(AppError::Validation("File does not exist".to_string()));
    }

    let summary = esg_import_service::import_csv_file(&state.pool, &file_path)
        .await
        .map_err(|e| {
            error!("ESG import failed: {:#}", e);
            AppError::Validation(format!("Failed to import ESG data: {}", e))
        })?;

    info!(
        "ESG import completed: {} rows read, {} metrics upserted, {} failed",
        summary.rows_read, summary.metrics_upserted, summary.rows_failed
    );
    Ok(Json(summary))
}
