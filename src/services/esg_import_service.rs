use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::db::esg_queries;

const BATCH_SIZE: usize = 1000;

/// One row of the vendor ESG export. A company repeats across many
/// (year, field) rows; org identity is the stable key, not the ticker.
#[derive(Debug, Deserialize)]
struct EsgCsvRow {
    orgpermid: i64,
    ticker: String,
    comname: String,
    #[serde(default)]
    isin: String,
    #[serde(default)]
    siccode: String,
    year: i32,
    #[serde(default)]
    pillar: String,
    fieldname: String,
    #[serde(default)]
    value: String,
    valuescore: f64,
}

#[derive(Debug, Default, Serialize)]
pub struct ImportSummary {
    pub rows_read: usize,
    pub metrics_upserted: usize,
    pub rows_failed: usize,
    pub errors: Vec<String>,
}

/// Bulk-load the ESG reference dataset. Rows are applied in batches, one
/// transaction per batch, upserting companies by org id and metrics by
/// (company, year, field_name) so re-running the import is safe.
pub async fn import_csv_file(pool: &PgPool, file_path: &Path) -> Result<ImportSummary> {
    let file = std::fs::File::open(file_path)
        .with_context(|| format!("Failed to open ESG CSV file: {:?}", file_path))?;

    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);

    let mut summary = ImportSummary::default();
    let mut batch: Vec<EsgCsvRow> = Vec::with_capacity(BATCH_SIZE);

    for (line_num, result) in reader.deserialize::<EsgCsvRow>().enumerate() {
        match result {
            Ok(row) => {
                summary.rows_read += 1;
                batch.push(row);
                if batch.len() >= BATCH_SIZE {
                    apply_batch(pool, &mut batch, &mut summary).await?;
                    info!("ESG import progress: {} rows applied", summary.metrics_upserted);
                }
            }
            Err(e) => {
                summary.rows_failed += 1;
                if summary.errors.len() < 50 {
                    summary.errors.push(format!("line {}: {}", line_num + 2, e));
                }
            }
        }
    }

    if !batch.is_empty() {
        apply_batch(pool, &mut batch, &mut summary).await?;
    }

    info!(
        "✅ ESG import finished: {} rows read, {} metrics upserted, {} rows failed",
        summary.rows_read, summary.metrics_upserted, summary.rows_failed
    );
    Ok(summary)
}

async fn apply_batch(
    pool: &PgPool,
    batch: &mut Vec<EsgCsvRow>,
    summary: &mut ImportSummary,
) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to open transaction")?;

    // Companies repeat across rows; resolve each org id once per batch.
    let mut company_ids: HashMap<i64, Uuid> = HashMap::new();

    for row in batch.drain(..) {
        let company_id = match company_ids.get(&row.orgpermid) {
            Some(id) => *id,
            None => {
                let id = esg_queries::upsert_company(
                    &mut *tx,
                    row.orgpermid,
                    &row.ticker,
                    &row.comname,
                    non_empty(&row.isin),
                    non_empty(&row.siccode),
                )
                .await
                .context("Failed to upsert company")?;
                company_ids.insert(row.orgpermid, id);
                id
            }
        };

        esg_queries::upsert_metric(
            &mut *tx,
            company_id,
            row.year,
            &row.fieldname,
            &row.pillar,
            &row.value,
            row.valuescore,
        )
        .await
        .context("Failed to upsert metric")?;
        summary.metrics_upserted += 1;
    }

    tx.commit().await.context("Failed to commit batch")?;
    Ok(())
}

fn non_empty(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_filters_blanks() {
        assert_eq!(non_empty(""), None);
        assert_eq!(non_empty("   "), None);
        assert_eq!(non_empty(" 1311 "), Some("1311"));
    }

    #[test]
    fn test_csv_row_deserializes_vendor_headers() {
        let data = "orgpermid,ticker,comname,isin,siccode,year,pillar,fieldname,value,valuescore\n\
                    4295905573,AAPL,Apple Inc,US0378331005,3571,2024,Environment,EnvironmentPillarScore,A-,0.8\n";
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_reader(data.as_bytes());

        let row: EsgCsvRow = reader.deserialize().next().unwrap().unwrap();
        assert_eq!(row.orgpermid, 4295905573);
        assert_eq!(row.ticker, "AAPL");
        assert_eq!(row.fieldname, "EnvironmentPillarScore");
        assert_eq!(row.valuescore, 0.8);
    }
}
