use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::Result;
use crate::models::{ScoredRecord, StockRecord};

/// Name of the extra column appended to the input columns
pub const SCORE_COLUMN: &str = "Score";

/// Filename for an export generated at `now`
pub fn export_filename(now: DateTime<Utc>) -> String {
    format!("filtered_stocks_{}.csv", now.format("%Y%m%d_%H%M%S"))
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Cell for `column` rebuilt from the typed fields; unknown columns are blank
fn typed_cell(record: &StockRecord, column: &str) -> String {
    match column {
        "Ticker" => record.ticker.clone(),
        "Company Name" => record.company_name.clone(),
        "Price" => optional(record.price),
        "YTarget" => optional(record.y_target),
        "PE Ratio TTM" => optional(record.pe_ratio_ttm),
        "PE Forward" => optional(record.pe_forward),
        "ROE" => optional(record.roe),
        "ROA" => optional(record.roa),
        "Dividend Paid" => optional(record.dividend_paid),
        "PE_Score" => record.pe_score.to_string(),
        "ROE_Score" => record.roe_score.to_string(),
        "ROA_Score" => record.roa_score.to_string(),
        "Dividend_Score" => record.dividend_score.to_string(),
        _ => String::new(),
    }
}

/// Write scored records as CSV: the dataset's columns in input order, then `Score`.
///
/// Rows loaded from a file are written back cell for cell, so columns the
/// screener does not interpret survive the export unchanged.
pub fn write_csv<W: Write>(columns: &[String], records: &[ScoredRecord], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header: Vec<&str> = columns.iter().map(String::as_str).collect();
    header.push(SCORE_COLUMN);
    csv_writer.write_record(&header)?;

    for scored in records {
        let mut cells: Vec<String> = match &scored.record.source_row {
            Some(row) if row.len() == columns.len() => row.iter().map(str::to_string).collect(),
            _ => columns.iter().map(|c| typed_cell(&scored.record, c)).collect(),
        };
        cells.push(scored.score.to_string());
        csv_writer.write_record(&cells)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Render the export into an in-memory string
pub fn to_csv_string(columns: &[String], records: &[ScoredRecord]) -> Result<String> {
    let mut buffer = Vec::new();
    write_csv(columns, records, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Write an export file into `dir` and return its path
pub fn export_to_dir(
    dir: &Path,
    columns: &[String],
    records: &[ScoredRecord],
    now: DateTime<Utc>,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(export_filename(now));
    let file = std::fs::File::create(&path)?;
    write_csv(columns, records, file)?;
    info!("Exported {} records to {}", records.len(), path.display());
    Ok(path)
}
