//! Filtered export written to disk and read back

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use test_log::test;

use stock_screener::analysis::screen;
use stock_screener::data::Dataset;
use stock_screener::export::{export_to_dir, SCORE_COLUMN};
use stock_screener::models::{FilterCriteria, StockRecord, WeightVector};

use crate::common::fixtures::{sample_dataset, write_csv_file};

fn without_source(record: &StockRecord) -> StockRecord {
    StockRecord {
        source_row: None,
        ..record.clone()
    }
}

#[test]
fn test_export_reloads_as_dataset() {
    let dataset = sample_dataset();
    let outcome = screen(
        dataset.records(),
        &WeightVector::default(),
        &FilterCriteria::new(0.0, 30.0, 0.0),
        10,
    )
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
    let path = export_to_dir(dir.path(), dataset.columns(), &outcome.filtered, now).unwrap();
    assert_eq!(
        path.file_name().and_then(|n| n.to_str()),
        Some("filtered_stocks_20240301_093000.csv")
    );

    let contents = std::fs::read_to_string(&path).unwrap();
    let header = contents.lines().next().unwrap();
    assert!(header.ends_with(&format!(",{}", SCORE_COLUMN)));

    // The extra Score column is ignored on load
    let reloaded = Dataset::from_path(&path).unwrap();
    let original: Vec<StockRecord> = outcome.filtered.iter().map(|s| without_source(&s.record)).collect();
    let roundtrip: Vec<StockRecord> = reloaded.records().iter().map(without_source).collect();
    assert_eq!(roundtrip, original);
    assert_eq!(reloaded.tickers(), vec!["2222.SR", "1120.SR", "AAPL"]);
}

#[test]
fn test_export_keeps_unscored_input_columns() {
    let contents = "\
Ticker,Sector,Company Name,Price,YTarget,PE Ratio TTM,PE Forward,ROE,ROA,Dividend Paid,PE_Score,ROE_Score,ROA_Score,Dividend_Score
AAA,Energy,Alpha Oil,50,60,12,11,18,6,2,0.8,0.6,0.5,0.4
BBB,Banks,Beta Bank,20,25,30,25,25,9,1,0.2,0.9,0.7,0.1
";
    let dir = tempfile::tempdir().unwrap();
    let input = write_csv_file(dir.path(), "with_sector.csv", contents);
    let dataset = Dataset::from_path(&input).unwrap();

    let outcome = screen(
        dataset.records(),
        &WeightVector::default(),
        &FilterCriteria::unrestricted(),
        10,
    )
    .unwrap();
    let export_dir = dir.path().join("out");
    let path = export_to_dir(&export_dir, dataset.columns(), &outcome.filtered, Utc::now()).unwrap();

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let header: Vec<String> = reader.headers().unwrap().iter().map(str::to_string).collect();
    let mut expected: Vec<String> = dataset.columns().to_vec();
    expected.push(SCORE_COLUMN.to_string());
    assert_eq!(header, expected);
    assert_eq!(header[1], "Sector");

    let sectors: Vec<String> = reader
        .records()
        .map(|row| row.unwrap().get(1).unwrap().to_string())
        .collect();
    assert_eq!(sectors, vec!["Energy", "Banks"]);
}

#[test]
fn test_export_of_empty_selection_has_header_only() {
    let dataset = sample_dataset();
    let dir = tempfile::tempdir().unwrap();
    let path = export_to_dir(dir.path(), dataset.columns(), &[], Utc::now()).unwrap();
    let contents = std::fs::read_to_string(path).unwrap();
    assert_eq!(contents.lines().count(), 1);
}
