//! File-backed dataset provider and its reload policies

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use test_log::test;

use stock_screener::data::{CsvDatasetProvider, DatasetSource, ReloadPolicy};
use stock_screener::ScreenerError;

use crate::common::fixtures::{csv_with_rows, sample_csv, write_csv_file, SAMPLE_ROWS};
use crate::common::logging::log_test_step;

fn touch_forward(path: &std::path::Path) {
    let file = std::fs::OpenOptions::new().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(60)).unwrap();
}

#[test]
fn test_never_policy_serves_cached_copy() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv_file(dir.path(), "stocks.csv", &sample_csv());
    let provider = CsvDatasetProvider::new(&path, ReloadPolicy::Never);

    let first = provider.load().unwrap();
    std::fs::write(&path, csv_with_rows(&SAMPLE_ROWS[..2])).unwrap();
    touch_forward(&path);

    let second = provider.load().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.len(), 5);

    log_test_step("explicit reload bypasses the cache");
    let reloaded = provider.reload().unwrap();
    assert_eq!(reloaded.len(), 2);
}

#[test]
fn test_on_change_policy_picks_up_edits() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv_file(dir.path(), "stocks.csv", &sample_csv());
    let provider = CsvDatasetProvider::new(&path, ReloadPolicy::OnFileChange);

    let first = provider.load().unwrap();
    assert!(Arc::ptr_eq(&first, &provider.load().unwrap()));

    std::fs::write(&path, csv_with_rows(&SAMPLE_ROWS[2..])).unwrap();
    touch_forward(&path);

    let second = provider.load().unwrap();
    assert_eq!(second.tickers(), vec!["AAPL", "MSFT", "XOM"]);
}

#[test]
fn test_missing_column_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let contents = "Ticker,Company Name,Price\nAAPL,Apple Inc,190\n";
    let path = write_csv_file(dir.path(), "broken.csv", contents);
    let provider = CsvDatasetProvider::new(&path, ReloadPolicy::Never);

    let err = provider.load().unwrap_err();
    assert_matches!(err, ScreenerError::MissingColumn(ref columns) if columns.contains(&"ROE_Score".to_string()));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let provider = CsvDatasetProvider::new(dir.path().join("absent.csv"), ReloadPolicy::Never);
    assert_matches!(provider.load(), Err(ScreenerError::Io(_)));
}
