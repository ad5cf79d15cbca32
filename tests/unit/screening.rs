//! Screening pipeline behaviour over the fixture dataset

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use test_log::test;

use stock_screener::analysis::{compute_scores, filter_records, normalize_weights, rank_top, screen};
use stock_screener::models::{FilterCriteria, WeightVector};
use stock_screener::ScreenerError;

use crate::common::fixtures::sample_dataset;

fn tickers(rows: &[stock_screener::models::ScoredRecord]) -> Vec<&str> {
    rows.iter().map(|r| r.ticker()).collect()
}

#[test]
fn test_default_weights_rank_fixture() {
    let dataset = sample_dataset();
    let outcome = screen(
        dataset.records(),
        &WeightVector::default(),
        &FilterCriteria::unrestricted(),
        10,
    )
    .unwrap();

    // XOM has no PE and drops out even without thresholds
    assert_eq!(outcome.filtered.len(), 4);
    assert_eq!(tickers(&outcome.top), vec!["2222.SR", "AAPL", "1120.SR", "MSFT"]);
    assert!((outcome.best_pick().unwrap().score - 0.747).abs() < 1e-9);
    assert_eq!(outcome.summary.matched, 4);
    assert_eq!(outcome.summary.total, 5);
}

#[test]
fn test_weight_scale_does_not_change_scores() {
    let dataset = sample_dataset();
    let a = compute_scores(dataset.records(), &normalize_weights(&WeightVector::new(0.35, 0.35, 0.15, 0.15)).unwrap());
    let b = compute_scores(dataset.records(), &normalize_weights(&WeightVector::new(7.0, 7.0, 3.0, 3.0)).unwrap());

    for (x, y) in a.iter().zip(&b) {
        assert!((x.score - y.score).abs() < 1e-12, "{} differs", x.ticker());
    }
}

#[test]
fn test_scores_stay_within_sub_score_range() {
    let dataset = sample_dataset();
    let weights = normalize_weights(&WeightVector::new(0.1, 0.9, 0.4, 0.6)).unwrap();

    for scored in compute_scores(dataset.records(), &weights) {
        let r = &scored.record;
        let lo = r.pe_score.min(r.roe_score).min(r.roa_score).min(r.dividend_score);
        let hi = r.pe_score.max(r.roe_score).max(r.roa_score).max(r.dividend_score);
        assert!(scored.score >= lo - 1e-12 && scored.score <= hi + 1e-12);
    }
}

#[test]
fn test_tightening_thresholds_only_shrinks() {
    let dataset = sample_dataset();
    let weights = normalize_weights(&WeightVector::default()).unwrap();
    let scored = compute_scores(dataset.records(), &weights);

    let loose = filter_records(&scored, &FilterCriteria::new(0.5, 40.0, 10.0));
    let tight = filter_records(&scored, &FilterCriteria::new(0.6, 30.0, 22.0));

    assert_eq!(tickers(&loose), vec!["2222.SR", "1120.SR", "AAPL", "MSFT"]);
    assert_eq!(tickers(&tight), vec!["2222.SR", "AAPL"]);
    assert!(tight.iter().all(|t| loose.iter().any(|l| l.ticker() == t.ticker())));
}

#[test]
fn test_rank_top_truncates_and_sorts() {
    let dataset = sample_dataset();
    let weights = normalize_weights(&WeightVector::default()).unwrap();
    let scored = compute_scores(dataset.records(), &weights);
    let filtered = filter_records(&scored, &FilterCriteria::unrestricted());

    let top = rank_top(&filtered, 2);
    assert_eq!(tickers(&top), vec!["2222.SR", "AAPL"]);
    assert!(rank_top(&filtered, 0).is_empty());
    assert_eq!(rank_top(&filtered, 50).len(), filtered.len());
}

#[test]
fn test_no_match_has_no_best_pick() {
    let dataset = sample_dataset();
    let outcome = screen(
        dataset.records(),
        &WeightVector::default(),
        &FilterCriteria::new(0.99, 100.0, 0.0),
        10,
    )
    .unwrap();

    assert!(outcome.filtered.is_empty());
    assert_matches!(outcome.best_pick(), Err(ScreenerError::NoMatches));
    assert_eq!(outcome.summary.lines()[0], "Filtered to 0 of 5 stocks");
}

#[test]
fn test_zero_weights_cannot_compute() {
    let dataset = sample_dataset();
    let result = screen(
        dataset.records(),
        &WeightVector::new(0.0, 0.0, 0.0, 0.0),
        &FilterCriteria::unrestricted(),
        10,
    );
    assert_matches!(result, Err(ScreenerError::ZeroWeightSum));
}

#[test]
fn test_roe_only_weighting_favours_apple() {
    let dataset = sample_dataset();
    let outcome = screen(
        dataset.records(),
        &WeightVector::new(0.0, 1.0, 0.0, 0.0),
        &FilterCriteria::unrestricted(),
        1,
    )
    .unwrap();
    assert_eq!(outcome.best_pick().unwrap().ticker(), "AAPL");
}
