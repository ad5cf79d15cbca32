//! Investment calculator through dataset lookups

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use test_log::test;

use stock_screener::analysis::{compute_investment_return, evaluate_ticker};
use stock_screener::models::Currency;
use stock_screener::ScreenerError;

use crate::common::fixtures::sample_dataset;

#[test]
fn test_gain_percent_is_target_ratio() {
    for amount in [100.0, 2_500.0, 1_000_000.0] {
        let projection = compute_investment_return(amount, 40.0, 50.0).unwrap();
        assert!((projection.gain_pct - 25.0).abs() < 1e-9);
        assert!((projection.shares * 40.0 - amount).abs() < 1e-6);
    }
}

#[test]
fn test_evaluate_saudi_ticker() {
    let dataset = sample_dataset();
    let evaluation = evaluate_ticker(&dataset, "2222.SR", 2_750.0, Currency::Sar).unwrap();

    assert_eq!(evaluation.shares_line(), "You could buy 100.00 shares");
    assert_eq!(
        evaluation.expected_value_line(),
        "Expected value at target price (33.00): 3300.00 SAR"
    );
    assert_eq!(evaluation.gain_line(), "Estimated gain: 550.00 SAR (+20.00%)");
}

#[test]
fn test_evaluate_missing_target() {
    let dataset = sample_dataset();
    assert_matches!(
        evaluate_ticker(&dataset, "XOM", 1_000.0, Currency::Usd),
        Err(ScreenerError::DataUnavailable { ref ticker, .. }) if ticker == "XOM"
    );
}

#[test]
fn test_evaluate_unknown_ticker() {
    let dataset = sample_dataset();
    let err = evaluate_ticker(&dataset, "NOPE", 1_000.0, Currency::Usd).unwrap_err();
    assert_eq!(err.to_string(), "Ticker not found: NOPE");
}
