use std::fmt;

use tracing::debug;

use crate::data::min_max;
use crate::error::{Result, ScreenerError};
use crate::models::{FilterCriteria, ScoredRecord, StockRecord, WeightVector};

/// Scale raw weights so the four components sum to 1.0.
///
/// Negative components are accepted as-is; only a zero (or non-finite) sum
/// is rejected.
pub fn normalize_weights(raw: &WeightVector) -> Result<WeightVector> {
    let total = raw.sum();
    if total == 0.0 || !total.is_finite() {
        return Err(ScreenerError::ZeroWeightSum);
    }

    Ok(WeightVector {
        pe: raw.pe / total,
        roe: raw.roe / total,
        roa: raw.roa / total,
        dividend: raw.dividend / total,
    })
}

/// Weighted linear combination of a record's four sub-scores
pub fn score_record(record: &StockRecord, weights: &WeightVector) -> f64 {
    weights.pe * record.pe_score
        + weights.roe * record.roe_score
        + weights.roa * record.roa_score
        + weights.dividend * record.dividend_score
}

/// Score every record, preserving input order
pub fn compute_scores(records: &[StockRecord], weights: &WeightVector) -> Vec<ScoredRecord> {
    records
        .iter()
        .map(|record| ScoredRecord {
            score: score_record(record, weights),
            record: record.clone(),
        })
        .collect()
}

/// True when a scored record satisfies all three predicates.
/// A missing PE or ROE never passes.
pub fn passes(scored: &ScoredRecord, criteria: &FilterCriteria) -> bool {
    let pe_ok = scored
        .record
        .pe_ratio_ttm
        .map_or(false, |pe| pe <= criteria.max_pe);
    let roe_ok = scored.record.roe.map_or(false, |roe| roe >= criteria.min_roe);

    scored.score >= criteria.min_score && pe_ok && roe_ok
}

/// Keep records that pass the criteria, in their original order
pub fn filter_records(scored: &[ScoredRecord], criteria: &FilterCriteria) -> Vec<ScoredRecord> {
    scored
        .iter()
        .filter(|s| passes(s, criteria))
        .cloned()
        .collect()
}

/// Highest `n` scores, descending. Equal scores keep their relative order.
pub fn rank_top(filtered: &[ScoredRecord], n: usize) -> Vec<ScoredRecord> {
    let mut ranked = filtered.to_vec();
    // sort_by is stable
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked.truncate(n);
    ranked
}

/// Best-scoring record, or `NoMatches` when nothing survived filtering
pub fn top_pick(filtered: &[ScoredRecord]) -> Result<ScoredRecord> {
    rank_top(filtered, 1)
        .into_iter()
        .next()
        .ok_or(ScreenerError::NoMatches)
}

/// Observed min and max score
pub fn score_bounds(scored: &[ScoredRecord]) -> Option<(f64, f64)> {
    min_max(scored.iter().map(|s| s.score))
}

/// Summary statistics for one screening pass
#[derive(Debug, Clone, PartialEq)]
pub struct ScreeningSummary {
    pub matched: usize,
    pub total: usize,
    pub weights: WeightVector,
    pub criteria: FilterCriteria,
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
    pub mean_score: Option<f64>,
}

impl ScreeningSummary {
    fn new(
        filtered: &[ScoredRecord],
        total: usize,
        weights: WeightVector,
        criteria: FilterCriteria,
    ) -> Self {
        let bounds = score_bounds(filtered);
        let mean_score = if filtered.is_empty() {
            None
        } else {
            Some(filtered.iter().map(|s| s.score).sum::<f64>() / filtered.len() as f64)
        };

        Self {
            matched: filtered.len(),
            total,
            weights,
            criteria,
            min_score: bounds.map(|(lo, _)| lo),
            max_score: bounds.map(|(_, hi)| hi),
            mean_score,
        }
    }

    /// Human-readable summary lines, one fact per line
    pub fn lines(&self) -> Vec<String> {
        let [pe, roe, roa, dividend] = self.weights.as_percentages();
        vec![
            format!("Filtered to {} of {} stocks", self.matched, self.total),
            format!(
                "PE ≤ {:.2}, ROE ≥ {:.2}",
                self.criteria.max_pe, self.criteria.min_roe
            ),
            format!("Score ≥ {:.2}", self.criteria.min_score),
            format!(
                "Weighted: PE {}%, ROE {}%, ROA {}%, Dividend {}%",
                pe, roe, roa, dividend
            ),
        ]
    }
}

impl fmt::Display for ScreeningSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "• {}", line)?;
        }
        Ok(())
    }
}

/// Everything one pass of normalize, score, filter and rank produces
#[derive(Debug, Clone)]
pub struct ScreeningOutcome {
    pub weights: WeightVector,
    pub scored: Vec<ScoredRecord>,
    pub filtered: Vec<ScoredRecord>,
    pub top: Vec<ScoredRecord>,
    pub summary: ScreeningSummary,
}

impl ScreeningOutcome {
    pub fn best_pick(&self) -> Result<&ScoredRecord> {
        self.top.first().ok_or(ScreenerError::NoMatches)
    }

    /// Observed score range over the whole dataset, for bounding the min-score control
    pub fn score_range(&self) -> Option<(f64, f64)> {
        score_bounds(&self.scored)
    }
}

/// Run the full pipeline over a set of records
pub fn screen(
    records: &[StockRecord],
    raw_weights: &WeightVector,
    criteria: &FilterCriteria,
    top_n: usize,
) -> Result<ScreeningOutcome> {
    let weights = normalize_weights(raw_weights)?;
    let scored = compute_scores(records, &weights);
    let filtered = filter_records(&scored, criteria);
    let top = rank_top(&filtered, top_n);
    let summary = ScreeningSummary::new(&filtered, records.len(), weights, *criteria);

    debug!(
        "Screened {} records: {} matched, top {} returned",
        records.len(),
        filtered.len(),
        top.len()
    );

    Ok(ScreeningOutcome {
        weights,
        scored,
        filtered,
        top,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    fn record(ticker: &str, scores: [f64; 4], pe: Option<f64>, roe: Option<f64>) -> StockRecord {
        StockRecord {
            ticker: ticker.to_string(),
            company_name: format!("{} Co", ticker),
            price: Some(50.0),
            y_target: Some(60.0),
            pe_ratio_ttm: pe,
            pe_forward: pe,
            roe,
            roa: Some(5.0),
            dividend_paid: Some(2.0),
            pe_score: scores[0],
            roe_score: scores[1],
            roa_score: scores[2],
            dividend_score: scores[3],
            source_row: None,
        }
    }

    fn sample() -> Vec<StockRecord> {
        vec![
            record("AAA", [0.8, 0.6, 0.5, 0.4], Some(12.0), Some(18.0)),
            record("BBB", [0.2, 0.9, 0.7, 0.1], Some(30.0), Some(25.0)),
            record("CCC", [0.5, 0.5, 0.5, 0.5], Some(20.0), Some(10.0)),
            record("DDD", [0.9, 0.1, 0.2, 0.9], None, Some(12.0)),
        ]
    }

    #[test]
    fn test_normalize_sums_to_one() {
        let inputs = [
            WeightVector::new(0.35, 0.35, 0.15, 0.15),
            WeightVector::new(1.0, 0.0, 0.0, 0.0),
            WeightVector::new(0.3, 0.3, 0.3, 0.3),
            WeightVector::new(0.05, 1.0, 0.55, 0.7),
        ];
        for raw in inputs {
            let normalized = normalize_weights(&raw).unwrap();
            assert!((normalized.sum() - 1.0).abs() < 1e-9, "{:?}", normalized);
        }
    }

    #[test]
    fn test_normalize_rejects_zero_sum() {
        assert_matches!(
            normalize_weights(&WeightVector::new(0.0, 0.0, 0.0, 0.0)),
            Err(ScreenerError::ZeroWeightSum)
        );
        assert_matches!(
            normalize_weights(&WeightVector::new(1.0, -1.0, 0.0, 0.0)),
            Err(ScreenerError::ZeroWeightSum)
        );
    }

    #[test]
    fn test_normalize_keeps_negative_weights() {
        let normalized = normalize_weights(&WeightVector::new(2.0, -1.0, 0.5, 0.5)).unwrap();
        assert_eq!(normalized.roe, -0.5);
    }

    #[test]
    fn test_score_example() {
        let weights = WeightVector::new(0.35, 0.35, 0.15, 0.15);
        let scored = compute_scores(&sample()[..1], &weights);
        assert!((scored[0].score - 0.625).abs() < 1e-12);
    }

    #[test]
    fn test_filter_excludes_missing_pe() {
        let weights = normalize_weights(&WeightVector::default()).unwrap();
        let scored = compute_scores(&sample(), &weights);
        let filtered = filter_records(&scored, &FilterCriteria::unrestricted());

        let tickers: Vec<&str> = filtered.iter().map(|s| s.ticker()).collect();
        assert_eq!(tickers, vec!["AAA", "BBB", "CCC"]);
    }

    #[test]
    fn test_filter_applies_all_predicates() {
        let weights = normalize_weights(&WeightVector::default()).unwrap();
        let scored = compute_scores(&sample(), &weights);

        let criteria = FilterCriteria::new(0.0, 25.0, 11.0);
        let tickers: Vec<String> = filter_records(&scored, &criteria)
            .into_iter()
            .map(|s| s.record.ticker)
            .collect();
        assert_eq!(tickers, vec!["AAA".to_string()]);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let weights = normalize_weights(&WeightVector::default()).unwrap();
        let scored = compute_scores(&sample(), &weights);
        let criteria = FilterCriteria::new(0.45, 30.0, 10.0);

        let once = filter_records(&scored, &criteria);
        let twice = filter_records(&once, &criteria);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_rank_top_is_descending_and_stable() {
        let mut records = sample();
        // Same sub-scores as CCC, later in the file
        records.push(record("EEE", [0.5, 0.5, 0.5, 0.5], Some(20.0), Some(10.0)));
        let scored = compute_scores(&records, &WeightVector::new(0.25, 0.25, 0.25, 0.25));

        let ranked = rank_top(&scored, 10);
        assert_eq!(ranked.len(), records.len());
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));

        let ccc = ranked.iter().position(|s| s.ticker() == "CCC").unwrap();
        let eee = ranked.iter().position(|s| s.ticker() == "EEE").unwrap();
        assert!(ccc < eee);

        assert_eq!(rank_top(&scored, 2).len(), 2);
        assert!(rank_top(&[], 10).is_empty());
    }

    #[test]
    fn test_raising_a_weight_never_demotes_the_stronger_record() {
        // AAA and BBB share every sub-score except PE
        let a = record("AAA", [0.9, 0.4, 0.4, 0.4], Some(10.0), Some(10.0));
        let b = record("BBB", [0.3, 0.4, 0.4, 0.4], Some(10.0), Some(10.0));
        let records = vec![b, a];

        for pe_weight in [0.0, 0.1, 0.35, 0.8, 1.0] {
            let raw = WeightVector::new(pe_weight, 0.35, 0.15, 0.15);
            let weights = normalize_weights(&raw).unwrap();
            let ranked = rank_top(&compute_scores(&records, &weights), 2);
            let pos_a = ranked.iter().position(|s| s.ticker() == "AAA").unwrap();
            let pos_b = ranked.iter().position(|s| s.ticker() == "BBB").unwrap();
            if pe_weight > 0.0 {
                assert!(pos_a < pos_b, "pe weight {}", pe_weight);
            }
        }
    }

    #[test]
    fn test_top_pick_reports_no_matches() {
        let weights = normalize_weights(&WeightVector::default()).unwrap();
        let scored = compute_scores(&sample(), &weights);
        let filtered = filter_records(&scored, &FilterCriteria::new(10.0, 100.0, 0.0));

        assert!(filtered.is_empty());
        assert_matches!(top_pick(&filtered), Err(ScreenerError::NoMatches));
    }

    #[test]
    fn test_screen_builds_summary() {
        let outcome = screen(
            &sample(),
            &WeightVector::new(0.7, 0.7, 0.3, 0.3),
            &FilterCriteria::unrestricted(),
            2,
        )
        .unwrap();

        assert_eq!(outcome.weights.as_percentages(), [35, 35, 15, 15]);
        assert_eq!(outcome.scored.len(), 4);
        assert_eq!(outcome.filtered.len(), 3);
        assert_eq!(outcome.top.len(), 2);
        assert_eq!(outcome.best_pick().unwrap().ticker(), "AAA");
        assert_eq!(outcome.summary.matched, 3);
        assert_eq!(outcome.summary.total, 4);
        assert!(outcome.summary.mean_score.is_some());
        assert_eq!(
            outcome.summary.lines()[3],
            "Weighted: PE 35%, ROE 35%, ROA 15%, Dividend 15%"
        );
    }

    #[test]
    fn test_screen_empty_result_has_no_best_pick() {
        let outcome = screen(
            &sample(),
            &WeightVector::default(),
            &FilterCriteria::new(f64::MAX, f64::INFINITY, f64::NEG_INFINITY),
            10,
        )
        .unwrap();

        assert!(outcome.top.is_empty());
        assert_eq!(outcome.summary.mean_score, None);
        assert_matches!(outcome.best_pick(), Err(ScreenerError::NoMatches));
        assert!(outcome.score_range().is_some());
    }
}
