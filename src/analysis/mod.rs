//! Screening engine: weighted scoring, threshold filtering, ranking, and
//! the investment-return calculator. Everything here is pure and is
//! recomputed from scratch on each input change.

pub mod investment;
pub mod scoring;

pub use investment::{
    compute_investment_return, evaluate_ticker, TickerEvaluation, INVESTMENT_STEP, MIN_INVESTMENT,
};
pub use scoring::{
    compute_scores, filter_records, normalize_weights, rank_top, score_bounds, screen, top_pick,
    ScreeningOutcome, ScreeningSummary,
};
