use thiserror::Error;

/// Errors surfaced by the screener library
#[derive(Error, Debug)]
pub enum ScreenerError {
    #[error("Cannot compute: weights sum to zero")]
    ZeroWeightSum,

    #[error("Cannot compute: current price is zero")]
    ZeroPrice,

    #[error("Cannot compute: investment amount is zero")]
    ZeroInvestment,

    #[error("Cannot compute: {0} is not a finite number")]
    NonFinite(&'static str),

    #[error("No stocks match the current filter criteria")]
    NoMatches,

    #[error("Ticker not found: {0}")]
    TickerNotFound(String),

    #[error("Data unavailable: {field} is missing for {ticker}")]
    DataUnavailable { ticker: String, field: &'static str },

    #[error("Missing required column(s): {}", .0.join(", "))]
    MissingColumn(Vec<String>),

    #[error("Invalid data on row {row}: {message}")]
    InvalidRow { row: usize, message: String },

    #[error("Market data error: {0}")]
    MarketData(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ScreenerError>;
