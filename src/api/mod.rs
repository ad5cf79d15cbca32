use std::fmt;

use crate::error::Result;
use crate::models::PricePoint;

pub mod yahoo_client;
pub use yahoo_client::YahooChartClient;

/// Look-back window for a price history request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryRange {
    OneMonth,
    SixMonths,
    #[default]
    OneYear,
    FiveYears,
}

impl HistoryRange {
    /// Range token understood by the chart endpoint
    pub fn as_query(&self) -> &'static str {
        match self {
            HistoryRange::OneMonth => "1mo",
            HistoryRange::SixMonths => "6mo",
            HistoryRange::OneYear => "1y",
            HistoryRange::FiveYears => "5y",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HistoryRange::OneMonth => "1M",
            HistoryRange::SixMonths => "6M",
            HistoryRange::OneYear => "1Y",
            HistoryRange::FiveYears => "5Y",
        }
    }
}

impl fmt::Display for HistoryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Source of historical closing prices for charting
#[async_trait::async_trait]
pub trait PriceHistoryProvider: Send + Sync {
    /// Time-ordered closing prices for `ticker` over `range`
    async fn price_history(&self, ticker: &str, range: HistoryRange) -> Result<Vec<PricePoint>>;
}
