use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::data::ReloadPolicy;

/// One row of the fundamentals dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    #[serde(rename = "Ticker")]
    pub ticker: String,
    #[serde(rename = "Company Name")]
    pub company_name: String,
    #[serde(rename = "Price", default, deserialize_with = "csv::invalid_option")]
    pub price: Option<f64>,
    #[serde(rename = "YTarget", default, deserialize_with = "csv::invalid_option")]
    pub y_target: Option<f64>,
    #[serde(rename = "PE Ratio TTM", default, deserialize_with = "csv::invalid_option")]
    pub pe_ratio_ttm: Option<f64>,
    #[serde(rename = "PE Forward", default, deserialize_with = "csv::invalid_option")]
    pub pe_forward: Option<f64>,
    #[serde(rename = "ROE", default, deserialize_with = "csv::invalid_option")]
    pub roe: Option<f64>,
    #[serde(rename = "ROA", default, deserialize_with = "csv::invalid_option")]
    pub roa: Option<f64>,
    #[serde(rename = "Dividend Paid", default, deserialize_with = "csv::invalid_option")]
    pub dividend_paid: Option<f64>,

    // Precomputed upstream, never derived here
    #[serde(rename = "PE_Score")]
    pub pe_score: f64,
    #[serde(rename = "ROE_Score")]
    pub roe_score: f64,
    #[serde(rename = "ROA_Score")]
    pub roa_score: f64,
    #[serde(rename = "Dividend_Score")]
    pub dividend_score: f64,

    /// Raw cells of the input row, so exports keep every source column
    #[serde(skip)]
    pub source_row: Option<csv::StringRecord>,
}

/// A record augmented with its weighted score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub record: StockRecord,
    pub score: f64,
}

impl ScoredRecord {
    pub fn ticker(&self) -> &str {
        &self.record.ticker
    }
}

/// Scoring weights for the four sub-scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightVector {
    pub pe: f64,
    pub roe: f64,
    pub roa: f64,
    pub dividend: f64,
}

impl WeightVector {
    pub fn new(pe: f64, roe: f64, roa: f64, dividend: f64) -> Self {
        Self { pe, roe, roa, dividend }
    }

    pub fn sum(&self) -> f64 {
        self.pe + self.roe + self.roa + self.dividend
    }

    /// Whole-number percentages, as shown in the summary line
    pub fn as_percentages(&self) -> [i64; 4] {
        [self.pe, self.roe, self.roa, self.dividend].map(|w| (w * 100.0).round() as i64)
    }
}

impl Default for WeightVector {
    fn default() -> Self {
        Self {
            pe: 0.35,
            roe: 0.35,
            roa: 0.15,
            dividend: 0.15,
        }
    }
}

/// Post-scoring threshold predicates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub min_score: f64,
    pub max_pe: f64,
    pub min_roe: f64,
}

impl FilterCriteria {
    pub fn new(min_score: f64, max_pe: f64, min_roe: f64) -> Self {
        Self { min_score, max_pe, min_roe }
    }

    /// Criteria that let every fully-populated record through
    pub fn unrestricted() -> Self {
        Self {
            min_score: f64::NEG_INFINITY,
            max_pe: f64::INFINITY,
            min_roe: f64::NEG_INFINITY,
        }
    }
}

/// Result of the investment-return calculator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvestmentReturn {
    pub shares: f64,
    pub expected_value: f64,
    pub gain: f64,
    pub gain_pct: f64,
}

/// Display currency. Amounts are labelled only, never converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Currency {
    #[default]
    Usd,
    Sar,
}

impl Currency {
    pub const ALL: [Currency; 2] = [Currency::Usd, Currency::Sar];

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Sar => "SAR",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Currency::Usd => Currency::Sar,
            Currency::Sar => Currency::Usd,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "SAR" => Ok(Currency::Sar),
            other => Err(format!("unsupported currency '{}', expected USD or SAR", other)),
        }
    }
}

/// One closing price in a historical series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
}

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    pub data_path: PathBuf,
    pub reload_policy: ReloadPolicy,
    pub market_data_base_url: String,
    pub request_timeout_secs: u64,
    pub top_n: usize,
    pub export_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("financial_data_35_35_15_15_all_final.csv"),
            reload_policy: ReloadPolicy::Never,
            market_data_base_url: "https://query1.finance.yahoo.com".to_string(),
            request_timeout_secs: 30,
            top_n: 10,
            export_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let defaults = Config::default();

        let reload_policy = match std::env::var("SCREENER_RELOAD_POLICY") {
            Ok(value) => value
                .parse()
                .map_err(|e: String| anyhow::anyhow!("SCREENER_RELOAD_POLICY: {}", e))?,
            Err(_) => defaults.reload_policy,
        };

        Ok(Config {
            data_path: std::env::var("SCREENER_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_path),
            reload_policy,
            market_data_base_url: std::env::var("MARKET_DATA_BASE_URL")
                .unwrap_or(defaults.market_data_base_url),
            request_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.request_timeout_secs),
            top_n: std::env::var("SCREENER_TOP_N")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.top_n),
            export_dir: std::env::var("SCREENER_EXPORT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.export_dir),
        })
    }
}
