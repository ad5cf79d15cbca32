use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Result, ScreenerError};
use crate::models::{Config, PricePoint};
use super::{HistoryRange, PriceHistoryProvider};

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    // Non-trading days come back as null
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Client for the Yahoo Finance chart endpoint
pub struct YahooChartClient {
    client: Client,
    base_url: Url,
}

impl YahooChartClient {
    /// Create a new client against `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("stock-screener/1.0")
            .build()?;

        let base_url = Url::parse(base_url)
            .map_err(|e| ScreenerError::MarketData(format!("invalid base URL {}: {}", base_url, e)))?;

        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.market_data_base_url,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn chart_url(&self, ticker: &str, range: HistoryRange) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ScreenerError::MarketData(format!("base URL cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", ticker]);
        url.query_pairs_mut()
            .append_pair("range", range.as_query())
            .append_pair("interval", "1d");
        Ok(url)
    }
}

fn parse_chart(ticker: &str, response: ChartResponse) -> Result<Vec<PricePoint>> {
    if let Some(error) = response.chart.error {
        return Err(ScreenerError::MarketData(format!(
            "{} for {}: {}",
            error.code, ticker, error.description
        )));
    }

    let result = response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| ScreenerError::MarketData(format!("no price history for {}", ticker)))?;

    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();

    if closes.len() != result.timestamp.len() {
        warn!(
            "Chart for {} has {} timestamps but {} closes",
            ticker,
            result.timestamp.len(),
            closes.len()
        );
    }

    let mut points: Vec<PricePoint> = result
        .timestamp
        .iter()
        .zip(closes)
        .filter_map(|(ts, close)| {
            let close = close?;
            let timestamp = DateTime::<Utc>::from_timestamp(*ts, 0)?;
            Some(PricePoint { timestamp, close })
        })
        .collect();

    if points.is_empty() {
        return Err(ScreenerError::MarketData(format!("no price history for {}", ticker)));
    }

    points.sort_by_key(|p| p.timestamp);
    Ok(points)
}

#[async_trait::async_trait]
impl PriceHistoryProvider for YahooChartClient {
    async fn price_history(&self, ticker: &str, range: HistoryRange) -> Result<Vec<PricePoint>> {
        let url = self.chart_url(ticker, range)?;
        debug!("Making request to: {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ScreenerError::MarketData(format!(
                "request for {} failed with status {}: {}",
                ticker, status, body
            )));
        }

        let chart: ChartResponse = response.json().await?;
        let points = parse_chart(ticker, chart)?;
        debug!("Retrieved {} price points for {} ({})", points.len(), ticker, range);
        Ok(points)
    }
}
