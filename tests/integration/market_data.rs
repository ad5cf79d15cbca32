//! Chart client against a mock HTTP server

use std::time::Duration;

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use serde_json::json;
use test_log::test;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stock_screener::api::{HistoryRange, PriceHistoryProvider, YahooChartClient};
use stock_screener::ScreenerError;

fn client(server: &MockServer) -> YahooChartClient {
    YahooChartClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
}

#[test(tokio::test)]
async fn test_fetches_closing_prices() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/AAPL"))
        .and(query_param("range", "1y"))
        .and(query_param("interval", "1d"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "chart": {
                "result": [{
                    "timestamp": [1704186000, 1704272400, 1704358800],
                    "indicators": { "quote": [{ "close": [185.64, null, 181.91] }] }
                }],
                "error": null
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let points = client(&server)
        .price_history("AAPL", HistoryRange::OneYear)
        .await
        .unwrap();

    let closes: Vec<f64> = points.iter().map(|p| p.close).collect();
    assert_eq!(closes, vec![185.64, 181.91]);
    assert!(points[0].timestamp < points[1].timestamp);
}

#[test(tokio::test)]
async fn test_not_found_is_market_data_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/NOPE"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "chart": {
                "result": null,
                "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" }
            }
        })))
        .mount(&server)
        .await;

    let result = client(&server).price_history("NOPE", HistoryRange::OneYear).await;
    assert_matches!(result, Err(ScreenerError::MarketData(ref message)) if message.contains("404"));
}

#[test(tokio::test)]
async fn test_error_payload_with_ok_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/2222.SR"))
        .and(query_param("range", "5y"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "chart": {
                "result": null,
                "error": { "code": "Bad Request", "description": "Invalid range" }
            }
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .price_history("2222.SR", HistoryRange::FiveYears)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Market data error: Bad Request for 2222.SR: Invalid range"
    );
}
