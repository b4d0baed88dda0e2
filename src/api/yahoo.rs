// ============================================================================
// API client : Yahoo Finance chart endpoint
// ============================================================================
// Fetches full available daily history for one ticker. The JSON mirror
// structs match the provider response so serde can deserialize directly.
//
// An unknown or delisted symbol yields an EMPTY series, not an error:
// every downstream metric and chart degrades to a "no data" state.
// Network and HTTP failures are real errors the caller surfaces as a
// retryable state.
// ============================================================================

use anyhow::{Context, Result};
use chrono::DateTime;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::models::{Bar, PriceSeries};

/// Request timeout; a silent provider must not hang the dashboard run.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct YahooResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    #[allow(dead_code)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<u64>>>,
}

/// Builds the shared HTTP client: browser User-Agent (Yahoo rejects the
/// default one) and a request timeout.
pub fn build_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
        .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .context("Failed to build HTTP client")
}

/// Fetches the full daily history for `symbol`, earliest available date up
/// to the present.
#[instrument(skip(client))]
pub async fn fetch_price_series(client: &reqwest::Client, symbol: &str) -> Result<PriceSeries> {
    let url = build_chart_url(symbol);
    debug!(url = %url, "Requesting daily history");

    let response = client
        .get(&url)
        .send()
        .await
        .with_context(|| format!("Request to Yahoo Finance failed for {}", symbol))?;

    let status = response.status();
    debug!(status = %status, "Received HTTP response");

    // Yahoo answers 404 for unknown symbols; treat that as "no rows", the
    // same degraded state as an empty result body.
    if status == reqwest::StatusCode::NOT_FOUND {
        info!(ticker = %symbol, "Symbol unknown to provider, returning empty series");
        return Ok(PriceSeries::new(symbol.to_string()));
    }
    if !status.is_success() {
        anyhow::bail!("Yahoo Finance returned HTTP {} for {}", status, symbol);
    }

    let payload: YahooResponse = response
        .json()
        .await
        .context("Failed to parse Yahoo Finance JSON response")?;

    let series = parse_chart_response(payload, symbol);
    info!(ticker = %symbol, bars = series.len(), "Fetched ticker history");
    Ok(series)
}

/// Daily interval over the provider's maximum range.
fn build_chart_url(symbol: &str) -> String {
    format!(
        "https://query1.finance.yahoo.com/v8/finance/chart/{}?interval=1d&range=max",
        symbol
    )
}

/// Converts the provider payload into a PriceSeries. Rows with missing
/// fields are skipped; a missing result block means an empty series.
fn parse_chart_response(payload: YahooResponse, symbol: &str) -> PriceSeries {
    let Some(result) = payload
        .chart
        .result
        .and_then(|results| results.into_iter().next())
    else {
        debug!(ticker = %symbol, "Provider returned no result block");
        return PriceSeries::new(symbol.to_string());
    };

    let timestamps = result.timestamp.unwrap_or_default();
    let Some(quote) = result.indicators.quote.into_iter().next() else {
        return PriceSeries::new(symbol.to_string());
    };

    let opens = quote.open.unwrap_or_default();
    let highs = quote.high.unwrap_or_default();
    let lows = quote.low.unwrap_or_default();
    let closes = quote.close.unwrap_or_default();
    let volumes = quote.volume.unwrap_or_default();

    let mut bars = Vec::with_capacity(timestamps.len());
    let mut skipped = 0usize;
    for (i, &ts) in timestamps.iter().enumerate() {
        let row = (
            opens.get(i).copied().flatten(),
            highs.get(i).copied().flatten(),
            lows.get(i).copied().flatten(),
            closes.get(i).copied().flatten(),
            DateTime::from_timestamp(ts, 0),
        );
        let (Some(open), Some(high), Some(low), Some(close), Some(datetime)) = row else {
            skipped += 1;
            continue;
        };
        let volume = volumes.get(i).copied().flatten().unwrap_or(0);
        bars.push(Bar::new(
            datetime.date_naive(),
            open,
            high,
            low,
            close,
            volume,
        ));
    }

    if skipped > 0 {
        warn!(ticker = %symbol, skipped, total = timestamps.len(), "Skipped rows with missing fields");
    }

    PriceSeries::from_bars(symbol.to_string(), bars)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_chart_url() {
        let url = build_chart_url("AAPL");
        assert!(url.contains("AAPL"));
        assert!(url.contains("interval=1d"));
        assert!(url.contains("range=max"));
    }

    #[test]
    fn test_parse_response_with_rows() {
        let raw = r#"{
            "chart": {
                "result": [{
                    "timestamp": [1704153600, 1704240000],
                    "indicators": {
                        "quote": [{
                            "open": [100.0, 102.0],
                            "high": [105.0, 106.0],
                            "low": [99.0, 101.0],
                            "close": [102.0, 104.0],
                            "volume": [1000, 2000]
                        }]
                    }
                }],
                "error": null
            }
        }"#;
        let payload: YahooResponse = serde_json::from_str(raw).unwrap();
        let series = parse_chart_response(payload, "AAPL");

        assert_eq!(series.len(), 2);
        assert_eq!(series.last().unwrap().close, 104.0);
    }

    #[test]
    fn test_parse_response_skips_partial_rows() {
        let raw = r#"{
            "chart": {
                "result": [{
                    "timestamp": [1704153600, 1704240000],
                    "indicators": {
                        "quote": [{
                            "open": [100.0, null],
                            "high": [105.0, 106.0],
                            "low": [99.0, 101.0],
                            "close": [102.0, 104.0],
                            "volume": [1000, 2000]
                        }]
                    }
                }],
                "error": null
            }
        }"#;
        let payload: YahooResponse = serde_json::from_str(raw).unwrap();
        let series = parse_chart_response(payload, "AAPL");
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn test_parse_response_without_result_is_empty_series() {
        let raw = r#"{
            "chart": {
                "result": null,
                "error": {"code": "Not Found", "description": "No data found"}
            }
        }"#;
        let payload: YahooResponse = serde_json::from_str(raw).unwrap();
        let series = parse_chart_response(payload, "NOPE");

        assert!(series.is_empty());
        assert_eq!(series.symbol, "NOPE");
    }
}
