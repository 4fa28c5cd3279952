// In crates/api-client/src/types.rs

use chrono::{DateTime, Utc};
use core_types::Symbol;
use reqwest::Client;
use serde::Deserialize;

/// The client for the chart API that supplies candles and the default
/// universe.
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// The persistent HTTP client.
    pub http_client: Client,
    /// The base URL of the chart API.
    pub base_url: String,
    /// Appended to every symbol before it goes upstream (e.g., ".NS").
    pub symbol_suffix: String,
    /// Endpoint listing the default universe, if one is configured.
    pub universe_url: Option<String>,
}

/// What to fetch for one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct CandleRequest {
    pub symbol: Symbol,
    /// Size of the window in days, used when no explicit range is given.
    pub days: u32,
    /// Candle interval (e.g., "15m", "1d").
    pub interval: String,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl CandleRequest {
    pub fn new(symbol: impl Into<Symbol>, days: u32, interval: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            days,
            interval: interval.into(),
            start: None,
            end: None,
        }
    }

    /// Restricts the request to an explicit `[start, end]` range.
    pub fn with_range(mut self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        self.start = start;
        self.end = end;
        self
    }
}

/// Top level of the chart endpoint's response.
#[derive(Debug, Deserialize)]
pub struct ChartEnvelope {
    pub chart: Chart,
}

#[derive(Debug, Deserialize)]
pub struct Chart {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<ChartError>,
}

/// The error object the chart API returns instead of a result,
/// e.g. `{"code": "Not Found", "description": "No data found, symbol may be delisted"}`.
#[derive(Debug, Deserialize)]
pub struct ChartError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct ChartResult {
    /// Bucket open times in unix seconds. Absent when the range holds no data.
    #[serde(default)]
    pub timestamp: Option<Vec<i64>>,
    pub indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
pub struct ChartIndicators {
    #[serde(default)]
    pub quote: Vec<ChartQuote>,
}

/// Column-oriented OHLCV values, aligned with `ChartResult::timestamp`.
/// Buckets without trades come back as `null`.
#[derive(Debug, Deserialize)]
pub struct ChartQuote {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<f64>>,
}

/// One row of a pre-normalized candle array.
#[derive(Debug, Deserialize)]
pub struct RawCandleRow {
    pub time: RawTime,
    #[serde(default)]
    pub open: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub low: Option<f64>,
    #[serde(default)]
    pub close: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
}

/// A row timestamp, either unix milliseconds or an RFC 3339 string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawTime {
    Millis(i64),
    Text(String),
}

/// One entry of the universe endpoint's `[{"symbol": ..}]` body.
#[derive(Debug, Deserialize, Clone)]
pub struct UniverseEntry {
    pub symbol: String,
}
