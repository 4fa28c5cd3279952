// In crates/api-client/src/lib.rs

use std::time::Duration;

use app_config::MarketDataSettings;
use async_trait::async_trait;
use core_types::Symbol;
use serde_json::Value;

pub mod cache;
pub mod error;
pub mod market_data;
pub mod normalize;
pub mod provider;
pub mod types;

// Re-export public types
pub use cache::{CacheKey, MarketDataCache};
pub use error::{Error, Result};
pub use market_data::MarketData;
pub use normalize::normalize;
pub use provider::{MarketDataProvider, StaticUniverse, UniverseSource};
pub use types::*;

impl ApiClient {
    /// Constructs a new ApiClient from MarketDataSettings.
    pub fn new(settings: &MarketDataSettings) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::ClientBuildError(e.to_string()))?;

        Ok(ApiClient {
            http_client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            symbol_suffix: settings.symbol_suffix.clone(),
            universe_url: settings.universe_url.clone(),
        })
    }

    /// The chart URL for a symbol, with the exchange suffix applied.
    pub fn chart_url(&self, symbol: &Symbol) -> String {
        format!("{}/v8/finance/chart/{}{}", self.base_url, symbol, self.symbol_suffix)
    }

    /// Query parameters for a chart request.
    ///
    /// An explicit range needs both bounds and is sent as `period1`/`period2`
    /// in unix seconds. Otherwise the window is `range={days}d` ending now.
    pub fn chart_query(request: &CandleRequest) -> Vec<(&'static str, String)> {
        let mut query = vec![("interval", request.interval.clone())];
        match (request.start, request.end) {
            (Some(start), Some(end)) => {
                query.push(("period1", start.timestamp().to_string()));
                query.push(("period2", end.timestamp().to_string()));
            }
            _ => query.push(("range", format!("{}d", request.days))),
        }
        query
    }

    /// Fetches the raw chart payload for a request.
    ///
    /// This corresponds to the `GET /v8/finance/chart/{symbol}` endpoint.
    pub async fn get_chart(&self, request: &CandleRequest) -> Result<Value> {
        let url = self.chart_url(&request.symbol);
        tracing::debug!(url = %url, interval = %request.interval, "Requesting chart");

        let response = self
            .http_client
            .get(&url)
            .query(&Self::chart_query(request))
            .send()
            .await
            .map_err(Error::RequestFailed)?;

        let status = response.status();
        let text = response.text().await.map_err(Error::RequestFailed)?;

        if !status.is_success() {
            return Err(Error::ApiError {
                code: i64::from(status.as_u16()),
                msg: error_message(&text),
            });
        }

        let value: Value = serde_json::from_str(&text).map_err(Error::DeserializationFailed)?;
        Ok(value)
    }

    /// Fetches the default universe from `universe_url`.
    pub async fn get_universe(&self, url: &str) -> Result<Vec<Symbol>> {
        let response = self.http_client.get(url).send().await.map_err(Error::RequestFailed)?;

        let status = response.status();
        let text = response.text().await.map_err(Error::RequestFailed)?;
        if !status.is_success() {
            return Err(Error::ApiError {
                code: i64::from(status.as_u16()),
                msg: error_message(&text),
            });
        }

        let entries: Vec<UniverseEntry> = serde_json::from_str(&text).map_err(Error::DeserializationFailed)?;
        Ok(entries.into_iter().map(|e| Symbol(e.symbol)).collect())
    }
}

/// Pulls the description out of a chart error body, falling back to the
/// raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.pointer("/chart/error/description").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.chars().take(200).collect())
}

#[async_trait]
impl MarketDataProvider for ApiClient {
    async fn fetch_candles(&self, request: &CandleRequest) -> core_types::Result<Value> {
        Ok(self.get_chart(request).await?)
    }
}

#[async_trait]
impl UniverseSource for ApiClient {
    async fn fetch_universe(&self) -> core_types::Result<Vec<Symbol>> {
        let Some(url) = &self.universe_url else {
            return Err(core_types::Error::Configuration("market_data.universe_url is not set".into()));
        };
        Ok(self.get_universe(url).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn settings() -> MarketDataSettings {
        MarketDataSettings {
            base_url: "https://charts.example.com/".into(),
            symbol_suffix: ".NS".into(),
            universe_url: None,
            request_timeout_secs: 5,
            cache_capacity: 16,
            cache_ttl_secs: 0,
        }
    }

    #[test]
    fn chart_url_appends_suffix() {
        let client = ApiClient::new(&settings()).unwrap();
        assert_eq!(
            client.chart_url(&Symbol::from("RELIANCE")),
            "https://charts.example.com/v8/finance/chart/RELIANCE.NS"
        );
    }

    #[test]
    fn explicit_range_uses_periods() {
        let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let end = Utc.timestamp_opt(1_700_518_400, 0).unwrap();
        let request = CandleRequest::new("TCS", 5, "15m").with_range(Some(start), Some(end));

        let query = ApiClient::chart_query(&request);
        assert_eq!(
            query,
            vec![
                ("interval", "15m".to_string()),
                ("period1", "1700000000".to_string()),
                ("period2", "1700518400".to_string()),
            ]
        );
    }

    #[test]
    fn open_range_falls_back_to_days() {
        let end = Utc.timestamp_opt(1_700_518_400, 0).unwrap();
        let request = CandleRequest::new("TCS", 70, "1d").with_range(None, Some(end));
        assert_eq!(
            ApiClient::chart_query(&request),
            vec![("interval", "1d".to_string()), ("range", "70d".to_string())]
        );
    }

    #[test]
    fn error_message_prefers_chart_description() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found"}}}"#;
        assert_eq!(error_message(body), "No data found");
        assert_eq!(error_message("Too Many Requests"), "Too Many Requests");
    }

    #[tokio::test]
    async fn universe_without_url_is_a_configuration_error() {
        let client = ApiClient::new(&settings()).unwrap();
        assert!(matches!(client.fetch_universe().await, Err(core_types::Error::Configuration(_))));
    }
}
