// In crates/web-server/src/types.rs

use analytics::TrendParams;
use app_config::ScanSettings;
use chrono::{DateTime, Utc};
use core_types::{PriceField, ScanResult};
use scanner::{ScanReport, ScanSummary, SymbolIssue};
use serde::{Deserialize, Serialize};

/// Query parameters of `GET /api/candles`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandleQuery {
    pub symbol: Option<String>,
    // `serde(default = ...)` provides a default value if the param is missing.
    #[serde(default = "default_days")]
    pub days: u32,
    #[serde(default = "default_interval")]
    pub interval: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(default = "default_window")]
    pub window: usize,
    #[serde(default)]
    pub source: PriceField,
    /// Defaults to `sma{window}`.
    pub key: Option<String>,
}

/// Body of `POST /api/scan`. Anything left out falls back to the server's
/// configured scan defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanInvocation {
    pub stock_list: Option<Vec<String>>,
    pub end_date_new: Option<String>,
    pub interval: Option<String>,
    pub check_v2: Option<bool>,
    pub check_v3: Option<bool>,
    pub use_cached: Option<bool>,
    pub params: Option<TrendParams>,
    pub options: ScanOptions,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanOptions {
    pub concurrency: Option<usize>,
    pub days: Option<u32>,
    pub lookback_days: Option<u32>,
}

impl ScanInvocation {
    /// Overlays the invocation on top of `defaults`.
    pub fn settings(&self, defaults: &ScanSettings) -> ScanSettings {
        let mut settings = defaults.clone();
        if let Some(interval) = &self.interval {
            settings.interval = interval.clone();
        }
        if let Some(check_v2) = self.check_v2 {
            settings.check_v2 = check_v2;
        }
        if let Some(check_v3) = self.check_v3 {
            settings.check_v3 = check_v3;
        }
        if let Some(use_cached) = self.use_cached {
            settings.use_cached = use_cached;
        }
        if let Some(params) = &self.params {
            settings.params = params.clone();
        }
        if let Some(concurrency) = self.options.concurrency {
            settings.concurrency = concurrency;
        }
        if let Some(days) = self.options.days {
            settings.days = days;
        }
        if let Some(lookback_days) = self.options.lookback_days {
            settings.lookback_days = lookback_days;
        }
        settings
    }
}

/// Response of `POST /api/scan`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    pub success: bool,
    pub data: Vec<ScanResult>,
    pub failures: Vec<SymbolIssue>,
    pub skipped: Vec<SymbolIssue>,
    pub summary: ScanSummary,
    pub timestamp: DateTime<Utc>,
    pub input_params: ScanInvocation,
}

impl ScanResponse {
    pub fn new(report: ScanReport, input_params: ScanInvocation) -> Self {
        Self {
            success: true,
            data: report.results,
            failures: report.failures,
            skipped: report.skipped,
            summary: report.summary,
            timestamp: Utc::now(),
            input_params,
        }
    }
}

// Helper functions for serde defaults.
fn default_days() -> u32 { 70 }
fn default_interval() -> String { "1d".to_string() }
fn default_window() -> usize { 44 }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invocation_overrides_only_what_it_sets() {
        let invocation: ScanInvocation = serde_json::from_str(
            r#"{"stockList":["TCS"],"checkV2":true,"useCached":true,"options":{"concurrency":4},"unknown":1}"#,
        )
        .unwrap();

        let settings = invocation.settings(&ScanSettings::default());
        assert!(settings.check_v2);
        assert!(settings.check_v3);
        assert!(settings.use_cached);
        assert_eq!(settings.concurrency, 4);
        assert_eq!(settings.interval, "15m");
        assert_eq!(invocation.stock_list, Some(vec!["TCS".to_string()]));
    }

    #[test]
    fn partial_params_fill_from_defaults() {
        let invocation: ScanInvocation =
            serde_json::from_str(r#"{"params":{"ma_window":20,"ma_key":"sma20"}}"#).unwrap();
        let settings = invocation.settings(&ScanSettings::default());
        assert_eq!(settings.params.ma_window, 20);
        assert_eq!(settings.params.skip_latest, 1);
    }
}
