use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use api_client::{CandleRequest, MarketData, MarketDataCache, MarketDataProvider, StaticUniverse, UniverseSource};
use app_config::ScanSettings;
use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use core_types::{Error, Symbol, TrendLabel};
use scanner::{ScanError, ScanRequest, ScanService, Scanner};
use serde_json::{json, Value};
use tokio::sync::watch;

/// Serves generated candle rows per symbol and records every request.
#[derive(Default)]
struct FakeProvider {
    closes: HashMap<String, Vec<f64>>,
    failing: Vec<String>,
    cancel_on: Option<(String, watch::Sender<bool>)>,
    requests: Mutex<Vec<CandleRequest>>,
}

impl FakeProvider {
    fn with(mut self, symbol: &str, closes: Vec<f64>) -> Self {
        self.closes.insert(symbol.to_string(), closes);
        self
    }

    fn failing(mut self, symbol: &str) -> Self {
        self.failing.push(symbol.to_string());
        self
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl MarketDataProvider for FakeProvider {
    async fn fetch_candles(&self, request: &CandleRequest) -> core_types::Result<Value> {
        self.requests.lock().unwrap().push(request.clone());
        let symbol = request.symbol.as_str();

        if let Some((trigger, tx)) = &self.cancel_on {
            if trigger == symbol {
                tx.send_replace(true);
            }
        }
        if self.failing.iter().any(|s| s == symbol) {
            return Err(Error::UpstreamFetch("API error: code 404, msg: No data found".into()));
        }

        let closes = self.closes.get(symbol).cloned().unwrap_or_else(rising);
        Ok(rows(&closes))
    }
}

fn rows(closes: &[f64]) -> Value {
    let start = 1_709_000_000_000_i64;
    let rows: Vec<Value> = closes
        .iter()
        .enumerate()
        .map(|(i, close)| {
            json!({
                "time": start + i as i64 * 900_000,
                "open": close - 0.5,
                "high": close + 1.0,
                "low": close - 1.0,
                "close": close,
                "volume": 1000.0
            })
        })
        .collect();
    Value::Array(rows)
}

fn rising() -> Vec<f64> {
    (0..60).map(|i| 100.0 + i as f64).collect()
}

fn falling() -> Vec<f64> {
    (0..60).map(|i| 200.0 - i as f64).collect()
}

fn symbols(list: &[&str]) -> Vec<Symbol> {
    list.iter().map(|s| Symbol::from(*s)).collect()
}

fn scanner_for(provider: Arc<FakeProvider>) -> Scanner {
    let cache = Arc::new(MarketDataCache::new(64, None));
    Scanner::new(MarketData::new(provider, cache))
}

#[tokio::test]
async fn one_failing_symbol_does_not_abort_the_scan() {
    let provider = Arc::new(FakeProvider::default().failing("AAA"));
    let scanner = scanner_for(provider.clone());

    let report = scanner.scan(&symbols(&["AAA", "BBB"]), &ScanRequest::default(), None).await;

    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].symbol, Symbol::from("BBB"));
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].symbol, Symbol::from("AAA"));
    assert!(report.failures[0].reason.contains("No data found"));
    assert_eq!(report.summary.scanned, 1);
    assert_eq!(report.summary.failed, 1);
    assert!(!report.summary.cancelled);
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn empty_symbol_list_contacts_nothing() {
    let provider = Arc::new(FakeProvider::default());
    let scanner = scanner_for(provider.clone());

    let report = scanner.scan(&[], &ScanRequest::default(), None).await;

    assert!(report.results.is_empty());
    assert_eq!(report.summary.requested, 0);
    assert!(!report.summary.cancelled);
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn classifies_rising_and_falling_averages_in_input_order() {
    let provider = Arc::new(FakeProvider::default().with("UP", rising()).with("DOWN", falling()));
    let scanner = scanner_for(provider);

    let report = scanner.scan(&symbols(&["DOWN", "UP"]), &ScanRequest::default(), None).await;
    assert_eq!(report.results.len(), 2);

    let down = &report.results[0];
    assert_eq!(down.symbol, Symbol::from("DOWN"));
    assert_eq!(down.trend_label, TrendLabel::Bearish);
    // sma44 exists from index 43; the reference is index 58.
    assert_eq!(down.streak_length, 15);

    let up = &report.results[1];
    assert_eq!(up.trend_label, TrendLabel::Bullish);
    assert_eq!(up.streak_length, 15);
    assert_eq!(up.metrics.close, 158.0);
    let ma = up.metrics.moving_average.unwrap();
    assert!((ma - 136.5).abs() < 1e-9);
    // The average trails far below a steady climb, so nothing clears.
    assert!(!up.cleared);
}

#[tokio::test]
async fn window_follows_end_date_and_lookback() {
    let provider = Arc::new(FakeProvider::default());
    let scanner = scanner_for(provider.clone());
    let end = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap();

    let request = ScanRequest::default().with_end_date(Some(end));
    scanner.scan(&symbols(&["TCS"]), &request, None).await;

    let requests = provider.requests.lock().unwrap();
    assert_eq!(requests[0].end, Some(end));
    assert_eq!(requests[0].start, Some(end - Duration::days(6)));
    assert_eq!(requests[0].interval, "15m");
    assert_eq!(requests[0].days, 5);
}

#[tokio::test]
async fn cache_is_only_used_when_requested() {
    let end = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap();

    let provider = Arc::new(FakeProvider::default());
    let scanner = scanner_for(provider.clone());
    let mut request = ScanRequest::default().with_end_date(Some(end));
    request.settings.use_cached = true;
    scanner.scan(&symbols(&["TCS", "TCS"]), &request, None).await;
    assert_eq!(provider.calls(), 1);

    let provider = Arc::new(FakeProvider::default());
    let scanner = scanner_for(provider.clone());
    request.settings.use_cached = false;
    scanner.scan(&symbols(&["TCS", "TCS"]), &request, None).await;
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn price_cap_and_streak_filters_skip_symbols() {
    let provider = Arc::new(FakeProvider::default().with("CHEAP", falling()));
    let scanner = scanner_for(provider);

    let mut request = ScanRequest::default();
    request.settings.params.max_price = Some(150.0);
    let report = scanner.scan(&symbols(&["EXPENSIVE", "CHEAP"]), &request, None).await;
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].symbol, Symbol::from("CHEAP"));
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].symbol, Symbol::from("EXPENSIVE"));
    assert_eq!(report.summary.failed, 0);

    let mut request = ScanRequest::default();
    request.settings.params.min_streak = 20;
    let report = scanner.scan(&symbols(&["CHEAP"]), &request, None).await;
    assert!(report.results.is_empty());
    assert_eq!(report.summary.skipped, 1);

    let mut request = ScanRequest::default();
    request.settings.params.only_cleared = true;
    let report = scanner.scan(&symbols(&["CHEAP"]), &request, None).await;
    assert!(report.results.is_empty());
    assert_eq!(report.skipped[0].reason, "reference candle did not clear the trend");
}

#[tokio::test]
async fn short_histories_fail_per_symbol() {
    let provider = Arc::new(
        FakeProvider::default()
            .with("EMPTY", Vec::new())
            .with("SHORT", (0..10).map(|i| 100.0 + i as f64).collect()),
    );
    let scanner = scanner_for(provider);

    let report = scanner.scan(&symbols(&["EMPTY", "SHORT", "OK"]), &ScanRequest::default(), None).await;
    assert_eq!(report.summary.failed, 2);
    assert_eq!(report.summary.scanned, 1);
    assert!(report.failures[0].reason.contains("need at least 2"));
    assert!(report.failures[1].reason.contains("exceeds series length"));
}

#[tokio::test]
async fn oversized_skip_latest_fails_each_symbol() {
    let provider = Arc::new(FakeProvider::default());
    let scanner = scanner_for(provider.clone());

    let mut settings = ScanSettings::default();
    settings.params.skip_latest = usize::MAX;
    let request = ScanRequest::new(settings);

    let report = scanner.scan(&symbols(&["AAA", "BBB"]), &request, None).await;
    assert!(report.results.is_empty());
    assert_eq!(report.summary.failed, 2);
    assert!(!report.summary.cancelled);
    assert!(report.failures[0].reason.contains("60 candles"));
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn out_of_range_lookback_fails_each_symbol_without_fetching() {
    let provider = Arc::new(FakeProvider::default());
    let scanner = scanner_for(provider.clone());

    let request = ScanRequest::new(ScanSettings {
        lookback_days: u32::MAX,
        ..ScanSettings::default()
    });

    let report = scanner.scan(&symbols(&["AAA", "BBB"]), &request, None).await;
    assert!(report.results.is_empty());
    assert_eq!(report.summary.failed, 2);
    assert!(report.failures[1].reason.contains("out of range"));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn cancelling_before_the_scan_returns_an_empty_cancelled_report() {
    let provider = Arc::new(FakeProvider::default());
    let scanner = scanner_for(provider.clone());
    let (_tx, rx) = watch::channel(true);

    let report = scanner.scan(&symbols(&["AAA", "BBB"]), &ScanRequest::default(), Some(rx)).await;

    assert!(report.results.is_empty());
    assert!(report.summary.cancelled);
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn cancelling_mid_scan_keeps_finished_symbols() {
    let (tx, rx) = watch::channel(false);
    let provider = Arc::new(FakeProvider {
        cancel_on: Some(("BBB".to_string(), tx)),
        ..FakeProvider::default()
    });
    let scanner = scanner_for(provider.clone());

    let report = scanner.scan(&symbols(&["AAA", "BBB", "CCC"]), &ScanRequest::default(), Some(rx)).await;

    assert_eq!(report.results.len(), 2);
    assert!(report.summary.cancelled);
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn bounded_fan_out_preserves_order() {
    let provider = Arc::new(FakeProvider::default().failing("BBB").with("CCC", falling()));
    let scanner = scanner_for(provider);

    let mut request = ScanRequest::default();
    request.settings.concurrency = 3;
    let report = scanner.scan(&symbols(&["AAA", "BBB", "CCC", "DDD"]), &request, None).await;

    let scanned: Vec<&str> = report.results.iter().map(|r| r.symbol.as_str()).collect();
    assert_eq!(scanned, vec!["AAA", "CCC", "DDD"]);
    assert_eq!(report.failures[0].symbol, Symbol::from("BBB"));
}

struct FailingUniverse;

#[async_trait]
impl UniverseSource for FailingUniverse {
    async fn fetch_universe(&self) -> core_types::Result<Vec<Symbol>> {
        Err(Error::UpstreamFetch("connection refused".into()))
    }
}

#[tokio::test]
async fn service_falls_back_to_the_universe() {
    let provider = Arc::new(FakeProvider::default());
    let universe = Arc::new(StaticUniverse::new(["INFY", "TCS"]));
    let service = ScanService::new(scanner_for(provider.clone()), universe);

    let report = service.run(None, &ScanRequest::default(), None).await.unwrap();
    assert_eq!(report.summary.requested, 2);
    assert_eq!(report.results.len(), 2);

    let report = service.run(Some(Vec::new()), &ScanRequest::default(), None).await.unwrap();
    assert_eq!(report.summary.requested, 2);

    let report = service.run(Some(symbols(&["SBIN"])), &ScanRequest::default(), None).await.unwrap();
    assert_eq!(report.results[0].symbol, Symbol::from("SBIN"));
}

#[tokio::test]
async fn service_rejects_invalid_requests_before_fetching() {
    let provider = Arc::new(FakeProvider::default());
    let service = ScanService::new(scanner_for(provider.clone()), Arc::new(FailingUniverse));

    let request = ScanRequest::new(ScanSettings {
        interval: "7m".into(),
        ..ScanSettings::default()
    });
    let err = service.run(Some(symbols(&["TCS"])), &request, None).await.unwrap_err();
    assert!(matches!(err, ScanError::InvalidRequest(Error::Configuration(_))));

    let mut settings = ScanSettings::default();
    settings.params.skip_latest = usize::MAX;
    let err = service.run(Some(symbols(&["TCS"])), &ScanRequest::new(settings), None).await.unwrap_err();
    assert!(matches!(err, ScanError::InvalidRequest(Error::Configuration(_))));

    let request = ScanRequest::new(ScanSettings {
        lookback_days: u32::MAX,
        ..ScanSettings::default()
    });
    let err = service.run(Some(symbols(&["TCS"])), &request, None).await.unwrap_err();
    assert!(matches!(err, ScanError::InvalidRequest(Error::Configuration(_))));

    let err = service.run(None, &ScanRequest::default(), None).await.unwrap_err();
    assert!(matches!(err, ScanError::Universe(Error::UpstreamFetch(_))));
    assert_eq!(provider.calls(), 0);
}
