// In crates/app-config/src/types.rs

use analytics::TrendParams;
use core_types::Error as CoreError;
use serde::{Deserialize, Serialize};

/// Candle intervals the upstream chart endpoint understands.
pub const SUPPORTED_INTERVALS: &[&str] = &[
    "1m", "2m", "5m", "15m", "30m", "60m", "90m", "1h", "1d", "5d", "1wk", "1mo", "3mo",
];

/// Rejects intervals the upstream supplier does not serve.
pub fn validate_interval(interval: &str) -> core_types::Result<()> {
    if SUPPORTED_INTERVALS.contains(&interval) {
        Ok(())
    } else {
        Err(CoreError::Configuration(format!(
            "unsupported interval '{}', expected one of {}",
            interval,
            SUPPORTED_INTERVALS.join(", ")
        )))
    }
}

/// Minute and hour intervals, as opposed to daily and longer.
pub fn is_intraday(interval: &str) -> bool {
    (interval.ends_with('m') && !interval.ends_with("mo")) || interval.ends_with('h')
}

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    /// The application's general settings.
    pub app: AppSettings,
    /// Settings for the upstream market-data supplier.
    pub market_data: MarketDataSettings,
    pub server: ServerSettings,
    /// Defaults applied to every scan invocation.
    #[serde(default)]
    pub scan: ScanSettings,
    /// Where the default symbol list comes from.
    #[serde(default)]
    pub universe: UniverseSettings,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppSettings {
    /// The environment the application is running in (e.g., "development", "production").
    pub environment: String,
    /// The default log level for the application.
    pub log_level: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone)]
pub struct MarketDataSettings {
    /// Base URL of the chart API (e.g., "https://query1.finance.yahoo.com").
    pub base_url: String,
    /// Appended to every symbol before it is sent upstream (e.g., ".NS").
    #[serde(default)]
    pub symbol_suffix: String,
    /// Endpoint returning `[{"symbol": ..}]` for the default universe.
    #[serde(default)]
    pub universe_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Maximum number of series kept by the market-data cache.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    /// Entries older than this are refetched. `0` keeps entries until evicted.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct UniverseSettings {
    /// Symbols listed inline in the config file.
    #[serde(default)]
    pub symbols: Vec<String>,
    /// A TOML file with a top-level `symbols = [..]` array.
    #[serde(default)]
    pub file: Option<String>,
}

/// Every option a scan invocation recognizes, with its default.
/// Upper bound for [`ScanSettings::lookback_days`], about a century.
pub const MAX_LOOKBACK_DAYS: u32 = 36_500;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ScanSettings {
    /// Candle interval requested from the supplier.
    pub interval: String,
    /// The `days` hint forwarded to the supplier.
    pub days: u32,
    /// Length of the fetched window, ending at the scan's end date.
    pub lookback_days: u32,
    /// Validate breakouts with the candle-conditions rule.
    pub check_v2: bool,
    /// Validate breakouts with the placement rule.
    pub check_v3: bool,
    /// Serve candles from the market-data cache when possible.
    pub use_cached: bool,
    /// How many symbols may be fetched at once.
    pub concurrency: usize,
    pub params: TrendParams,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            interval: "15m".to_string(),
            days: 5,
            lookback_days: 6,
            check_v2: false,
            check_v3: true,
            use_cached: false,
            concurrency: 1,
            params: TrendParams::default(),
        }
    }
}

impl ScanSettings {
    /// Checks the settings once, before any symbol is fetched.
    pub fn validate(&self) -> core_types::Result<()> {
        validate_interval(&self.interval)?;
        if self.days == 0 {
            return Err(CoreError::Configuration("days must be greater than 0".into()));
        }
        if self.lookback_days == 0 || self.lookback_days > MAX_LOOKBACK_DAYS {
            return Err(CoreError::Configuration(format!(
                "lookback_days must be between 1 and {MAX_LOOKBACK_DAYS}"
            )));
        }
        if self.concurrency == 0 {
            return Err(CoreError::Configuration("concurrency must be greater than 0".into()));
        }
        self.params.validate()
    }
}

/// Helper functions for serde defaults
fn default_timeout_secs() -> u64 { 10 }
fn default_cache_capacity() -> usize { 512 }
fn default_cache_ttl_secs() -> u64 { 900 }
