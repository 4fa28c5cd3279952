// In crates/analytics/src/types.rs

use core_types::{Error, PriceField, Result};
use serde::{Deserialize, Serialize};

/// Upper bound for [`TrendParams::skip_latest`].
pub const MAX_SKIP_LATEST: usize = 1_000;

/// Every tunable of the trend screen, with the defaults the scanner uses
/// when a request or config file leaves a value out.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct TrendParams {
    /// Length of the simple moving average.
    pub ma_window: usize,
    /// Candle field the moving average is computed on.
    pub source: PriceField,
    /// Indicator key the moving average is stored under.
    pub ma_key: String,
    /// Number of most recent candles treated as still forming. The streak
    /// reference index is `len - 1 - skip_latest`.
    pub skip_latest: usize,
    /// Minimum streak length for a symbol to be reported.
    pub min_streak: usize,
    /// Only report symbols whose reference candle cleared the trend.
    pub only_cleared: bool,
    /// Skip symbols whose latest high is above this price.
    pub max_price: Option<f64>,
    /// Slack allowed between the moving average and the candle range.
    pub placement_tolerance: f64,
    /// Body-to-range ratio under which a candle counts as a doji.
    pub doji_body_ratio: f64,
    /// Distance from the moving average, relative to it, accepted by the
    /// candle-conditions rule.
    pub conditions_tolerance: f64,
}

impl Default for TrendParams {
    fn default() -> Self {
        Self {
            ma_window: 44,
            source: PriceField::Close,
            ma_key: "sma44".to_string(),
            skip_latest: 1,
            min_streak: 0,
            only_cleared: false,
            max_price: None,
            placement_tolerance: 0.005,
            doji_body_ratio: 0.0025,
            conditions_tolerance: 0.01,
        }
    }
}

impl TrendParams {
    /// Rejects parameter combinations no scan could run with.
    pub fn validate(&self) -> Result<()> {
        if self.ma_window == 0 {
            return Err(Error::Configuration("ma_window must be greater than 0".into()));
        }
        if self.skip_latest > MAX_SKIP_LATEST {
            return Err(Error::Configuration(format!("skip_latest must be at most {MAX_SKIP_LATEST}")));
        }
        if self.ma_key.trim().is_empty() {
            return Err(Error::Configuration("ma_key must not be empty".into()));
        }
        for (name, value) in [
            ("placement_tolerance", self.placement_tolerance),
            ("doji_body_ratio", self.doji_body_ratio),
            ("conditions_tolerance", self.conditions_tolerance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Configuration(format!("{name} must be a non-negative number")));
            }
        }
        if let Some(max_price) = self.max_price {
            if !max_price.is_finite() || max_price <= 0.0 {
                return Err(Error::Configuration("max_price must be positive".into()));
            }
        }
        Ok(())
    }
}
