// In crates/core-types/src/types.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A tradable instrument identifier (e.g., "RELIANCE").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(pub String);

impl Symbol {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Symbol(value.to_string())
    }
}

impl From<String> for Symbol {
    fn from(value: String) -> Self {
        Symbol(value)
    }
}

/// One OHLCV observation for a fixed time bucket.
///
/// Indicator values computed on top of a series (moving averages) live in
/// `indicators`, keyed by name. The map is flattened when serialized, so a
/// candle with an `sma44` entry renders as `{"time": .., "close": .., "sma44": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// The open time of the bucket.
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
    #[serde(flatten)]
    pub indicators: BTreeMap<String, f64>,
}

impl Candle {
    pub fn new(time: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
            volume,
            indicators: BTreeMap::new(),
        }
    }

    /// Returns the raw value of the requested price field.
    pub fn field(&self, field: PriceField) -> f64 {
        match field {
            PriceField::Open => self.open,
            PriceField::High => self.high,
            PriceField::Low => self.low,
            PriceField::Close => self.close,
            PriceField::Volume => self.volume,
        }
    }

    /// Looks up a previously computed indicator value.
    pub fn indicator(&self, key: &str) -> Option<f64> {
        self.indicators.get(key).copied()
    }

    /// The midpoint of the candle's range, `(high + low) / 2`.
    pub fn mid_price(&self) -> f64 {
        (self.high + self.low) / 2.0
    }
}

/// An ordered candle sequence, ascending by time with unique timestamps.
pub type CandleSeries = Vec<Candle>;

/// Selects which candle field a moving average is computed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceField {
    Open,
    High,
    Low,
    #[default]
    Close,
    Volume,
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PriceField::Open => "open",
            PriceField::High => "high",
            PriceField::Low => "low",
            PriceField::Close => "close",
            PriceField::Volume => "volume",
        };
        f.pad(name)
    }
}

impl FromStr for PriceField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "open" => Ok(PriceField::Open),
            "high" => Ok(PriceField::High),
            "low" => Ok(PriceField::Low),
            "close" => Ok(PriceField::Close),
            "volume" => Ok(PriceField::Volume),
            other => Err(Error::Configuration(format!("unknown price field '{other}'"))),
        }
    }
}

/// The direction of a single moving-average streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrendDirection {
    Rising,
    Falling,
    #[default]
    None,
}

/// A single `(direction, length)` streak ending at a reference point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrendStreak {
    pub direction: TrendDirection,
    pub length: usize,
}

/// Rising and falling run lengths, counted independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreakCounts {
    pub rising: usize,
    pub falling: usize,
}

/// The label a symbol's moving-average trend is classified as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrendLabel {
    Bullish,
    Bearish,
}

impl fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendLabel::Bullish => f.pad("BULLISH"),
            TrendLabel::Bearish => f.pad("BEARISH"),
        }
    }
}

/// Price snapshot of the reference candle a scan result was computed at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanMetrics {
    pub high: f64,
    pub low: f64,
    pub open: f64,
    pub close: f64,
    pub moving_average: Option<f64>,
    pub time: DateTime<Utc>,
}

impl ScanMetrics {
    pub fn from_candle(candle: &Candle, ma_key: &str) -> Self {
        Self {
            high: candle.high,
            low: candle.low,
            open: candle.open,
            close: candle.close,
            moving_average: candle.indicator(ma_key),
            time: candle.time,
        }
    }
}

/// The outcome of successfully scanning one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub symbol: Symbol,
    pub trend_label: TrendLabel,
    pub streak_length: usize,
    pub cleared: bool,
    pub metrics: ScanMetrics,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn candle_serializes_indicators_flat() {
        let mut candle = Candle::new(Utc.timestamp_opt(1_700_000_000, 0).unwrap(), 10.0, 12.0, 9.0, 11.0, 500.0);
        candle.indicators.insert("sma44".to_string(), 10.5);

        let json = serde_json::to_value(&candle).unwrap();
        assert_eq!(json["sma44"], 10.5);
        assert_eq!(json["close"], 11.0);

        let back: Candle = serde_json::from_value(json).unwrap();
        assert_eq!(back.indicator("sma44"), Some(10.5));
    }

    #[test]
    fn price_field_parses_case_insensitively() {
        assert_eq!("Close".parse::<PriceField>().unwrap(), PriceField::Close);
        assert_eq!("volume".parse::<PriceField>().unwrap(), PriceField::Volume);
        assert!(matches!("vwap".parse::<PriceField>(), Err(Error::Configuration(_))));
    }

    #[test]
    fn trend_label_uses_uppercase_names() {
        assert_eq!(serde_json::to_string(&TrendLabel::Bullish).unwrap(), "\"BULLISH\"");
        assert_eq!(TrendLabel::Bearish.to_string(), "BEARISH");
    }
}
