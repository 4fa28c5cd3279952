// In crates/scanner/src/types.rs

use std::fmt;

use app_config::ScanSettings;
use chrono::{DateTime, NaiveDate, Utc};
use core_types::{Error, ScanResult, Symbol};
use serde::Serialize;

use crate::error::ScanError;

/// Everything a scan needs besides the symbol list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanRequest {
    /// End of the fetched window. Defaults to the time the scan starts.
    pub end_date: Option<DateTime<Utc>>,
    pub settings: ScanSettings,
}

impl ScanRequest {
    pub fn new(settings: ScanSettings) -> Self {
        Self {
            end_date: None,
            settings,
        }
    }

    pub fn with_end_date(mut self, end_date: Option<DateTime<Utc>>) -> Self {
        self.end_date = end_date;
        self
    }
}

/// Parses a date given either as RFC 3339 or as a plain `YYYY-MM-DD`
/// date, which is read as midnight UTC.
pub fn parse_date(value: &str) -> core_types::Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(value) {
        return Ok(t.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc())
        .ok_or_else(|| Error::Configuration(format!("invalid date '{value}'")))
}

/// Why a symbol was left out of the results without failing.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    AbovePriceCap { high: f64, cap: f64 },
    StreakTooShort { length: usize, min: usize },
    NotCleared,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AbovePriceCap { high, cap } => write!(f, "latest high {high} is above the price cap {cap}"),
            SkipReason::StreakTooShort { length, min } => write!(f, "streak of {length} is shorter than {min}"),
            SkipReason::NotCleared => f.write_str("reference candle did not clear the trend"),
        }
    }
}

/// What happened to one symbol of a scan.
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolOutcome {
    Scanned(ScanResult),
    Skipped { symbol: Symbol, reason: SkipReason },
    Failed(ScanError),
}

/// A symbol together with why it is not among the results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolIssue {
    pub symbol: Symbol,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummary {
    pub requested: usize,
    pub scanned: usize,
    pub failed: usize,
    pub skipped: usize,
    /// The scan stopped before every requested symbol was started.
    pub cancelled: bool,
}

/// The accumulated outcome of a scan, in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanReport {
    pub results: Vec<ScanResult>,
    pub failures: Vec<SymbolIssue>,
    pub skipped: Vec<SymbolIssue>,
    pub summary: ScanSummary,
}

impl ScanReport {
    pub fn new(requested: usize) -> Self {
        Self {
            summary: ScanSummary {
                requested,
                ..ScanSummary::default()
            },
            ..Self::default()
        }
    }

    pub fn record(&mut self, outcome: SymbolOutcome) {
        match outcome {
            SymbolOutcome::Scanned(result) => {
                self.summary.scanned += 1;
                self.results.push(result);
            }
            SymbolOutcome::Skipped { symbol, reason } => {
                self.summary.skipped += 1;
                self.skipped.push(SymbolIssue {
                    symbol,
                    reason: reason.to_string(),
                });
            }
            SymbolOutcome::Failed(error) => {
                self.summary.failed += 1;
                let (symbol, reason) = match error {
                    ScanError::PerSymbol { symbol, source } => (symbol, source.to_string()),
                    other => (Symbol(String::new()), other.to_string()),
                };
                self.failures.push(SymbolIssue { symbol, reason });
            }
        }
    }
}
