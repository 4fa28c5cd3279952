// In crates/scanner/src/scanner.rs

use analytics::{add_moving_average, count_streaks, moving_average_values, BreakoutValidator, Classification};
use api_client::{CandleRequest, MarketData};
use chrono::{DateTime, Duration, Utc};
use core_types::{Error, ScanMetrics, ScanResult, Symbol};
use futures::stream::{FuturesOrdered, StreamExt};
use tokio::sync::watch;

use crate::error::ScanError;
use crate::types::{ScanReport, ScanRequest, SkipReason, SymbolOutcome};

/// Runs the trend screen over a list of symbols.
///
/// Each symbol is fetched, enriched with its moving average, classified and
/// validated on its own. A symbol that fails is recorded and the scan moves
/// on to the next one.
#[derive(Clone)]
pub struct Scanner {
    market_data: MarketData,
}

impl Scanner {
    pub fn new(market_data: MarketData) -> Self {
        Self { market_data }
    }

    /// Scans `symbols` in order, at most `settings.concurrency` at a time.
    ///
    /// Once `cancel` reads `true` no further symbols are started; whatever is
    /// already in flight completes and the report is marked cancelled.
    pub async fn scan(
        &self,
        symbols: &[Symbol],
        request: &ScanRequest,
        cancel: Option<watch::Receiver<bool>>,
    ) -> ScanReport {
        let mut report = ScanReport::new(symbols.len());
        if symbols.is_empty() {
            return report;
        }

        let settings = &request.settings;
        let validator = BreakoutValidator::from_params(&settings.params, settings.check_v2, settings.check_v3);
        let end = request.end_date.unwrap_or_else(Utc::now);
        let start = match window_start(end, settings.lookback_days) {
            Ok(start) => start,
            Err(e) => {
                tracing::warn!(error = %e, "Cannot build the fetch window.");
                for symbol in symbols {
                    report.record(SymbolOutcome::Failed(ScanError::PerSymbol {
                        symbol: symbol.clone(),
                        source: e.clone(),
                    }));
                }
                return report;
            }
        };

        tracing::info!(
            symbols = symbols.len(),
            interval = %settings.interval,
            %start,
            %end,
            rules = ?validator.rule_names(),
            "Starting scan."
        );

        let concurrency = settings.concurrency.max(1);
        let mut remaining = symbols.iter();
        let mut in_flight = FuturesOrdered::new();
        let mut processed = 0;

        loop {
            while in_flight.len() < concurrency && !is_cancelled(cancel.as_ref()) {
                let Some(symbol) = remaining.next() else {
                    break;
                };
                in_flight.push_back(self.scan_symbol(symbol.clone(), request, &validator, start, end));
            }
            // Completes in push order, so the report keeps the input order.
            let Some(outcome) = in_flight.next().await else {
                break;
            };
            processed += 1;
            report.record(outcome);
        }
        report.summary.cancelled = processed < symbols.len();

        if report.summary.cancelled {
            tracing::warn!(processed, requested = symbols.len(), "Scan cancelled.");
        }
        tracing::info!(
            scanned = report.summary.scanned,
            skipped = report.summary.skipped,
            failed = report.summary.failed,
            "Scan finished."
        );
        report
    }

    async fn scan_symbol(
        &self,
        symbol: Symbol,
        request: &ScanRequest,
        validator: &BreakoutValidator,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> SymbolOutcome {
        match self.evaluate(&symbol, request, validator, start, end).await {
            Ok(outcome) => outcome,
            Err(source) => {
                tracing::warn!(symbol = %symbol, error = %source, "Failed to scan symbol.");
                SymbolOutcome::Failed(ScanError::PerSymbol { symbol, source })
            }
        }
    }

    async fn evaluate(
        &self,
        symbol: &Symbol,
        request: &ScanRequest,
        validator: &BreakoutValidator,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> core_types::Result<SymbolOutcome> {
        let settings = &request.settings;
        let params = &settings.params;

        let candle_request = CandleRequest::new(symbol.clone(), settings.days, settings.interval.clone())
            .with_range(Some(start), Some(end));
        let series = self.market_data.candles(&candle_request, settings.use_cached).await?;

        if series.len() <= params.skip_latest {
            return Err(Error::DataFormat(format!(
                "{} candles, need at least {}",
                series.len(),
                params.skip_latest.saturating_add(1)
            )));
        }

        if let (Some(cap), Some(latest)) = (params.max_price, series.last()) {
            if latest.high > cap {
                tracing::debug!(symbol = %symbol, high = latest.high, cap, "Skipping symbol above price cap.");
                return Ok(SymbolOutcome::Skipped {
                    symbol: symbol.clone(),
                    reason: SkipReason::AbovePriceCap { high: latest.high, cap },
                });
            }
        }

        let series = add_moving_average(&series, params.source, params.ma_window, &params.ma_key)?;

        // The newest `skip_latest` candles are still forming.
        let reference = series.len() - 1 - params.skip_latest;
        let averages = moving_average_values(&series, &params.ma_key);
        let classification = Classification::from(count_streaks(&averages, reference));

        if classification.streak_length < params.min_streak {
            return Ok(SymbolOutcome::Skipped {
                symbol: symbol.clone(),
                reason: SkipReason::StreakTooShort {
                    length: classification.streak_length,
                    min: params.min_streak,
                },
            });
        }

        let cleared = validator.check(classification.label, &series, reference);
        if params.only_cleared && !cleared {
            return Ok(SymbolOutcome::Skipped {
                symbol: symbol.clone(),
                reason: SkipReason::NotCleared,
            });
        }

        tracing::debug!(
            symbol = %symbol,
            label = %classification.label,
            streak = classification.streak_length,
            cleared,
            "Symbol classified."
        );

        Ok(SymbolOutcome::Scanned(ScanResult {
            symbol: symbol.clone(),
            trend_label: classification.label,
            streak_length: classification.streak_length,
            cleared,
            metrics: ScanMetrics::from_candle(&series[reference], &params.ma_key),
        }))
    }
}

/// Start of the fetched window, `lookback_days` before `end`.
fn window_start(end: DateTime<Utc>, lookback_days: u32) -> core_types::Result<DateTime<Utc>> {
    Duration::try_days(i64::from(lookback_days))
        .and_then(|lookback| end.checked_sub_signed(lookback))
        .ok_or_else(|| Error::Configuration(format!("lookback of {lookback_days} days is out of range")))
}

fn is_cancelled(cancel: Option<&watch::Receiver<bool>>) -> bool {
    cancel.is_some_and(|rx| *rx.borrow())
}
