// In crates/api-client/src/normalize.rs

use chrono::{DateTime, Utc};
use core_types::{Candle, CandleSeries, Error, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::types::{ChartEnvelope, RawCandleRow, RawTime};

/// Turns a raw supplier payload into an ordered candle series.
///
/// Accepts either the chart envelope returned by the chart endpoint or a
/// flat array of candle rows. Rows missing any of open/high/low/close are
/// dropped and a missing volume becomes `0.0`. The result is sorted by time
/// and a repeated timestamp keeps its last row.
pub fn normalize(raw: &Value) -> Result<CandleSeries> {
    let candles = match raw {
        Value::Object(map) if map.contains_key("chart") => from_chart(raw)?,
        Value::Array(_) => from_rows(raw)?,
        _ => return Err(Error::DataFormat("unrecognized candle payload".into())),
    };
    Ok(order_and_dedup(candles))
}

fn from_chart(raw: &Value) -> Result<Vec<Candle>> {
    let envelope = ChartEnvelope::deserialize(raw)
        .map_err(|e| Error::DataFormat(format!("malformed chart payload: {e}")))?;

    if let Some(error) = envelope.chart.error {
        return Err(Error::DataFormat(format!("{}: {}", error.code, error.description)));
    }

    let result = envelope
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| Error::DataFormat("chart payload has no result".into()))?;

    // The supplier leaves out timestamps entirely when the range is empty.
    let Some(timestamps) = result.timestamp else {
        return Ok(Vec::new());
    };

    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| Error::DataFormat("chart payload has no quote".into()))?;

    let mut candles = Vec::with_capacity(timestamps.len());
    for (i, secs) in timestamps.into_iter().enumerate() {
        let time = DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| Error::DataFormat(format!("timestamp {secs} out of range")))?;
        if let Some(candle) = build_candle(
            time,
            at(&quote.open, i),
            at(&quote.high, i),
            at(&quote.low, i),
            at(&quote.close, i),
            at(&quote.volume, i),
        ) {
            candles.push(candle);
        }
    }
    Ok(candles)
}

/// Columns can be shorter than the timestamp list; a missing slot reads as null.
fn at(values: &[Option<f64>], i: usize) -> Option<f64> {
    values.get(i).copied().flatten()
}

fn from_rows(raw: &Value) -> Result<Vec<Candle>> {
    let rows = Vec::<RawCandleRow>::deserialize(raw)
        .map_err(|e| Error::DataFormat(format!("malformed candle rows: {e}")))?;

    let mut candles = Vec::with_capacity(rows.len());
    for row in rows {
        let time = parse_time(&row.time)?;
        if let Some(candle) = build_candle(time, row.open, row.high, row.low, row.close, row.volume) {
            candles.push(candle);
        }
    }
    Ok(candles)
}

fn parse_time(time: &RawTime) -> Result<DateTime<Utc>> {
    match time {
        RawTime::Millis(ms) => DateTime::from_timestamp_millis(*ms)
            .ok_or_else(|| Error::DataFormat(format!("timestamp {ms} out of range"))),
        RawTime::Text(text) => DateTime::parse_from_rfc3339(text)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| Error::DataFormat(format!("invalid time '{text}': {e}"))),
    }
}

fn build_candle(
    time: DateTime<Utc>,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    volume: Option<f64>,
) -> Option<Candle> {
    let finite = |v: Option<f64>| v.filter(|x| x.is_finite());
    let volume = finite(volume).unwrap_or(0.0);
    Some(Candle::new(time, finite(open)?, finite(high)?, finite(low)?, finite(close)?, volume))
}

fn order_and_dedup(mut candles: Vec<Candle>) -> CandleSeries {
    // Stable, so equal timestamps stay in arrival order.
    candles.sort_by_key(|c| c.time);

    let mut series: CandleSeries = Vec::with_capacity(candles.len());
    for candle in candles {
        match series.last_mut() {
            Some(last) if last.time == candle.time => *last = candle,
            _ => series.push(candle),
        }
    }
    series
}
