// In crates/analytics/src/moving_average.rs

use core_types::{Candle, CandleSeries, Error, PriceField, Result};
use ta::indicators::SimpleMovingAverage as Sma;
use ta::Next;

/// Returns a copy of `series` with a simple moving average of `source`
/// stored under `output_key`.
///
/// Candles before index `window - 1` do not have a full window behind them;
/// the key is left absent on those rather than stored as a partial mean.
/// All OHLCV fields are carried over untouched.
///
/// # Errors
///
/// `Error::Configuration` if `window` is zero or longer than the series.
pub fn add_moving_average(
    series: &[Candle],
    source: PriceField,
    window: usize,
    output_key: &str,
) -> Result<CandleSeries> {
    if window == 0 {
        return Err(Error::Configuration("moving average window must be greater than 0".into()));
    }
    if window > series.len() {
        return Err(Error::Configuration(format!(
            "moving average window {} exceeds series length {}",
            window,
            series.len()
        )));
    }

    let mut sma = Sma::new(window).map_err(|e| Error::Configuration(format!("{e:?}")))?;

    let enriched = series
        .iter()
        .enumerate()
        .map(|(i, candle)| {
            let average = sma.next(candle.field(source));
            let mut candle = candle.clone();
            if i + 1 >= window {
                candle.indicators.insert(output_key.to_string(), average);
            } else {
                candle.indicators.remove(output_key);
            }
            candle
        })
        .collect();

    Ok(enriched)
}

/// Extracts the per-candle values of an indicator, `None` where absent.
pub fn moving_average_values(series: &[Candle], key: &str) -> Vec<Option<f64>> {
    series.iter().map(|candle| candle.indicator(key)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn series(closes: &[f64]) -> CandleSeries {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let time = Utc.timestamp_opt(1_700_000_000 + i as i64 * 900, 0).unwrap();
                Candle::new(time, c, c + 1.0, c - 1.0, c, 100.0 + i as f64)
            })
            .collect()
    }

    fn naive_mean(values: &[f64]) -> f64 {
        values.iter().sum::<f64>() / values.len() as f64
    }

    #[test]
    fn matches_arithmetic_mean_for_every_window() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + ((i * 7) % 13) as f64 * 1.37).collect();
        let input = series(&closes);

        for window in 1..=closes.len() {
            let out = add_moving_average(&input, PriceField::Close, window, "sma").unwrap();
            for (i, candle) in out.iter().enumerate() {
                if i + 1 < window {
                    assert_eq!(candle.indicator("sma"), None, "window {window} index {i}");
                } else {
                    let expected = naive_mean(&closes[i + 1 - window..=i]);
                    let actual = candle.indicator("sma").unwrap();
                    assert!((actual - expected).abs() < 1e-9, "window {window} index {i}: {actual} vs {expected}");
                }
            }
        }
    }

    #[test]
    fn leaves_ohlcv_untouched() {
        let input = series(&[10.0, 11.0, 12.0, 13.0]);
        let out = add_moving_average(&input, PriceField::Close, 2, "sma2").unwrap();

        for (before, after) in input.iter().zip(&out) {
            assert_eq!(before.time, after.time);
            assert_eq!(before.open, after.open);
            assert_eq!(before.high, after.high);
            assert_eq!(before.low, after.low);
            assert_eq!(before.close, after.close);
            assert_eq!(before.volume, after.volume);
        }
        assert!(input.iter().all(|c| c.indicators.is_empty()));
    }

    #[test]
    fn averages_the_requested_source_field() {
        let input = series(&[10.0, 20.0, 30.0]);
        let out = add_moving_average(&input, PriceField::High, 3, "hma").unwrap();
        assert_eq!(out[2].indicator("hma"), Some(21.0));

        let out = add_moving_average(&input, PriceField::Volume, 2, "vma").unwrap();
        assert_eq!(out[1].indicator("vma"), Some(100.5));
    }

    #[test]
    fn rejects_invalid_windows() {
        let input = series(&[1.0, 2.0, 3.0]);
        assert!(matches!(
            add_moving_average(&input, PriceField::Close, 0, "sma"),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            add_moving_average(&input, PriceField::Close, 4, "sma"),
            Err(Error::Configuration(_))
        ));
        assert!(add_moving_average(&[], PriceField::Close, 1, "sma").is_err());
    }

    #[test]
    fn extracts_values_with_gaps() {
        let input = series(&[1.0, 2.0, 3.0, 4.0]);
        let out = add_moving_average(&input, PriceField::Close, 3, "sma3").unwrap();
        assert_eq!(moving_average_values(&out, "sma3"), vec![None, None, Some(2.0), Some(3.0)]);
        assert_eq!(moving_average_values(&out, "missing"), vec![None; 4]);
    }
}
