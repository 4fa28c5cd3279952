// In crates/analytics/src/breakout.rs

use core_types::{Candle, TrendLabel};

use crate::types::TrendParams;

/// A single test of whether a candle's price action confirms a trend.
///
/// Rules receive the candle and the moving-average value computed at that
/// candle. They never see candles without an average.
pub trait BreakoutRule {
    /// The name of the rule, used in logs.
    fn name(&self) -> &'static str;

    fn confirms_upward(&self, candle: &Candle, ma: f64) -> bool;

    fn confirms_downward(&self, candle: &Candle, ma: f64) -> bool;
}

/// Close above the midpoint of the range.
pub fn is_bullish_candle(candle: &Candle) -> bool {
    candle.close > candle.mid_price()
}

/// Close below the midpoint of the range.
pub fn is_bearish_candle(candle: &Candle) -> bool {
    candle.close < candle.mid_price()
}

/// Body smaller than `body_ratio` of the full high-low range.
pub fn is_doji_candle(candle: &Candle, body_ratio: f64) -> bool {
    let range = candle.high - candle.low;
    let body = (candle.open - candle.close).abs();
    body < body_ratio * range
}

/// The moving average sits inside the candle (with a little slack on the
/// side the trend comes from) and the candle closes in the trend's
/// direction or is indecisive.
#[derive(Debug, Clone)]
pub struct PlacementRule {
    pub placement_tolerance: f64,
    pub doji_body_ratio: f64,
}

impl BreakoutRule for PlacementRule {
    fn name(&self) -> &'static str {
        "placement"
    }

    fn confirms_upward(&self, candle: &Candle, ma: f64) -> bool {
        let placed = ma <= candle.high && ma >= candle.low * (1.0 - self.placement_tolerance);
        placed && (is_bullish_candle(candle) || is_doji_candle(candle, self.doji_body_ratio))
    }

    fn confirms_downward(&self, candle: &Candle, ma: f64) -> bool {
        let placed = ma <= candle.high * (1.0 + self.placement_tolerance) && ma >= candle.low;
        placed && (is_bearish_candle(candle) || is_doji_candle(candle, self.doji_body_ratio))
    }
}

/// The candle has a modest body in the trend's direction (or closes on the
/// trend's side of its midpoint) and touches the moving average.
#[derive(Debug, Clone)]
pub struct ConditionsRule {
    pub tolerance: f64,
}

/// Bodies larger than this fraction of the open are not treated as a
/// measured move.
const MAX_BODY_FRACTION: f64 = 0.05;

impl BreakoutRule for ConditionsRule {
    fn name(&self) -> &'static str {
        "conditions"
    }

    fn confirms_upward(&self, candle: &Candle, ma: f64) -> bool {
        let body = (candle.close - candle.open).abs() / candle.open;
        let measured_rise = candle.close > candle.open && body < MAX_BODY_FRACTION;
        let touches = (ma - candle.low).abs() < ma * self.tolerance || (ma > candle.low && ma < candle.high);
        (measured_rise || is_bullish_candle(candle)) && touches
    }

    fn confirms_downward(&self, candle: &Candle, ma: f64) -> bool {
        let body = (candle.close - candle.open).abs() / candle.open;
        let measured_drop = candle.close < candle.open && body < MAX_BODY_FRACTION;
        let touches = (ma - candle.high).abs() < ma * self.tolerance || (ma < candle.high && ma > candle.low);
        (measured_drop || is_bearish_candle(candle)) && touches
    }
}

/// Checks whether the candle at an index clears the classified trend.
///
/// Every configured rule has to agree. A validator without rules never
/// clears anything.
pub struct BreakoutValidator {
    ma_key: String,
    rules: Vec<Box<dyn BreakoutRule + Send + Sync>>,
}

impl BreakoutValidator {
    pub fn new(ma_key: impl Into<String>, rules: Vec<Box<dyn BreakoutRule + Send + Sync>>) -> Self {
        Self {
            ma_key: ma_key.into(),
            rules,
        }
    }

    /// Builds the validator for a scan from its algorithm flags.
    ///
    /// `check_v3` selects [`PlacementRule`], `check_v2` selects
    /// [`ConditionsRule`].
    pub fn from_params(params: &TrendParams, check_v2: bool, check_v3: bool) -> Self {
        let mut rules: Vec<Box<dyn BreakoutRule + Send + Sync>> = Vec::new();
        if check_v3 {
            rules.push(Box::new(PlacementRule {
                placement_tolerance: params.placement_tolerance,
                doji_body_ratio: params.doji_body_ratio,
            }));
        }
        if check_v2 {
            rules.push(Box::new(ConditionsRule {
                tolerance: params.conditions_tolerance,
            }));
        }
        Self::new(params.ma_key.clone(), rules)
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    pub fn check_upward_trend(&self, series: &[Candle], index: usize) -> bool {
        self.evaluate(series, index, |rule, candle, ma| rule.confirms_upward(candle, ma))
    }

    pub fn check_downward_trend(&self, series: &[Candle], index: usize) -> bool {
        self.evaluate(series, index, |rule, candle, ma| rule.confirms_downward(candle, ma))
    }

    /// Runs the check matching `label`.
    pub fn check(&self, label: TrendLabel, series: &[Candle], index: usize) -> bool {
        match label {
            TrendLabel::Bullish => self.check_upward_trend(series, index),
            TrendLabel::Bearish => self.check_downward_trend(series, index),
        }
    }

    fn evaluate<F>(&self, series: &[Candle], index: usize, confirms: F) -> bool
    where
        F: Fn(&dyn BreakoutRule, &Candle, f64) -> bool,
    {
        if self.rules.is_empty() {
            return false;
        }
        let Some(candle) = series.get(index) else {
            return false;
        };
        // No average yet means not enough history behind this candle.
        let Some(ma) = candle.indicator(&self.ma_key) else {
            return false;
        };
        self.rules.iter().all(|rule| confirms(&**rule, candle, ma))
    }
}
