// In crates/analytics/src/lib.rs

//! The technical-analysis core: moving averages, trend streaks, trend
//! classification and breakout validation over candle series.

pub mod breakout;
pub mod classifier;
pub mod moving_average;
pub mod streak;
pub mod types;

pub use breakout::{BreakoutRule, BreakoutValidator, ConditionsRule, PlacementRule};
pub use classifier::{classify, Classification};
pub use moving_average::{add_moving_average, moving_average_values};
pub use streak::{count_streaks, unified_streak};
pub use types::{TrendParams, MAX_SKIP_LATEST};
