// In crates/analytics/src/classifier.rs

use core_types::{StreakCounts, TrendLabel};
use serde::Serialize;

/// A trend label together with the streak length that backs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub label: TrendLabel,
    pub streak_length: usize,
}

/// Reduces the two streak counts to a single label.
///
/// `Bullish` only when the rising run is strictly longer; equal counts,
/// including `0 == 0`, resolve to `Bearish`.
pub fn classify(rising: usize, falling: usize) -> Classification {
    let label = if rising > falling {
        TrendLabel::Bullish
    } else {
        TrendLabel::Bearish
    };
    Classification {
        label,
        streak_length: rising.max(falling),
    }
}

impl From<StreakCounts> for Classification {
    fn from(counts: StreakCounts) -> Self {
        classify(counts.rising, counts.falling)
    }
}
