// In crates/analytics/src/streak.rs

use core_types::{StreakCounts, TrendDirection, TrendStreak};

/// Counts the rising and falling runs of a moving-average sequence that end
/// at `reference`, walking backward.
///
/// Each comparison looks at `ma[i]` against `ma[i - 1]` for
/// `i = reference, reference - 1, .., 1`. A step is rising when
/// `ma[i] > ma[i - 1]` and falling otherwise. The two counts are computed
/// independently: `rising` is the length of the run of rising steps ending
/// at `reference`, `falling` the length of the run of falling steps. A
/// missing value on either side of a comparison ends both runs.
///
/// Both counts are zero when `reference < 1`, `reference` is past the end of
/// the sequence, or the first comparison touches a missing value.
pub fn count_streaks(ma: &[Option<f64>], reference: usize) -> StreakCounts {
    StreakCounts {
        rising: run_length(ma, reference, |current, previous| current > previous),
        falling: run_length(ma, reference, |current, previous| !(current > previous)),
    }
}

fn run_length(ma: &[Option<f64>], reference: usize, agrees: impl Fn(f64, f64) -> bool) -> usize {
    if reference < 1 || reference >= ma.len() {
        return 0;
    }

    let mut length = 0;
    for i in (1..=reference).rev() {
        let (Some(current), Some(previous)) = (ma[i], ma[i - 1]) else {
            break;
        };
        if !agrees(current, previous) {
            break;
        }
        length += 1;
    }
    length
}

/// Single-streak variant: the first comparison sets the direction and the
/// run extends while later comparisons agree with it.
///
/// Produces one `(direction, length)` pair instead of two independent
/// counts. The scanner classifies on [`count_streaks`]; this variant is for
/// callers that only want the most recent run.
pub fn unified_streak(ma: &[Option<f64>], reference: usize) -> TrendStreak {
    let mut streak = TrendStreak::default();
    if reference < 1 || reference >= ma.len() {
        return streak;
    }

    for i in (1..=reference).rev() {
        let (Some(current), Some(previous)) = (ma[i], ma[i - 1]) else {
            break;
        };
        let direction = if current > previous {
            TrendDirection::Rising
        } else {
            TrendDirection::Falling
        };

        if streak.length == 0 {
            streak.direction = direction;
            streak.length = 1;
        } else if direction == streak.direction {
            streak.length += 1;
        } else {
            break;
        }
    }
    streak
}
