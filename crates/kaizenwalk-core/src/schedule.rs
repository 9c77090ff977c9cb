//! Workout schedule math.
//!
//! The workout is fixed: 30 minutes split into ten 3-minute intervals,
//! alternating fast/slow starting fast, grouped into five sets of one fast
//! plus one slow interval. Everything here is a pure function of elapsed
//! seconds; state lives in the timer engine.

use serde::{Deserialize, Serialize};

/// Total workout length in seconds (30 minutes).
pub const TOTAL_DURATION_SECS: u64 = 1800;
/// Length of one fast or slow interval in seconds (3 minutes).
pub const INTERVAL_DURATION_SECS: u64 = 180;
/// Number of intervals in a workout.
pub const TOTAL_INTERVALS: u32 = 10;
/// Number of fast+slow sets in a workout.
pub const TOTAL_SETS: u32 = 5;

/// The two alternating walk phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Fast,
    Slow,
}

impl Phase {
    pub fn is_fast(self) -> bool {
        self == Phase::Fast
    }

    /// Status line shown while this phase is active.
    pub fn status_text(self) -> &'static str {
        match self {
            Phase::Fast => "Fast Walk",
            Phase::Slow => "Slow Walk",
        }
    }
}

/// Interval index for the given elapsed time.
///
/// Unbounded: callers decide whether the index is still inside the workout
/// via [`within_workout`].
pub fn current_interval(elapsed_secs: u64) -> u32 {
    (elapsed_secs / INTERVAL_DURATION_SECS) as u32
}

/// Fast on even interval indices, slow on odd.
pub fn is_fast_interval(interval: u32) -> bool {
    interval % 2 == 0
}

/// Phase of the given interval index.
pub fn phase_of(interval: u32) -> Phase {
    if is_fast_interval(interval) {
        Phase::Fast
    } else {
        Phase::Slow
    }
}

/// Whether the interval index lies inside the ten-interval workout.
pub fn within_workout(interval: u32) -> bool {
    interval < TOTAL_INTERVALS
}

/// Set position for an interval index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetInfo {
    /// 1-based set number.
    pub set_number: u32,
    /// Sets left after the current one.
    pub sets_remaining: u32,
}

impl SetInfo {
    /// `Set N/5 • M sets remaining`, singular "set" when one remains.
    pub fn display_text(&self) -> String {
        let noun = if self.sets_remaining == 1 { "set" } else { "sets" };
        format!(
            "Set {}/{} • {} {} remaining",
            self.set_number, TOTAL_SETS, self.sets_remaining, noun
        )
    }
}

/// Set info for the given interval index.
pub fn set_info(interval: u32) -> SetInfo {
    let set_number = interval / 2 + 1;
    SetInfo {
        set_number,
        sets_remaining: TOTAL_SETS.saturating_sub(set_number),
    }
}

/// Seconds left in the whole workout, floored at zero.
pub fn time_remaining(elapsed_secs: u64) -> u64 {
    TOTAL_DURATION_SECS.saturating_sub(elapsed_secs)
}

/// Seconds spent inside the current interval.
pub fn time_in_interval(elapsed_secs: u64) -> u64 {
    elapsed_secs % INTERVAL_DURATION_SECS
}

/// Fraction of the current interval consumed, in [0, 1).
///
/// Drives the depleting radial indicator.
pub fn interval_progress(elapsed_secs: u64) -> f64 {
    time_in_interval(elapsed_secs) as f64 / INTERVAL_DURATION_SECS as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn interval_boundaries() {
        assert_eq!(current_interval(0), 0);
        assert_eq!(current_interval(179), 0);
        assert_eq!(current_interval(180), 1);
        assert_eq!(current_interval(1799), 9);
        assert_eq!(current_interval(1800), 10);
    }

    #[test]
    fn phases_alternate_starting_fast() {
        assert_eq!(phase_of(0), Phase::Fast);
        assert_eq!(phase_of(1), Phase::Slow);
        assert_eq!(phase_of(8), Phase::Fast);
        assert_eq!(phase_of(9), Phase::Slow);
    }

    #[test]
    fn set_numbers_span_one_to_five() {
        assert_eq!(set_info(0).set_number, 1);
        assert_eq!(set_info(1).set_number, 1);
        assert_eq!(set_info(2).set_number, 2);
        assert_eq!(set_info(9).set_number, 5);
        assert_eq!(set_info(9).sets_remaining, 0);
    }

    #[test]
    fn set_text_pluralizes() {
        assert_eq!(set_info(0).display_text(), "Set 1/5 • 4 sets remaining");
        assert_eq!(set_info(7).display_text(), "Set 4/5 • 1 set remaining");
        assert_eq!(set_info(9).display_text(), "Set 5/5 • 0 sets remaining");
    }

    #[test]
    fn remaining_time_is_zero_floored() {
        assert_eq!(time_remaining(0), 1800);
        assert_eq!(time_remaining(1800), 0);
        assert_eq!(time_remaining(1801), 0);
    }

    #[test]
    fn progress_stays_in_unit_range() {
        assert_eq!(interval_progress(0), 0.0);
        assert!(interval_progress(179) < 1.0);
        assert_eq!(interval_progress(180), 0.0);
        assert!((interval_progress(90) - 0.5).abs() < f64::EPSILON);
    }

    proptest! {
        #[test]
        fn interval_matches_floor_division(elapsed in 0u64..TOTAL_DURATION_SECS) {
            prop_assert_eq!(current_interval(elapsed) as u64, elapsed / 180);
            prop_assert!(within_workout(current_interval(elapsed)));
        }

        #[test]
        fn phase_alternates_with_index(interval in 0u32..TOTAL_INTERVALS) {
            prop_assert_eq!(is_fast_interval(interval), interval % 2 == 0);
        }

        #[test]
        fn sets_remaining_decreases_with_interval(a in 0u32..TOTAL_INTERVALS, b in 0u32..TOTAL_INTERVALS) {
            if a <= b {
                prop_assert!(set_info(a).sets_remaining >= set_info(b).sets_remaining);
            }
        }

        #[test]
        fn remaining_never_negative(elapsed in 0u64..10_000u64) {
            prop_assert!(time_remaining(elapsed) <= TOTAL_DURATION_SECS);
        }

        #[test]
        fn progress_in_unit_interval(elapsed in 0u64..TOTAL_DURATION_SECS) {
            let p = interval_progress(elapsed);
            prop_assert!((0.0..1.0).contains(&p));
        }
    }
}
