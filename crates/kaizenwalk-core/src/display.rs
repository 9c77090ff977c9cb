//! Presentation helpers shared by front-ends.
//!
//! A [`Frame`] is everything a display needs to render one tick: clock text,
//! status line, set line, interval progress and button state. Front-ends
//! (CLI today) stay dumb and just print fields.

use serde::{Deserialize, Serialize};

use crate::schedule::{self, Phase};
use crate::timer::TimerSnapshot;

/// `M:SS` with unpadded minutes, e.g. `30:00`, `2:05`, `0:09`.
pub fn format_clock(total_secs: u64) -> String {
    let minutes = total_secs / 60;
    let seconds = total_secs % 60;
    format!("{}:{:02}", minutes, seconds)
}

/// Label on the single start/stop control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ButtonState {
    Start,
    Stop,
    Loading,
    Error,
}

impl ButtonState {
    pub fn label(self) -> &'static str {
        match self {
            ButtonState::Start => "START",
            ButtonState::Stop => "STOP",
            ButtonState::Loading => "LOADING…",
            ButtonState::Error => "ERROR",
        }
    }
}

/// One render-ready view of the timer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    /// Remaining workout time as `M:SS`.
    pub clock: String,
    /// "Ready to start", "Fast Walk", "Slow Walk" or "Complete!".
    pub status: String,
    /// "Set N/5 • M sets remaining", empty when idle or complete.
    pub set_line: String,
    /// Fraction of the current interval consumed, in [0, 1).
    pub interval_progress: f64,
    pub button: ButtonState,
}

impl Frame {
    /// Frame for a snapshot. Completed snapshots pin the clock to 0:00
    /// regardless of how far past the end the last tick landed.
    pub fn from_snapshot(snapshot: &TimerSnapshot) -> Self {
        if snapshot.is_completed {
            return Frame {
                clock: format_clock(0),
                status: "Complete!".to_string(),
                set_line: String::new(),
                interval_progress: 0.0,
                button: ButtonState::Start,
            };
        }
        if !snapshot.is_running {
            return Frame {
                clock: format_clock(schedule::TOTAL_DURATION_SECS),
                status: "Ready to start".to_string(),
                set_line: String::new(),
                interval_progress: 0.0,
                button: ButtonState::Start,
            };
        }

        let interval = schedule::current_interval(snapshot.elapsed_secs);
        let status = match schedule::phase_of(interval) {
            Phase::Fast => "Fast Walk",
            Phase::Slow => "Slow Walk",
        };
        Frame {
            clock: format_clock(schedule::time_remaining(snapshot.elapsed_secs)),
            status: status.to_string(),
            set_line: schedule::set_info(interval).display_text(),
            interval_progress: schedule::interval_progress(snapshot.elapsed_secs),
            button: ButtonState::Stop,
        }
    }

    /// Frame shown when start() aborts: idle layout with the error button.
    pub fn error_state(detail: &str) -> Self {
        Frame {
            clock: format_clock(schedule::TOTAL_DURATION_SECS),
            status: format!("Error: {}", detail),
            set_line: String::new(),
            interval_progress: 0.0,
            button: ButtonState::Error,
        }
    }
}

/// Where rendered frames go. The engine pushes one frame per tick.
pub trait DisplaySink: Send {
    fn present(&mut self, frame: &Frame);
}

/// Discards frames. Used when no display is wired up.
#[derive(Debug, Default)]
pub struct NullSink;

impl DisplaySink for NullSink {
    fn present(&mut self, _frame: &Frame) {}
}
