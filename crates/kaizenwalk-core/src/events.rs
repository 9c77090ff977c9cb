use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schedule::Phase;
use crate::timer::TimerSnapshot;

/// Every state change in the engine produces an Event.
/// The CLI prints them; other front-ends may subscribe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    WorkoutStarted {
        start_time_ms: i64,
        at: DateTime<Utc>,
    },
    IntervalChanged {
        interval: u32,
        phase: Phase,
        set_number: u32,
        at: DateTime<Utc>,
    },
    WorkoutStopped {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    WorkoutCompleted {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerSnapshot,
        at: DateTime<Utc>,
    },
}
