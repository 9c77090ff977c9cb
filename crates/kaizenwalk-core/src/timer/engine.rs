//! Timer engine implementation.
//!
//! The engine is a clock-derived state machine. It does not use internal
//! threads - the caller is responsible for calling `tick()` periodically.
//! Elapsed time is recomputed from the clock source on every tick, never
//! incremented, so throttled or missed ticks cannot skew the workout.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> (Completed | Idle)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::headless();
//! engine.start()?;
//! // In a loop, roughly once a second:
//! engine.tick(); // Returns Some(Event) on boundaries and completion
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::clock::{epoch_ms, ClockSource};
use super::wake::{WakeLockGuard, WakeLockProvider};
use crate::cue::{self, CuePlayer, Notification};
use crate::display::{DisplaySink, Frame};
use crate::error::EngineError;
use crate::events::Event;
use crate::schedule;
use crate::sync::{protocol, SyncPort};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    Idle,
    Running,
    /// Terminal until the next explicit `start()`.
    Completed,
}

/// Copyable mirror of engine state. Crosses the worker boundary in sync
/// messages and persists between CLI invocations within a session.
///
/// `last_interval` is `None` until the first boundary is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub is_running: bool,
    /// Epoch-ms anchor of the running session.
    #[serde(rename = "startTime")]
    pub start_time_ms: Option<i64>,
    #[serde(rename = "elapsedTime")]
    pub elapsed_secs: u64,
    pub last_interval: Option<u32>,
    pub is_completed: bool,
}

/// Core timer engine.
///
/// Owns the sole authoritative `TimerState`; the background worker holds a
/// mirrored copy, reconciled by message passing only.
pub struct TimerEngine {
    state: EngineState,
    start_time_ms: Option<i64>,
    elapsed_secs: u64,
    last_interval: Option<u32>,
    clock: Box<dyn ClockSource>,
    cues: Box<dyn CuePlayer>,
    wake: Box<dyn WakeLockProvider>,
    wake_guard: Option<Box<dyn WakeLockGuard>>,
    sync: Box<dyn SyncPort>,
    display: Box<dyn DisplaySink>,
}

impl TimerEngine {
    pub fn new(
        clock: Box<dyn ClockSource>,
        cues: Box<dyn CuePlayer>,
        wake: Box<dyn WakeLockProvider>,
        sync: Box<dyn SyncPort>,
        display: Box<dyn DisplaySink>,
    ) -> Self {
        Self {
            state: EngineState::Idle,
            start_time_ms: None,
            elapsed_secs: 0,
            last_interval: None,
            clock,
            cues,
            wake,
            wake_guard: None,
            sync,
            display,
        }
    }

    /// Engine with a wall clock and no-op capabilities. Enough for
    /// one-shot CLI commands and tests.
    pub fn headless() -> Self {
        Self::new(
            Box::new(super::clock::WallClock::new()),
            Box::new(crate::cue::SilentCuePlayer),
            Box::new(super::wake::NoopWakeLock),
            Box::new(crate::sync::NullSyncPort),
            Box::new(crate::display::NullSink),
        )
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn last_interval(&self) -> Option<u32> {
        self.last_interval
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            is_running: self.state == EngineState::Running,
            start_time_ms: self.start_time_ms,
            elapsed_secs: self.elapsed_secs,
            last_interval: self.last_interval,
            is_completed: self.state == EngineState::Completed,
        }
    }

    pub fn frame(&self) -> Frame {
        Frame::from_snapshot(&self.snapshot())
    }

    /// Build a full state snapshot event.
    pub fn snapshot_event(&self) -> Event {
        Event::StateSnapshot {
            state: self.snapshot(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a workout. Valid from `Idle` and `Completed`.
    ///
    /// The cue player is primed before any state changes: a player that
    /// cannot begin playback aborts the whole transition, leaving the
    /// engine idle with nothing acquired and the error frame displayed.
    pub fn start(&mut self) -> Result<Event, EngineError> {
        if self.state == EngineState::Running {
            return Err(EngineError::AlreadyRunning);
        }
        if let Err(err) = self.cues.prime() {
            // Aborted start lands in Idle even from Completed, holding
            // nothing.
            self.state = EngineState::Idle;
            self.start_time_ms = None;
            self.elapsed_secs = 0;
            self.last_interval = None;
            self.display.present(&Frame::error_state(&err.to_string()));
            return Err(EngineError::PlaybackStart(err.to_string()));
        }

        let start_ms = epoch_ms();
        self.state = EngineState::Running;
        self.start_time_ms = Some(start_ms);
        self.elapsed_secs = 0;
        self.last_interval = None;
        self.clock.begin();
        // Best-effort: a workout without a wake lock still runs.
        self.wake_guard = match self.wake.request() {
            Ok(guard) => Some(guard),
            Err(err) => {
                tracing::warn!(error = %err, "wake lock unavailable, continuing without");
                None
            }
        };
        self.sync.timer_started(start_ms);
        self.push_frame();
        tracing::info!(start_ms, "workout started");
        Ok(Event::WorkoutStarted {
            start_time_ms: start_ms,
            at: Utc::now(),
        })
    }

    /// Call periodically, roughly once a second. Returns
    /// `Some(Event::IntervalChanged)` on a cued boundary and
    /// `Some(Event::WorkoutCompleted)` when the workout ends.
    pub fn tick(&mut self) -> Option<Event> {
        if self.state != EngineState::Running {
            return None;
        }
        self.elapsed_secs = self.clock.elapsed_secs();
        if self.clock.has_ended() || self.elapsed_secs >= schedule::TOTAL_DURATION_SECS {
            return Some(self.complete());
        }
        let fired = self.check_interval_boundary();
        self.push_frame();
        fired
    }

    /// Stop and reset to idle. Valid from any state and idempotent:
    /// stopping an already idle engine changes nothing and reports
    /// nothing.
    pub fn stop(&mut self) -> Option<Event> {
        if self.state == EngineState::Idle {
            return None;
        }
        let elapsed = self.elapsed_secs;
        self.state = EngineState::Idle;
        self.start_time_ms = None;
        self.elapsed_secs = 0;
        self.last_interval = None;
        self.clock.halt();
        self.wake_guard = None;
        self.sync.timer_stopped();
        self.cues.halt();
        self.push_frame();
        tracing::info!(elapsed, "workout stopped");
        Some(Event::WorkoutStopped {
            elapsed_secs: elapsed,
            at: Utc::now(),
        })
    }

    /// Visibility-resume reconciliation. Re-derives elapsed time from the
    /// engine's own clock source, never from a mirrored snapshot, which
    /// may lag by up to one tick period.
    pub fn on_visible(&mut self) -> Option<Event> {
        self.tick()
    }

    /// Merge a mirrored snapshot pushed by the background worker.
    ///
    /// Strictly a recovery path for a dormant foreground: the reducer
    /// ignores the mirror entirely while this engine is running. Adopting
    /// a running mirror re-anchors the engine's own clock so subsequent
    /// ticks derive elapsed time locally again.
    pub fn apply_update(&mut self, incoming: TimerSnapshot) -> Option<Event> {
        let local = self.snapshot();
        let merged = protocol::apply_timer_update(local, incoming);
        if merged == local {
            return None;
        }
        self.start_time_ms = merged.start_time_ms;
        self.elapsed_secs = merged.elapsed_secs;
        self.last_interval = merged.last_interval;
        self.state = if merged.is_completed {
            EngineState::Completed
        } else if merged.is_running {
            match merged.start_time_ms {
                Some(start_ms) => self.clock.begin_at(start_ms),
                None => self.clock.begin(),
            }
            EngineState::Running
        } else {
            EngineState::Idle
        };
        self.push_frame();
        Some(self.snapshot_event())
    }

    /// Forced completion pushed by the background worker. No-op when
    /// already completed, so the completion cue still fires exactly once.
    pub fn complete_from_sync(&mut self) -> Option<Event> {
        if self.state == EngineState::Completed {
            return None;
        }
        Some(self.complete())
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Boundary rule: cue when the interval index moves and the index is
    /// still inside the workout, except the very first boundary after
    /// start, which records the index silently.
    fn check_interval_boundary(&mut self) -> Option<Event> {
        let current = schedule::current_interval(self.elapsed_secs);
        if Some(current) == self.last_interval || !schedule::within_workout(current) {
            return None;
        }
        let fired = if self.last_interval.is_some() {
            let phase = schedule::phase_of(current);
            let set = schedule::set_info(current);
            self.cues.play_phase_cue(phase, set);
            self.cues.vibrate(cue::vibration_for(phase));
            self.cues.notify(&Notification::interval_change(phase, set));
            tracing::debug!(interval = current, ?phase, "interval boundary");
            Some(Event::IntervalChanged {
                interval: current,
                phase,
                set_number: set.set_number,
                at: Utc::now(),
            })
        } else {
            None
        };
        self.last_interval = Some(current);
        fired
    }

    fn complete(&mut self) -> Event {
        self.state = EngineState::Completed;
        self.clock.halt();
        self.wake_guard = None;
        self.cues.play_completion_cue();
        self.cues.vibrate(cue::COMPLETION_VIBRATION);
        self.cues.notify(&Notification::workout_complete());
        self.push_frame();
        tracing::info!(elapsed = self.elapsed_secs, "workout completed");
        Event::WorkoutCompleted {
            elapsed_secs: self.elapsed_secs,
            at: Utc::now(),
        }
    }

    fn push_frame(&mut self) {
        let frame = Frame::from_snapshot(&self.snapshot());
        self.display.present(&frame);
    }
}
