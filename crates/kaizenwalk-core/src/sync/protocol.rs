//! Foreground <-> worker message schema.
//!
//! Messages are the only thing that crosses the actor boundary; neither
//! side ever shares memory with the other. The envelope is adjacently
//! tagged `{ "type": ..., "data": ... }` with SCREAMING_SNAKE_CASE type
//! names, so a payload is always attributable to exactly one message kind.

use serde::{Deserialize, Serialize};

use crate::timer::TimerSnapshot;

/// Bump on any incompatible change to the message shapes below.
pub const PROTOCOL_VERSION: u32 = 1;

/// Messages the foreground sends to the background worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ForegroundMessage {
    /// Begin mirroring a session anchored at this epoch-ms timestamp.
    StartTimer {
        #[serde(rename = "startTime")]
        start_time: i64,
    },
    /// Stop mirroring and clear state. Idempotent.
    StopTimer,
    /// Overwrite the worker's mirror with the foreground's state.
    SyncState(TimerSnapshot),
    /// Warm the audio cache ahead of a workout.
    PreloadAudio,
    /// Purge the audio cache; the asset is re-fetched on next use.
    ClearAudioCache,
}

/// Messages the background worker pushes to foreground instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerMessage {
    /// Mirrored state, at most once per worker tick.
    TimerUpdate(TimerSnapshot),
    /// The worker's own clock crossed the workout duration. Sent exactly
    /// once per session; no TimerUpdate follows it.
    TimerComplete(TimerSnapshot),
    /// Reply to PreloadAudio / ClearAudioCache.
    AudioCached { cached: bool },
}

/// Merge a mirrored snapshot into local state.
///
/// Mirrored state is strictly a recovery path for a dormant foreground:
/// while the local engine runs, its own clock is authoritative and the
/// mirror is discarded wholesale. Field-by-field overwrites would let a
/// lagging mirror walk a live display backwards.
pub fn apply_timer_update(local: TimerSnapshot, incoming: TimerSnapshot) -> TimerSnapshot {
    if local.is_running {
        local
    } else {
        incoming
    }
}
