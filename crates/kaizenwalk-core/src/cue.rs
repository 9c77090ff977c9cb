//! Cue playback capability.
//!
//! The engine signals interval changes and completion through this trait;
//! how a tone is synthesized is the implementation's business. All calls
//! except [`CuePlayer::prime`] are fire-and-forget: cue failures are logged
//! by implementations and never reach the engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schedule::{Phase, SetInfo, TOTAL_SETS};

/// Icon shipped with the app shell, reused on every notification.
pub const NOTIFICATION_ICON: &str = "/icon-512x512.png";

/// Vibration pattern announcing a fast interval.
pub const FAST_VIBRATION: &[u32] = &[100, 50, 100];
/// Vibration pattern announcing a slow interval.
pub const SLOW_VIBRATION: &[u32] = &[200];
/// Vibration pattern announcing workout completion.
pub const COMPLETION_VIBRATION: &[u32] = &[200, 100, 200, 100, 200];

/// The three cue tones. Tone parameters are the player's concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CueKind {
    Bell,
    Gong,
    Fanfare,
}

impl CueKind {
    /// Bell announces fast intervals, gong announces slow ones.
    pub fn for_phase(phase: Phase) -> Self {
        match phase {
            Phase::Fast => CueKind::Bell,
            Phase::Slow => CueKind::Gong,
        }
    }
}

/// Vibration pattern paired with a phase cue.
pub fn vibration_for(phase: Phase) -> &'static [u32] {
    match phase {
        Phase::Fast => FAST_VIBRATION,
        Phase::Slow => SLOW_VIBRATION,
    }
}

#[derive(Debug, Error)]
pub enum CueError {
    /// Audio playback could not begin. Fatal to the start transition.
    #[error("audio playback failed to start: {0}")]
    Playback(String),
}

/// System notification payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    /// Notifications with the same tag replace each other.
    pub tag: String,
    pub require_interaction: bool,
    /// Empty when the notification carries no vibration.
    pub vibrate: Vec<u32>,
}

impl Notification {
    /// Interval-change toast: `Fast Walk 🏃` / `Slow Walk 🚶`, `Set N of 5`.
    pub fn interval_change(phase: Phase, set: SetInfo) -> Self {
        let title = match phase {
            Phase::Fast => "Fast Walk 🏃",
            Phase::Slow => "Slow Walk 🚶",
        };
        Notification {
            title: title.to_string(),
            body: format!("Set {} of {}", set.set_number, TOTAL_SETS),
            icon: NOTIFICATION_ICON.to_string(),
            tag: "interval-change".to_string(),
            require_interaction: false,
            vibrate: Vec::new(),
        }
    }

    /// Completion raised by the foreground engine.
    pub fn workout_complete() -> Self {
        Notification {
            title: "KaizenWalk Complete! 🎉".to_string(),
            body: "Congratulations! You completed your 30-minute workout.".to_string(),
            icon: NOTIFICATION_ICON.to_string(),
            tag: "completion".to_string(),
            require_interaction: true,
            vibrate: Vec::new(),
        }
    }

    /// Completion raised by the background worker when the foreground is
    /// dormant. Requires interaction so the user cannot miss the end of a
    /// workout that finished with the screen off.
    pub fn background_complete() -> Self {
        Notification {
            title: "KaizenWalk Complete! 🎉".to_string(),
            body: "Congratulations! You completed your 30-minute walk.".to_string(),
            icon: NOTIFICATION_ICON.to_string(),
            tag: "kaizenwalk-complete".to_string(),
            require_interaction: true,
            vibrate: COMPLETION_VIBRATION.to_vec(),
        }
    }
}

/// Raises system notifications. The notify-only slice of [`CuePlayer`],
/// enough for the background worker.
pub trait Notifier: Send {
    fn notify(&mut self, notification: &Notification);
}

/// Plays audio cues, vibrates and raises notifications for the engine.
pub trait CuePlayer: Send {
    /// Begin audio playback at position zero. The one fallible call:
    /// `start()` aborts the whole transition when this errors.
    fn prime(&mut self) -> Result<(), CueError>;

    /// Stop playback and drop any held audio resources.
    fn halt(&mut self);

    fn play_phase_cue(&mut self, phase: Phase, set: SetInfo);

    fn play_completion_cue(&mut self);

    fn vibrate(&mut self, pattern: &[u32]);

    fn notify(&mut self, notification: &Notification);
}

/// No-op player for headless runs and tests.
#[derive(Debug, Default)]
pub struct SilentCuePlayer;

impl CuePlayer for SilentCuePlayer {
    fn prime(&mut self) -> Result<(), CueError> {
        Ok(())
    }

    fn halt(&mut self) {}

    fn play_phase_cue(&mut self, _phase: Phase, _set: SetInfo) {}

    fn play_completion_cue(&mut self) {}

    fn vibrate(&mut self, _pattern: &[u32]) {}

    fn notify(&mut self, _notification: &Notification) {}
}

/// No-op notifier for tests.
#[derive(Debug, Default)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&mut self, _notification: &Notification) {}
}
