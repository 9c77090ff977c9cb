//! Elapsed-time sources.
//!
//! Elapsed time is always derived from a clock source, never accumulated
//! tick by tick, so a late or missed tick can never skew the workout.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Milliseconds since the Unix epoch.
pub(crate) fn epoch_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Where the engine reads elapsed seconds from.
pub trait ClockSource: Send {
    /// Anchor the session at zero. Called once per `start()`.
    fn begin(&mut self);

    /// Adopt an anchor established elsewhere (mirrored state from the
    /// background worker, or a persisted session). Lets a resumed
    /// foreground re-derive elapsed time from its own reading of the
    /// clock instead of a stale mirror.
    fn begin_at(&mut self, start_epoch_ms: i64);

    /// Seconds since the anchor. Zero while unanchored.
    fn elapsed_secs(&self) -> u64;

    /// End-of-media signal. Always false for wall clocks; true once an
    /// audio track runs out, which forces completion even slightly off
    /// the nominal duration.
    fn has_ended(&self) -> bool;

    /// Clear the anchor.
    fn halt(&mut self);
}

/// Epoch-anchored wall clock. The default authoritative source.
#[derive(Debug, Default)]
pub struct WallClock {
    start_epoch_ms: Option<i64>,
}

impl WallClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClockSource for WallClock {
    fn begin(&mut self) {
        self.start_epoch_ms = Some(epoch_ms());
    }

    fn begin_at(&mut self, start_epoch_ms: i64) {
        self.start_epoch_ms = Some(start_epoch_ms);
    }

    fn elapsed_secs(&self) -> u64 {
        match self.start_epoch_ms {
            // max(0) guards against a system clock stepping backwards.
            Some(start) => ((epoch_ms() - start).max(0) / 1000) as u64,
            None => 0,
        }
    }

    fn has_ended(&self) -> bool {
        false
    }

    fn halt(&mut self) {
        self.start_epoch_ms = None;
    }
}

/// Playback position shared between an external audio player and
/// [`AudioTrackClock`]. Cloning shares the same position.
#[derive(Debug, Clone, Default)]
pub struct TrackPosition(Arc<TrackState>);

#[derive(Debug, Default)]
struct TrackState {
    position_secs: AtomicU64,
    ended: AtomicBool,
}

impl TrackPosition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Player-side: report the current playback position.
    pub fn set_position(&self, secs: u64) {
        self.0.position_secs.store(secs, Ordering::Relaxed);
    }

    /// Player-side: the track ran out.
    pub fn mark_ended(&self) {
        self.0.ended.store(true, Ordering::Relaxed);
    }

    pub fn position_secs(&self) -> u64 {
        self.0.position_secs.load(Ordering::Relaxed)
    }

    pub fn has_ended(&self) -> bool {
        self.0.ended.load(Ordering::Relaxed)
    }

    fn reset(&self) {
        self.0.position_secs.store(0, Ordering::Relaxed);
        self.0.ended.store(false, Ordering::Relaxed);
    }
}

/// Clock driven by the 30-minute guidance track's playback position.
/// When configured, the track is authoritative for cue timing and its end
/// completes the workout.
#[derive(Debug, Clone)]
pub struct AudioTrackClock {
    position: TrackPosition,
}

impl AudioTrackClock {
    pub fn new(position: TrackPosition) -> Self {
        Self { position }
    }
}

impl ClockSource for AudioTrackClock {
    fn begin(&mut self) {
        self.position.reset();
    }

    // The external player owns seeking; adopting a mirrored anchor keeps
    // whatever position it currently reports.
    fn begin_at(&mut self, _start_epoch_ms: i64) {}

    fn elapsed_secs(&self) -> u64 {
        self.position.position_secs()
    }

    fn has_ended(&self) -> bool {
        self.position.has_ended()
    }

    fn halt(&mut self) {
        self.position.reset();
    }
}

/// Hand-driven clock for deterministic tests. Clones share state, so a
/// test can keep one handle while the engine owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock(Arc<TrackState>);

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, secs: u64) {
        self.0.position_secs.fetch_add(secs, Ordering::Relaxed);
    }

    pub fn set(&self, secs: u64) {
        self.0.position_secs.store(secs, Ordering::Relaxed);
    }

    /// Simulate the guidance track running out.
    pub fn finish_track(&self) {
        self.0.ended.store(true, Ordering::Relaxed);
    }
}

impl ClockSource for ManualClock {
    fn begin(&mut self) {
        self.0.position_secs.store(0, Ordering::Relaxed);
        self.0.ended.store(false, Ordering::Relaxed);
    }

    // Tests position the clock explicitly.
    fn begin_at(&mut self, _start_epoch_ms: i64) {}

    fn elapsed_secs(&self) -> u64 {
        self.0.position_secs.load(Ordering::Relaxed)
    }

    fn has_ended(&self) -> bool {
        self.0.ended.load(Ordering::Relaxed)
    }

    fn halt(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wall_clock_unanchored_reads_zero() {
        let mut clock = WallClock::new();
        assert_eq!(clock.elapsed_secs(), 0);
        assert!(!clock.has_ended());
        clock.begin();
        assert!(clock.elapsed_secs() < 2);
        clock.halt();
        assert_eq!(clock.elapsed_secs(), 0);
    }

    #[test]
    fn wall_clock_adopts_past_anchor() {
        let mut clock = WallClock::new();
        clock.begin_at(epoch_ms() - 90_000);
        let elapsed = clock.elapsed_secs();
        assert!((89..=91).contains(&elapsed), "elapsed was {elapsed}");
    }

    #[test]
    fn wall_clock_floors_future_anchor_at_zero() {
        let mut clock = WallClock::new();
        clock.begin_at(epoch_ms() + 60_000);
        assert_eq!(clock.elapsed_secs(), 0);
    }

    #[test]
    fn audio_clock_tracks_shared_position() {
        let position = TrackPosition::new();
        let mut clock = AudioTrackClock::new(position.clone());
        clock.begin();

        position.set_position(42);
        assert_eq!(clock.elapsed_secs(), 42);
        assert!(!clock.has_ended());

        position.mark_ended();
        assert!(clock.has_ended());

        clock.begin();
        assert_eq!(clock.elapsed_secs(), 0);
        assert!(!clock.has_ended());
    }

    #[test]
    fn manual_clock_clones_share_state() {
        let handle = ManualClock::new();
        let mut owned: Box<dyn ClockSource> = Box::new(handle.clone());
        owned.begin();
        handle.advance(180);
        assert_eq!(owned.elapsed_secs(), 180);
        handle.finish_track();
        assert!(owned.has_ended());
    }
}
