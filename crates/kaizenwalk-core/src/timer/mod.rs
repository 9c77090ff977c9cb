mod clock;
mod engine;
mod wake;

pub use clock::{AudioTrackClock, ClockSource, ManualClock, TrackPosition, WallClock};
pub use engine::{EngineState, TimerEngine, TimerSnapshot};
pub use wake::{NoopWakeLock, WakeLockError, WakeLockGuard, WakeLockProvider};

pub(crate) use clock::epoch_ms;
