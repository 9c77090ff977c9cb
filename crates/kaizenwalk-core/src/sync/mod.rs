//! Foreground/background session sync.
//!
//! [`protocol`] defines the versioned message schema, [`worker`] the
//! background mirror that keeps counting while the foreground is dormant.

pub mod protocol;
pub mod worker;

pub use protocol::{apply_timer_update, ForegroundMessage, WorkerMessage, PROTOCOL_VERSION};
pub use worker::{
    spawn, spawn_with, BackgroundTimer, ManualWorkerClock, SystemClock, WorkerClock, WorkerHandle,
};

/// Where the engine announces session transitions. Fire and forget: a
/// missing or dead counterpart must never fail a start or stop.
pub trait SyncPort: Send {
    fn timer_started(&mut self, start_time_ms: i64);
    fn timer_stopped(&mut self);
}

/// Discards everything. For headless or single-process use.
#[derive(Debug, Default)]
pub struct NullSyncPort;

impl SyncPort for NullSyncPort {
    fn timer_started(&mut self, _start_time_ms: i64) {}
    fn timer_stopped(&mut self) {}
}
