//! Background timer worker.
//!
//! Mirrors the running session so elapsed time survives the foreground
//! going dormant. The worker keeps its own epoch anchor and recomputes
//! elapsed seconds from wall time on every tick; it never counts ticks,
//! so sleeping through any number of them costs nothing. On completion it
//! raises the background notification itself, because the foreground may
//! not be there to do it.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::cache::CacheHandle;
use crate::cue::{Notification, Notifier};
use crate::error::{CoreError, Result};
use crate::schedule::{current_interval, phase_of, set_info, within_workout, TOTAL_DURATION_SECS};
use crate::sync::protocol::{ForegroundMessage, WorkerMessage};
use crate::sync::SyncPort;
use crate::timer::{epoch_ms, TimerSnapshot};

/// Wall-time source for the worker, injectable for tests.
pub trait WorkerClock: Send {
    fn now_ms(&self) -> i64;
}

/// Real epoch time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl WorkerClock for SystemClock {
    fn now_ms(&self) -> i64 {
        epoch_ms()
    }
}

/// Hand-cranked clock. Clones share the same instant.
#[derive(Debug, Clone, Default)]
pub struct ManualWorkerClock {
    now_ms: Arc<AtomicI64>,
}

impl ManualWorkerClock {
    pub fn at(epoch_ms: i64) -> Self {
        Self {
            now_ms: Arc::new(AtomicI64::new(epoch_ms)),
        }
    }

    pub fn set(&self, epoch_ms: i64) {
        self.now_ms.store(epoch_ms, Ordering::Relaxed);
    }

    pub fn advance_secs(&self, secs: i64) {
        self.now_ms.fetch_add(secs * 1000, Ordering::Relaxed);
    }
}

impl WorkerClock for ManualWorkerClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::Relaxed)
    }
}

/// The background mirror of the session state.
pub struct BackgroundTimer {
    state: TimerSnapshot,
    clock: Box<dyn WorkerClock>,
    notifier: Box<dyn Notifier>,
}

impl BackgroundTimer {
    pub fn new(clock: Box<dyn WorkerClock>, notifier: Box<dyn Notifier>) -> Self {
        Self {
            state: TimerSnapshot::default(),
            clock,
            notifier,
        }
    }

    pub fn state(&self) -> TimerSnapshot {
        self.state
    }

    /// Apply one foreground message. Cache messages are not handled here;
    /// the actor loop routes them to the cache worker.
    pub fn handle(&mut self, message: &ForegroundMessage) {
        match message {
            ForegroundMessage::StartTimer { start_time } => {
                // A second start while running is ignored; the first
                // anchor wins.
                if self.state.is_running {
                    debug!("ignoring start, background timer already running");
                    return;
                }
                self.state = TimerSnapshot {
                    is_running: true,
                    start_time_ms: Some(*start_time),
                    elapsed_secs: 0,
                    last_interval: None,
                    is_completed: false,
                };
                debug!(start_time_ms = *start_time, "background timer started");
            }
            ForegroundMessage::StopTimer => {
                self.state = TimerSnapshot::default();
                debug!("background timer stopped");
            }
            ForegroundMessage::SyncState(snapshot) => {
                self.state = *snapshot;
            }
            ForegroundMessage::PreloadAudio | ForegroundMessage::ClearAudioCache => {}
        }
    }

    /// Advance one second of wall time. Returns the message to broadcast,
    /// if any. A completing tick reports `TimerComplete` and nothing else;
    /// every later tick is silent.
    pub fn tick(&mut self) -> Option<WorkerMessage> {
        if !self.state.is_running {
            return None;
        }
        let start_ms = self.state.start_time_ms?;
        let elapsed = ((self.clock.now_ms() - start_ms).max(0) / 1000) as u64;
        self.state.elapsed_secs = elapsed;

        if elapsed >= TOTAL_DURATION_SECS {
            self.state.is_running = false;
            self.state.is_completed = true;
            self.notifier.notify(&Notification::background_complete());
            debug!(elapsed_secs = elapsed, "background timer complete");
            return Some(WorkerMessage::TimerComplete(self.state));
        }

        let current = current_interval(elapsed);
        if within_workout(current) && self.state.last_interval != Some(current) {
            if self.state.last_interval.is_some() {
                let phase = phase_of(current);
                self.notifier
                    .notify(&Notification::interval_change(phase, set_info(current)));
            }
            self.state.last_interval = Some(current);
        }

        Some(WorkerMessage::TimerUpdate(self.state))
    }
}

/// Handle to a spawned worker task. Clones talk to the same task.
#[derive(Clone)]
pub struct WorkerHandle {
    tx: mpsc::Sender<ForegroundMessage>,
    out: broadcast::Sender<WorkerMessage>,
}

impl WorkerHandle {
    /// Subscribe to worker broadcasts. Each subscriber sees every message
    /// from the moment it subscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<WorkerMessage> {
        self.out.subscribe()
    }

    pub async fn send(&self, message: ForegroundMessage) -> Result<()> {
        self.tx
            .send(message)
            .await
            .map_err(|_| CoreError::Custom("background worker is gone".into()))
    }

    fn post(&self, message: ForegroundMessage) {
        if let Err(err) = self.tx.try_send(message) {
            warn!(error = %err, "dropping message to background worker");
        }
    }
}

/// The engine talks to the worker through this impl. Sends are fire and
/// forget, like posting to a service across a message port.
impl SyncPort for WorkerHandle {
    fn timer_started(&mut self, start_time_ms: i64) {
        self.post(ForegroundMessage::StartTimer {
            start_time: start_time_ms,
        });
    }

    fn timer_stopped(&mut self) {
        self.post(ForegroundMessage::StopTimer);
    }
}

/// Spawn the worker on the current tokio runtime with real wall time.
pub fn spawn(notifier: Box<dyn Notifier>, cache: Option<CacheHandle>) -> WorkerHandle {
    spawn_with(Box::new(SystemClock), notifier, cache)
}

/// Spawn with an injected clock. The task runs a one-second tick loop and
/// drains foreground messages between ticks; it exits when every handle
/// is dropped.
pub fn spawn_with(
    clock: Box<dyn WorkerClock>,
    notifier: Box<dyn Notifier>,
    cache: Option<CacheHandle>,
) -> WorkerHandle {
    let (tx, mut rx) = mpsc::channel::<ForegroundMessage>(32);
    let (out, _) = broadcast::channel::<WorkerMessage>(64);
    let out_tx = out.clone();

    tokio::spawn(async move {
        let mut timer = BackgroundTimer::new(clock, notifier);
        let mut ticker = tokio::time::interval(Duration::from_secs(1));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                received = rx.recv() => {
                    let Some(message) = received else { break };
                    match message {
                        ForegroundMessage::PreloadAudio => {
                            let cached = match &cache {
                                Some(handle) => handle.preload().await.unwrap_or(false),
                                None => false,
                            };
                            let _ = out_tx.send(WorkerMessage::AudioCached { cached });
                        }
                        ForegroundMessage::ClearAudioCache => {
                            let cached = match &cache {
                                Some(handle) => handle.clear().await.unwrap_or(false),
                                None => false,
                            };
                            let _ = out_tx.send(WorkerMessage::AudioCached { cached });
                        }
                        other => timer.handle(&other),
                    }
                }
                _ = ticker.tick() => {
                    if let Some(update) = timer.tick() {
                        // No subscribers is fine; the state is still kept.
                        let _ = out_tx.send(update);
                    }
                }
            }
        }
        debug!("background timer task stopped");
    });

    WorkerHandle { tx, out }
}
