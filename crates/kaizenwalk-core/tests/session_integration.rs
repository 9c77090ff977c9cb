//! Session scenarios across the engine/worker boundary.
//!
//! The foreground engine and the background worker each keep their own
//! clock; nothing crosses the boundary except protocol messages. These
//! tests run whole sessions through both actors and check the
//! reconciliation rules: a running foreground never adopts mirrored state,
//! a dormant one does and re-derives elapsed time from its own clock on
//! resume, and completion crosses the boundary exactly once.

use std::time::Duration;

use kaizenwalk_core::cache::{
    spawn_cache_thread, AssetFetcher, CacheWorker, FetchRequest, FetchResponse, MemoryCacheStore,
};
use kaizenwalk_core::cue::{SilentCuePlayer, SilentNotifier};
use kaizenwalk_core::display::NullSink;
use kaizenwalk_core::error::CacheError;
use kaizenwalk_core::storage::CacheConfig;
use kaizenwalk_core::sync::{
    spawn_with, BackgroundTimer, ForegroundMessage, ManualWorkerClock, NullSyncPort, SyncPort,
    WorkerMessage,
};
use kaizenwalk_core::timer::{
    EngineState, ManualClock, NoopWakeLock, TimerEngine, TimerSnapshot,
};

const T0: i64 = 1_700_000_000_000;

fn engine_on(clock: ManualClock) -> TimerEngine {
    TimerEngine::new(
        Box::new(clock),
        Box::new(SilentCuePlayer),
        Box::new(NoopWakeLock),
        Box::new(NullSyncPort),
        Box::new(NullSink),
    )
}

fn worker_at(t0: i64) -> (BackgroundTimer, ManualWorkerClock) {
    let clock = ManualWorkerClock::at(t0);
    let timer = BackgroundTimer::new(Box::new(clock.clone()), Box::new(SilentNotifier));
    (timer, clock)
}

#[test]
fn dormant_foreground_recovers_then_rederives_on_resume() {
    let (mut worker, worker_clock) = worker_at(T0);
    worker.handle(&ForegroundMessage::StartTimer { start_time: T0 });

    // 400 seconds pass with no foreground anywhere.
    worker_clock.advance_secs(400);
    let Some(WorkerMessage::TimerUpdate(mirror)) = worker.tick() else {
        panic!("expected a mirror update");
    };
    assert_eq!(mirror.elapsed_secs, 400);

    // A fresh foreground instance comes up idle and adopts the mirror.
    let clock = ManualClock::new();
    let mut engine = engine_on(clock.clone());
    assert!(engine.apply_update(mirror).is_some());
    assert_eq!(engine.state(), EngineState::Running);
    assert_eq!(engine.elapsed_secs(), 400);

    // By the time it becomes visible the mirror is already stale. The
    // resume path reads the engine's own clock, not the mirrored value.
    clock.set(403);
    engine.on_visible();
    assert_eq!(engine.elapsed_secs(), 403);
}

#[test]
fn running_foreground_discards_every_mirror() {
    let clock = ManualClock::new();
    let mut engine = engine_on(clock.clone());
    engine.start().unwrap();
    clock.set(600);
    engine.tick();

    let (mut worker, worker_clock) = worker_at(T0);
    worker.handle(&ForegroundMessage::StartTimer { start_time: T0 });
    // The worker lags one tick period behind.
    worker_clock.advance_secs(599);
    let Some(WorkerMessage::TimerUpdate(mirror)) = worker.tick() else {
        panic!("expected a mirror update");
    };

    assert!(engine.apply_update(mirror).is_none());
    assert_eq!(engine.elapsed_secs(), 600);
    assert_eq!(engine.state(), EngineState::Running);
}

#[test]
fn stop_clears_both_sides_idempotently() {
    let clock = ManualClock::new();
    let mut engine = engine_on(clock.clone());
    let (mut worker, worker_clock) = worker_at(T0);

    engine.start().unwrap();
    worker.handle(&ForegroundMessage::StartTimer { start_time: T0 });
    worker_clock.advance_secs(90);
    clock.set(90);
    engine.tick();
    worker.tick();

    engine.stop();
    worker.handle(&ForegroundMessage::StopTimer);
    assert_eq!(engine.snapshot(), TimerSnapshot::default());
    assert_eq!(worker.state(), TimerSnapshot::default());

    // A second stop on either side changes nothing, and no tick fires
    // after a stop is acknowledged.
    engine.stop();
    worker.handle(&ForegroundMessage::StopTimer);
    worker_clock.advance_secs(10);
    assert_eq!(worker.tick(), None);
    assert!(engine.tick().is_none());
    assert_eq!(engine.snapshot(), TimerSnapshot::default());
    assert_eq!(worker.state(), TimerSnapshot::default());
}

#[tokio::test(start_paused = true)]
async fn spawned_worker_carries_a_session_to_completion() {
    let worker_clock = ManualWorkerClock::at(T0);
    let handle = spawn_with(
        Box::new(worker_clock.clone()),
        Box::new(SilentNotifier),
        None,
    );
    let mut updates = handle.subscribe();

    // Anchor the worker the way the engine does on start.
    let mut port = handle.clone();
    port.timer_started(T0);

    let clock = ManualClock::new();
    let mut engine = engine_on(clock.clone());
    engine.start().unwrap();

    // Mid-session the worker mirrors wall time on its own.
    worker_clock.advance_secs(200);
    let Ok(WorkerMessage::TimerUpdate(mirror)) = updates.recv().await else {
        panic!("expected a mirror update");
    };
    assert_eq!(mirror.elapsed_secs, 200);

    // The running engine keeps deriving from its own clock.
    clock.set(201);
    engine.tick();
    engine.apply_update(mirror);
    assert_eq!(engine.elapsed_secs(), 201);

    // The worker's clock crosses the finish line first.
    worker_clock.advance_secs(1700);
    let completed = loop {
        match updates.recv().await.unwrap() {
            WorkerMessage::TimerUpdate(state) => assert!(state.elapsed_secs < 1800),
            WorkerMessage::TimerComplete(state) => break state,
            WorkerMessage::AudioCached { .. } => panic!("no cache traffic in this session"),
        }
    };
    assert!(completed.is_completed);
    assert!(!completed.is_running);

    // The pushed completion forces the foreground over the line once.
    assert!(engine.complete_from_sync().is_some());
    assert_eq!(engine.state(), EngineState::Completed);
    assert!(engine.complete_from_sync().is_none());

    // After TIMER_COMPLETE the worker goes silent; no trailing updates.
    worker_clock.advance_secs(30);
    let silence = tokio::time::timeout(Duration::from_secs(5), updates.recv()).await;
    assert!(silence.is_err(), "worker emitted after completion: {silence:?}");
}

#[tokio::test]
async fn cache_messages_flow_through_the_actor() {
    struct StaticFetcher;

    impl AssetFetcher for StaticFetcher {
        fn fetch(&self, _request: &FetchRequest) -> Result<FetchResponse, CacheError> {
            Ok(FetchResponse {
                status: 200,
                body: b"track bytes".to_vec(),
                same_origin: true,
            })
        }
    }

    let cache_worker = CacheWorker::new(
        Box::new(MemoryCacheStore::new()),
        Box::new(StaticFetcher),
        CacheConfig::default(),
    );
    let cache = spawn_cache_thread(cache_worker);
    let handle = spawn_with(
        Box::new(ManualWorkerClock::at(T0)),
        Box::new(SilentNotifier),
        Some(cache),
    );
    let mut updates = handle.subscribe();

    handle.send(ForegroundMessage::PreloadAudio).await.unwrap();
    let Ok(WorkerMessage::AudioCached { cached }) = updates.recv().await else {
        panic!("expected a cache reply");
    };
    assert!(cached);

    handle
        .send(ForegroundMessage::ClearAudioCache)
        .await
        .unwrap();
    let Ok(WorkerMessage::AudioCached { cached }) = updates.recv().await else {
        panic!("expected a cache reply");
    };
    assert!(!cached);
}
