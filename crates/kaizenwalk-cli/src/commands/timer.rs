use std::time::Duration;

use clap::Subcommand;
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use url::Url;

use kaizenwalk_core::cache::{spawn_cache_thread, CacheHandle, CacheWorker, HttpFetcher};
use kaizenwalk_core::display::Frame;
use kaizenwalk_core::storage::{ClockSourceKind, Config, Database};
use kaizenwalk_core::sync::{self, ForegroundMessage, WorkerMessage};
use kaizenwalk_core::timer::{
    ClockSource, EngineState, NoopWakeLock, TimerEngine, TimerSnapshot, WallClock,
};

use crate::console::{ConsoleCuePlayer, ConsoleNotifier, ConsoleSink};

const SNAPSHOT_KEY: &str = "timer_snapshot";

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a workout session
    Start,
    /// Stop the current session and reset to idle
    Stop,
    /// Print the current frame and timer state as JSON
    Status,
    /// Run a live session in the foreground until it completes
    Run,
}

/// Frame plus raw state, the JSON surface of `timer status`.
#[derive(Serialize)]
struct StatusReport {
    frame: Frame,
    state: TimerSnapshot,
}

fn load_snapshot(db: &Database) -> TimerSnapshot {
    if let Ok(Some(json)) = db.kv_get(SNAPSHOT_KEY) {
        if let Ok(snapshot) = serde_json::from_str::<TimerSnapshot>(&json) {
            return snapshot;
        }
    }
    TimerSnapshot::default()
}

fn save_snapshot(db: &Database, snapshot: &TimerSnapshot) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string(snapshot)?;
    db.kv_set(SNAPSHOT_KEY, &json)?;
    Ok(())
}

/// Engine for one-shot commands: wall clock, silent capabilities, state
/// adopted from the persisted snapshot. Elapsed time is re-derived from
/// the wall-clock anchor on the next tick, never from the stored value.
fn restore_engine(snapshot: TimerSnapshot) -> TimerEngine {
    let mut engine = TimerEngine::headless();
    engine.apply_update(snapshot);
    engine
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        TimerAction::Start => {
            let db = Database::open()?;
            let mut engine = restore_engine(load_snapshot(&db));
            let event = engine.start()?;
            save_snapshot(&db, &engine.snapshot())?;
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        TimerAction::Stop => {
            let db = Database::open()?;
            let mut engine = restore_engine(load_snapshot(&db));
            let event = engine.stop();
            // Nothing outlives the session.
            db.kv_delete(SNAPSHOT_KEY)?;
            if let Some(event) = event {
                println!("{}", serde_json::to_string_pretty(&event)?);
            }
        }
        TimerAction::Status => {
            let db = Database::open()?;
            let mut engine = restore_engine(load_snapshot(&db));
            // Tick to re-derive elapsed time; this may also complete a
            // session whose duration ran out between invocations.
            let event = engine.tick();
            let report = StatusReport {
                frame: engine.frame(),
                state: engine.snapshot(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
            if let Some(event) = event {
                println!("{}", serde_json::to_string_pretty(&event)?);
            }
            save_snapshot(&db, &engine.snapshot())?;
        }
        TimerAction::Run => {
            let config = Config::load_or_default();
            let db = Database::open()?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_session(config, db))?;
        }
    }
    Ok(())
}

/// Cache worker on its own thread, if the pieces come together. A missing
/// cache is a degraded session, never a failed one.
fn build_cache_handle(config: &Config) -> Option<CacheHandle> {
    let open = || -> Result<CacheHandle, Box<dyn std::error::Error>> {
        let store = Database::open()?;
        let origin = Url::parse(&config.cache.base_url)?;
        let fetcher = HttpFetcher::new(origin)?;
        let worker = CacheWorker::new(Box::new(store), Box::new(fetcher), config.cache.clone());
        Ok(spawn_cache_thread(worker))
    };
    match open() {
        Ok(handle) => Some(handle),
        Err(err) => {
            tracing::warn!(error = %err, "audio cache unavailable for this session");
            None
        }
    }
}

/// Live session: foreground engine on a 1 Hz tick, background worker
/// mirroring it, Ctrl-C stopping both.
async fn run_session(config: Config, db: Database) -> Result<(), Box<dyn std::error::Error>> {
    let cache = build_cache_handle(&config);
    let handle = sync::spawn(Box::new(ConsoleNotifier), cache);
    let mut updates = handle.subscribe();

    let clock: Box<dyn ClockSource> = match config.timer.clock_source {
        ClockSourceKind::Wall => Box::new(WallClock::new()),
        ClockSourceKind::Audio => {
            // Terminal sessions have no audio player feeding a track
            // position, so the wall clock stays authoritative here.
            tracing::warn!("audio clock source configured; falling back to wall clock");
            Box::new(WallClock::new())
        }
    };
    let mut engine = TimerEngine::new(
        clock,
        Box::new(ConsoleCuePlayer),
        Box::new(NoopWakeLock),
        Box::new(handle.clone()),
        Box::new(ConsoleSink),
    );

    // Warm the guidance track before the session needs it.
    handle.send(ForegroundMessage::PreloadAudio).await?;

    let persisted = load_snapshot(&db);
    if persisted.is_running {
        // Attach to a session started by a one-shot command and hand the
        // worker the same anchor.
        engine.apply_update(persisted);
        handle
            .send(ForegroundMessage::SyncState(engine.snapshot()))
            .await?;
        tracing::info!("attached to the running session");
    } else {
        let event = engine.start()?;
        println!("{}", serde_json::to_string_pretty(&event)?);
    }
    save_snapshot(&db, &engine.snapshot())?;

    let mut ticker = tokio::time::interval(Duration::from_millis(config.timer.tick_interval_ms.max(1)));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Some(event) = engine.tick() {
                    println!("{}", serde_json::to_string_pretty(&event)?);
                }
                if engine.state() == EngineState::Completed {
                    save_snapshot(&db, &engine.snapshot())?;
                    break;
                }
            }
            received = updates.recv() => {
                match received {
                    Ok(WorkerMessage::TimerUpdate(state)) => {
                        // Recovery path only; while the engine runs its
                        // own clock wins and this is discarded.
                        engine.apply_update(state);
                    }
                    Ok(WorkerMessage::TimerComplete(_)) => {
                        if let Some(event) = engine.complete_from_sync() {
                            println!("{}", serde_json::to_string_pretty(&event)?);
                        }
                        save_snapshot(&db, &engine.snapshot())?;
                        break;
                    }
                    Ok(WorkerMessage::AudioCached { cached }) => {
                        tracing::info!(cached, "guidance track cache state");
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "fell behind worker updates");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            _ = &mut ctrl_c => {
                if let Some(event) = engine.stop() {
                    println!("{}", serde_json::to_string_pretty(&event)?);
                }
                db.kv_delete(SNAPSHOT_KEY)?;
                break;
            }
        }
    }
    eprintln!();
    Ok(())
}
