//! # KaizenWalk Core Library
//!
//! This library provides the core logic for the KaizenWalk interval-walk
//! timer: a fixed 30-minute workout of alternating 3-minute fast/slow
//! phases, grouped into five sets. It implements a CLI-first philosophy
//! where every operation is available through a standalone binary, with any
//! graphical shell staying a thin layer over the same core library.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a clock-derived state machine that requires the
//!   caller to periodically invoke `tick()` for progress updates; elapsed
//!   time is always recomputed from a [`ClockSource`], never accumulated
//! - **Background Sync**: a detached tokio actor mirroring the session so
//!   elapsed time survives a throttled or dormant foreground, speaking an
//!   explicit message protocol (no shared memory)
//! - **Asset Cache**: offline-first storage for the app shell and the
//!   30-minute guidance track, with strict range-request bypass
//! - **Storage**: SQLite-backed cache persistence and in-session snapshot
//!   storage, TOML-based configuration
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: core timer state machine
//! - [`BackgroundTimer`]: the background worker's mirrored timer
//! - [`CacheWorker`]: fetch interception and cache population
//! - [`Database`]: snapshot and cache persistence
//! - [`Config`]: application configuration management

pub mod timer;
pub mod schedule;
pub mod cue;
pub mod display;
pub mod sync;
pub mod cache;
pub mod storage;
pub mod events;
pub mod error;

pub use timer::{ClockSource, EngineState, TimerEngine, TimerSnapshot};
pub use schedule::{Phase, SetInfo};
pub use cue::{CuePlayer, Notification, Notifier};
pub use display::{DisplaySink, Frame};
pub use sync::{BackgroundTimer, ForegroundMessage, SyncPort, WorkerMessage};
pub use cache::{CacheWorker, CachedAsset, FetchRequest, FetchResponse};
pub use storage::{Config, Database};
pub use events::Event;
pub use error::{CacheError, ConfigError, CoreError, DatabaseError, EngineError};
