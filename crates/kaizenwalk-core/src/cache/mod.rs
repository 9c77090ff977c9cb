//! Offline asset cache: store abstraction plus the worker that serves
//! intercepted fetches and seeds the app shell.

mod store;
mod worker;

pub use store::{CachedAsset, CacheStore, MemoryCacheStore};
pub use worker::{
    spawn_cache_thread, AssetFetcher, ByteRange, CacheCommand, CacheHandle, CacheWorker,
    FetchRequest, FetchResponse, HttpFetcher, PreloadOutcome,
};
