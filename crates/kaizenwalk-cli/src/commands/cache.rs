use clap::Subcommand;
use serde::Serialize;
use url::Url;

use kaizenwalk_core::cache::{CacheWorker, HttpFetcher, PreloadOutcome};
use kaizenwalk_core::storage::{Config, Database};

#[derive(Subcommand)]
pub enum CacheAction {
    /// Fetch and cache the 30-minute guidance track
    Preload,
    /// Purge the audio cache; the track is re-fetched on next use
    Clear,
    /// Report which caches exist and whether the track is cached
    Status,
}

/// JSON surface of `cache status`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CacheStatus {
    audio_cached: bool,
    caches: Vec<String>,
}

fn build_worker() -> Result<CacheWorker, Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let store = Database::open()?;
    let origin = Url::parse(&config.cache.base_url)?;
    let fetcher = HttpFetcher::new(origin)?;
    Ok(CacheWorker::new(
        Box::new(store),
        Box::new(fetcher),
        config.cache,
    ))
}

pub fn run(action: CacheAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut worker = build_worker()?;
    match action {
        CacheAction::Preload => {
            match worker.preload_audio()? {
                PreloadOutcome::AlreadyCached => println!("already cached"),
                PreloadOutcome::Cached => println!("cached"),
            }
        }
        CacheAction::Clear => {
            let existed = worker.clear_audio_cache()?;
            println!("{}", if existed { "cleared" } else { "nothing to clear" });
        }
        CacheAction::Status => {
            let status = CacheStatus {
                audio_cached: worker.audio_cached()?,
                caches: worker.cache_names()?,
            };
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }
    Ok(())
}
