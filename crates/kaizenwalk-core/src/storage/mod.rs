mod config;
pub mod database;

pub use config::{CacheConfig, ClockSourceKind, Config, NotificationsConfig, TimerConfig};
pub use database::Database;

use std::path::PathBuf;

/// Returns `~/.config/kaizenwalk[-dev]/` based on KAIZENWALK_ENV.
///
/// Set KAIZENWALK_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if the config directory cannot be created.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("KAIZENWALK_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("kaizenwalk-dev")
    } else {
        base_dir.join("kaizenwalk")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
