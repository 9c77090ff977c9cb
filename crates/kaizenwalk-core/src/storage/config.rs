//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Timer clock source and tick cadence
//! - Notification preferences
//! - Cache names, base URL and the app-shell asset list
//!
//! Configuration is stored at `~/.config/kaizenwalk/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::ConfigError;

/// Which clock drives the session's elapsed seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClockSourceKind {
    /// Wall-clock delta from the start anchor.
    #[default]
    Wall,
    /// Playback position of the 30-minute guidance track.
    Audio,
}

/// Timer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default)]
    pub clock_source: ClockSourceKind,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub vibration: bool,
}

/// Asset cache configuration. The cache names are versioned; bumping one
/// makes activation drop the previous generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_shell_cache_name")]
    pub shell_cache_name: String,
    #[serde(default = "default_audio_cache_name")]
    pub audio_cache_name: String,
    /// File name of the guidance track, resolved against `base_url`.
    #[serde(default = "default_audio_asset")]
    pub audio_asset: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_shell_assets")]
    pub shell_assets: Vec<String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/kaizenwalk/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

// Default functions
fn default_tick_interval_ms() -> u64 {
    1000
}
fn default_true() -> bool {
    true
}
fn default_shell_cache_name() -> String {
    "kaizenwalk-mp3-v1".into()
}
fn default_audio_cache_name() -> String {
    "kaizenwalk-audio-v1".into()
}
fn default_audio_asset() -> String {
    "kaizenwalk_30min.mp3".into()
}
fn default_base_url() -> String {
    "http://localhost:8000".into()
}
fn default_shell_assets() -> Vec<String> {
    [
        "/",
        "/index.html",
        "/app.js",
        "/style.css",
        "/manifest.json",
        "/icon-512x512.png",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            clock_source: ClockSourceKind::Wall,
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            vibration: true,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            shell_cache_name: default_shell_cache_name(),
            audio_cache_name: default_audio_cache_name(),
            audio_asset: default_audio_asset(),
            base_url: default_base_url(),
            shell_assets: default_shell_assets(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|_| ConfigError::InvalidValue {
                            key: key.to_string(),
                            message: format!("cannot parse '{value}' as boolean"),
                        })?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| ConfigError::InvalidValue {
                                    key: key.to_string(),
                                    message: format!("cannot parse '{value}' as number"),
                                })?
                        } else {
                            return Err(ConfigError::InvalidValue {
                                key: key.to_string(),
                                message: format!("cannot parse '{value}' as number"),
                            });
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|err| ConfigError::InvalidValue {
                            key: key.to_string(),
                            message: err.to_string(),
                        })?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }

    /// Path of the config file, creating the data directory if needed.
    pub fn path() -> std::io::Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing the default config on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path().map_err(|err| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: err.to_string(),
        })?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|err| ConfigError::LoadFailed {
                path,
                message: err.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to
    /// disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path().map_err(|err| ConfigError::SaveFailed {
            path: PathBuf::from("config.toml"),
            message: err.to_string(),
        })?;
        let content = toml::to_string_pretty(self).map_err(|err| ConfigError::SaveFailed {
            path: path.clone(),
            message: err.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|err| ConfigError::SaveFailed {
            path,
            message: err.to_string(),
        })?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key and persist. Returns an error if the key
    /// is unknown or the value does not fit the field.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: err.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: err.to_string(),
        })?;
        self.save()?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}
