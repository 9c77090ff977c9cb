//! Named asset caches.
//!
//! A store holds any number of named caches, each mapping canonical URLs
//! to byte payloads. The persistent implementation lives on the SQLite
//! database; [`MemoryCacheStore`] backs tests and ephemeral runs.

use std::collections::BTreeMap;

use crate::error::CacheError;

/// One cached payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedAsset {
    pub url: String,
    pub bytes: Vec<u8>,
}

impl CachedAsset {
    /// An empty body marks a write that never completed. Readers purge
    /// such entries and treat the lookup as a miss.
    pub fn is_valid(&self) -> bool {
        !self.bytes.is_empty()
    }
}

/// Storage for named caches of `url -> bytes`.
pub trait CacheStore: Send {
    fn get(&self, cache_name: &str, url: &str) -> Result<Option<CachedAsset>, CacheError>;

    /// Insert or overwrite. Re-caching identical bytes is harmless;
    /// writes are last-writer-wins.
    fn put(&mut self, cache_name: &str, url: &str, bytes: &[u8]) -> Result<(), CacheError>;

    /// Remove one entry. Returns whether it existed.
    fn delete(&mut self, cache_name: &str, url: &str) -> Result<bool, CacheError>;

    /// Drop a whole named cache. Returns whether it existed.
    fn delete_cache(&mut self, cache_name: &str) -> Result<bool, CacheError>;

    fn cache_names(&self) -> Result<Vec<String>, CacheError>;

    fn contains(&self, cache_name: &str, url: &str) -> Result<bool, CacheError> {
        Ok(self.get(cache_name, url)?.is_some())
    }
}

/// In-memory store. Caches spring into existence on first write, like
/// opening a named cache.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    caches: BTreeMap<String, BTreeMap<String, Vec<u8>>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, cache_name: &str, url: &str) -> Result<Option<CachedAsset>, CacheError> {
        Ok(self.caches.get(cache_name).and_then(|cache| {
            cache.get(url).map(|bytes| CachedAsset {
                url: url.to_string(),
                bytes: bytes.clone(),
            })
        }))
    }

    fn put(&mut self, cache_name: &str, url: &str, bytes: &[u8]) -> Result<(), CacheError> {
        self.caches
            .entry(cache_name.to_string())
            .or_default()
            .insert(url.to_string(), bytes.to_vec());
        Ok(())
    }

    fn delete(&mut self, cache_name: &str, url: &str) -> Result<bool, CacheError> {
        Ok(self
            .caches
            .get_mut(cache_name)
            .map(|cache| cache.remove(url).is_some())
            .unwrap_or(false))
    }

    fn delete_cache(&mut self, cache_name: &str) -> Result<bool, CacheError> {
        Ok(self.caches.remove(cache_name).is_some())
    }

    fn cache_names(&self) -> Result<Vec<String>, CacheError> {
        Ok(self.caches.keys().cloned().collect())
    }
}
