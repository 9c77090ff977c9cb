//! Asset cache worker.
//!
//! Serves fetches cache-first with network fallback, seeds the app shell
//! at install, and keeps the 30-minute guidance track available offline.
//! The one non-negotiable rule: a range request never writes to the cache.
//! Caching a partial byte range would corrupt every future full read, so
//! ranges always go straight to network and a cached full copy is only an
//! offline fallback.

use std::sync::mpsc;
use std::thread;

use url::Url;

use crate::cache::store::{CachedAsset, CacheStore};
use crate::error::CacheError;
use crate::storage::CacheConfig;

/// Inclusive byte range of a partial-content request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    /// `None` means "to end of resource".
    pub end: Option<u64>,
}

impl ByteRange {
    /// `Range` header value, e.g. `bytes=0-1023` or `bytes=512-`.
    pub fn header_value(&self) -> String {
        match self.end {
            Some(end) => format!("bytes={}-{}", self.start, end),
            None => format!("bytes={}-", self.start),
        }
    }
}

/// One intercepted fetch.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: Url,
    pub range: Option<ByteRange>,
}

impl FetchRequest {
    pub fn full(url: Url) -> Self {
        Self { url, range: None }
    }

    pub fn ranged(url: Url, start: u64, end: Option<u64>) -> Self {
        Self {
            url,
            range: Some(ByteRange { start, end }),
        }
    }
}

/// What a fetch produced, from network, cache, or synthesized locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Vec<u8>,
    /// Whether the response came from the configured origin. Cross-origin
    /// responses are served but never cached.
    pub same_origin: bool,
}

impl FetchResponse {
    fn from_cached(asset: &CachedAsset) -> Self {
        Self {
            status: 200,
            body: asset.bytes.clone(),
            same_origin: true,
        }
    }

    /// Synthetic 503 for app-shell fetches that failed with no cache entry.
    pub fn offline() -> Self {
        Self {
            status: 503,
            body: b"Offline - Resource not available".to_vec(),
            same_origin: true,
        }
    }

    /// Synthetic 503 for audio fetches that failed with no cache entry.
    pub fn audio_unavailable() -> Self {
        Self {
            status: 503,
            body: b"Audio not available".to_vec(),
            same_origin: true,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Performs the actual network I/O. Blocking by design: the worker runs on
/// its own thread, never on the async runtime.
pub trait AssetFetcher: Send {
    fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, CacheError>;
}

/// `reqwest`-backed fetcher.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    origin: Url,
}

impl HttpFetcher {
    pub fn new(origin: Url) -> Result<Self, CacheError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self { client, origin })
    }
}

impl AssetFetcher for HttpFetcher {
    fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, CacheError> {
        let mut builder = self.client.get(request.url.clone());
        if let Some(range) = &request.range {
            builder = builder.header(reqwest::header::RANGE, range.header_value());
        }
        let response = builder.send().map_err(|err| CacheError::Fetch {
            url: request.url.to_string(),
            message: err.to_string(),
        })?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .map_err(|err| CacheError::Fetch {
                url: request.url.to_string(),
                message: err.to_string(),
            })?
            .to_vec();
        Ok(FetchResponse {
            status,
            body,
            same_origin: same_origin(&self.origin, &request.url),
        })
    }
}

fn same_origin(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.host_str() == b.host_str()
        && a.port_or_known_default() == b.port_or_known_default()
}

/// Result of an audio preload request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreloadOutcome {
    AlreadyCached,
    Cached,
}

/// The cache worker proper. Owns a store and a fetcher; all operations are
/// synchronous and run off the async runtime.
pub struct CacheWorker {
    store: Box<dyn CacheStore>,
    fetcher: Box<dyn AssetFetcher>,
    config: CacheConfig,
}

impl CacheWorker {
    pub fn new(
        store: Box<dyn CacheStore>,
        fetcher: Box<dyn AssetFetcher>,
        config: CacheConfig,
    ) -> Self {
        Self {
            store,
            fetcher,
            config,
        }
    }

    /// Seed the shell cache with every app-shell asset, all-or-nothing:
    /// if any fetch fails, nothing is written.
    pub fn install(&mut self) -> Result<(), CacheError> {
        let mut fetched = Vec::with_capacity(self.config.shell_assets.len());
        for asset in &self.config.shell_assets {
            let url = resolve(&self.config.base_url, asset)
                .map_err(|err| CacheError::InstallFailed(err.to_string()))?;
            let response = self
                .fetcher
                .fetch(&FetchRequest::full(url.clone()))
                .map_err(|err| CacheError::InstallFailed(err.to_string()))?;
            if !response.is_success() {
                return Err(CacheError::InstallFailed(format!(
                    "{url} returned status {}",
                    response.status
                )));
            }
            fetched.push((url, response.body));
        }
        for (url, body) in fetched {
            self.store
                .put(&self.config.shell_cache_name, url.as_str(), &body)?;
        }
        tracing::info!(
            cache = %self.config.shell_cache_name,
            assets = self.config.shell_assets.len(),
            "app shell cached"
        );
        Ok(())
    }

    /// Forward-only cache versioning: drop every cache whose name is
    /// neither the current shell nor audio cache. Returns deleted names.
    pub fn activate(&mut self) -> Result<Vec<String>, CacheError> {
        let mut deleted = Vec::new();
        for name in self.store.cache_names()? {
            if name != self.config.shell_cache_name && name != self.config.audio_cache_name {
                self.store.delete_cache(&name)?;
                tracing::info!(cache = %name, "deleted stale cache");
                deleted.push(name);
            }
        }
        Ok(deleted)
    }

    /// Serve one intercepted fetch. Network trouble never escapes as an
    /// error; total failure synthesizes a 503.
    pub fn handle_fetch(&mut self, request: &FetchRequest) -> Result<FetchResponse, CacheError> {
        if self.is_audio(&request.url) {
            self.handle_audio(request)
        } else {
            self.handle_shell(request)
        }
    }

    /// Idempotent warm-up of the guidance track.
    pub fn preload_audio(&mut self) -> Result<PreloadOutcome, CacheError> {
        let url = resolve(&self.config.base_url, &self.config.audio_asset)?;
        let key = url.as_str().to_string();
        match self.store.get(&self.config.audio_cache_name, &key)? {
            Some(asset) if asset.is_valid() => return Ok(PreloadOutcome::AlreadyCached),
            Some(_) => {
                self.store.delete(&self.config.audio_cache_name, &key)?;
            }
            None => {}
        }
        let response = self.fetcher.fetch(&FetchRequest::full(url))?;
        if !response.is_success() || response.body.is_empty() {
            return Err(CacheError::Fetch {
                url: key,
                message: format!("preload returned status {}", response.status),
            });
        }
        self.store
            .put(&self.config.audio_cache_name, &key, &response.body)?;
        tracing::info!(url = %key, bytes = response.body.len(), "audio track cached");
        Ok(PreloadOutcome::Cached)
    }

    /// Purge the audio cache. The track is re-fetched on next use.
    pub fn clear_audio_cache(&mut self) -> Result<bool, CacheError> {
        self.store.delete_cache(&self.config.audio_cache_name)
    }

    /// Whether a valid copy of the guidance track is cached.
    pub fn audio_cached(&self) -> Result<bool, CacheError> {
        let url = resolve(&self.config.base_url, &self.config.audio_asset)?;
        Ok(self
            .store
            .get(&self.config.audio_cache_name, url.as_str())?
            .map(|asset| asset.is_valid())
            .unwrap_or(false))
    }

    /// Names of the caches currently held in the store.
    pub fn cache_names(&self) -> Result<Vec<String>, CacheError> {
        self.store.cache_names()
    }

    fn is_audio(&self, url: &Url) -> bool {
        url.path().contains(self.config.audio_asset.as_str())
    }

    fn handle_audio(&mut self, request: &FetchRequest) -> Result<FetchResponse, CacheError> {
        let key = request.url.as_str().to_string();
        let cached = match self.store.get(&self.config.audio_cache_name, &key)? {
            Some(asset) if asset.is_valid() => Some(asset),
            Some(_) => {
                // Empty entry: a write that never completed. Purge it.
                self.store.delete(&self.config.audio_cache_name, &key)?;
                None
            }
            None => None,
        };

        if request.range.is_none() {
            if let Some(asset) = &cached {
                return Ok(FetchResponse::from_cached(asset));
            }
        }

        match self.fetcher.fetch(request) {
            Ok(response) => {
                if request.range.is_none() && response.is_success() && !response.body.is_empty() {
                    self.store
                        .put(&self.config.audio_cache_name, &key, &response.body)?;
                }
                Ok(response)
            }
            Err(err) => {
                tracing::warn!(url = %key, error = %err, "audio fetch failed");
                // A cached full copy still beats nothing, even for a
                // range request.
                match cached {
                    Some(asset) => Ok(FetchResponse::from_cached(&asset)),
                    None => Ok(FetchResponse::audio_unavailable()),
                }
            }
        }
    }

    fn handle_shell(&mut self, request: &FetchRequest) -> Result<FetchResponse, CacheError> {
        let key = request.url.as_str().to_string();
        // Lookup searches every named cache, like matching against the
        // whole cache storage.
        for name in self.store.cache_names()? {
            if let Some(asset) = self.store.get(&name, &key)? {
                if asset.is_valid() {
                    return Ok(FetchResponse::from_cached(&asset));
                }
            }
        }

        match self.fetcher.fetch(request) {
            Ok(response) => {
                if response.is_success() && response.same_origin {
                    self.store
                        .put(&self.config.shell_cache_name, &key, &response.body)?;
                }
                Ok(response)
            }
            Err(err) => {
                tracing::warn!(url = %key, error = %err, "shell fetch failed");
                Ok(FetchResponse::offline())
            }
        }
    }
}

fn resolve(base_url: &str, asset: &str) -> Result<Url, CacheError> {
    let base = Url::parse(base_url).map_err(|err| CacheError::Fetch {
        url: base_url.to_string(),
        message: format!("invalid base URL: {err}"),
    })?;
    base.join(asset).map_err(|err| CacheError::Fetch {
        url: asset.to_string(),
        message: format!("cannot resolve against base: {err}"),
    })
}

/// Commands the dedicated cache thread accepts.
pub enum CacheCommand {
    /// Reply: whether the track is cached afterwards.
    Preload(tokio::sync::oneshot::Sender<bool>),
    /// Reply: always false once the cache is purged.
    Clear(tokio::sync::oneshot::Sender<bool>),
}

/// Handle to the cache thread. Cheap to clone; the thread exits when the
/// last handle is dropped.
#[derive(Clone)]
pub struct CacheHandle {
    tx: mpsc::Sender<CacheCommand>,
}

impl CacheHandle {
    pub async fn preload(&self) -> Result<bool, CacheError> {
        let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();
        self.tx
            .send(CacheCommand::Preload(reply_tx))
            .map_err(|_| CacheError::WorkerGone)?;
        reply_rx.await.map_err(|_| CacheError::WorkerGone)
    }

    pub async fn clear(&self) -> Result<bool, CacheError> {
        let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();
        self.tx
            .send(CacheCommand::Clear(reply_tx))
            .map_err(|_| CacheError::WorkerGone)?;
        reply_rx.await.map_err(|_| CacheError::WorkerGone)
    }
}

/// Run a [`CacheWorker`] on its own thread with an mpsc command channel,
/// so async code can request preloads without blocking its tick loop.
pub fn spawn_cache_thread(mut worker: CacheWorker) -> CacheHandle {
    let (tx, rx) = mpsc::channel::<CacheCommand>();
    thread::spawn(move || {
        while let Ok(command) = rx.recv() {
            match command {
                CacheCommand::Preload(reply) => {
                    let cached = match worker.preload_audio() {
                        Ok(_) => true,
                        Err(err) => {
                            tracing::warn!(error = %err, "audio preload failed");
                            false
                        }
                    };
                    let _ = reply.send(cached);
                }
                CacheCommand::Clear(reply) => {
                    if let Err(err) = worker.clear_audio_cache() {
                        tracing::warn!(error = %err, "audio cache clear failed");
                    }
                    let _ = reply.send(false);
                }
            }
        }
    });
    CacheHandle { tx }
}
