//! Shared image cache keyed by source reference.
//!
//! A source is fetched at most once: the first request inserts a `Pending`
//! entry and asks the fetcher to start loading; every later request for the
//! same source, before or after resolution, gets the same entry. The host
//! reports completion through [`ImageCache::complete`], which notifies
//! subscribers so the canvas can redraw with the now-known image bounds.
//!
//! There is no cancellation. A load that lands after its node was deleted
//! just fills the cache.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Decoded RGBA8 pixels (straight alpha).
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    pub pixels: Arc<Vec<u8>>,
}

impl Raster {
    /// Expected RGBA8 buffer size, computed in `usize`.
    pub fn byte_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * 4
    }

    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(pixels.len(), Self::byte_len(width, height));
        Self {
            width,
            height,
            pixels: Arc::new(pixels),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ImageLoadError {
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("decode failed: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImageState {
    Pending,
    Ready(Raster),
    Failed(ImageLoadError),
}

/// Starts loading a source. Completion comes back via `ImageCache::complete`.
pub trait ImageFetcher {
    fn fetch(&mut self, source: &str);
}

impl<F: FnMut(&str)> ImageFetcher for F {
    fn fetch(&mut self, source: &str) {
        self(source)
    }
}

/// Cheap handle to a cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageHandle(Arc<str>);

impl ImageHandle {
    pub fn source(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone)]
pub struct ImageCacheConfig {
    /// Soft cap on entries. Pending entries and sources the document
    /// still uses are never evicted, so the cache may exceed it.
    pub max_entries: usize,
}

impl Default for ImageCacheConfig {
    fn default() -> Self {
        Self { max_entries: 512 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Fetches handed to an `ImageFetcher`.
    pub fetches: u64,
    pub evictions: u64,
}

pub type SubscriptionId = u64;

type Listener = Box<dyn FnMut(&str)>;

struct CacheEntry {
    state: ImageState,
    last_used: u64,
}

pub struct ImageCache {
    entries: HashMap<Arc<str>, CacheEntry>,
    config: ImageCacheConfig,
    stats: CacheStats,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: SubscriptionId,
    clock: u64,
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ImageCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageCache")
            .field("entries", &self.entries.len())
            .field("listeners", &self.listeners.len())
            .field("stats", &self.stats)
            .finish()
    }
}

impl ImageCache {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ImageCacheConfig::default())
    }

    #[must_use]
    pub fn with_config(config: ImageCacheConfig) -> Self {
        Self {
            entries: HashMap::new(),
            config,
            stats: CacheStats::default(),
            listeners: Vec::new(),
            next_subscription: 0,
            clock: 0,
        }
    }

    /// Handle for `source`, starting a fetch only if the source was never
    /// requested before.
    pub fn get_or_fetch(&mut self, source: &str, fetcher: &mut dyn ImageFetcher) -> ImageHandle {
        self.clock += 1;
        if let Some(entry) = self.entries.get_mut(source) {
            entry.last_used = self.clock;
            self.stats.hits += 1;
            // The map key and the handle share one `Arc<str>`
            let key = self
                .entries
                .get_key_value(source)
                .map_or_else(|| Arc::from(source), |(k, _)| k.clone());
            return ImageHandle(key);
        }

        self.stats.misses += 1;
        self.stats.fetches += 1;
        let key: Arc<str> = Arc::from(source);
        self.entries.insert(
            key.clone(),
            CacheEntry {
                state: ImageState::Pending,
                last_used: self.clock,
            },
        );
        log::debug!("fetching image {source}");
        fetcher.fetch(source);
        ImageHandle(key)
    }

    pub fn state(&self, source: &str) -> Option<&ImageState> {
        self.entries.get(source).map(|e| &e.state)
    }

    /// The raster for `source`, once it has loaded.
    pub fn raster(&self, source: &str) -> Option<&Raster> {
        match self.state(source) {
            Some(ImageState::Ready(raster)) => Some(raster),
            _ => None,
        }
    }

    /// Record the outcome of a fetch and notify subscribers.
    pub fn complete(&mut self, source: &str, result: Result<Raster, ImageLoadError>) {
        self.clock += 1;
        let state = match result {
            Ok(raster) => ImageState::Ready(raster),
            Err(err) => {
                log::warn!("image {source} failed to load: {err}");
                ImageState::Failed(err)
            }
        };
        match self.entries.get_mut(source) {
            Some(entry) => {
                entry.state = state;
                entry.last_used = self.clock;
            }
            None => {
                self.entries.insert(
                    Arc::from(source),
                    CacheEntry {
                        state,
                        last_used: self.clock,
                    },
                );
            }
        }
        for (_, listener) in &mut self.listeners {
            listener(source);
        }
    }

    /// Fetch a failed source again. No-op for pending or loaded sources.
    pub fn retry(&mut self, source: &str, fetcher: &mut dyn ImageFetcher) -> bool {
        match self.entries.get_mut(source) {
            Some(entry) if matches!(entry.state, ImageState::Failed(_)) => {
                entry.state = ImageState::Pending;
                self.stats.fetches += 1;
                fetcher.fetch(source);
                true
            }
            _ => false,
        }
    }

    /// Call `listener(source)` whenever an entry resolves.
    pub fn subscribe(&mut self, listener: impl FnMut(&str) + 'static) -> SubscriptionId {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Trim the cache back towards `max_entries`, least recently used
    /// first. Only resolved entries that `live` rejects are candidates, so a
    /// source still referenced by the document is never fetched twice.
    pub fn retain_live(&mut self, live: impl Fn(&str) -> bool) {
        while self.entries.len() > self.config.max_entries {
            let victim = self
                .entries
                .iter()
                .filter(|(k, e)| !matches!(e.state, ImageState::Pending) && !live(k))
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| k.clone());
            match victim {
                Some(key) => {
                    self.entries.remove(&key);
                    self.stats.evictions += 1;
                }
                None => break,
            }
        }
    }
}
