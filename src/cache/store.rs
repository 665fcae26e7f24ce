//! Tiered read-through/write-through store.
//!
//! Read path: request-local map (when enabled) → shared in-memory mirror →
//! shared durable store; the first non-empty answer wins, and shared-store
//! hits are backfilled into the request-local map.
//!
//! Write path: write-through to the in-memory mirror with a fixed short TTL
//! and to the durable store with the tier's timeout.
//!
//! Every backend fault is caught at this boundary, logged with the in-flight
//! request path when one is resolvable, and swallowed: a failing cache must
//! degrade to "as if uncached", never break the caller.

use super::backend::CacheBackend;
use super::codec;
use crate::config::CacheConfig;
use crate::context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// TTL of the shared in-memory mirror. Fixed regardless of the tier timeout:
/// the mirror exists to dedupe lookups within a short window, not to hold
/// data long-term.
// TODO(product): confirm the 60s dedupe window is intentional rather than an
// inherited default before exposing it as a tunable.
pub(crate) const MEM_MIRROR_TTL: Duration = Duration::from_secs(60);

/// Counters for cache effectiveness.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub errors: u64,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Default)]
struct AtomicStats {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    errors: AtomicU64,
}

impl AtomicStats {
    fn to_stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// The two-to-three-level store behind every cached call.
///
/// Owns no backend lifecycle; the durable store is authoritative, the
/// optional in-memory mirror dedupes short-window lookups, and the
/// request-local tier lives in the current [`RequestScope`].
///
/// [`RequestScope`]: crate::context::RequestScope
pub struct TieredStore {
    durable: Arc<dyn CacheBackend>,
    mem: Option<Arc<dyn CacheBackend>>,
    config: CacheConfig,
    stats: AtomicStats,
}

impl TieredStore {
    pub fn new(durable: Arc<dyn CacheBackend>) -> Self {
        Self {
            durable,
            mem: None,
            config: CacheConfig::default(),
            stats: AtomicStats::default(),
        }
    }

    /// Adds a shared in-memory mirror checked before the durable store.
    pub fn with_mem_mirror(mut self, mem: Arc<dyn CacheBackend>) -> Self {
        self.mem = Some(mem);
        self
    }

    pub fn with_config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.to_stats()
    }

    /// Looks `key` up across the tiers. Decode failures and backend faults
    /// read as `None`; a shared-store hit is backfilled into the
    /// request-local map when the local tier is enabled.
    pub async fn get<T: DeserializeOwned + Serialize>(&self, key: &str, compress: bool) -> Option<T> {
        if self.config.local_cache_enabled {
            if let Some(text) = context::local_get(key) {
                if let Ok(value) = serde_json::from_str::<T>(&text) {
                    self.stats.hits.fetch_add(1, Ordering::Relaxed);
                    return Some(value);
                }
            }
        }

        let raw = match self.mem_get(key).await {
            Some(bytes) => Some(bytes),
            None => self.durable_get(key).await,
        };
        let Some(bytes) = raw else {
            self.stats.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        };

        let Some(value) = codec::decode::<T>(&bytes, compress) else {
            self.stats.errors.fetch_add(1, Ordering::Relaxed);
            self.stats.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        };

        if self.config.local_cache_enabled {
            if let Ok(text) = serde_json::to_string(&value) {
                context::local_set(key, text);
            }
        }
        self.stats.hits.fetch_add(1, Ordering::Relaxed);
        Some(value)
    }

    /// Writes `value` through the mirror and the durable store. Encoding
    /// failures skip the write; backend faults are logged and swallowed.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, timeout: Duration, compress: bool) {
        let bytes = match codec::encode(value, compress) {
            Ok(bytes) => bytes,
            Err(err) => {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(key, error = %err, "cache value is not JSON-serializable, skipping write");
                return;
            }
        };

        if let Some(ref mem) = self.mem {
            if let Err(err) = mem.set(key, &bytes, MEM_MIRROR_TTL).await {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(key, backend = mem.name(), error = %err, "mem mirror write failed");
            }
        }

        if let Err(err) = self.durable.set(key, &bytes, timeout).await {
            self.stats.errors.fetch_add(1, Ordering::Relaxed);
            let path = context::request_path().unwrap_or_default();
            tracing::warn!(
                key,
                backend = self.durable.name(),
                request_path = %path,
                error = %err,
                "durable cache write failed"
            );
            return;
        }
        self.stats.sets.fetch_add(1, Ordering::Relaxed);
    }

    async fn mem_get(&self, key: &str) -> Option<Vec<u8>> {
        let mem = self.mem.as_ref()?;
        match mem.get(key).await {
            Ok(bytes) => bytes,
            Err(err) => {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key, backend = mem.name(), error = %err, "mem mirror read failed");
                None
            }
        }
    }

    async fn durable_get(&self, key: &str) -> Option<Vec<u8>> {
        match self.durable.get(key).await {
            Ok(bytes) => bytes,
            Err(err) => {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key, backend = self.durable.name(), error = %err, "durable cache read failed");
                None
            }
        }
    }
}
