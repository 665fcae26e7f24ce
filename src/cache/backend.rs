//! Cache backend implementations.
//!
//! Backends store raw encoded bytes under derived keys. Single-key get/set
//! atomicity is the backend's concern; concurrent writers to one key race
//! and last-write-wins is the accepted semantics.

use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

#[derive(Clone)]
struct CacheEntry {
    data: Vec<u8>,
    created_at: Instant,
    ttl: Duration,
    last_accessed: Instant,
}

impl CacheEntry {
    fn new(data: Vec<u8>, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            data,
            created_at: now,
            ttl,
            last_accessed: now,
        }
    }
    fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.ttl
    }
}

/// A shared store holding raw encoded payloads with per-entry TTLs.
///
/// Implementations must be safe to call from many tasks at once and should
/// fail fast: a slow or unreachable store is handled by the store client's
/// own timeouts, not at this layer.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<bool>;
    async fn exists(&self, key: &str) -> Result<bool>;
    async fn clear(&self) -> Result<()>;
    async fn len(&self) -> Result<usize>;
    fn name(&self) -> &'static str;
}

/// Process-wide in-memory backend with lazy expiry and least-recent-access
/// eviction once `max_entries` is reached.
pub struct MemoryBackend {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    max_entries: usize,
}

impl MemoryBackend {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            max_entries,
        }
    }
    fn evict_if_needed(&self, entries: &mut HashMap<String, CacheEntry>) {
        entries.retain(|_, e| !e.is_expired());
        while entries.len() >= self.max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.last_accessed)
                .map(|(k, _)| k.clone());
            if let Some(k) = oldest {
                entries.remove(&k);
            } else {
                break;
            }
        }
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut entries = self.entries.write().unwrap();
        if let Some(entry) = entries.get_mut(key) {
            if entry.is_expired() {
                entries.remove(key);
                return Ok(None);
            }
            entry.last_accessed = Instant::now();
            return Ok(Some(entry.data.clone()));
        }
        Ok(None)
    }
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        let mut entries = self.entries.write().unwrap();
        self.evict_if_needed(&mut entries);
        entries.insert(key.to_string(), CacheEntry::new(value.to_vec(), ttl));
        Ok(())
    }
    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.entries.write().unwrap().remove(key).is_some())
    }
    async fn exists(&self, key: &str) -> Result<bool> {
        let entries = self.entries.read().unwrap();
        Ok(entries.get(key).map(|e| !e.is_expired()).unwrap_or(false))
    }
    async fn clear(&self) -> Result<()> {
        self.entries.write().unwrap().clear();
        Ok(())
    }
    async fn len(&self) -> Result<usize> {
        Ok(self
            .entries
            .read()
            .unwrap()
            .values()
            .filter(|e| !e.is_expired())
            .count())
    }
    fn name(&self) -> &'static str {
        "memory"
    }
}

/// No-op backend for disabling a tier.
pub struct NullBackend;
impl NullBackend {
    pub fn new() -> Self {
        Self
    }
}
impl Default for NullBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheBackend for NullBackend {
    async fn get(&self, _: &str) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }
    async fn set(&self, _: &str, _: &[u8], _: Duration) -> Result<()> {
        Ok(())
    }
    async fn delete(&self, _: &str) -> Result<bool> {
        Ok(false)
    }
    async fn exists(&self, _: &str) -> Result<bool> {
        Ok(false)
    }
    async fn clear(&self) -> Result<()> {
        Ok(())
    }
    async fn len(&self) -> Result<usize> {
        Ok(0)
    }
    fn name(&self) -> &'static str {
        "null"
    }
}
