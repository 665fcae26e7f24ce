//! Process-wide key/value memoization with simple TTLs.
//!
//! Independent of the tiered store: no compression, no user scoping, no
//! distribution. One coarse lock guards the table; callers needing isolation
//! should use distinct key namespaces rather than rely on per-key locking.

use once_cell::sync::Lazy;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

static GLOBAL: Lazy<InstanceCache> = Lazy::new(InstanceCache::new);

fn epoch_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// A process-local table of `(value, expiry)` entries.
///
/// Expiry of `0.0` means "never expires". Eviction is lazy: an expired entry
/// is removed by the next `get`/`exists` that touches its key, never by a
/// background sweep.
#[derive(Debug, Default)]
pub struct InstanceCache {
    entries: Mutex<HashMap<String, (Value, f64)>>,
}

impl InstanceCache {
    /// A fresh, independently owned cache, for dependency injection.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide instance: created on first access, lives for the
    /// process lifetime, clearable on demand. Prefer constructing and
    /// injecting [`InstanceCache::new`] where ownership allows.
    pub fn global() -> &'static InstanceCache {
        &GLOBAL
    }

    /// Stores `value` under `key` for `seconds` (`0` = never expires).
    ///
    /// With `use_round` the expiry is quantized down to the nearest multiple
    /// of `seconds` since the epoch, so independent callers using the same
    /// period share expiry boundaries.
    pub fn set(&self, key: impl Into<String>, value: Value, seconds: u64, use_round: bool) {
        let expiry = if seconds == 0 {
            0.0
        } else {
            let period = seconds as f64;
            let deadline = epoch_secs() + period;
            if use_round {
                (deadline / period).floor() * period
            } else {
                deadline
            }
        };
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.into(), (value, expiry));
        }
    }

    fn get_raw(&self, key: &str) -> Option<Value> {
        let mut entries = self.entries.lock().ok()?;
        let expiry = entries.get(key)?.1;
        if expiry > 0.0 && epoch_secs() > expiry {
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|(value, _)| value.clone())
    }

    /// Returns the live value under `key`.
    ///
    /// `None` is returned for an absent key, an expired key, and a stored
    /// JSON `null` alike; callers cannot distinguish the three. This is a
    /// documented limitation, kept for compatibility.
    pub fn get(&self, key: &str) -> Option<Value> {
        match self.get_raw(key) {
            Some(Value::Null) | None => None,
            Some(value) => Some(value),
        }
    }

    /// True while a live entry exists under `key` (including a stored
    /// `null`, unlike [`get`](InstanceCache::get)).
    pub fn exists(&self, key: &str) -> bool {
        self.get_raw(key).is_some()
    }

    /// Removes `key`. No-op when absent.
    pub fn delete(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }

    /// Drops every entry.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_set_get_without_expiry() {
        let cache = InstanceCache::new();
        cache.set("k", json!({"v": 1}), 0, false);
        assert_eq!(cache.get("k"), Some(json!({"v": 1})));
        assert!(cache.exists("k"));
    }

    #[test]
    fn test_expiry_evicts_lazily() {
        let cache = InstanceCache::new();
        cache.set("k", json!("short-lived"), 1, false);
        assert_eq!(cache.get("k"), Some(json!("short-lived")));
        std::thread::sleep(Duration::from_millis(1100));
        assert_eq!(cache.get("k"), None);
        assert!(!cache.exists("k"));
    }

    #[test]
    fn test_rounded_expiry_shares_boundary() {
        let cache = InstanceCache::new();
        let period = 3600u64;
        cache.set("a", json!(1), period, true);
        std::thread::sleep(Duration::from_millis(20));
        cache.set("b", json!(2), period, true);
        let entries = cache.entries.lock().unwrap();
        let expiry_a = entries.get("a").unwrap().1;
        let expiry_b = entries.get("b").unwrap().1;
        assert_eq!(expiry_a, expiry_b);
        assert_eq!(expiry_a % period as f64, 0.0);
    }

    #[test]
    fn test_stored_null_reads_as_miss_but_exists() {
        let cache = InstanceCache::new();
        cache.set("k", Value::Null, 0, false);
        assert_eq!(cache.get("k"), None);
        assert!(cache.exists("k"));
    }

    #[test]
    fn test_delete_and_clear() {
        let cache = InstanceCache::new();
        cache.set("a", json!(1), 0, false);
        cache.set("b", json!(2), 0, false);
        cache.delete("a");
        cache.delete("a"); // absent: no-op
        assert!(!cache.exists("a"));
        assert!(cache.exists("b"));
        cache.clear();
        assert!(!cache.exists("b"));
    }

    #[test]
    fn test_global_is_shared() {
        let marker = json!("global-instance-cache-marker");
        InstanceCache::global().set("test_global_is_shared", marker.clone(), 0, false);
        assert_eq!(InstanceCache::global().get("test_global_is_shared"), Some(marker));
        InstanceCache::global().delete("test_global_is_shared");
    }
}
