//! Cache configuration.

/// Configuration shared by the tiered store and the cached-call wrappers.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Enables the request-local tier. When on, shared-store hits are
    /// backfilled into the current [`RequestScope`](crate::context::RequestScope)
    /// so repeated lookups within one unit of work skip the shared stores.
    pub local_cache_enabled: bool,
    /// Namespace prepended to every derived cache key.
    pub key_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            local_cache_enabled: false,
            key_prefix: "web_cache".to_string(),
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_local_cache(mut self, enabled: bool) -> Self {
        self.local_cache_enabled = enabled;
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }
}
