//! Tiered request/response caching.
//!
//! ## Overview
//!
//! This module wraps business-logic callables in a multi-tier cache:
//! a request-local map for lookups within one unit of work, an optional
//! shared in-memory mirror for short-window deduplication, and a shared
//! durable store holding entries for the configured tier timeout. Cache
//! faults never reach the caller; a broken store degrades to "as if
//! uncached".
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`Cached`] / [`CachedBuilder`] | Wraps a callable with cached / refresh / cacheless entry points |
//! | [`CacheTier`] | Tier descriptor: key namespace, TTL and user affinity |
//! | [`TieredStore`] | Read-through/write-through store across the tiers |
//! | [`CacheBackend`] | Trait for pluggable shared stores |
//! | [`MemoryBackend`] | Process-wide in-memory store implementation |
//! | [`NullBackend`] | No-op store for disabled tiers |
//! | [`InstanceCache`] | Simple process-wide memoization table with TTLs |
//!
//! ## Cache Key Derivation
//!
//! Keys combine the configured prefix, the tier namespace, the wrapped
//! callable's target id, canonical content hashes of the invocation
//! arguments, and the resolved acting identity (a username, or the
//! `backend` sentinel). Identical invocations always derive identical keys;
//! any change in arguments, tier or identity changes the key.
//!
//! ## Example
//!
//! ```rust,no_run
//! use reqcache::{CacheTier, CachedBuilder, MemoryBackend, TieredStore};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn demo() -> reqcache::Result<()> {
//! let store = Arc::new(TieredStore::new(Arc::new(MemoryBackend::new(10_000))));
//! let lookup = CachedBuilder::new("catalog.fetch_item", store, |id: u64| async move {
//!     reqcache::Result::Ok(format!("item-{}", id))
//! })
//! .tier(CacheTier::new("catalog", Duration::from_secs(300)))
//! .build()?;
//!
//! let item = lookup.cached(42).await?;       // store-first
//! let fresh = lookup.refresh(42).await?;     // recompute + overwrite
//! let direct = lookup.cacheless(42).await?;  // never touches the store
//! # Ok(())
//! # }
//! ```

mod backend;
mod cached;
mod codec;
mod instance;
mod key;
mod store;
mod tier;

pub use backend::{CacheBackend, MemoryBackend, NullBackend};
pub use cached::{cached_fn, Cached, CachedBuilder};
pub use instance::InstanceCache;
pub use key::{
    build_key, content_hash, resolve_identity, select_tier, Identity, IdentityResolver,
    ScopeIdentity,
};
pub use store::{CacheStats, TieredStore};
pub use tier::CacheTier;
