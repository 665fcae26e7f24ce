//! # reqcache
//!
//! Tiered request/response caching for service SDKs.
//!
//! ## Overview
//!
//! This library lets application teams wrap business-logic callables in a
//! decorator-style cache without re-implementing storage plumbing. A wrapped
//! callable gains three execution modes sharing one key derivation and one
//! store: cached (store-first), forced refresh (recompute and overwrite) and
//! cacheless (guaranteed-fresh, store untouched).
//!
//! ## Core Philosophy
//!
//! - **Transparent failure**: adding caching to a function never changes its
//!   error behavior, only its latency and freshness. Store faults are logged
//!   and absorbed; only misconfiguration fails loudly, at build time.
//! - **Deterministic keys**: cache keys are content-addressed from
//!   canonicalized arguments and the resolved acting identity, independent
//!   of map insertion order.
//! - **Scoped state**: request-local data lives in an explicitly entered
//!   [`RequestScope`] with guaranteed cleanup, never in globals keyed by
//!   thread id.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use reqcache::{CacheTier, CachedBuilder, MemoryBackend, TieredStore};
//! use reqcache::context::RequestScope;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> reqcache::Result<()> {
//!     let store = Arc::new(TieredStore::new(Arc::new(MemoryBackend::new(10_000))));
//!
//!     let profile = CachedBuilder::new("accounts.load_profile", store, |user_id: u64| async move {
//!         // expensive lookup elsewhere
//!         reqcache::Result::Ok(format!("profile-{}", user_id))
//!     })
//!     .tier(CacheTier::new("accounts", Duration::from_secs(300)))
//!     .build()?;
//!
//!     RequestScope::new()
//!         .with_username("alice")
//!         .with_path("/api/profile")
//!         .enter(async {
//!             let first = profile.cached(7).await?;   // computes and stores
//!             let second = profile.cached(7).await?;  // served from cache
//!             assert_eq!(first, second);
//!             reqcache::Result::Ok(())
//!         })
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cache`] | Tier descriptors, key derivation, tiered store, cached-call wrapper, instance cache |
//! | [`config`] | Cache configuration (local tier switch, key prefix) |
//! | [`context`] | Request-scoped state: acting user, request path, request-local tier |
//! | [`error`] | Error and context types |

pub mod cache;
pub mod config;
pub mod context;
pub mod error;

pub use cache::{
    cached_fn, CacheBackend, CacheStats, CacheTier, Cached, CachedBuilder, Identity,
    IdentityResolver, InstanceCache, MemoryBackend, NullBackend, ScopeIdentity, TieredStore,
};
pub use config::CacheConfig;
pub use context::RequestScope;
pub use error::{Error, ErrorContext};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;
