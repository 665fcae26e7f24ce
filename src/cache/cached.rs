//! Cached-call wrapper.
//!
//! [`Cached`] wraps an async callable together with a tier configuration and
//! exposes three execution modes on the same object:
//!
//! - [`cached`](Cached::cached): consult the store first, execute on a miss
//!   and write the result back (the default, also available as
//!   [`call`](Cached::call))
//! - [`refresh`](Cached::refresh): always execute, then overwrite the cache
//! - [`cacheless`](Cached::cacheless): always execute, never touch the store
//!
//! Caching is transparent to the error contract: the wrapped callable's own
//! errors propagate unchanged through all three modes, while store faults
//! are absorbed inside [`TieredStore`].

use super::key::{build_key, resolve_identity, select_tier, IdentityResolver, ScopeIdentity};
use super::store::TieredStore;
use super::tier::CacheTier;
use crate::{Error, ErrorContext, Result};
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

type WrappedFn<A, R> = Arc<dyn Fn(A) -> BoxFuture<'static, Result<R>> + Send + Sync>;
type CachePredicate<R> = Arc<dyn Fn(&R) -> bool + Send + Sync>;

/// Builder for [`Cached`].
///
/// `target` identifies the wrapped callable inside derived keys; use a
/// stable `"module.function"`-shaped id. Without a tier the wrapper is
/// behaviorally identical to its cacheless mode.
pub struct CachedBuilder<A, R> {
    target: String,
    store: Arc<TieredStore>,
    func: WrappedFn<A, R>,
    tier: Option<CacheTier>,
    backend_tier: Option<CacheTier>,
    user_related: Option<bool>,
    compress: bool,
    is_cacheable: CachePredicate<R>,
    identity: Arc<dyn IdentityResolver>,
}

impl<A, R> CachedBuilder<A, R>
where
    A: Serialize + Send + 'static,
    R: Serialize + DeserializeOwned + Send + 'static,
{
    pub fn new<F, Fut>(target: impl Into<String>, store: Arc<TieredStore>, func: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R>> + Send + 'static,
    {
        let wrapped: WrappedFn<A, R> =
            Arc::new(move |args| -> BoxFuture<'static, Result<R>> { Box::pin(func(args)) });
        Self {
            target: target.into(),
            store,
            func: wrapped,
            tier: None,
            backend_tier: None,
            user_related: None,
            compress: true,
            is_cacheable: Arc::new(|_| true),
            identity: Arc::new(ScopeIdentity),
        }
    }

    /// The tier enabling caching. Omitting it leaves the wrapper cacheless.
    pub fn tier(mut self, tier: CacheTier) -> Self {
        self.tier = Some(tier);
        self
    }

    /// A distinct tier used when the acting identity resolves to backend.
    pub fn backend_tier(mut self, tier: CacheTier) -> Self {
        self.backend_tier = Some(tier);
        self
    }

    /// Explicit user-affinity override. Takes priority over the tier's own
    /// flag; when neither is given, keys are user-scoped.
    pub fn user_related(mut self, user_related: bool) -> Self {
        self.user_related = Some(user_related);
        self
    }

    /// Disables zlib compression of stored payloads.
    pub fn compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Predicate deciding whether a freshly computed result is written back.
    /// Defaults to caching every result.
    pub fn cache_when<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&R) -> bool + Send + Sync + 'static,
    {
        self.is_cacheable = Arc::new(predicate);
        self
    }

    /// Replaces the identity resolver (defaults to the current
    /// [`RequestScope`]'s username).
    ///
    /// [`RequestScope`]: crate::context::RequestScope
    pub fn identity_resolver(mut self, resolver: Arc<dyn IdentityResolver>) -> Self {
        self.identity = resolver;
        self
    }

    /// Validates the configuration. Misconfiguration is the one fault this
    /// subsystem surfaces as a hard error.
    pub fn build(self) -> Result<Cached<A, R>> {
        if self.target.is_empty() {
            return Err(Error::configuration_with_context(
                "cached target id must not be empty",
                ErrorContext::new()
                    .with_field_path("builder.target")
                    .with_source("cached_builder"),
            ));
        }
        for (slot, tier) in [("tier", &self.tier), ("backend_tier", &self.backend_tier)] {
            if let Some(tier) = tier {
                if tier.key.is_empty() {
                    return Err(Error::configuration_with_context(
                        "cache tier namespace must not be empty",
                        ErrorContext::new()
                            .with_field_path(format!("builder.{}.key", slot))
                            .with_source("cached_builder"),
                    ));
                }
            }
        }
        let user_related = self
            .user_related
            .or_else(|| self.tier.as_ref().and_then(|t| t.user_related))
            .unwrap_or(true);
        Ok(Cached {
            target: self.target,
            store: self.store,
            func: self.func,
            tier: self.tier,
            backend_tier: self.backend_tier,
            user_related,
            compress: self.compress,
            is_cacheable: self.is_cacheable,
            identity: self.identity,
        })
    }
}

/// An async callable wrapped with tiered caching.
pub struct Cached<A, R> {
    target: String,
    store: Arc<TieredStore>,
    func: WrappedFn<A, R>,
    tier: Option<CacheTier>,
    backend_tier: Option<CacheTier>,
    user_related: bool,
    compress: bool,
    is_cacheable: CachePredicate<R>,
    identity: Arc<dyn IdentityResolver>,
}

impl<A, R> Cached<A, R>
where
    A: Serialize + Send + 'static,
    R: Serialize + DeserializeOwned + Send + 'static,
{
    /// Default entry point, same as [`Cached::cached`].
    pub async fn call(&self, args: A) -> Result<R> {
        self.cached(args).await
    }

    /// Returns the cached value when present; otherwise executes the
    /// wrapped callable and writes the result back. With caching disabled
    /// (no tier, or a zero timeout) this is exactly the cacheless path.
    pub async fn cached(&self, args: A) -> Result<R> {
        match self.invocation_key(&args) {
            Some((key, timeout)) => {
                if let Some(hit) = self.store.get::<R>(&key, self.compress).await {
                    return Ok(hit);
                }
                self.execute_and_store(args, Some((key, timeout))).await
            }
            None => self.cacheless(args).await,
        }
    }

    /// Always executes the wrapped callable, then overwrites the cache when
    /// the acceptance predicate agrees. The fresh result is returned whether
    /// or not the write succeeds.
    pub async fn refresh(&self, args: A) -> Result<R> {
        let slot = self.invocation_key(&args);
        self.execute_and_store(args, slot).await
    }

    /// Executes the wrapped callable without reading or writing the store.
    pub async fn cacheless(&self, args: A) -> Result<R> {
        (self.func)(args).await
    }

    async fn execute_and_store(&self, args: A, slot: Option<(String, Duration)>) -> Result<R> {
        let value = (self.func)(args).await?;
        if let Some((key, timeout)) = slot {
            if (self.is_cacheable)(&value) {
                self.store.set(&key, &value, timeout, self.compress).await;
            }
        }
        Ok(value)
    }

    /// Derives the key and effective timeout for this invocation, or `None`
    /// when caching is disabled for it.
    fn invocation_key(&self, args: &A) -> Option<(String, Duration)> {
        let identity = resolve_identity(self.user_related, &*self.identity);
        let tier = select_tier(self.tier.as_ref(), self.backend_tier.as_ref(), &identity)?;
        if tier.timeout.is_zero() {
            return None;
        }
        let (positional, keyword) = project_args(serialize_args(args));
        let key = build_key(
            &self.store.config().key_prefix,
            tier,
            &self.target,
            &positional,
            &keyword,
            &identity,
        );
        Some((key, tier.timeout))
    }
}

/// Serializes the argument value for hashing. Key derivation never fails on
/// argument content: a value that cannot be serialized degrades to its
/// string form.
fn serialize_args<A: Serialize>(args: &A) -> Value {
    match serde_json::to_value(args) {
        Ok(value) => value,
        Err(err) => Value::String(format!("<unserializable: {}>", err)),
    }
}

/// Maps the serialized argument value onto the key layout's two hash slots:
/// an object fills the keyword slot, an array the positional slot, and any
/// other value becomes a single positional element.
fn project_args(value: Value) -> (Value, Value) {
    match value {
        Value::Object(map) => (Value::Array(Vec::new()), Value::Object(map)),
        Value::Array(items) => (Value::Array(items), Value::Object(serde_json::Map::new())),
        other => (Value::Array(vec![other]), Value::Object(serde_json::Map::new())),
    }
}

/// Convenience constructor mirroring `CachedBuilder::new(...).tier(...)`.
pub fn cached_fn<A, R, F, Fut>(
    target: impl Into<String>,
    store: Arc<TieredStore>,
    tier: CacheTier,
    func: F,
) -> Result<Cached<A, R>>
where
    A: Serialize + Send + 'static,
    R: Serialize + DeserializeOwned + Send + 'static,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R>> + Send + 'static,
{
    CachedBuilder::new(target, store, func).tier(tier).build()
}
