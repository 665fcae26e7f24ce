//! Request-scoped execution context.
//!
//! A [`RequestScope`] carries the state that is private to one logical unit
//! of work (typically one inbound request or one background job): the acting
//! username, the request path used for log context, and the request-local
//! cache tier.
//!
//! The scope is entered with [`RequestScope::enter`], which runs a future
//! with the scope installed as a task-local and tears it down on every exit
//! path, including panics and cancellation. There is no global map keyed by
//! thread id; concurrent tasks each see their own scope.
//!
//! All accessors are total: outside a scope they return `None` or do
//! nothing, so ambient code can call them unconditionally.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

tokio::task_local! {
    static REQUEST_SCOPE: Arc<ScopeInner>;
}

#[derive(Debug, Default)]
struct ScopeInner {
    username: Option<String>,
    path: Option<String>,
    local: Mutex<HashMap<String, String>>,
}

/// State owned by one logical unit of work.
///
/// ```rust
/// use reqcache::context::{self, RequestScope};
///
/// # async fn handler() {
/// RequestScope::new()
///     .with_username("alice")
///     .with_path("/api/v1/things")
///     .enter(async {
///         assert_eq!(context::current_username().as_deref(), Some("alice"));
///     })
///     .await;
/// # }
/// ```
#[derive(Debug, Default)]
pub struct RequestScope {
    inner: ScopeInner,
}

impl RequestScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// A scope for background work with no acting user.
    pub fn backend() -> Self {
        Self::new()
    }

    /// Sets the acting username, e.g. for background workers that act on a
    /// user's behalf.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.inner.username = Some(username.into());
        self
    }

    /// Sets the in-flight request path, used only as log context when a
    /// store write fails.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.inner.path = Some(path.into());
        self
    }

    /// Runs `fut` with this scope installed. The scope and its local cache
    /// entries are dropped when the future completes.
    pub async fn enter<F: Future>(self, fut: F) -> F::Output {
        REQUEST_SCOPE.scope(Arc::new(self.inner), fut).await
    }
}

/// The acting username of the current scope, if any.
pub fn current_username() -> Option<String> {
    REQUEST_SCOPE
        .try_with(|scope| scope.username.clone())
        .ok()
        .flatten()
}

/// The in-flight request path of the current scope, if any.
pub fn request_path() -> Option<String> {
    REQUEST_SCOPE
        .try_with(|scope| scope.path.clone())
        .ok()
        .flatten()
}

/// Reads an entry from the request-local cache tier.
pub fn local_get(key: &str) -> Option<String> {
    REQUEST_SCOPE
        .try_with(|scope| scope.local.lock().ok().and_then(|map| map.get(key).cloned()))
        .ok()
        .flatten()
}

/// Writes an entry to the request-local cache tier. No-op outside a scope.
pub fn local_set(key: &str, value: String) {
    let _ = REQUEST_SCOPE.try_with(|scope| {
        if let Ok(mut map) = scope.local.lock() {
            map.insert(key.to_string(), value);
        }
    });
}

/// Drops all request-local cache entries of the current scope.
pub fn clear_local() {
    let _ = REQUEST_SCOPE.try_with(|scope| {
        if let Ok(mut map) = scope.local.lock() {
            map.clear();
        }
    });
}
