//! Cache tier descriptors.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// An immutable descriptor of one cache tier: a key namespace, a TTL and a
/// user-affinity flag.
///
/// A zero `timeout` means "do not cache". `user_related` is tri-state:
/// `None` defers to the wrapper's default (user-scoped).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheTier {
    /// Namespace for keys derived under this tier.
    pub key: String,
    /// Entry lifetime in the durable store.
    pub timeout: Duration,
    /// Whether keys are scoped per acting user. `None` means unspecified.
    pub user_related: Option<bool>,
    /// Human description. Not functional.
    pub label: String,
}

impl CacheTier {
    pub fn new(key: impl Into<String>, timeout: Duration) -> Self {
        Self {
            key: key.into(),
            timeout,
            user_related: None,
            label: String::new(),
        }
    }

    pub fn with_user_related(mut self, user_related: bool) -> Self {
        self.user_related = Some(user_related);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Derives a copy with a different TTL. Same identity, new timeout; the
    /// original descriptor is never mutated.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            key: self.key.clone(),
            timeout,
            user_related: self.user_related,
            label: self.label.clone(),
        }
    }
}
