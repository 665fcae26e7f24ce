//! Cache key derivation.
//!
//! Keys follow the fixed textual layout
//! `"<prefix>:<tier_key>:<target>:<args_hash>,<kwargs_hash>[<identity>]"`.
//! The layout is not versioned: changing the hash algorithm or component
//! order makes old entries unreachable, never corrupt.
//!
//! Content hashes are computed over canonicalized arguments so that a key is
//! independent of map insertion order and of container element order:
//! object keys are sorted before hashing, and arrays are hashed element-wise
//! with the set of element hashes sorted before the final hash.

use super::tier::CacheTier;
use crate::context;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// The resolved acting identity for key derivation.
///
/// `Backend` is the sentinel used when no per-user scoping is requested or
/// no user context is resolvable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    User(String),
    Backend,
}

impl Identity {
    pub fn as_str(&self) -> &str {
        match self {
            Identity::User(username) => username,
            Identity::Backend => "backend",
        }
    }

    pub fn is_backend(&self) -> bool {
        matches!(self, Identity::Backend)
    }
}

/// Supplies the current acting username, or `None` when there is no user
/// context. Implementations must not panic; absence is the failure mode.
pub trait IdentityResolver: Send + Sync {
    fn current_username(&self) -> Option<String>;
}

/// Default resolver: reads the username of the current [`RequestScope`]
/// (see [`crate::context`]).
///
/// [`RequestScope`]: crate::context::RequestScope
#[derive(Debug, Default)]
pub struct ScopeIdentity;

impl IdentityResolver for ScopeIdentity {
    fn current_username(&self) -> Option<String> {
        context::current_username()
    }
}

/// Resolves the acting identity. When `user_related` is off the invocation
/// is shared across users and the identity is always `Backend`; otherwise
/// any unresolvable user degrades to `Backend`. Never fails.
pub fn resolve_identity(user_related: bool, resolver: &dyn IdentityResolver) -> Identity {
    if !user_related {
        return Identity::Backend;
    }
    match resolver.current_username() {
        Some(username) if !username.is_empty() => Identity::User(username),
        _ => Identity::Backend,
    }
}

/// Picks the effective tier for this invocation. Backend identity prefers
/// the backend-specific tier when one is configured; `None` disables
/// caching.
pub fn select_tier<'a>(
    foreground: Option<&'a CacheTier>,
    backend: Option<&'a CacheTier>,
    identity: &Identity,
) -> Option<&'a CacheTier> {
    if identity.is_backend() {
        backend.or(foreground)
    } else {
        foreground
    }
}

fn hash_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hasher.finalize().iter().map(|b| format!("{:02x}", b)).collect()
}

/// Canonical content hash of a JSON value.
///
/// Deterministic for identical content regardless of object key order or
/// array element order; any change in content changes the hash.
pub fn content_hash(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by_key(|(k, _)| k.as_str());
            let parts: Vec<String> = entries
                .into_iter()
                .map(|(k, v)| format!("{}={}", k, content_hash(v)))
                .collect();
            hash_hex(&parts.join(","))
        }
        Value::Array(items) => {
            let mut hashes: Vec<String> = items.iter().map(content_hash).collect();
            hashes.sort();
            hash_hex(&hashes.join(","))
        }
        scalar => hash_hex(&scalar.to_string()),
    }
}

/// Composes the cache key for one invocation.
///
/// Never fails for well-formed input; argument content is already reduced to
/// JSON values by the caller (non-serializable arguments degrade to their
/// string form upstream).
pub fn build_key(
    prefix: &str,
    tier: &CacheTier,
    target: &str,
    args: &Value,
    kwargs: &Value,
    identity: &Identity,
) -> String {
    format!(
        "{}:{}:{}:{},{}[{}]",
        prefix,
        tier.key,
        target,
        content_hash(args),
        content_hash(kwargs),
        identity.as_str(),
    )
}
