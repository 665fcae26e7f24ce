//! Tests for identity resolution and per-user key scoping.

use reqcache::context::RequestScope;
use reqcache::{
    CacheTier, Cached, CachedBuilder, IdentityResolver, MemoryBackend, TieredStore,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn store() -> Arc<TieredStore> {
    Arc::new(TieredStore::new(Arc::new(MemoryBackend::new(1024))))
}

fn counting_wrapper(
    target: &str,
    store: Arc<TieredStore>,
    tier: CacheTier,
) -> (Cached<u32, u32>, Arc<AtomicU32>) {
    let counter = Arc::new(AtomicU32::new(0));
    let executed = counter.clone();
    let wrapper = CachedBuilder::new(target, store, move |_: u32| {
        let executed = executed.clone();
        async move { Ok::<_, reqcache::Error>(executed.fetch_add(1, Ordering::SeqCst) + 1) }
    })
    .tier(tier)
    .build()
    .unwrap();
    (wrapper, counter)
}

#[tokio::test]
async fn test_user_scoped_keys_isolate_users() {
    let tier = CacheTier::new("per_user", Duration::from_secs(60)).with_user_related(true);
    let (wrapper, counter) = counting_wrapper("tests.isolated", store(), tier);
    let wrapper = Arc::new(wrapper);

    let for_alice = {
        let wrapper = wrapper.clone();
        RequestScope::new()
            .with_username("alice")
            .enter(async move { wrapper.cached(1).await.unwrap() })
            .await
    };
    let for_bob = {
        let wrapper = wrapper.clone();
        RequestScope::new()
            .with_username("bob")
            .enter(async move { wrapper.cached(1).await.unwrap() })
            .await
    };
    assert_ne!(for_alice, for_bob);
    assert_eq!(counter.load(Ordering::SeqCst), 2);

    // the same user hits their own entry
    let alice_again = {
        let wrapper = wrapper.clone();
        RequestScope::new()
            .with_username("alice")
            .enter(async move { wrapper.cached(1).await.unwrap() })
            .await
    };
    assert_eq!(alice_again, for_alice);
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_not_user_related_shares_across_users() {
    let tier = CacheTier::new("shared", Duration::from_secs(60)).with_user_related(false);
    let (wrapper, counter) = counting_wrapper("tests.shared", store(), tier);
    let wrapper = Arc::new(wrapper);

    let for_alice = {
        let wrapper = wrapper.clone();
        RequestScope::new()
            .with_username("alice")
            .enter(async move { wrapper.cached(1).await.unwrap() })
            .await
    };
    let for_bob = {
        let wrapper = wrapper.clone();
        RequestScope::new()
            .with_username("bob")
            .enter(async move { wrapper.cached(1).await.unwrap() })
            .await
    };
    assert_eq!(for_alice, for_bob);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unresolvable_user_degrades_to_backend() {
    let tier = CacheTier::new("per_user", Duration::from_secs(60));
    let (wrapper, counter) = counting_wrapper("tests.backendless", store(), tier);

    // no scope: identity degrades to backend and caching still works
    let first = wrapper.cached(1).await.unwrap();
    let second = wrapper.cached(1).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_backend_tier_applies_to_backend_identity() {
    // foreground tier expires instantly; the backend tier holds entries.
    // If backend identity picked the foreground tier, nothing would cache.
    let foreground = CacheTier::new("fg", Duration::ZERO);
    let backend = CacheTier::new("bg", Duration::from_secs(60));

    let counter = Arc::new(AtomicU32::new(0));
    let executed = counter.clone();
    let wrapper = CachedBuilder::new("tests.backend_tier", store(), move |_: u32| {
        let executed = executed.clone();
        async move { Ok::<_, reqcache::Error>(executed.fetch_add(1, Ordering::SeqCst) + 1) }
    })
    .tier(foreground)
    .backend_tier(backend)
    .build()
    .unwrap();

    let first = wrapper.cached(1).await.unwrap();
    let second = wrapper.cached(1).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_custom_identity_resolver() {
    struct Fixed(&'static str);
    impl IdentityResolver for Fixed {
        fn current_username(&self) -> Option<String> {
            Some(self.0.to_string())
        }
    }

    let shared_store = store();
    let tier = CacheTier::new("per_user", Duration::from_secs(60));
    let counter = Arc::new(AtomicU32::new(0));

    let build = |resolver: Arc<dyn IdentityResolver>| {
        let executed = counter.clone();
        CachedBuilder::new("tests.fixed_identity", shared_store.clone(), move |_: u32| {
            let executed = executed.clone();
            async move { Ok::<_, reqcache::Error>(executed.fetch_add(1, Ordering::SeqCst) + 1) }
        })
        .tier(tier.clone())
        .identity_resolver(resolver)
        .build()
        .unwrap()
    };

    let as_carol = build(Arc::new(Fixed("carol")));
    let as_dave = build(Arc::new(Fixed("dave")));

    let carol_value = as_carol.cached(1).await.unwrap();
    let dave_value = as_dave.cached(1).await.unwrap();
    assert_ne!(carol_value, dave_value);

    // same identity, same store, same target: a hit even across wrappers
    let carol_again = build(Arc::new(Fixed("carol")));
    assert_eq!(carol_again.cached(1).await.unwrap(), carol_value);
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}
