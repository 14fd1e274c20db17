// 🗄️ Lazy Cache - key → Entity, loaded at most once per key
//
// A miss spawns ONE load and parks a shared handle in the slot. Everyone who
// asks for the same key before it finishes awaits that same handle. When the
// load completes, the task swaps the slot to the realized value, so later
// reads are synchronous.
//
// The spawned load runs to completion even if every waiter goes away.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::future::IntoFuture;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::entity::Entity;
use crate::loader::EntityLoader;

type SharedLoad = Shared<BoxFuture<'static, Option<Arc<Entity>>>>;

enum Slot {
    Pending(SharedLoad),

    /// None = the load failed; not retried for this cache's lifetime
    Ready(Option<Arc<Entity>>),
}

// ============================================================================
// LOOKUP RESULT
// ============================================================================

/// What a key access yields
pub enum Lookup {
    /// Already realized (None for a prior failed load)
    Ready(Option<Arc<Entity>>),

    /// Load in flight
    Pending(Deferred),
}

impl Lookup {
    pub fn is_ready(&self) -> bool {
        matches!(self, Lookup::Ready(_))
    }

    /// Wait for the value whichever state the slot was in
    pub async fn resolve(self) -> Option<Arc<Entity>> {
        match self {
            Lookup::Ready(entity) => entity,
            Lookup::Pending(deferred) => deferred.await,
        }
    }

    /// Await, then read from the entity; None if it failed to load
    pub async fn await_then_get<T, F>(self, read: F) -> Option<T>
    where
        F: FnOnce(&Entity) -> T,
    {
        self.resolve().await.map(|entity| read(&entity))
    }
}

/// Handle on an in-flight load; `.await` it directly or go through `await_then_get`
#[derive(Clone)]
pub struct Deferred {
    key: String,
    load: SharedLoad,
}

impl Deferred {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub async fn await_then_get<T, F>(self, read: F) -> Option<T>
    where
        F: FnOnce(&Entity) -> T,
    {
        self.load.await.map(|entity| read(&entity))
    }
}

impl IntoFuture for Deferred {
    type Output = Option<Arc<Entity>>;
    type IntoFuture = SharedLoad;

    fn into_future(self) -> Self::IntoFuture {
        self.load
    }
}

// ============================================================================
// LAZY CACHE
// ============================================================================

/// Clones share the same slots
#[derive(Clone)]
pub struct LazyCache {
    loader: Arc<EntityLoader>,
    slots: Arc<Mutex<HashMap<String, Slot>>>,
}

impl LazyCache {
    pub fn new(loader: Arc<EntityLoader>) -> Self {
        LazyCache {
            loader,
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Access a key, starting its load on first use
    ///
    /// Must be called from within a Tokio runtime: a miss spawns the load.
    pub fn get(&self, key: &str) -> Lookup {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());

        match slots.get(key) {
            Some(Slot::Ready(entity)) => return Lookup::Ready(entity.clone()),
            Some(Slot::Pending(load)) => {
                return Lookup::Pending(Deferred {
                    key: key.to_string(),
                    load: load.clone(),
                })
            }
            None => {}
        }

        // Slot is inserted before the lock drops, so the task's swap always lands after it
        let load = self.spawn_load(key);
        slots.insert(key.to_string(), Slot::Pending(load.clone()));

        Lookup::Pending(Deferred {
            key: key.to_string(),
            load,
        })
    }

    fn spawn_load(&self, key: &str) -> SharedLoad {
        debug!(key, "cache miss, loading");

        let loader = Arc::clone(&self.loader);
        let slots = Arc::clone(&self.slots);
        let task_key = key.to_string();

        let handle = tokio::spawn(async move {
            let entity = loader.fetch(&task_key).await.map(Arc::new);
            realize(&slots, task_key, entity.clone());
            entity
        });

        let slots = Arc::clone(&self.slots);
        let key = key.to_string();
        async move {
            match handle.await {
                Ok(entity) => entity,
                Err(err) => {
                    warn!(key = %key, error = %err, "entity load task failed");
                    realize(&slots, key, None);
                    None
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Realized (loaded or failed) as opposed to absent or in flight
    pub fn is_realized(&self, key: &str) -> bool {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        matches!(slots.get(key), Some(Slot::Ready(_)))
    }

    /// Number of keys ever requested
    pub fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn realize(slots: &Mutex<HashMap<String, Slot>>, key: String, entity: Option<Arc<Entity>>) {
    let mut slots = slots.lock().unwrap_or_else(|e| e.into_inner());
    slots.insert(key, Slot::Ready(entity));
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::MemoryFetcher;
    use crate::loader::tests::{loader_for, seeded_fetcher};
    use std::time::Duration;

    const TREX_URL: &str = "https://host/monsters/Rare/T-Rox.json";

    fn slow_cache() -> (LazyCache, Arc<MemoryFetcher>) {
        let fetcher = seeded_fetcher(MemoryFetcher::new().with_delay(Duration::from_millis(20)));
        let cache = LazyCache::new(Arc::new(loader_for(Arc::clone(&fetcher))));
        (cache, fetcher)
    }

    #[tokio::test]
    async fn test_concurrent_access_shares_one_fetch() {
        let (cache, fetcher) = slow_cache();

        let first = cache.get("rare t-rox");
        let second = cache.get("rare t-rox");
        assert!(!first.is_ready());
        assert!(!second.is_ready());

        let (a, b) = tokio::join!(first.resolve(), second.resolve());
        let (a, b) = (a.unwrap(), b.unwrap());

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(fetcher.hits(TREX_URL), 1);
    }

    #[tokio::test]
    async fn test_realized_value_replaces_handle() {
        let (cache, fetcher) = slow_cache();

        let name = cache
            .get("rare t-rox")
            .await_then_get(|e| e.name().to_string())
            .await;
        assert_eq!(name, Some("Rare T-Rox".to_string()));

        // Let the load task finish its swap
        tokio::task::yield_now().await;
        assert!(cache.is_realized("rare t-rox"));

        match cache.get("rare t-rox") {
            Lookup::Ready(Some(entity)) => assert_eq!(entity.file_key, "T-Rox"),
            _ => panic!("expected realized entity"),
        }
        assert_eq!(fetcher.hits(TREX_URL), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_load_is_cached_as_none() {
        let (cache, fetcher) = slow_cache();
        let url = "https://host/monsters/Common/Missingno.json";

        let missing = cache.get("Missingno");
        let info = missing.await_then_get(|e| e.info()).await;
        assert!(info.is_none());

        tokio::task::yield_now().await;
        assert!(matches!(cache.get("Missingno"), Lookup::Ready(None)));
        assert_eq!(fetcher.hits(url), 1);
    }

    #[tokio::test]
    async fn test_deferred_is_awaitable() {
        let (cache, _) = slow_cache();

        let Lookup::Pending(deferred) = cache.get("toe jammer") else {
            panic!("first access should be pending");
        };
        assert_eq!(deferred.key(), "toe jammer");

        let entity = deferred.clone().await.unwrap();
        assert_eq!(entity.name(), "Toe Jammer");
        assert_eq!(
            deferred.await_then_get(|e| e.lives_on("water island")).await,
            Some(true)
        );
    }

    #[tokio::test]
    async fn test_abandoned_access_still_populates() {
        let (cache, fetcher) = slow_cache();

        drop(cache.get("rare t-rox"));
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(cache.is_realized("rare t-rox"));
        assert_eq!(fetcher.hits(TREX_URL), 1);
    }

    #[tokio::test]
    async fn test_distinct_keys_load_independently() {
        let (cache, fetcher) = slow_cache();

        let (trex, toe) = tokio::join!(
            cache.get("rare t-rox").resolve(),
            cache.get("toe jammer").resolve()
        );

        assert!(trex.is_some());
        assert!(toe.is_some());
        assert_eq!(cache.len(), 2);
        assert_eq!(fetcher.hits("https://host/breedingCombos.json"), 1);
    }
}
