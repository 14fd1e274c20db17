// 🎤 MSM Client - One context object per process (or per test)
//
// Owns every piece of shared state: name registry, combination table,
// costume index and entity cache. Nothing lives in globals, so two `Msm`
// instances never see each other's caches.

use std::sync::Arc;
use tracing::info;

use crate::assets::AssetIndex;
use crate::cache::{Deferred, LazyCache, Lookup};
use crate::combos::{CombinationIndex, ComboLookup};
use crate::config::Config;
use crate::entity::Entity;
use crate::fetch::{Fetcher, HttpFetcher};
use crate::loader::EntityLoader;
use crate::names::{NameRegistry, NameResolver};

/// Reserved key: name-based fetch operation (matched case-insensitively)
pub const FETCH_KEY: &str = "get";

/// Reserved key: combination lookup
pub const COMBINATION_KEY: &str = "twoMonsterCombo";

// ============================================================================
// ACCESS
// ============================================================================

/// Result of addressing the client by key
pub enum Access {
    /// `get`: callable name-based fetch; the `get` key itself is never cached
    Fetch(FetchOp),

    /// `twoMonsterCombo`: callable combination lookup
    Combination(CombinationOp),

    /// Any other key, already realized
    Cached(Option<Arc<Entity>>),

    /// Any other key, load in flight
    Deferred(Deferred),
}

impl Access {
    /// Collapse a cached/deferred access back into a `Lookup`; None for the reserved ops
    pub fn into_lookup(self) -> Option<Lookup> {
        match self {
            Access::Cached(entity) => Some(Lookup::Ready(entity)),
            Access::Deferred(deferred) => Some(Lookup::Pending(deferred)),
            Access::Fetch(_) | Access::Combination(_) => None,
        }
    }
}

#[derive(Clone)]
pub struct FetchOp {
    cache: LazyCache,
}

impl FetchOp {
    /// Joins an in-flight or realized load for the same name
    pub async fn call(&self, name: &str) -> Option<Arc<Entity>> {
        self.cache.get(name).resolve().await
    }
}

#[derive(Clone)]
pub struct CombinationOp {
    combos: Arc<CombinationIndex>,
}

impl CombinationOp {
    pub async fn call(&self, combo: &str) -> ComboLookup {
        self.combos.lookup(combo).await
    }
}

// ============================================================================
// MSM
// ============================================================================

pub struct Msm {
    config: Arc<Config>,
    registry: Arc<NameRegistry>,
    combos: Arc<CombinationIndex>,
    assets: Arc<AssetIndex>,
    cache: LazyCache,
}

impl Msm {
    /// Client over HTTP
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let fetcher = HttpFetcher::new(&config)?;
        Ok(Msm::with_fetcher(config, Arc::new(fetcher)))
    }

    /// Client over any transport
    pub fn with_fetcher(config: Config, fetcher: Arc<dyn Fetcher>) -> Self {
        let config = Arc::new(config);
        let registry = Arc::new(NameRegistry::new());

        let combos = Arc::new(CombinationIndex::new(
            Arc::clone(&fetcher),
            config.combination_table_url.clone(),
            Arc::clone(&registry),
        ));
        let assets = Arc::new(AssetIndex::new(Arc::clone(&fetcher), Arc::clone(&config)));
        let loader = Arc::new(EntityLoader::new(
            Arc::clone(&config),
            fetcher,
            NameResolver::new(Arc::clone(&registry)),
            Arc::clone(&combos),
            Arc::clone(&assets),
        ));
        let cache = LazyCache::new(loader);

        Msm {
            config,
            registry,
            combos,
            assets,
            cache,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &NameRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &LazyCache {
        &self.cache
    }

    /// Load a monster by loose name; at most one request per name
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn fetch(&self, name: &str) -> Option<Arc<Entity>> {
        self.cache.get(name).resolve().await
    }

    /// "A + B" → bred results, or a sentinel
    pub async fn lookup_combination(&self, combo: &str) -> ComboLookup {
        self.combos.lookup(combo).await
    }

    /// Key-addressed access: reserved operation keys, else the lazy cache
    ///
    /// Must be called from within a Tokio runtime.
    pub fn entry(&self, key: &str) -> Access {
        if key == COMBINATION_KEY {
            return Access::Combination(CombinationOp {
                combos: Arc::clone(&self.combos),
            });
        }
        if key.eq_ignore_ascii_case(FETCH_KEY) {
            return Access::Fetch(FetchOp {
                cache: self.cache.clone(),
            });
        }

        match self.cache.get(key) {
            Lookup::Ready(entity) => Access::Cached(entity),
            Lookup::Pending(deferred) => Access::Deferred(deferred),
        }
    }

    /// Preload both shared indices; returns (combination entries, costume monsters)
    pub async fn warm(&self) -> (usize, usize) {
        let (combos, assets) = tokio::join!(self.combos.load(), self.assets.load());
        info!(
            combinations = combos.len(),
            costumes = assets.len(),
            names = self.registry.len(),
            "indices warm"
        );
        (combos.len(), assets.len())
    }
}

// ============================================================================
// TESTS
// ============================================================================
