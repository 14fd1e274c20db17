// 📦 Entity Loader - raw name → decorated Entity (or None)
//
// 1. Warm the combination index (fills the name registry)
// 2. Resolve tier + file key
// 3. GET {base}{Tier}/{fileKey}.json
// 4. Decorate: image/sound URLs, costumes for the canonical name
//
// A missing or broken record is a soft failure: logged, returned as None.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::assets::AssetIndex;
use crate::combos::CombinationIndex;
use crate::config::Config;
use crate::entity::{Entity, MonsterRecord};
use crate::error::LoadError;
use crate::fetch::{fetch_json, Fetcher};
use crate::names::NameResolver;

pub struct EntityLoader {
    config: Arc<Config>,
    fetcher: Arc<dyn Fetcher>,
    resolver: NameResolver,
    combos: Arc<CombinationIndex>,
    assets: Arc<AssetIndex>,
}

impl EntityLoader {
    pub fn new(
        config: Arc<Config>,
        fetcher: Arc<dyn Fetcher>,
        resolver: NameResolver,
        combos: Arc<CombinationIndex>,
        assets: Arc<AssetIndex>,
    ) -> Self {
        EntityLoader {
            config,
            fetcher,
            resolver,
            combos,
            assets,
        }
    }

    /// Load a monster by loose name; None when it cannot be loaded
    pub async fn fetch(&self, raw_name: &str) -> Option<Entity> {
        match self.try_fetch(raw_name).await {
            Ok(entity) => Some(entity),
            Err(err) if err.is_not_found() => {
                warn!(name = raw_name, url = err.url(), "monster not found");
                None
            }
            Err(err) => {
                warn!(name = raw_name, error = %err, "monster load failed");
                None
            }
        }
    }

    /// Same as `fetch` but with the failure reason
    pub async fn try_fetch(&self, raw_name: &str) -> Result<Entity, LoadError> {
        // Registry must be warm before resolving, or rare/bred names miss their casing
        self.combos.load().await;

        let resolved = self.resolver.resolve(raw_name);
        let canonical_name = self.resolver.canonical_name(raw_name);
        let url = self.config.record_url(resolved.tier, &resolved.file_key);
        debug!(name = raw_name, tier = %resolved.tier, file_key = %resolved.file_key, "resolved");

        let record: MonsterRecord = fetch_json(self.fetcher.as_ref(), &url).await?;
        let costumes = self.assets.resolve(&canonical_name, resolved.tier).await;

        Ok(Entity::new(
            record,
            resolved.tier,
            resolved.file_key,
            canonical_name,
            costumes,
            &self.config,
        ))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::fetch::testing::MemoryFetcher;
    use crate::names::{NameRegistry, Tier};
    use serde_json::json;

    pub(crate) fn test_config() -> Arc<Config> {
        Arc::new(Config {
            record_base_url: "https://host/monsters/".to_string(),
            image_base_url: "https://host/images/".to_string(),
            sound_base_url: "https://host/sounds/".to_string(),
            combination_table_url: "https://host/breedingCombos.json".to_string(),
            asset_index_url: "https://host/costumes.json".to_string(),
            asset_base_url: "https://host/costumes/".to_string(),
            ..Config::default()
        })
    }

    /// A small dataset: two records, a breeding table, a costume index
    pub(crate) fn seeded_fetcher(fetcher: MemoryFetcher) -> Arc<MemoryFetcher> {
        fetcher.serve_json(
            "https://host/breedingCombos.json",
            json!({
                "Mammott + Noggin": ["Toe Jammer"],
                "T-Rox": ["Rare T-Rox"]
            }),
        );
        fetcher.serve_json(
            "https://host/costumes.json",
            json!({ "T-Rox": { "Rare": ["Knight.png", "Pirate.png"] } }),
        );
        fetcher.serve_json(
            "https://host/monsters/Rare/T-Rox.json",
            json!({
                "name": "Rare T-Rox",
                "cost": "20000",
                "islands": ["Plant Island", "Earth Island"],
                "description": "A rare one."
            }),
        );
        fetcher.serve_json(
            "https://host/monsters/Common/Toe Jammer.json",
            json!({ "name": "Toe Jammer", "islands": ["Water Island"] }),
        );
        Arc::new(fetcher)
    }

    pub(crate) fn loader_for(fetcher: Arc<MemoryFetcher>) -> EntityLoader {
        let config = test_config();
        let fetcher: Arc<dyn Fetcher> = fetcher;
        let registry = Arc::new(NameRegistry::new());
        let combos = Arc::new(CombinationIndex::new(
            Arc::clone(&fetcher),
            config.combination_table_url.clone(),
            Arc::clone(&registry),
        ));
        let assets = Arc::new(AssetIndex::new(Arc::clone(&fetcher), Arc::clone(&config)));

        EntityLoader::new(config, fetcher, NameResolver::new(registry), combos, assets)
    }

    #[tokio::test]
    async fn test_fetch_uses_registry_casing_and_costumes() {
        let fetcher = seeded_fetcher(MemoryFetcher::new());
        let loader = loader_for(Arc::clone(&fetcher));

        // "t-rox" would be "T-rox" by heuristic; the registry knows "T-Rox"
        let entity = loader.fetch("  rare t-rox ").await.unwrap();

        assert_eq!(entity.tier, Tier::Rare);
        assert_eq!(entity.file_key, "T-Rox");
        assert_eq!(entity.canonical_name, "T-Rox");
        assert_eq!(entity.name(), "Rare T-Rox");
        assert_eq!(entity.image_url(), "https://host/images/T-Rox.png");
        assert_eq!(
            entity.sound_url(),
            "https://host/sounds/T-Rox_Memory_Sample.mp3.mpeg"
        );
        assert_eq!(
            entity.costumes(),
            [
                "https://host/costumes/T-Rox/Rare/Knight.png",
                "https://host/costumes/T-Rox/Rare/Pirate.png"
            ]
        );
        assert_eq!(fetcher.hits("https://host/breedingCombos.json"), 1);
    }

    #[tokio::test]
    async fn test_fetch_bred_result_by_lowercase_name() {
        let fetcher = seeded_fetcher(MemoryFetcher::new());
        let loader = loader_for(fetcher);

        let entity = loader.fetch("toe jammer").await.unwrap();

        assert_eq!(entity.file_key, "Toe Jammer");
        assert_eq!(entity.statistics().description, "No description available.");
        assert!(entity.costumes().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_missing_is_none() {
        let fetcher = seeded_fetcher(MemoryFetcher::new());
        let loader = loader_for(Arc::clone(&fetcher));

        assert!(loader.fetch("epic nobody").await.is_none());
        assert_eq!(fetcher.hits("https://host/monsters/Epic/Nobody.json"), 1);

        let err = loader.try_fetch("epic nobody").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_fetch_survives_missing_indices() {
        let fetcher = Arc::new(MemoryFetcher::new());
        fetcher.serve_json(
            "https://host/monsters/Common/Noggin.json",
            json!({ "name": "Noggin", "cost": 150 }),
        );
        let loader = loader_for(fetcher);

        // No breeding table, no costume index: heuristic casing, no costumes
        let entity = loader.fetch("noggin").await.unwrap();
        assert_eq!(entity.file_key, "Noggin");
        assert_eq!(entity.cost(), "150");
        assert!(entity.costumes().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_malformed_record_is_none() {
        let fetcher = seeded_fetcher(MemoryFetcher::new());
        fetcher.serve("https://host/monsters/Common/Glitch.json", "{ not json");
        let loader = loader_for(fetcher);

        assert!(loader.fetch("Glitch").await.is_none());
        assert!(matches!(
            loader.try_fetch("Glitch").await,
            Err(LoadError::Decode { .. })
        ));
    }
}
