// 👗 Asset Index - Costume files per monster and tier
//
// costumes.json looks like:
//   { "Mammott": { "Common": ["Santa.png"], "Rare": ["Elf.png"] }, ... }
//
// Missing monsters, missing tiers and a missing index are all normal: they
// resolve to an empty list, never an error.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::LoadError;
use crate::fetch::{fetch_json, Fetcher};
use crate::names::Tier;

// ============================================================================
// ASSET TABLE
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetTable {
    /// canonical monster name → tier → ordered file names
    entries: HashMap<String, HashMap<Tier, Vec<String>>>,
}

impl AssetTable {
    pub fn from_raw(raw: &Map<String, Value>) -> Self {
        let mut entries = HashMap::new();

        for (monster, tiers) in raw {
            let Some(tiers) = tiers.as_object() else {
                debug!(monster = %monster, "ignoring non-object costume entry");
                continue;
            };

            let mut by_tier = HashMap::new();
            for (label, files) in tiers {
                let (Some(tier), Some(files)) = (Tier::from_label(label), files.as_array()) else {
                    debug!(monster = %monster, tier = %label, "ignoring costume tier");
                    continue;
                };
                let files: Vec<String> = files
                    .iter()
                    .filter_map(|f| f.as_str().map(str::to_string))
                    .collect();
                by_tier.insert(tier, files);
            }

            entries.insert(monster.clone(), by_tier);
        }

        AssetTable { entries }
    }

    /// File names for a monster/tier; empty when either is absent
    pub fn files(&self, canonical_name: &str, tier: Tier) -> &[String] {
        self.entries
            .get(canonical_name)
            .and_then(|by_tier| by_tier.get(&tier))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// ASSET INDEX
// ============================================================================

pub struct AssetIndex {
    fetcher: Arc<dyn Fetcher>,
    config: Arc<Config>,
    table: Mutex<Option<Arc<AssetTable>>>,
}

impl AssetIndex {
    pub fn new(fetcher: Arc<dyn Fetcher>, config: Arc<Config>) -> Self {
        AssetIndex {
            fetcher,
            config,
            table: Mutex::new(None),
        }
    }

    /// Same cache-or-fetch contract as `CombinationIndex::load`
    pub async fn load(&self) -> Arc<AssetTable> {
        let mut slot = self.table.lock().await;
        if let Some(table) = slot.as_ref() {
            return Arc::clone(table);
        }

        let url = &self.config.asset_index_url;
        match self.fetch_table(url).await {
            Ok(table) => {
                info!(url = %url, monsters = table.len(), "loaded costume index");
                let table = Arc::new(table);
                *slot = Some(Arc::clone(&table));
                table
            }
            Err(err) => {
                warn!(url = %url, error = %err, "costume index load failed");
                Arc::new(AssetTable::default())
            }
        }
    }

    async fn fetch_table(&self, url: &str) -> Result<AssetTable, LoadError> {
        let raw: Map<String, Value> = fetch_json(self.fetcher.as_ref(), url).await?;
        Ok(AssetTable::from_raw(&raw))
    }

    /// Absolute costume URLs for a monster in a tier
    pub async fn resolve(&self, canonical_name: &str, tier: Tier) -> Vec<String> {
        let table = self.load().await;
        let dir = self.config.asset_dir_url(canonical_name, tier);

        table
            .files(canonical_name, tier)
            .iter()
            .map(|file| format!("{}{}", dir, urlencoding::encode(file)))
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::MemoryFetcher;
    use serde_json::json;

    const INDEX_URL: &str = "https://host/costumes.json";

    fn config() -> Arc<Config> {
        Arc::new(Config {
            asset_index_url: INDEX_URL.to_string(),
            asset_base_url: "https://host/costumes/".to_string(),
            ..Config::default()
        })
    }

    fn raw_index() -> Value {
        json!({
            "Pom Pom": {
                "Common": ["Party Hat.png", "Scarf.png"],
                "Epic": ["Crown.png"]
            },
            "Mammott": { "Rare": "oops", "Legendary": ["x.png"] },
            "Broken": 7
        })
    }

    #[test]
    fn test_from_raw_is_lenient() {
        let raw = raw_index();
        let table = AssetTable::from_raw(raw.as_object().unwrap());

        assert_eq!(table.files("Pom Pom", Tier::Common), ["Party Hat.png", "Scarf.png"]);
        assert!(table.files("Mammott", Tier::Rare).is_empty());
        assert!(table.files("Broken", Tier::Common).is_empty());
        assert_eq!(table.len(), 2);
    }

    #[tokio::test]
    async fn test_resolve_builds_absolute_urls() {
        let fetcher = Arc::new(MemoryFetcher::new());
        fetcher.serve_json(INDEX_URL, raw_index());
        let index = AssetIndex::new(fetcher, config());

        assert_eq!(
            index.resolve("Pom Pom", Tier::Common).await,
            vec![
                "https://host/costumes/Pom%20Pom/Party%20Hat.png".to_string(),
                "https://host/costumes/Pom%20Pom/Scarf.png".to_string(),
            ]
        );
        assert_eq!(
            index.resolve("Pom Pom", Tier::Epic).await,
            vec!["https://host/costumes/Pom%20Pom/Epic/Crown.png".to_string()]
        );
    }

    #[tokio::test]
    async fn test_resolve_absent_is_empty() {
        let fetcher = Arc::new(MemoryFetcher::new());
        fetcher.serve_json(INDEX_URL, raw_index());
        let index = AssetIndex::new(Arc::clone(&fetcher) as Arc<dyn Fetcher>, config());

        assert!(index.resolve("Pom Pom", Tier::Rare).await.is_empty());
        assert!(index.resolve("Nobody", Tier::Common).await.is_empty());
        // Index fetched once for all three lookups
        assert_eq!(fetcher.hits(INDEX_URL), 1);
    }

    #[tokio::test]
    async fn test_missing_index_degrades_and_retries() {
        let fetcher = Arc::new(MemoryFetcher::new());
        let index = AssetIndex::new(Arc::clone(&fetcher) as Arc<dyn Fetcher>, config());

        assert!(index.resolve("Pom Pom", Tier::Common).await.is_empty());

        fetcher.serve_json(INDEX_URL, raw_index());
        assert_eq!(index.resolve("Pom Pom", Tier::Epic).await.len(), 1);
        assert_eq!(fetcher.hits(INDEX_URL), 2);
    }
}
