// ⚙️ Configuration - Where the dataset lives
//
// Every remote location is a field here; the rest of the crate only builds
// URLs through the helpers at the bottom of `impl Config`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::names::Tier;

const DEFAULT_RECORD_BASE_URL: &str =
    "https://raw.githubusercontent.com/gaboom63/MSM-API/master/data/monsters/";
const DEFAULT_IMAGE_BASE_URL: &str =
    "https://raw.githubusercontent.com/gaboom63/MSM-API/master/images/bm/";
const DEFAULT_SOUND_BASE_URL: &str =
    "https://raw.githubusercontent.com/gaboom63/MSM-API/master/data/sounds/";
const DEFAULT_COMBINATION_TABLE_URL: &str =
    "https://raw.githubusercontent.com/Gaboom63/MSM-API/refs/heads/main/data/monsters/Extras/breedingCombos.json";
const DEFAULT_ASSET_INDEX_URL: &str =
    "https://raw.githubusercontent.com/Gaboom63/MSM-API/main/data/costumes.json";
const DEFAULT_ASSET_BASE_URL: &str =
    "https://raw.githubusercontent.com/Gaboom63/MSM-API/main/data/costumes/";

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Monster records: `{record_base_url}{Tier}/{fileKey}.json`
    pub record_base_url: String,

    /// Primary monster images
    pub image_base_url: String,

    /// Memory sample audio files
    pub sound_base_url: String,

    /// Breeding combination table (single JSON object)
    pub combination_table_url: String,

    /// Costume index (single JSON object)
    pub asset_index_url: String,

    /// Costume files: `{asset_base_url}{Name}/[{Tier}/]{file}`
    pub asset_base_url: String,

    /// Per-request timeout for the HTTP transport
    pub request_timeout_secs: u64,

    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            record_base_url: DEFAULT_RECORD_BASE_URL.to_string(),
            image_base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
            sound_base_url: DEFAULT_SOUND_BASE_URL.to_string(),
            combination_table_url: DEFAULT_COMBINATION_TABLE_URL.to_string(),
            asset_index_url: DEFAULT_ASSET_INDEX_URL.to_string(),
            asset_base_url: DEFAULT_ASSET_BASE_URL.to_string(),
            request_timeout_secs: 30,
            user_agent: format!("msm-api/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Config {
    /// Load config from a JSON file; missing fields keep their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: Config =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;

        Ok(config)
    }

    /// Defaults overridden by `MSM_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        let string_fields: [(&str, &mut String); 6] = [
            ("MSM_RECORD_BASE_URL", &mut config.record_base_url),
            ("MSM_IMAGE_BASE_URL", &mut config.image_base_url),
            ("MSM_SOUND_BASE_URL", &mut config.sound_base_url),
            ("MSM_COMBINATION_TABLE_URL", &mut config.combination_table_url),
            ("MSM_ASSET_INDEX_URL", &mut config.asset_index_url),
            ("MSM_ASSET_BASE_URL", &mut config.asset_base_url),
        ];
        for (key, field) in string_fields {
            if let Some(value) = lookup(key) {
                *field = value;
            }
        }

        if let Some(raw) = lookup("MSM_REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid MSM_REQUEST_TIMEOUT_SECS: {:?}", raw))?;
        }

        Ok(config)
    }

    // ========================================================================
    // URL LAYOUT
    // ========================================================================

    /// `GET {base}/{tier}/{fileKey}.json`
    ///
    /// The file key goes in unencoded: the remote store is addressed by the
    /// exact casing and spelling seen in the dataset.
    pub fn record_url(&self, tier: Tier, file_key: &str) -> String {
        format!("{}{}/{}.json", self.record_base_url, tier.as_str(), file_key)
    }

    pub fn image_url(&self, image_file: &str) -> String {
        format!("{}{}", self.image_base_url, urlencoding::encode(image_file))
    }

    pub fn sound_url(&self, sound_file: &str) -> String {
        format!("{}{}", self.sound_base_url, urlencoding::encode(sound_file))
    }

    /// Directory holding one monster's costumes for a tier (trailing slash included)
    ///
    /// Common costumes sit directly under the monster; other tiers get a subfolder.
    pub fn asset_dir_url(&self, canonical_name: &str, tier: Tier) -> String {
        let name = urlencoding::encode(canonical_name);
        if tier.is_base() {
            format!("{}{}/", self.asset_base_url, name)
        } else {
            format!("{}{}/{}/", self.asset_base_url, name, tier.as_str())
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
