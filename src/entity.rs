// 🎵 Monster Entity - Fetched record + derived fields
//
// "The record is a VALUE (never changes), the costume cursor is STATE"
//
// - `MonsterRecord`: exactly what the JSON file says (plus unknown fields)
// - `Entity`: record + tier, file key, absolute asset URLs, costume cursor
//
// Every cache miss builds a fresh Entity; the cursor belongs to that one instance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::Config;
use crate::names::{sound_file_name, Tier};

pub const UNKNOWN: &str = "Unknown";
pub const NO_DESCRIPTION: &str = "No description available.";

// ============================================================================
// MONSTER RECORD
// ============================================================================

/// One `{Tier}/{fileKey}.json` file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonsterRecord {
    pub name: String,

    #[serde(default, deserialize_with = "string_or_number")]
    pub cost: Option<String>,

    #[serde(default)]
    pub islands: Vec<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// File name or absolute URL of the primary image
    #[serde(default)]
    pub image: Option<String>,

    #[serde(default, deserialize_with = "string_or_number")]
    pub breeding_time: Option<String>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub breeding_combo: Vec<String>,

    /// Any other fields the dataset carries, kept verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    }))
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::One(s)) => vec![s],
        Some(Raw::Many(v)) => v,
        None => Vec::new(),
    })
}

// ============================================================================
// STATISTICS
// ============================================================================

/// Summary view with fallbacks filled in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub name: String,

    /// Number of islands the monster lives on
    pub islands: usize,

    pub cost: String,
    pub description: String,
    pub breeding_time: String,
    pub breeding_combo: Vec<String>,
}

// ============================================================================
// ENTITY
// ============================================================================

#[derive(Debug)]
pub struct Entity {
    pub record: MonsterRecord,
    pub tier: Tier,

    /// Casing used for the record path
    pub file_key: String,

    /// Registry casing, used for costume lookups
    pub canonical_name: String,

    image_url: String,
    sound_file: String,
    sound_url: String,
    costumes: Vec<String>,

    /// 0..len selects a costume; len means "base image"
    cursor: AtomicUsize,

    pub loaded_at: DateTime<Utc>,
}

impl Entity {
    /// Decorate a fetched record
    pub fn new(
        record: MonsterRecord,
        tier: Tier,
        file_key: String,
        canonical_name: String,
        costumes: Vec<String>,
        config: &Config,
    ) -> Self {
        let image_url = primary_image_url(record.image.as_deref(), &file_key, config);
        let sound_file = sound_file_name(&record.name);
        let sound_url = config.sound_url(&sound_file);
        let cursor = AtomicUsize::new(costumes.len());

        Entity {
            record,
            tier,
            file_key,
            canonical_name,
            image_url,
            sound_file,
            sound_url,
            costumes,
            cursor,
            loaded_at: Utc::now(),
        }
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    pub fn sound_file(&self) -> &str {
        &self.sound_file
    }

    pub fn sound_url(&self) -> &str {
        &self.sound_url
    }

    // ========================================================================
    // COSTUME CURSOR
    // ========================================================================

    pub fn costumes(&self) -> &[String] {
        &self.costumes
    }

    /// Image at a cycle position: a costume for 0..len, the base image at len
    ///
    /// Positions wrap over the full cycle of `len + 1`.
    pub fn costume(&self, index: usize) -> &str {
        let len = self.costumes.len();
        let position = index % (len + 1);
        if position == len {
            &self.image_url
        } else {
            &self.costumes[position]
        }
    }

    pub fn costume_index(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }

    pub fn current_costume(&self) -> &str {
        self.costume(self.costume_index())
    }

    /// Advance one step through costumes then the base image, wrapping to 0
    pub fn next_costume(&self) -> &str {
        let cycle = self.costumes.len() + 1;
        let previous = self
            .cursor
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |i| Some((i + 1) % cycle))
            .unwrap_or_else(|i| i);
        self.costume((previous + 1) % cycle)
    }

    /// Back to the base image
    pub fn reset_costumes(&self) -> &str {
        self.cursor.store(self.costumes.len(), Ordering::SeqCst);
        &self.image_url
    }

    // ========================================================================
    // TEXT ACCESSORS
    // ========================================================================

    /// Case-insensitive island membership
    pub fn lives_on(&self, island: &str) -> bool {
        let island = island.trim();
        self.record
            .islands
            .iter()
            .any(|i| i.eq_ignore_ascii_case(island))
    }

    pub fn cost(&self) -> &str {
        self.record.cost.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn description(&self) -> &str {
        self.record.description.as_deref().unwrap_or(NO_DESCRIPTION)
    }

    /// "Mammott costs 300 coins and lives on 2 islands: Plant Island, Cold Island."
    pub fn info(&self) -> String {
        let islands = if self.record.islands.is_empty() {
            UNKNOWN.to_string()
        } else {
            self.record.islands.join(", ")
        };

        format!(
            "{} costs {} and lives on {} islands: {}.",
            self.name(),
            self.cost(),
            self.record.islands.len(),
            islands
        )
    }

    pub fn statistics(&self) -> Statistics {
        Statistics {
            name: self.record.name.clone(),
            islands: self.record.islands.len(),
            cost: self.cost().to_string(),
            description: self.description().to_string(),
            breeding_time: self
                .record
                .breeding_time
                .clone()
                .unwrap_or_else(|| UNKNOWN.to_string()),
            breeding_combo: self.record.breeding_combo.clone(),
        }
    }
}

/// Explicit absolute URLs pass through; otherwise `{image or fileKey}.png` under the image base
fn primary_image_url(image: Option<&str>, file_key: &str, config: &Config) -> String {
    if let Some(url) = image.filter(|i| i.starts_with("http://") || i.starts_with("https://")) {
        return url.to_string();
    }

    let mut file = image.unwrap_or(file_key).to_string();
    if !file.to_lowercase().ends_with(".png") {
        file.push_str(".png");
    }
    config.image_url(&file)
}

// ============================================================================
// TESTS
// ============================================================================
