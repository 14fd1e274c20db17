// 🧬 Combination Index - Breeding table with order-independent keys
//
// Raw table keys come in two shapes:
// - "Mammott + Noggin" (any spacing/casing, either order) → combination
// - "Mammott"                                              → standalone entry
//
// "noggin+MAMMOTT" and "Mammott + Noggin" both land on "mammott + noggin".
// Loading the table also feeds the name registry, which is what lets later
// lookups use the dataset's exact casing.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::LoadError;
use crate::fetch::{fetch_json, Fetcher};
use crate::names::NameRegistry;

/// Character separating the two parents in a combination
pub const COMPONENT_SEPARATOR: char = '+';

/// Separator used in canonical keys
pub const CANONICAL_SEPARATOR: &str = " + ";

pub const INVALID_FORMAT_MESSAGE: &str = "Invalid format. Use 'Monster A + Monster B'";
pub const NOT_FOUND_MESSAGE: &str = "No combination found.";

/// Canonical key for a combination string, or None if it has no separator
///
/// Components are trimmed, lowercased and sorted. Keys with more than two
/// components are canonicalized the same way.
pub fn canonical_key(combo: &str) -> Option<String> {
    if !combo.contains(COMPONENT_SEPARATOR) {
        return None;
    }

    let mut parts: Vec<String> = combo
        .split(COMPONENT_SEPARATOR)
        .map(|part| part.trim().to_lowercase())
        .collect();
    parts.sort();

    Some(parts.join(CANONICAL_SEPARATOR))
}

// ============================================================================
// COMBINATION TABLE
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombinationTable {
    /// canonical key (or lowercased standalone name) → result names
    entries: HashMap<String, Vec<String>>,
}

impl CombinationTable {
    /// Normalize a raw table, registering every name it introduces
    pub fn from_raw(raw: &Map<String, Value>, registry: &NameRegistry) -> Self {
        let mut entries: HashMap<String, Vec<String>> = HashMap::new();

        for (key, value) in raw {
            let results = string_list(key, value);

            match canonical_key(key) {
                Some(canonical) => {
                    registry.register_all(results.iter().map(String::as_str));

                    // Merge lists whose raw keys canonicalize together; first seen wins order
                    let merged = entries.entry(canonical).or_default();
                    for name in results {
                        if !merged.contains(&name) {
                            merged.push(name);
                        }
                    }
                }
                None => {
                    registry.register(key);
                    entries.insert(key.to_lowercase(), results);
                }
            }
        }

        CombinationTable { entries }
    }

    /// Entry by already-canonical key
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn string_list(key: &str, value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        other => {
            debug!(key, value = %other, "ignoring non-list combination entry");
            Vec::new()
        }
    }
}

// ============================================================================
// LOOKUP RESULT
// ============================================================================

/// Outcome of a combination lookup; never an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComboLookup {
    Found(Vec<String>),
    NotFound,

    /// Query had no separator; the table was not consulted
    InvalidFormat,
}

impl ComboLookup {
    /// Flatten to the user-facing list form (sentinel message for misses)
    pub fn into_names(self) -> Vec<String> {
        match self {
            ComboLookup::Found(names) => names,
            ComboLookup::NotFound => vec![NOT_FOUND_MESSAGE.to_string()],
            ComboLookup::InvalidFormat => vec![INVALID_FORMAT_MESSAGE.to_string()],
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, ComboLookup::Found(_))
    }
}

// ============================================================================
// COMBINATION INDEX
// ============================================================================

pub struct CombinationIndex {
    fetcher: Arc<dyn Fetcher>,
    url: String,
    registry: Arc<NameRegistry>,

    /// Only successful loads are stored; held across the fetch so concurrent
    /// loaders share one request
    table: Mutex<Option<Arc<CombinationTable>>>,
}

impl CombinationIndex {
    pub fn new(fetcher: Arc<dyn Fetcher>, url: impl Into<String>, registry: Arc<NameRegistry>) -> Self {
        CombinationIndex {
            fetcher,
            url: url.into(),
            registry,
            table: Mutex::new(None),
        }
    }

    /// Cached table, or fetch it. Failures yield an empty table and are retried next call.
    pub async fn load(&self) -> Arc<CombinationTable> {
        let mut slot = self.table.lock().await;
        if let Some(table) = slot.as_ref() {
            return Arc::clone(table);
        }

        match self.fetch_table().await {
            Ok(table) => {
                info!(url = %self.url, entries = table.len(), "loaded combination table");
                let table = Arc::new(table);
                *slot = Some(Arc::clone(&table));
                table
            }
            Err(err) => {
                warn!(url = %self.url, error = %err, "combination table load failed");
                Arc::new(CombinationTable::default())
            }
        }
    }

    async fn fetch_table(&self) -> Result<CombinationTable, LoadError> {
        let raw: Map<String, Value> = fetch_json(self.fetcher.as_ref(), &self.url).await?;
        Ok(CombinationTable::from_raw(&raw, &self.registry))
    }

    pub async fn is_loaded(&self) -> bool {
        self.table.lock().await.is_some()
    }

    /// Results for "A + B" (either order, any casing/spacing)
    pub async fn lookup(&self, combo: &str) -> ComboLookup {
        let Some(key) = canonical_key(combo) else {
            return ComboLookup::InvalidFormat;
        };

        let table = self.load().await;
        match table.get(&key) {
            Some(results) => ComboLookup::Found(results.to_vec()),
            None => ComboLookup::NotFound,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
