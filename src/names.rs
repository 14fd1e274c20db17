// 🏷️ Name Resolution - Loose user input → exact on-disk file key
//
// Problem solved:
// - "rare mammott", "Rare Mammott", "  RARE mammott " → (Rare, "Mammott")
// - "t-rox" → whatever casing the breeding table used ("T-Rox"), not a guess
// - Names never seen in the table fall back to a casing heuristic
//
// The registry is the source of truth: a name seen verbatim in the
// combination dataset always wins over the heuristic.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

// ============================================================================
// TIER
// ============================================================================

/// Rarity tier; decides both the record folder and the costume subfolder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    /// Base tier, implied when no qualifier is given
    Common,
    Rare,
    Epic,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Common => "Common",
            Tier::Rare => "Rare",
            Tier::Epic => "Epic",
        }
    }

    pub fn is_base(&self) -> bool {
        *self == Tier::Common
    }

    /// Exact folder label as used in the dataset ("Common", "Rare", "Epic")
    pub fn from_label(label: &str) -> Option<Tier> {
        match label {
            "Common" => Some(Tier::Common),
            "Rare" => Some(Tier::Rare),
            "Epic" => Some(Tier::Epic),
            _ => None,
        }
    }

    /// Tiers that can be written as a leading qualifier word
    fn qualified() -> [(Tier, &'static str); 2] {
        [(Tier::Rare, "rare "), (Tier::Epic, "epic ")]
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// RESOLVED NAME
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedName {
    pub tier: Tier,

    /// Exact casing required by the remote store
    pub file_key: String,
}

/// Split a leading "rare "/"epic " qualifier off a raw name
///
/// Only the literal matched prefix is removed; the remainder is returned
/// untouched (it may still contain the word elsewhere).
pub fn split_qualifier(raw_name: &str) -> (Tier, &str) {
    let trimmed = raw_name.trim();

    for (tier, prefix) in Tier::qualified() {
        let matches = trimmed
            .get(..prefix.len())
            .map(|head| head.eq_ignore_ascii_case(prefix))
            .unwrap_or(false);
        if matches {
            return (tier, &trimmed[prefix.len()..]);
        }
    }

    (Tier::Common, trimmed)
}

// ============================================================================
// NAME REGISTRY
// ============================================================================

/// lowercase name → canonical casing, as seen in the combination table
///
/// Append-only for the lifetime of the owning `Msm` context: entries are
/// inserted (or re-inserted with the casing seen last) but never removed.
#[derive(Debug, Default)]
pub struct NameRegistry {
    names: RwLock<HashMap<String, String>>,
}

impl NameRegistry {
    pub fn new() -> Self {
        NameRegistry {
            names: RwLock::new(HashMap::new()),
        }
    }

    /// Record a name with its exact casing
    pub fn register(&self, canonical: &str) {
        let mut names = self.names.write().unwrap_or_else(|e| e.into_inner());
        names.insert(canonical.to_lowercase(), canonical.to_string());
    }

    pub fn register_all<'a, I>(&self, canonicals: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut names = self.names.write().unwrap_or_else(|e| e.into_inner());
        for canonical in canonicals {
            names.insert(canonical.to_lowercase(), canonical.to_string());
        }
    }

    /// Canonical casing for a name, looked up case-insensitively
    pub fn get(&self, name: &str) -> Option<String> {
        let names = self.names.read().unwrap_or_else(|e| e.into_inner());
        names.get(&name.to_lowercase()).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.names.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// NAME RESOLVER
// ============================================================================

/// Maps raw user input to `{tier, file_key}`
///
/// Query it after the combination index has loaded at least once, otherwise
/// every lookup falls through to the casing heuristic.
#[derive(Debug, Clone)]
pub struct NameResolver {
    registry: Arc<NameRegistry>,
}

impl NameResolver {
    pub fn new(registry: Arc<NameRegistry>) -> Self {
        NameResolver { registry }
    }

    pub fn resolve(&self, raw_name: &str) -> ResolvedName {
        let (tier, remainder) = split_qualifier(raw_name);

        let file_key = self
            .registry
            .get(remainder)
            .unwrap_or_else(|| heuristic_casing(remainder));

        ResolvedName { tier, file_key }
    }

    /// Name to use for costume lookups: registry casing, else the input as given
    pub fn canonical_name(&self, raw_name: &str) -> String {
        let (_, remainder) = split_qualifier(raw_name);
        self.registry
            .get(remainder)
            .unwrap_or_else(|| remainder.to_string())
    }
}

/// Keep caller casing if any uppercase is present, else capitalize the first char
fn heuristic_casing(name: &str) -> String {
    if name.chars().any(|c| c.is_ascii_uppercase()) {
        return name.to_string();
    }

    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ============================================================================
// SOUND FILE NAMES
// ============================================================================

/// Memory sample file for a display name
///
/// "rare pom pom" → "Pom_Pom_Memory_Sample.mp3.mpeg"
pub fn sound_file_name(display_name: &str) -> String {
    let base = strip_qualifier_word(display_name);

    let words: Vec<String> = base
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect();

    format!("{}_Memory_Sample.mp3.mpeg", words.join("_"))
}

/// Drop a leading "rare"/"epic" word followed by any whitespace (tab, newline...)
fn strip_qualifier_word(name: &str) -> &str {
    let trimmed = name.trim();

    if let Some(split) = trimmed.find(char::is_whitespace) {
        let (head, rest) = trimmed.split_at(split);
        if head.eq_ignore_ascii_case("rare") || head.eq_ignore_ascii_case("epic") {
            return rest.trim_start();
        }
    }

    trimmed
}

// ============================================================================
// TESTS
// ============================================================================
