// MSM API - Core Library
// Name resolution + lazy, cached access to the My Singing Monsters dataset

pub mod assets;
pub mod cache;
pub mod client;
pub mod combos;
pub mod config;
pub mod entity;
pub mod error;
pub mod fetch;
pub mod loader;
pub mod names;

// Re-export commonly used types
pub use assets::{AssetIndex, AssetTable};
pub use cache::{Deferred, LazyCache, Lookup};
pub use client::{Access, CombinationOp, FetchOp, Msm, COMBINATION_KEY, FETCH_KEY};
pub use combos::{
    canonical_key, CombinationIndex, CombinationTable, ComboLookup, INVALID_FORMAT_MESSAGE,
    NOT_FOUND_MESSAGE,
};
pub use config::Config;
pub use entity::{Entity, MonsterRecord, Statistics};
pub use error::LoadError;
pub use fetch::{fetch_json, Fetcher, HttpFetcher};
pub use loader::EntityLoader;
pub use names::{sound_file_name, split_qualifier, NameRegistry, NameResolver, ResolvedName, Tier};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
