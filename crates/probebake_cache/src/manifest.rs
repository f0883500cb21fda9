//! Persisted bake state.
//!
//! The manifest is stored as `bake-state.json` in the cache directory. It is
//! the only state that has to survive a restart: the sorted list of baked
//! records, tagged with the tool version that wrote it.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CacheError;
use crate::store::{BakedRecord, BakedStateStore};

/// Name of the manifest file within the cache directory.
const MANIFEST_FILE: &str = "bake-state.json";

/// On-disk form of a [`BakedStateStore`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BakeManifest {
    /// Version of the tool that produced this manifest. Invalidate on change.
    pub probebake_version: String,

    /// Baked records in ascending output-hash order.
    pub records: Vec<BakedRecord>,
}

impl BakeManifest {
    /// Creates an empty manifest for the given tool version.
    pub fn new(probebake_version: &str) -> Self {
        Self {
            probebake_version: probebake_version.to_string(),
            records: Vec::new(),
        }
    }

    /// Snapshots a store for persistence.
    pub fn from_store(probebake_version: &str, store: &BakedStateStore) -> Self {
        Self {
            probebake_version: probebake_version.to_string(),
            records: store.records().to_vec(),
        }
    }

    /// Restores the store this manifest describes.
    pub fn into_store(self) -> BakedStateStore {
        BakedStateStore::from_records(self.records)
    }

    /// Loads the manifest from the cache directory, returning `None` if the
    /// file doesn't exist or can't be parsed.
    ///
    /// Any problem results in `None`, so the caller starts from an empty store
    /// and rebakes everything.
    pub fn load(cache_dir: &Path) -> Option<Self> {
        let path = cache_dir.join(MANIFEST_FILE);
        let content = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&content) {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable bake manifest");
                None
            }
        }
    }

    /// Loads a compatible manifest, or an empty one if none is usable.
    pub fn load_or_new(cache_dir: &Path, probebake_version: &str) -> Self {
        Self::load(cache_dir)
            .filter(|m| m.is_compatible(probebake_version))
            .unwrap_or_else(|| Self::new(probebake_version))
    }

    /// Saves the manifest to the cache directory.
    ///
    /// Creates the cache directory if it doesn't exist.
    pub fn save(&self, cache_dir: &Path) -> Result<(), CacheError> {
        std::fs::create_dir_all(cache_dir).map_err(|e| CacheError::Io {
            path: cache_dir.to_path_buf(),
            source: e,
        })?;
        let path = cache_dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self).map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;
        std::fs::write(&path, json).map_err(|e| CacheError::Io { path, source: e })
    }

    /// Returns `true` if this manifest was produced by a compatible tool version.
    pub fn is_compatible(&self, current_version: &str) -> bool {
        self.probebake_version == current_version
    }
}
