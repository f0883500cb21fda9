//! [`TextureCache`] backed by the on-disk [`TextureStore`].

use std::path::{Path, PathBuf};

use probebake_cache::{BakedRecord, CacheError, TextureStore};
use probebake_common::{EntityId, Hash128};

use crate::collab::TextureCache;

/// A texture that passed validation and was loaded from the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedTexture {
    /// Output hash the texture was baked for, taken from its file name.
    pub output_hash: Hash128,
    /// File the texture was read from.
    pub path: PathBuf,
    /// Payload size in bytes.
    pub byte_len: usize,
}

/// Texture cache that keeps raw texture bytes in a [`TextureStore`].
pub struct DiskTextureCache {
    store: TextureStore,
}

impl DiskTextureCache {
    /// Creates a cache rooted at `cache_dir`, naming files with `ext`.
    pub fn new(cache_dir: &Path, ext: &str) -> Self {
        Self {
            store: TextureStore::new(cache_dir, ext),
        }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &TextureStore {
        &self.store
    }
}

impl TextureCache for DiskTextureCache {
    type Texture = Vec<u8>;
    type Handle = ImportedTexture;

    fn cache_path(&self, _id: EntityId, output_hash: Hash128) -> PathBuf {
        self.store.texture_path(output_hash)
    }

    fn write_baked_texture(&mut self, texture: &Vec<u8>, path: &Path) -> Result<(), CacheError> {
        self.store.write_at(path, texture)
    }

    fn contains(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn import_from_cache(&mut self, path: &Path) -> Result<ImportedTexture, CacheError> {
        let invalid = || CacheError::InvalidArtifact {
            path: path.to_path_buf(),
        };
        let output_hash = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.parse::<Hash128>().ok())
            .ok_or_else(invalid)?;
        let bytes = self.store.read_at(path).ok_or_else(invalid)?;
        Ok(ImportedTexture {
            output_hash,
            path: path.to_path_buf(),
            byte_len: bytes.len(),
        })
    }

    fn delete_asset(&mut self, record: &BakedRecord) -> Result<(), CacheError> {
        self.store.remove(record.output_hash).map(|_| ())
    }
}
