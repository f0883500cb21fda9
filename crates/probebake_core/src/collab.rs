//! Interfaces to the host that owns the scene, the GPU, and the asset database.
//!
//! The scheduler never touches probes, textures, or files directly; it is
//! handed one implementation of each trait at construction time.

use std::path::{Path, PathBuf};

use probebake_cache::{BakedRecord, CacheError};
use probebake_common::{EntityId, Hash128};

use crate::entity::{BakeableEntity, CustomTexture};
use crate::error::RenderError;

/// Source of the probes to bake, and sink for finished textures.
pub trait EntityEnumerator {
    /// Handle to an imported texture, as produced by the paired [`TextureCache`].
    type Handle;

    /// Probes that should currently be baked.
    fn active_probes(&self) -> Vec<BakeableEntity>;

    /// Probes with authored content whose hashes affect every bake.
    fn custom_textures(&self) -> Vec<CustomTexture>;

    /// Binds an imported baked texture to a probe.
    fn attach_baked_texture(&mut self, id: EntityId, handle: Self::Handle);

    /// Returns `true` if a baked texture was already attached to the probe.
    fn has_baked_texture(&self, id: EntityId) -> bool;
}

/// Captures probes into textures.
///
/// Rendering may finish asynchronously; the scheduler waits for
/// [`Renderer::is_complete`] before committing a job.
pub trait Renderer {
    /// Rendered output, handed to [`TextureCache::write_baked_texture`].
    type Texture;

    /// Renders one probe.
    fn render(&mut self, entity: &BakeableEntity) -> Result<Self::Texture, RenderError>;

    /// Returns `true` once every submitted render has finished.
    fn is_complete(&self) -> bool;

    /// Abandons any outstanding work.
    fn cancel(&mut self);
}

/// Stores and imports baked textures by output hash.
pub trait TextureCache {
    /// Rendered output accepted by [`TextureCache::write_baked_texture`].
    type Texture;

    /// Handle to an imported texture.
    type Handle: Clone;

    /// Where the texture for `output_hash` lives.
    fn cache_path(&self, id: EntityId, output_hash: Hash128) -> PathBuf;

    /// Writes a rendered texture to `path`.
    fn write_baked_texture(&mut self, texture: &Self::Texture, path: &Path) -> Result<(), CacheError>;

    /// Returns `true` if a texture is present at `path`.
    fn contains(&self, path: &Path) -> bool;

    /// Imports the texture at `path`.
    fn import_from_cache(&mut self, path: &Path) -> Result<Self::Handle, CacheError>;

    /// Deletes the asset behind a record that is no longer baked.
    fn delete_asset(&mut self, record: &BakedRecord) -> Result<(), CacheError>;
}
