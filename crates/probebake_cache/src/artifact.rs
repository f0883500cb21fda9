//! Content-addressed storage for baked textures.
//!
//! Every baked texture lives at `<cache_dir>/textures/<output_hash>.<ext>`.
//! Each file carries a small header with magic bytes, a format version, and a
//! checksum of the payload, so a truncated or foreign file reads as a miss.

use std::path::{Path, PathBuf};

use probebake_common::Hash128;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Magic bytes identifying a baked texture artifact.
const TEXTURE_MAGIC: [u8; 4] = *b"PRBK";

/// Current artifact format version. Increment on breaking changes to
/// the header or payload format.
const TEXTURE_FORMAT_VERSION: u32 = 1;

/// Subdirectory of the cache that holds texture artifacts.
const TEXTURE_SUBDIR: &str = "textures";

/// Header prepended to every baked texture for validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextureHeader {
    /// Magic bytes: must be `b"PRBK"`.
    pub magic: [u8; 4],

    /// Artifact format version.
    pub format_version: u32,

    /// Hash of the payload bytes.
    pub checksum: Hash128,
}

/// Content-addressed store for baked texture payloads.
pub struct TextureStore {
    /// Directory holding the texture files.
    root: PathBuf,

    /// File extension for texture files, without the dot.
    ext: String,
}

impl TextureStore {
    /// Creates a texture store inside the given cache directory.
    pub fn new(cache_dir: &Path, ext: &str) -> Self {
        Self {
            root: cache_dir.join(TEXTURE_SUBDIR),
            ext: ext.to_string(),
        }
    }

    /// Returns the directory holding the texture files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the file path for the texture with the given output hash.
    pub fn texture_path(&self, output_hash: Hash128) -> PathBuf {
        self.root.join(format!("{output_hash}.{}", self.ext))
    }

    /// Writes a texture keyed by its output hash and returns the file path.
    pub fn write(&self, output_hash: Hash128, data: &[u8]) -> Result<PathBuf, CacheError> {
        let path = self.texture_path(output_hash);
        self.write_at(&path, data)?;
        Ok(path)
    }

    /// Writes a texture payload with a validation header to an explicit path.
    pub fn write_at(&self, path: &Path, data: &[u8]) -> Result<(), CacheError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CacheError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let header = TextureHeader {
            magic: TEXTURE_MAGIC,
            format_version: TEXTURE_FORMAT_VERSION,
            checksum: Hash128::of(data),
        };
        let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
            .map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })?;

        // 4-byte header length (little-endian) + header + payload
        let header_len = header_bytes.len() as u32;
        let mut output = Vec::with_capacity(4 + header_bytes.len() + data.len());
        output.extend_from_slice(&header_len.to_le_bytes());
        output.extend_from_slice(&header_bytes);
        output.extend_from_slice(data);

        std::fs::write(path, &output).map_err(|e| CacheError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Reads the texture for an output hash.
    pub fn read(&self, output_hash: Hash128) -> Option<Vec<u8>> {
        self.read_at(&self.texture_path(output_hash))
    }

    /// Reads and validates a texture file.
    ///
    /// Returns `None` if the file doesn't exist, the header is invalid, the
    /// format version doesn't match, or the checksum doesn't verify.
    pub fn read_at(&self, path: &Path) -> Option<Vec<u8>> {
        let raw = std::fs::read(path).ok()?;
        if raw.len() < 4 {
            return None;
        }

        let header_len = u32::from_le_bytes(raw[..4].try_into().ok()?) as usize;
        if raw.len() < 4 + header_len {
            return None;
        }

        let header: TextureHeader =
            bincode::serde::decode_from_slice(&raw[4..4 + header_len], bincode::config::standard())
                .ok()?
                .0;
        if header.magic != TEXTURE_MAGIC || header.format_version != TEXTURE_FORMAT_VERSION {
            return None;
        }

        let payload = &raw[4 + header_len..];
        if Hash128::of(payload) != header.checksum {
            return None;
        }
        Some(payload.to_vec())
    }

    /// Deletes the texture for an output hash. Returns `false` if it was already gone.
    pub fn remove(&self, output_hash: Hash128) -> Result<bool, CacheError> {
        let path = self.texture_path(output_hash);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::Io { path, source: e }),
        }
    }

    /// Removes texture files whose output hash is not in `live`.
    ///
    /// Files with other extensions or non-hash names are left alone.
    /// Returns the number of files removed.
    pub fn gc(&self, live: &[Hash128]) -> Result<usize, CacheError> {
        if !self.root.exists() {
            return Ok(0);
        }

        let entries = std::fs::read_dir(&self.root).map_err(|e| CacheError::Io {
            path: self.root.clone(),
            source: e,
        })?;

        let mut removed = 0;
        for entry in entries {
            let entry = entry.map_err(|e| CacheError::Io {
                path: self.root.clone(),
                source: e,
            })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(self.ext.as_str()) {
                continue;
            }
            let Some(hash) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<Hash128>().ok())
            else {
                continue;
            };
            if !live.contains(&hash) {
                std::fs::remove_file(&path).map_err(|e| CacheError::Io {
                    path: path.clone(),
                    source: e,
                })?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}
