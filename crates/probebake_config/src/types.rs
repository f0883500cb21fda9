//! Configuration types deserialized from `probebake.toml`.

use serde::Deserialize;

/// Default scale applied to capture positions before rounding.
pub const DEFAULT_QUANTIZATION: f32 = 1000.0;

/// The top-level project configuration parsed from `probebake.toml`.
#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    /// Project metadata and scene location.
    pub project: ProjectMeta,
    /// Probe bake settings.
    #[serde(default)]
    pub bake: BakeConfig,
    /// Cache directory settings.
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Core project metadata required in every `probebake.toml`.
#[derive(Debug, Deserialize)]
pub struct ProjectMeta {
    /// The project name.
    pub name: String,
    /// Path to the scene description, relative to the project root.
    pub scene: String,
}

/// Settings that feed into every probe's fingerprint.
#[derive(Debug, Clone, Deserialize)]
pub struct BakeConfig {
    /// Number of light bounces. Above one, every probe's output depends on
    /// every other probe's settings.
    #[serde(default = "default_bounces")]
    pub bounces: u32,
    /// Scale applied to float settings before rounding and hashing.
    #[serde(default = "default_quantization")]
    pub quantization: f32,
}

impl Default for BakeConfig {
    fn default() -> Self {
        Self {
            bounces: default_bounces(),
            quantization: default_quantization(),
        }
    }
}

fn default_bounces() -> u32 {
    1
}

fn default_quantization() -> f32 {
    DEFAULT_QUANTIZATION
}

/// Location and naming of the on-disk bake cache.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Cache directory, relative to the project root.
    #[serde(default = "default_cache_dir")]
    pub dir: String,
    /// File extension used for baked texture artifacts.
    #[serde(default = "default_texture_ext")]
    pub texture_ext: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
            texture_ext: default_texture_ext(),
        }
    }
}

fn default_cache_dir() -> String {
    ".probebake-cache".to_string()
}

fn default_texture_ext() -> String {
    "bake".to_string()
}
