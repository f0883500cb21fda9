//! Shared project loading for CLI commands.
//!
//! Resolves the project root, loads `probebake.toml` and the scene it names,
//! and builds the scheduler the `bake` and `status` commands drive.

use std::path::{Path, PathBuf};

use probebake_cache::BakeManifest;
use probebake_config::{load_config, load_config_file, ProjectConfig, CONFIG_FILE};
use probebake_core::{BakeScheduler, BakeSettings, DiskTextureCache};

use crate::renderer::HeadlessRenderer;
use crate::scene::SceneFile;
use crate::GlobalArgs;

/// Version tag written into the bake manifest.
pub const PROBEBAKE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// The scheduler configuration used by the CLI.
pub type CliScheduler = BakeScheduler<SceneFile, HeadlessRenderer, DiskTextureCache>;

/// A loaded project.
pub struct Project {
    /// Directory containing `probebake.toml`.
    pub root: PathBuf,
    /// Parsed configuration.
    pub config: ProjectConfig,
}

impl Project {
    /// Loads the project selected by the global CLI args.
    pub fn load(global: &GlobalArgs) -> Result<Self, Box<dyn std::error::Error>> {
        match global.config {
            Some(ref config_path) => {
                let p = PathBuf::from(config_path);
                if p.is_file() {
                    let root = p
                        .parent()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| PathBuf::from("."));
                    let config = load_config_file(&p)?;
                    Ok(Self { root, config })
                } else {
                    let config = load_config(&p)?;
                    Ok(Self { root: p, config })
                }
            }
            None => {
                let root = find_project_root(&std::env::current_dir()?)?;
                let config = load_config(&root)?;
                Ok(Self { root, config })
            }
        }
    }

    /// Absolute cache directory.
    pub fn cache_dir(&self) -> PathBuf {
        self.root.join(&self.config.cache.dir)
    }

    /// Loads the scene named in the configuration.
    pub fn load_scene(&self) -> Result<SceneFile, Box<dyn std::error::Error>> {
        let path = self.root.join(&self.config.project.scene);
        SceneFile::load(&path).map_err(|e| format!("{}: {e}", path.display()).into())
    }

    /// Bake settings from the configuration.
    pub fn settings(&self) -> BakeSettings {
        BakeSettings {
            bounces: self.config.bake.bounces,
            quantization: self.config.bake.quantization,
        }
    }

    /// Builds a scheduler over the persisted bake state.
    pub fn scheduler(&self) -> Result<CliScheduler, Box<dyn std::error::Error>> {
        let scene = self.load_scene()?;
        let cache_dir = self.cache_dir();
        let store = BakeManifest::load_or_new(&cache_dir, PROBEBAKE_VERSION).into_store();
        tracing::debug!(
            probes = scene.probe_count(),
            baked = store.len(),
            cache = %cache_dir.display(),
            "loaded project"
        );
        Ok(BakeScheduler::new(
            scene,
            HeadlessRenderer::new(),
            DiskTextureCache::new(&cache_dir, &self.config.cache.texture_ext),
            self.settings(),
            store,
        ))
    }
}

/// Walks up from `start` looking for the nearest directory containing `probebake.toml`.
pub fn find_project_root(start: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(format!(
                "could not find {CONFIG_FILE} in {} or any parent directory",
                start.display()
            )
            .into());
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;

    /// Writes a two-probe project into `dir`.
    pub fn write_project(dir: &Path) {
        std::fs::write(
            dir.join("probebake.toml"),
            r#"
[project]
name = "atrium"
scene = "scene.toml"

[bake]
bounces = 2
"#,
        )
        .unwrap();
        write_scene(dir, "overcast");
    }

    /// Rewrites the project's scene with the given sky name.
    pub fn write_scene(dir: &Path, sky: &str) {
        std::fs::write(
            dir.join("scene.toml"),
            format!(
                r#"
[environment]
scene = "atrium-v1"
sky = "{sky}"

[[probes]]
id = 1
kind = "reflection"
position = [0.0, 1.5, 0.0]
resolution = 16

[[probes]]
id = 2
kind = "planar"
position = [0.0, 0.0, 0.0]
normal = [0.0, 1.0, 0.0]
resolution = 16
"#
            ),
        )
        .unwrap();
    }
}
