//! TOML scene descriptions for headless baking.
//!
//! A scene file lists the probes to bake, any externally authored probe
//! textures, and names for the static scene and sky state. Names are hashed,
//! so bumping a name (for example `sky = "overcast-v2"`) invalidates every bake.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use glam::Vec3;
use probebake_common::{EntityId, Hash128};
use probebake_core::{
    BakeableEntity, CustomTexture, EntityEnumerator, ImportedTexture, PlanarProbe, ProbeKind,
    ReflectionProbe, SceneStateHash,
};
use serde::Deserialize;

/// Errors from loading a scene file.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// The scene file could not be read.
    #[error("failed to read scene: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse scene: {0}")]
    Parse(String),

    /// The scene is well-formed TOML but describes an invalid scene.
    #[error("invalid scene: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
struct SceneToml {
    environment: EnvironmentToml,
    #[serde(default)]
    probes: Vec<ProbeToml>,
    #[serde(default)]
    custom_textures: Vec<CustomTextureToml>,
}

#[derive(Debug, Deserialize)]
struct EnvironmentToml {
    scene: String,
    sky: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ProbeKindToml {
    Reflection,
    Planar,
}

#[derive(Debug, Deserialize)]
struct ProbeToml {
    id: u64,
    kind: ProbeKindToml,
    position: [f32; 3],
    #[serde(default)]
    normal: Option<[f32; 3]>,
    #[serde(default = "default_resolution")]
    resolution: u32,
    #[serde(default = "default_near_clip")]
    near_clip: f32,
    #[serde(default = "default_far_clip")]
    far_clip: f32,
}

fn default_resolution() -> u32 {
    128
}

fn default_near_clip() -> f32 {
    0.3
}

fn default_far_clip() -> f32 {
    1000.0
}

#[derive(Debug, Deserialize)]
struct CustomTextureToml {
    id: u64,
    content: String,
}

/// A loaded scene, usable as the scheduler's entity source.
#[derive(Debug)]
pub struct SceneFile {
    probes: Vec<BakeableEntity>,
    custom: Vec<CustomTexture>,
    state: SceneStateHash,
    attached: BTreeMap<EntityId, ImportedTexture>,
}

impl SceneFile {
    /// Reads and validates a scene file.
    pub fn load(path: &Path) -> Result<Self, SceneError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parses and validates a scene from a string.
    pub fn parse(content: &str) -> Result<Self, SceneError> {
        let raw: SceneToml = toml::from_str(content).map_err(|e| SceneError::Parse(e.to_string()))?;

        let mut seen = BTreeSet::new();
        for id in raw
            .probes
            .iter()
            .map(|p| p.id)
            .chain(raw.custom_textures.iter().map(|c| c.id))
        {
            if !seen.insert(id) {
                return Err(SceneError::Invalid(format!("duplicate entity id {id}")));
            }
        }

        let probes = raw
            .probes
            .into_iter()
            .map(probe_from_toml)
            .collect::<Result<Vec<_>, _>>()?;
        let custom = raw
            .custom_textures
            .into_iter()
            .map(|c| CustomTexture {
                id: EntityId(c.id),
                content_hash: Hash128::of(c.content.as_bytes()),
            })
            .collect();
        let state = SceneStateHash {
            scene_objects: Hash128::of(raw.environment.scene.as_bytes()),
            sky_settings: Hash128::of(raw.environment.sky.as_bytes()),
        };

        Ok(Self {
            probes,
            custom,
            state,
            attached: BTreeMap::new(),
        })
    }

    /// Hashes of the scene's static state.
    pub fn state_hash(&self) -> SceneStateHash {
        self.state
    }

    /// Number of probes to bake.
    pub fn probe_count(&self) -> usize {
        self.probes.len()
    }

    /// Textures attached by the last bake, by probe.
    pub fn attached(&self) -> &BTreeMap<EntityId, ImportedTexture> {
        &self.attached
    }
}

fn probe_from_toml(p: ProbeToml) -> Result<BakeableEntity, SceneError> {
    if p.resolution == 0 {
        return Err(SceneError::Invalid(format!("probe {} has zero resolution", p.id)));
    }
    let kind = match p.kind {
        ProbeKindToml::Reflection => {
            if p.near_clip <= 0.0 || p.far_clip <= p.near_clip {
                return Err(SceneError::Invalid(format!(
                    "probe {} needs 0 < near_clip < far_clip",
                    p.id
                )));
            }
            ProbeKind::Reflection(ReflectionProbe {
                capture_position: Vec3::from_array(p.position),
                resolution: p.resolution,
                near_clip: p.near_clip,
                far_clip: p.far_clip,
            })
        }
        ProbeKindToml::Planar => {
            let normal = p.normal.map(Vec3::from_array).ok_or_else(|| {
                SceneError::Invalid(format!("planar probe {} is missing `normal`", p.id))
            })?;
            let normal = normal.try_normalize().ok_or_else(|| {
                SceneError::Invalid(format!("planar probe {} has a zero normal", p.id))
            })?;
            ProbeKind::Planar(PlanarProbe {
                capture_position: Vec3::from_array(p.position),
                plane_normal: normal,
                resolution: p.resolution,
            })
        }
    };
    Ok(BakeableEntity {
        id: EntityId(p.id),
        kind,
    })
}

impl EntityEnumerator for SceneFile {
    type Handle = ImportedTexture;

    fn active_probes(&self) -> Vec<BakeableEntity> {
        self.probes.clone()
    }

    fn custom_textures(&self) -> Vec<CustomTexture> {
        self.custom.clone()
    }

    fn attach_baked_texture(&mut self, id: EntityId, handle: ImportedTexture) {
        tracing::debug!(entity = %id, path = %handle.path.display(), "attached baked texture");
        self.attached.insert(id, handle);
    }

    fn has_baked_texture(&self, id: EntityId) -> bool {
        self.attached.contains_key(&id)
    }
}
