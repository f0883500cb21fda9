//! Bakeable entities and the scene-wide inputs that affect them.

use glam::Vec3;
use probebake_common::{EntityId, Hash128};

/// Settings of a cubemap reflection probe.
#[derive(Debug, Clone, PartialEq)]
pub struct ReflectionProbe {
    /// World-space capture point.
    pub capture_position: Vec3,
    /// Cubemap face size in texels.
    pub resolution: u32,
    /// Near clip distance of the capture camera.
    pub near_clip: f32,
    /// Far clip distance of the capture camera.
    pub far_clip: f32,
}

/// Settings of a planar reflection probe.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanarProbe {
    /// World-space capture point.
    pub capture_position: Vec3,
    /// Normal of the reflecting plane.
    pub plane_normal: Vec3,
    /// Texture size in texels.
    pub resolution: u32,
}

/// The kinds of probe the pipeline knows how to bake.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeKind {
    /// Cubemap capture around a point.
    Reflection(ReflectionProbe),
    /// Mirrored capture across a plane.
    Planar(PlanarProbe),
}

impl ProbeKind {
    /// Short lowercase name of the kind, for logs and reports.
    pub fn name(&self) -> &'static str {
        match self {
            ProbeKind::Reflection(_) => "reflection",
            ProbeKind::Planar(_) => "planar",
        }
    }

    /// Output texture size in texels.
    pub fn resolution(&self) -> u32 {
        match self {
            ProbeKind::Reflection(p) => p.resolution,
            ProbeKind::Planar(p) => p.resolution,
        }
    }
}

/// A probe the host wants baked.
#[derive(Debug, Clone, PartialEq)]
pub struct BakeableEntity {
    /// Stable identity assigned by the host.
    pub id: EntityId,
    /// Probe settings.
    pub kind: ProbeKind,
}

/// A probe whose content is authored externally rather than baked.
///
/// Its content hash still feeds the dependency hash of every baked probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomTexture {
    /// Stable identity assigned by the host.
    pub id: EntityId,
    /// Hash of the authored texture content.
    pub content_hash: Hash128,
}

/// Hashes of the static scene supplied by the host once per tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneStateHash {
    /// Static geometry and materials.
    pub scene_objects: Hash128,
    /// Sky and ambient lighting settings.
    pub sky_settings: Hash128,
}
