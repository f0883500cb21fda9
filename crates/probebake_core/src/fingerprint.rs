//! State, dependency, and output hashes for bakeable entities.
//!
//! A probe's output hash is its own state hash appended with one aggregate
//! hash shared by every probe. Any change to a shared input therefore changes
//! every output hash and forces a full rebake.

use glam::Vec3;
use probebake_common::{ContentHasher, EntityId, Hash128};

use crate::entity::{BakeableEntity, CustomTexture, ProbeKind, SceneStateHash};

const KIND_REFLECTION: u8 = 1;
const KIND_PLANAR: u8 = 2;

/// Computes state hashes for probe settings.
///
/// Float settings are multiplied by `quantization` and rounded before they
/// are hashed, so editor jitter below `0.5 / quantization` does not cause a
/// rebake.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fingerprinter {
    quantization: f32,
}

impl Fingerprinter {
    /// Creates a fingerprinter with the given quantization scale.
    pub fn new(quantization: f32) -> Self {
        debug_assert!(quantization > 0.0, "quantization must be positive");
        Self { quantization }
    }

    /// Returns the quantization scale.
    pub fn quantization(&self) -> f32 {
        self.quantization
    }

    /// Hashes an entity's own settings.
    ///
    /// The entity id is not part of the hash, so two probes with
    /// identical settings share one output.
    pub fn state_hash(&self, entity: &BakeableEntity) -> Hash128 {
        let mut hasher = ContentHasher::new();
        match &entity.kind {
            ProbeKind::Reflection(probe) => {
                hasher.write_u8(KIND_REFLECTION);
                self.write_vec3(&mut hasher, probe.capture_position);
                hasher
                    .write_u32(probe.resolution)
                    .write_quantized(probe.near_clip, self.quantization)
                    .write_quantized(probe.far_clip, self.quantization);
            }
            ProbeKind::Planar(probe) => {
                hasher.write_u8(KIND_PLANAR);
                self.write_vec3(&mut hasher, probe.capture_position);
                self.write_vec3(&mut hasher, probe.plane_normal);
                hasher.write_u32(probe.resolution);
            }
        }
        hasher.finish()
    }

    fn write_vec3(&self, hasher: &mut ContentHasher, v: Vec3) {
        hasher
            .write_quantized(v.x, self.quantization)
            .write_quantized(v.y, self.quantization)
            .write_quantized(v.z, self.quantization);
    }
}

impl Default for Fingerprinter {
    fn default() -> Self {
        Self::new(1000.0)
    }
}

/// Folds every scene-wide input into one dependency hash.
///
/// Fold order: every probe state hash when `bounces > 1`, then every custom
/// texture hash, then the scene objects hash, then the sky hash. Both lists are
/// sorted by entity id first so enumeration order never changes the result.
pub fn aggregate_hash(
    states: &[(EntityId, Hash128)],
    bounces: u32,
    custom: &[CustomTexture],
    scene: &SceneStateHash,
) -> Hash128 {
    let mut acc = Hash128::EMPTY;

    if bounces > 1 {
        let mut sorted = states.to_vec();
        sorted.sort_by_key(|(id, _)| *id);
        acc = sorted.into_iter().fold(acc, |acc, (_, state)| acc.append(state));
    }

    let mut sorted_custom: Vec<(EntityId, Hash128)> =
        custom.iter().map(|c| (c.id, c.content_hash)).collect();
    sorted_custom.sort_by_key(|(id, _)| *id);
    acc = sorted_custom
        .into_iter()
        .fold(acc, |acc, (_, content)| acc.append(content));

    acc.append(scene.scene_objects).append(scene.sky_settings)
}

/// Content address of an entity's baked texture.
pub fn output_hash(state_hash: Hash128, aggregate: Hash128) -> Hash128 {
    state_hash.append(aggregate)
}
