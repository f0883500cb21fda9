//! Deterministic CPU renderer for headless bakes.
//!
//! Produces an RGBA8 gradient per probe, tinted by the probe's capture
//! position. The pixels carry no lighting; the point is that identical
//! settings always produce identical bytes, so the full bake pipeline can run
//! without a GPU.

use probebake_core::{BakeableEntity, ProbeKind, RenderError, Renderer};

/// Largest texture edge the headless renderer will produce.
const MAX_RESOLUTION: u32 = 2048;

/// Renders probes synchronously on the CPU.
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    rendered: usize,
}

impl HeadlessRenderer {
    /// Creates a renderer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of probes rendered so far.
    pub fn rendered(&self) -> usize {
        self.rendered
    }
}

impl Renderer for HeadlessRenderer {
    type Texture = Vec<u8>;

    fn render(&mut self, entity: &BakeableEntity) -> Result<Vec<u8>, RenderError> {
        let size = entity.kind.resolution();
        if size == 0 || size > MAX_RESOLUTION {
            return Err(RenderError::new(format!(
                "resolution {size} outside 1..={MAX_RESOLUTION}"
            )));
        }

        let origin = match &entity.kind {
            ProbeKind::Reflection(p) => p.capture_position,
            ProbeKind::Planar(p) => p.capture_position + p.plane_normal,
        };
        let tint = [channel(origin.x), channel(origin.y), channel(origin.z)];

        let edge = size as usize;
        let mut texels = Vec::with_capacity(edge * edge * 4);
        for y in 0..edge {
            for x in 0..edge {
                let u = (x * 255 / edge) as u8;
                let v = (y * 255 / edge) as u8;
                texels.extend_from_slice(&[u ^ tint[0], v ^ tint[1], tint[2], 255]);
            }
        }

        self.rendered += 1;
        Ok(texels)
    }

    fn is_complete(&self) -> bool {
        true
    }

    fn cancel(&mut self) {
        tracing::debug!("headless renderer has no outstanding work to cancel");
    }
}

/// Maps a world coordinate onto a repeating byte pattern.
fn channel(coord: f32) -> u8 {
    (coord * 16.0).rem_euclid(256.0) as u8
}
