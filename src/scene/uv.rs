//! UV repair for textures that are not the reference size.
//!
//! Decoded UVs are authored against a 64×64 texture. When the real texture
//! is W×H, every rectangle has to be stretched by (W/64, H/64) to land on
//! the same texels once the exporter normalizes by the real size.

use super::Scene;
use crate::types::TextureId;

/// Per-axis scale from the reference space to a texture's pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvScale {
    pub u: f32,
    pub v: f32,
}

impl UvScale {
    /// Scale that maps `reference`-sized UVs onto a `width`×`height` texture.
    pub fn between(reference: u32, width: u32, height: u32) -> Self {
        let reference = reference as f32;
        Self {
            u: width as f32 / reference,
            v: height as f32 / reference,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.u == 1.0 && self.v == 1.0
    }

    /// Apply to one rectangle: u at indices 0 and 2, v at 1 and 3.
    pub fn apply(&self, uv: &mut [f32; 4]) {
        uv[0] *= self.u;
        uv[2] *= self.u;
        uv[1] *= self.v;
        uv[3] *= self.v;
    }
}

/// Bind every face to `texture` and rescale its UVs from the reference
/// space to a `width`×`height` texture.
///
/// The texture assignment always happens; coordinates are only touched
/// when the scale is not the identity. Not idempotent: a second call
/// multiplies again.
pub fn rescale_uvs(
    scene: &mut Scene,
    texture: TextureId,
    width: u32,
    height: u32,
    reference: u32,
) -> UvScale {
    let scale = UvScale::between(reference, width, height);
    let needs_scale = !scale.is_identity();

    for face in scene.faces_mut() {
        face.texture = Some(texture);
        if needs_scale {
            scale.apply(&mut face.uv);
        }
    }

    scale
}
