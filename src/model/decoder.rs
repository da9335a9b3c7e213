//! Decoding model descriptions into scenes.

use super::{BlockyModel, FaceLayout, ModelNode, ShapeKind, MODEL_EXTENSION};
use crate::error::{ConvertError, Result};
use crate::scene::{Cube, Face, Scene};
use crate::types::FaceSide;
use glam::{Mat4, Quat, Vec3};
use serde::Deserialize;
use std::path::Path;
use tracing::warn;

/// Maximum node nesting (guards against pathological input).
const MAX_NODE_DEPTH: usize = 256;

/// Turns a parsed model description into a [`Scene`].
pub trait ModelDecoder {
    /// Short name used in logs and setup errors.
    fn name(&self) -> &str;

    /// Decode `payload`, which was read from `source`.
    fn decode(&self, payload: &serde_json::Value, source: &Path) -> Result<Scene>;
}

/// Decoder for the `.blockymodel` JSON schema.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlockyModelDecoder;

impl ModelDecoder for BlockyModelDecoder {
    fn name(&self) -> &str {
        "blockymodel"
    }

    fn decode(&self, payload: &serde_json::Value, source: &Path) -> Result<Scene> {
        let model = BlockyModel::deserialize(payload)?;
        let mut scene = Scene::new(scene_name(source), source);

        for node in &model.nodes {
            add_node(&mut scene, node, Mat4::IDENTITY, 0)?;
        }

        Ok(scene)
    }
}

/// File name without the model extension.
fn scene_name(source: &Path) -> String {
    let file_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match file_name.strip_suffix(MODEL_EXTENSION) {
        Some(stem) => stem.to_string(),
        None => file_name,
    }
}

fn add_node(scene: &mut Scene, node: &ModelNode, parent: Mat4, depth: usize) -> Result<()> {
    if depth > MAX_NODE_DEPTH {
        return Err(ConvertError::Decode(format!(
            "node nesting deeper than {} at {:?}",
            MAX_NODE_DEPTH,
            node.display_name()
        )));
    }

    let position = Vec3::from_array(node.position.to_array());
    let q = node.orientation;
    let rotation = Quat::from_xyzw(q.x, q.y, q.z, q.w);
    let rotation = if rotation.length_squared() > f32::EPSILON {
        rotation.normalize()
    } else {
        warn!(node = %node.display_name(), "degenerate orientation, using identity");
        Quat::IDENTITY
    };
    let world = parent * Mat4::from_rotation_translation(rotation, position);

    if let Some(shape) = &node.shape {
        if shape.visible && shape.kind != ShapeKind::None {
            let (mut from, mut to) = shape.bounds();
            let size = shape.settings.size.to_array().map(f32::abs);

            let sides: Vec<FaceSide> = match shape.kind {
                ShapeKind::Box => FaceSide::ALL.to_vec(),
                ShapeKind::Quad => {
                    let normal = shape.settings.normal.as_deref().unwrap_or("+Z");
                    let side = FaceSide::from_normal(normal).ok_or_else(|| {
                        ConvertError::Decode(format!(
                            "quad {:?} has unknown normal {:?}",
                            node.display_name(),
                            normal
                        ))
                    })?;
                    // Flatten onto the plane the quad faces
                    let axis = side.normal().iter().position(|c| *c != 0.0).unwrap_or(2);
                    let center = shape.offset.to_array()[axis];
                    from[axis] = center;
                    to[axis] = center;
                    vec![side]
                }
                ShapeKind::None => Vec::new(),
            };

            let mut cube = Cube::new(node.display_name(), from, to).with_transform(world);
            cube.double_sided = shape.double_sided || shape.kind == ShapeKind::Quad;
            for side in sides {
                let layout = shape.texture_layout.get(&side).cloned().unwrap_or_default();
                cube.faces.insert(side, layout_face(side, size, &layout));
            }
            scene.add_cube(cube);
        }
    }

    for child in &node.children {
        add_node(scene, child, world, depth + 1)?;
    }

    Ok(())
}

/// Compute the reference-space UV rectangle for one side.
fn layout_face(side: FaceSide, size: [f32; 3], layout: &FaceLayout) -> Face {
    let (mut width, mut height) = side.extent(size);
    let angle = (layout.angle.rem_euclid(360) / 90) * 90;
    if angle == 90 || angle == 270 {
        std::mem::swap(&mut width, &mut height);
    }

    let (x, y) = (layout.offset.x, layout.offset.y);
    let mut uv = [x, y, x + width, y + height];
    if layout.mirror.x {
        uv.swap(0, 2);
    }
    if layout.mirror.y {
        uv.swap(1, 3);
    }

    Face::new(uv).with_rotation(angle)
}
