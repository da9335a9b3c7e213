//! Triangulation of scenes.
//!
//! Every face of every cube becomes a textured quad. Quads are grouped by
//! the texture their face is bound to so each exporter can emit one
//! material per group.

pub mod geometry;

pub use geometry::{Mesh, Vertex};

use crate::scene::{Cube, Face, Scene};
use crate::types::{BoundingBox, FaceSide, TextureId};
use glam::Vec3;

/// Model units per metre in exported files.
pub const UNITS_PER_METRE: f32 = 16.0;

/// Faces sharing one texture binding.
#[derive(Debug, Clone)]
pub struct MaterialGroup {
    /// Bound texture, or `None` for untextured faces.
    pub texture: Option<TextureId>,
    pub mesh: Mesh,
}

/// A scene flattened into triangle meshes.
#[derive(Debug, Clone, Default)]
pub struct SceneMesh {
    /// Groups in order of first appearance.
    pub groups: Vec<MaterialGroup>,
}

impl SceneMesh {
    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|g| g.mesh.is_empty())
    }

    pub fn total_vertices(&self) -> usize {
        self.groups.iter().map(|g| g.mesh.vertex_count()).sum()
    }

    pub fn total_triangles(&self) -> usize {
        self.groups.iter().map(|g| g.mesh.triangle_count()).sum()
    }

    /// Bounds over all vertices, if there are any.
    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(
            self.groups
                .iter()
                .flat_map(|g| g.mesh.vertices.iter().map(|v| v.position)),
        )
    }

    fn group_mut(&mut self, texture: Option<TextureId>) -> &mut Mesh {
        let index = match self.groups.iter().position(|g| g.texture == texture) {
            Some(index) => index,
            None => {
                self.groups.push(MaterialGroup {
                    texture,
                    mesh: Mesh::new(),
                });
                self.groups.len() - 1
            }
        };
        &mut self.groups[index].mesh
    }
}

/// Triangulate every face in the scene.
///
/// UVs are normalized by the scene's texture size.
pub fn build_mesh(scene: &Scene) -> SceneMesh {
    let [width, height] = scene.texture_size();
    let texture_size = [width.max(1) as f32, height.max(1) as f32];

    let mut output = SceneMesh::default();
    for cube in scene.cubes() {
        for (side, face) in &cube.faces {
            let mesh = output.group_mut(face.texture);
            add_face(mesh, cube, *side, face, texture_size);
        }
    }
    output
}

fn add_face(mesh: &mut Mesh, cube: &Cube, side: FaceSide, face: &Face, texture_size: [f32; 2]) {
    let uv = [
        face.uv[0] / texture_size[0],
        face.uv[1] / texture_size[1],
        face.uv[2] / texture_size[0],
        face.uv[3] / texture_size[1],
    ];
    let (corners, uvs) = face_vertices(side, cube.from, cube.to, uv, face.rotation);

    let normal = cube
        .transform
        .transform_vector3(Vec3::from_array(side.normal()))
        .normalize_or_zero();
    let positions = corners.map(|p| {
        (cube.transform.transform_point3(Vec3::from_array(p)) / UNITS_PER_METRE).to_array()
    });

    let front: Vec<u32> = (0..4)
        .map(|i| mesh.add_vertex(Vertex::new(positions[i], normal.to_array(), uvs[i])))
        .collect();
    mesh.add_quad(front[0], front[1], front[2], front[3]);

    if cube.double_sided {
        let back_normal = cube
            .transform
            .transform_vector3(Vec3::from_array(side.opposite().normal()))
            .normalize_or_zero()
            .to_array();
        let back: Vec<u32> = (0..4)
            .map(|i| mesh.add_vertex(Vertex::new(positions[i], back_normal, uvs[i])))
            .collect();
        mesh.add_quad(back[0], back[3], back[2], back[1]);
    }
}

/// Generate the 4 corners of a face with their UVs.
/// Corners run top-left, top-right, bottom-right, bottom-left as seen from outside.
fn face_vertices(
    side: FaceSide,
    from: [f32; 3],
    to: [f32; 3],
    uv: [f32; 4],
    rotation: i32,
) -> ([[f32; 3]; 4], [[f32; 2]; 4]) {
    let (u1, v1, u2, v2) = (uv[0], uv[1], uv[2], uv[3]);

    // v = 0 is the top row of the texture
    let base_uvs = [[u1, v1], [u2, v1], [u2, v2], [u1, v2]];
    let uvs = rotate_uvs(base_uvs, rotation);

    let positions = match side {
        FaceSide::Bottom => [
            [from[0], from[1], to[2]],
            [to[0], from[1], to[2]],
            [to[0], from[1], from[2]],
            [from[0], from[1], from[2]],
        ],
        FaceSide::Top => [
            [from[0], to[1], from[2]],
            [to[0], to[1], from[2]],
            [to[0], to[1], to[2]],
            [from[0], to[1], to[2]],
        ],
        FaceSide::Back => [
            [to[0], to[1], from[2]],
            [from[0], to[1], from[2]],
            [from[0], from[1], from[2]],
            [to[0], from[1], from[2]],
        ],
        FaceSide::Front => [
            [from[0], to[1], to[2]],
            [to[0], to[1], to[2]],
            [to[0], from[1], to[2]],
            [from[0], from[1], to[2]],
        ],
        FaceSide::Left => [
            [from[0], to[1], from[2]],
            [from[0], to[1], to[2]],
            [from[0], from[1], to[2]],
            [from[0], from[1], from[2]],
        ],
        FaceSide::Right => [
            [to[0], to[1], to[2]],
            [to[0], to[1], from[2]],
            [to[0], from[1], from[2]],
            [to[0], from[1], to[2]],
        ],
    };

    (positions, uvs)
}

/// Rotate UV corners by quarter turns.
fn rotate_uvs(uvs: [[f32; 2]; 4], rotation: i32) -> [[f32; 2]; 4] {
    let steps = ((rotation / 90) % 4 + 4) % 4;
    let mut result = uvs;
    for _ in 0..steps {
        result = [result[3], result[0], result[1], result[2]];
    }
    result
}
