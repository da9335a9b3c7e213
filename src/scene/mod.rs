//! In-memory scene decoded from one model.
//!
//! A [`Scene`] is owned by whoever is converting the model and lives for
//! exactly one work item. It is torn down with [`Scene::close`], which
//! consumes it, so a closed scene can never be touched again.

pub mod uv;

pub use uv::{rescale_uvs, UvScale};

use crate::texture::TextureAsset;
use crate::types::{FaceSide, TextureId, REFERENCE_SIZE};
use glam::Mat4;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One textured side of a cube.
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    /// Texture bound to this face, if any.
    pub texture: Option<TextureId>,
    /// Texture rectangle `[u_min, v_min, u_max, v_max]` in the scene's texture space.
    pub uv: [f32; 4],
    /// Quarter-turn rotation of the UV rectangle in degrees (0, 90, 180, 270).
    pub rotation: i32,
}

impl Face {
    pub fn new(uv: [f32; 4]) -> Self {
        Self {
            texture: None,
            uv,
            rotation: 0,
        }
    }

    pub fn with_rotation(mut self, rotation: i32) -> Self {
        self.rotation = rotation;
        self
    }
}

/// A box primitive.
#[derive(Debug, Clone)]
pub struct Cube {
    /// Name of the node the cube came from.
    pub name: String,
    /// Minimum corner in node-local model units.
    pub from: [f32; 3],
    /// Maximum corner in node-local model units.
    pub to: [f32; 3],
    /// Node-local to model space.
    pub transform: Mat4,
    /// Faces present on this cube.
    pub faces: BTreeMap<FaceSide, Face>,
    /// Render both sides of each face.
    pub double_sided: bool,
}

impl Cube {
    pub fn new(name: impl Into<String>, from: [f32; 3], to: [f32; 3]) -> Self {
        Self {
            name: name.into(),
            from,
            to,
            transform: Mat4::IDENTITY,
            faces: BTreeMap::new(),
            double_sided: false,
        }
    }

    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_face(mut self, side: FaceSide, face: Face) -> Self {
        self.faces.insert(side, face);
        self
    }
}

/// A texture bound into a scene.
#[derive(Debug, Clone)]
pub struct SceneTexture {
    pub id: TextureId,
    pub asset: TextureAsset,
}

/// Decoded model: an ordered list of cubes plus the textures bound to them.
#[derive(Debug)]
pub struct Scene {
    name: String,
    source: PathBuf,
    cubes: Vec<Cube>,
    textures: Vec<SceneTexture>,
    texture_size: [u32; 2],
}

impl Scene {
    /// Create an empty scene whose UVs are in the reference texture space.
    pub fn new(name: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            cubes: Vec::new(),
            textures: Vec::new(),
            texture_size: [REFERENCE_SIZE, REFERENCE_SIZE],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn add_cube(&mut self, cube: Cube) {
        self.cubes.push(cube);
    }

    pub fn cubes(&self) -> &[Cube] {
        &self.cubes
    }

    /// Iterate every face of every cube, in cube order.
    pub fn faces(&self) -> impl Iterator<Item = &Face> {
        self.cubes.iter().flat_map(|c| c.faces.values())
    }

    /// Iterate every face of every cube mutably.
    pub fn faces_mut(&mut self) -> impl Iterator<Item = &mut Face> {
        self.cubes.iter_mut().flat_map(|c| c.faces.values_mut())
    }

    pub fn face_count(&self) -> usize {
        self.cubes.iter().map(|c| c.faces.len()).sum()
    }

    /// Pixel size of the texture space face UVs are expressed in.
    pub fn texture_size(&self) -> [u32; 2] {
        self.texture_size
    }

    /// Set the square texture space UVs are authored against.
    ///
    /// Only takes effect while no texture is bound; a bound texture's size
    /// wins.
    pub fn set_reference_size(&mut self, size: u32) {
        if self.textures.is_empty() && size > 0 {
            self.texture_size = [size, size];
        }
    }

    /// Bind a texture under a fresh identifier and adopt its pixel size as
    /// the scene's texture space.
    ///
    /// Faces are not touched; [`rescale_uvs`] assigns them.
    pub fn bind_texture(&mut self, asset: TextureAsset) -> TextureId {
        let id = TextureId::fresh();
        self.texture_size = [asset.width, asset.height];
        debug!(scene = %self.name, texture = %asset.file_name, %id, "bound texture");
        self.textures.push(SceneTexture { id, asset });
        id
    }

    pub fn textures(&self) -> &[SceneTexture] {
        &self.textures
    }

    pub fn texture(&self, id: TextureId) -> Option<&SceneTexture> {
        self.textures.iter().find(|t| t.id == id)
    }

    /// Tear the scene down. Its textures and identifiers die with it.
    pub fn close(self) {
        debug!(
            scene = %self.name,
            source = %self.source.display(),
            cubes = self.cubes.len(),
            textures = self.textures.len(),
            "closed scene"
        );
    }
}
