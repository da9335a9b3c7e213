//! `.blockymodel` parsing.
//!
//! A blockymodel is a JSON tree of nodes. Each node carries a local
//! transform, an optional shape (box or quad) with a per-side texture
//! layout, and child nodes.

pub mod decoder;

pub use decoder::{BlockyModelDecoder, ModelDecoder};

use crate::types::FaceSide;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// File extension of model files, matched case-sensitively.
pub const MODEL_EXTENSION: &str = ".blockymodel";

/// A parsed `.blockymodel` document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockyModel {
    /// Root nodes.
    #[serde(default)]
    pub nodes: Vec<ModelNode>,
    /// Level-of-detail hint; carried but unused.
    #[serde(default)]
    pub lod: Option<String>,
}

/// Node identifiers appear both as strings and as numbers in the wild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeId {
    Text(String),
    Number(i64),
}

/// A node in the model hierarchy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelNode {
    #[serde(default)]
    pub id: Option<NodeId>,
    #[serde(default)]
    pub name: Option<String>,
    /// Translation relative to the parent node.
    #[serde(default)]
    pub position: Vec3Json,
    /// Rotation relative to the parent node.
    #[serde(default)]
    pub orientation: QuatJson,
    #[serde(default)]
    pub shape: Option<Shape>,
    #[serde(default)]
    pub children: Vec<ModelNode>,
}

impl ModelNode {
    /// Display name, falling back to the id.
    pub fn display_name(&self) -> String {
        match (&self.name, &self.id) {
            (Some(name), _) => name.clone(),
            (None, Some(NodeId::Text(id))) => id.clone(),
            (None, Some(NodeId::Number(id))) => id.to_string(),
            (None, None) => "node".to_string(),
        }
    }
}

/// Geometry attached to a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shape {
    #[serde(rename = "type", default)]
    pub kind: ShapeKind,
    /// Centre of the shape relative to the node origin.
    #[serde(default)]
    pub offset: Vec3Json,
    /// Per-axis scale applied to the geometry but not to the texture layout.
    #[serde(default = "default_stretch")]
    pub stretch: Vec3Json,
    #[serde(default)]
    pub settings: ShapeSettings,
    #[serde(default)]
    pub texture_layout: HashMap<FaceSide, FaceLayout>,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub double_sided: bool,
}

fn default_stretch() -> Vec3Json {
    Vec3Json { x: 1.0, y: 1.0, z: 1.0 }
}

fn default_visible() -> bool {
    true
}

impl Shape {
    /// Geometric size after stretching.
    pub fn stretched_size(&self) -> [f32; 3] {
        let size = self.settings.size.to_array();
        let stretch = self.stretch.to_array();
        [size[0] * stretch[0], size[1] * stretch[1], size[2] * stretch[2]]
    }

    /// Minimum and maximum corners in node-local units.
    pub fn bounds(&self) -> ([f32; 3], [f32; 3]) {
        let size = self.stretched_size();
        let center = self.offset.to_array();
        let mut from = [0.0; 3];
        let mut to = [0.0; 3];
        for i in 0..3 {
            let half = size[i].abs() / 2.0;
            from[i] = center[i] - half;
            to[i] = center[i] + half;
        }
        (from, to)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Box,
    Quad,
    #[default]
    None,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeSettings {
    /// Unstretched size in texture pixels.
    #[serde(default)]
    pub size: Vec3Json,
    /// Facing of a quad, e.g. "+Z".
    #[serde(default)]
    pub normal: Option<String>,
}

/// Where one side of a shape sits on the texture.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FaceLayout {
    /// Top-left corner in reference pixels.
    #[serde(default)]
    pub offset: Vec2Json,
    #[serde(default)]
    pub mirror: MirrorJson,
    /// Clockwise rotation in degrees (multiples of 90).
    #[serde(default)]
    pub angle: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2Json {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3Json {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Vec3Json {
    pub fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuatJson {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub z: f32,
    #[serde(default = "default_w")]
    pub w: f32,
}

fn default_w() -> f32 {
    1.0
}

impl Default for QuatJson {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, z: 0.0, w: 1.0 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MirrorJson {
    #[serde(default)]
    pub x: bool,
    #[serde(default)]
    pub y: bool,
}
