//! Scene export formats.
//!
//! Exporters turn a scene into one or more named artifacts. The batch
//! orchestrator only sees the [`SceneExporter`] trait; which concrete
//! exporter runs is picked by [`ExportTarget`].

pub mod gltf;
pub mod obj;

pub use gltf::GlbExporter;
pub use obj::ObjExporter;

use crate::error::Result;
use crate::scene::Scene;

/// Output format of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExportTarget {
    /// Wavefront OBJ mesh plus MTL material file.
    Obj,
    /// Binary glTF with the texture embedded.
    #[default]
    Glb,
}

impl ExportTarget {
    /// File extensions this target produces, in write order.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            ExportTarget::Obj => &["obj", "mtl"],
            ExportTarget::Glb => &["glb"],
        }
    }
}

impl std::fmt::Display for ExportTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportTarget::Obj => write!(f, "obj"),
            ExportTarget::Glb => write!(f, "glb"),
        }
    }
}

/// Options passed to every export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    /// Bundle texture bytes into the output instead of referencing files.
    pub embed_resources: bool,
    /// Produce a binary container where the format has one.
    pub binary: bool,
    /// Export animation data.
    pub include_animations: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            embed_resources: true,
            binary: true,
            include_animations: false,
        }
    }
}

/// One exported file, written as `<model name>.<extension>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub extension: &'static str,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn new(extension: &'static str, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            extension,
            bytes: bytes.into(),
        }
    }
}

/// Serializes scenes into a target format.
pub trait SceneExporter {
    /// Format this exporter produces.
    fn target(&self) -> ExportTarget;

    /// Serialize `scene`. Must not modify anything outside the returned artifacts.
    fn compile(&self, scene: &Scene, options: &ExportOptions) -> Result<Vec<Artifact>>;
}
