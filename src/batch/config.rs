use crate::export::{ExportOptions, ExportTarget};
use crate::types::REFERENCE_SIZE;
use std::path::PathBuf;

/// Batch run configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    /// Directory tree scanned for `.blockymodel` files.
    pub source_root: PathBuf,
    /// Directory the source tree is mirrored into.
    pub output_root: PathBuf,
    /// Output format.
    pub target: ExportTarget,
    /// Also write each resolved texture next to the model's outputs.
    pub copy_textures: bool,
    /// Texture size model UVs are authored against.
    pub reference_size: u32,
}

impl BatchConfig {
    pub fn new(source_root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            output_root: output_root.into(),
            target: ExportTarget::default(),
            copy_textures: false,
            reference_size: REFERENCE_SIZE,
        }
    }

    pub fn with_target(mut self, target: ExportTarget) -> Self {
        self.target = target;
        self
    }

    pub fn with_copy_textures(mut self, copy_textures: bool) -> Self {
        self.copy_textures = copy_textures;
        self
    }

    /// Override the reference texture size (zero is ignored).
    pub fn with_reference_size(mut self, reference_size: u32) -> Self {
        if reference_size > 0 {
            self.reference_size = reference_size;
        }
        self
    }

    /// Whether resolved textures are written next to the outputs.
    ///
    /// Always true for OBJ: the MTL refers to the texture by file name only.
    pub fn copies_textures(&self) -> bool {
        self.copy_textures || self.target == ExportTarget::Obj
    }

    /// Options every export in the run is compiled with: resources embedded,
    /// binary container, no animations.
    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            embed_resources: true,
            binary: true,
            include_animations: false,
        }
    }
}
