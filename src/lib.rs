//! # Blocky Batch
//!
//! A Rust library for batch-converting `.blockymodel` files to OBJ+MTL or GLB.
//!
//! ## Overview
//!
//! A source tree is scanned for `.blockymodel` files. Each model is decoded
//! into a scene, bound to the companion PNG found next to it, has its UVs
//! rescaled from the 64×64 space models are authored against to the real
//! texture size, and is exported into the same relative directory under the
//! output root. Failing models are logged and skipped.
//!
//! ## Quick Start
//!
//! ```ignore
//! use blocky_batch::{run_batch, BatchConfig, CancelToken, Converter, ExportTarget, NullSink};
//!
//! let config = BatchConfig::new("assets/models", "out").with_target(ExportTarget::Glb);
//! let report = run_batch(&Converter::standard(), &config, &mut NullSink, CancelToken::new())?;
//! println!("{}", report);
//! ```
//!
//! ## Stepping
//!
//! Hosts with their own event loop can drive a [`BatchRun`] one item at a
//! time:
//!
//! ```ignore
//! use blocky_batch::{scan, BatchRun, Step};
//!
//! let mut run = BatchRun::new(&converter, &config, scan(&config.source_root), cancel)?;
//! while let Step::Continue = run.step(&mut sink) {
//!     // handle input, repaint, ...
//! }
//! ```

pub mod error;
pub mod types;
pub mod model;
pub mod scene;
pub mod texture;
pub mod mesher;
pub mod export;
pub mod scanner;
pub mod batch;

// Re-export main types for convenience
pub use error::{ConvertError, Result};
pub use types::{BoundingBox, FaceSide, TextureId, REFERENCE_SIZE};
pub use model::{BlockyModelDecoder, ModelDecoder};
pub use scene::{rescale_uvs, Cube, Face, Scene, UvScale};
pub use texture::{read_size, resolve_texture, TextureAsset};
pub use mesher::{build_mesh, Mesh, SceneMesh, Vertex};
pub use export::gltf::export_glb;
pub use export::obj::export_obj;
pub use export::{Artifact, ExportOptions, ExportTarget, GlbExporter, ObjExporter, SceneExporter};
pub use scanner::{scan, WorkItem};
pub use batch::{
    run_batch, BatchConfig, BatchOutcome, BatchReport, BatchRun, BatchSink, CancelToken,
    Converter, ItemFailure, ItemState, NullSink, Step,
};
