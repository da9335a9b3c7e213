//! Batch conversion of a scanned source tree.
//!
//! Work items are converted strictly one at a time. Each item moves through
//! the states of [`ItemState`]: the model and its companion texture are read
//! (concurrently), the model is decoded into a [`Scene`] owned by this item
//! alone, the texture is bound and the UVs rescaled to it, the scene is
//! exported and the artifacts are written under the mirrored output
//! directory. The scene is closed before the next item starts.
//!
//! A failing item is logged and counted; the batch moves on. Only a missing
//! exporter for the configured target stops a run before it starts.

pub mod config;
pub mod sink;
pub mod writer;

pub use config::BatchConfig;
pub use sink::{BatchOutcome, BatchReport, BatchSink, CancelToken, NullSink};

use crate::error::{ConvertError, Result};
use crate::export::{Artifact, ExportTarget, GlbExporter, ObjExporter, SceneExporter};
use crate::model::{BlockyModelDecoder, ModelDecoder};
use crate::scanner::{scan, WorkItem};
use crate::scene::{rescale_uvs, Scene};
use crate::texture::resolver::list_file_names;
use crate::texture::{resolve_texture, TextureAsset};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Decoder plus the exporters available to batch runs.
pub struct Converter {
    decoder: Box<dyn ModelDecoder>,
    exporters: Vec<Box<dyn SceneExporter>>,
}

impl Converter {
    /// A converter with no exporters registered.
    pub fn new(decoder: impl ModelDecoder + 'static) -> Self {
        Self {
            decoder: Box::new(decoder),
            exporters: Vec::new(),
        }
    }

    /// The `.blockymodel` decoder with the OBJ and GLB exporters.
    pub fn standard() -> Self {
        Self::new(BlockyModelDecoder)
            .with_exporter(ObjExporter)
            .with_exporter(GlbExporter)
    }

    /// Register an exporter. A later exporter for the same target takes precedence.
    pub fn with_exporter(mut self, exporter: impl SceneExporter + 'static) -> Self {
        self.exporters.push(Box::new(exporter));
        self
    }

    pub fn decoder(&self) -> &dyn ModelDecoder {
        self.decoder.as_ref()
    }

    /// Exporter for `target`, or a setup error if none is registered.
    pub fn exporter(&self, target: ExportTarget) -> Result<&dyn SceneExporter> {
        self.exporters
            .iter()
            .rev()
            .find(|e| e.target() == target)
            .map(|e| e.as_ref())
            .ok_or_else(|| {
                ConvertError::CodecUnavailable(format!("no exporter registered for {}", target))
            })
    }
}

/// Scan `config.source_root` and convert everything found.
///
/// Only setup errors are returned; per-item failures end up in the report.
pub fn run_batch(
    converter: &Converter,
    config: &BatchConfig,
    sink: &mut dyn BatchSink,
    cancel: CancelToken,
) -> Result<BatchReport> {
    converter.exporter(config.target)?;
    let items = scan(&config.source_root);
    let run = BatchRun::new(converter, config, items, cancel)?;
    Ok(run.run(sink))
}

/// Lifecycle of one work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    Idle,
    Loading,
    TextureInjecting,
    Rescaling,
    Exporting,
    Writing,
    Done,
    Failed,
    Cancelled,
}

impl std::fmt::Display for ItemState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ItemState::Idle => "idle",
            ItemState::Loading => "loading",
            ItemState::TextureInjecting => "texture-injecting",
            ItemState::Rescaling => "rescaling",
            ItemState::Exporting => "exporting",
            ItemState::Writing => "writing",
            ItemState::Done => "done",
            ItemState::Failed => "failed",
            ItemState::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// An item failure and the state it happened in.
#[derive(Debug, Error)]
#[error("{stage}: {error}")]
pub struct ItemFailure {
    pub stage: ItemState,
    #[source]
    pub error: ConvertError,
}

impl ItemFailure {
    fn at<E: Into<ConvertError>>(stage: ItemState) -> impl FnOnce(E) -> ItemFailure {
        move |error| ItemFailure {
            stage,
            error: error.into(),
        }
    }
}

/// Result of one [`BatchRun::step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// More items remain.
    Continue,
    /// The run has ended; further steps return the same report.
    Finished(BatchReport),
}

enum ItemOutcome {
    Exported,
    Cancelled,
}

/// State of one batch invocation.
pub struct BatchRun<'a> {
    converter: &'a Converter,
    exporter: &'a dyn SceneExporter,
    config: &'a BatchConfig,
    items: Vec<WorkItem>,
    index: usize,
    cancel: CancelToken,
    report: BatchReport,
    finished: bool,
}

impl<'a> BatchRun<'a> {
    /// Prepare a run over `items`. Fails if no exporter handles the target.
    pub fn new(
        converter: &'a Converter,
        config: &'a BatchConfig,
        items: Vec<WorkItem>,
        cancel: CancelToken,
    ) -> Result<Self> {
        let exporter = converter.exporter(config.target)?;
        let total = items.len();
        info!(
            source = %config.source_root.display(),
            output = %config.output_root.display(),
            target = %config.target,
            decoder = converter.decoder().name(),
            total,
            "starting batch"
        );
        Ok(Self {
            converter,
            exporter,
            config,
            items,
            index: 0,
            cancel,
            report: BatchReport::new(total),
            finished: false,
        })
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }

    /// Items attempted so far.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Process all remaining items.
    pub fn run(mut self, sink: &mut dyn BatchSink) -> BatchReport {
        loop {
            if let Step::Finished(report) = self.step(sink) {
                return report;
            }
        }
    }

    /// Process exactly one item, or finish the run.
    pub fn step(&mut self, sink: &mut dyn BatchSink) -> Step {
        if self.finished {
            return Step::Finished(self.report.clone());
        }
        if self.items.is_empty() {
            return self.finish(BatchOutcome::NothingToDo, sink);
        }
        if self.cancel.is_cancelled() {
            return self.finish(BatchOutcome::Cancelled, sink);
        }
        let Some(item) = self.items.get(self.index).cloned() else {
            return self.finish(BatchOutcome::Completed, sink);
        };

        match self.convert(&item) {
            Ok(ItemOutcome::Exported) => self.report.exported += 1,
            // Nothing was written for this item
            Ok(ItemOutcome::Cancelled) => return self.finish(BatchOutcome::Cancelled, sink),
            Err(failure) => {
                warn!(
                    path = %item.source_path.display(),
                    stage = %failure.stage,
                    error = %failure.error,
                    "conversion failed"
                );
                self.report.failed += 1;
                self.report.failed_items.push(item.source_path.clone());
            }
        }

        self.index += 1;
        self.report.processed = self.index;
        sink.progress(self.index as f32 / self.items.len() as f32);

        if self.index == self.items.len() {
            self.finish(BatchOutcome::Completed, sink)
        } else {
            Step::Continue
        }
    }

    fn finish(&mut self, outcome: BatchOutcome, sink: &mut dyn BatchSink) -> Step {
        self.finished = true;
        self.report.outcome = outcome;
        sink.progress(0.0);
        info!(
            total = self.report.total,
            exported = self.report.exported,
            failed = self.report.failed,
            outcome = ?outcome,
            "batch finished"
        );
        sink.finished(&self.report);
        Step::Finished(self.report.clone())
    }

    fn convert(&self, item: &WorkItem) -> std::result::Result<ItemOutcome, ItemFailure> {
        let mut state = ItemState::Idle;
        let result = self.convert_in(item, &mut state);
        let end = match &result {
            Ok(ItemOutcome::Exported) => ItemState::Done,
            Ok(ItemOutcome::Cancelled) => ItemState::Cancelled,
            Err(_) => ItemState::Failed,
        };
        self.enter(item, &mut state, end);
        result
    }

    fn convert_in(
        &self,
        item: &WorkItem,
        state: &mut ItemState,
    ) -> std::result::Result<ItemOutcome, ItemFailure> {
        self.enter(item, state, ItemState::Loading);
        let (model, texture) = rayon::join(
            || fs::read_to_string(&item.source_path),
            || read_texture(&item.source_dir, &item.base_name),
        );
        let model = model.map_err(ItemFailure::at(ItemState::Loading))?;
        let texture = texture.map_err(ItemFailure::at(ItemState::TextureInjecting))?;
        if self.cancel.is_cancelled() {
            return Ok(ItemOutcome::Cancelled);
        }

        let payload: serde_json::Value =
            serde_json::from_str(&model).map_err(ItemFailure::at(ItemState::Loading))?;
        let mut scene = self
            .converter
            .decoder()
            .decode(&payload, &item.source_path)
            .map_err(ItemFailure::at(ItemState::Loading))?;
        scene.set_reference_size(self.config.reference_size);

        let result = self.process(item, &mut scene, texture, state);
        scene.close();
        result
    }

    fn process(
        &self,
        item: &WorkItem,
        scene: &mut Scene,
        texture: Option<TextureAsset>,
        state: &mut ItemState,
    ) -> std::result::Result<ItemOutcome, ItemFailure> {
        match texture {
            Some(asset) => {
                self.enter(item, state, ItemState::TextureInjecting);
                let (width, height) = (asset.width, asset.height);
                let id = scene.bind_texture(asset);
                if self.cancel.is_cancelled() {
                    return Ok(ItemOutcome::Cancelled);
                }

                self.enter(item, state, ItemState::Rescaling);
                let scale = rescale_uvs(scene, id, width, height, self.config.reference_size);
                debug!(model = %item.base_name, u = scale.u, v = scale.v, "rescaled uvs");
            }
            None => debug!(model = %item.base_name, "no texture found, exporting untextured"),
        }

        self.enter(item, state, ItemState::Exporting);
        let artifacts = self
            .exporter
            .compile(scene, &self.config.export_options())
            .map_err(ItemFailure::at(*state))?;
        check_artifacts(self.exporter.target(), &artifacts).map_err(ItemFailure::at(*state))?;

        if self.cancel.is_cancelled() {
            return Ok(ItemOutcome::Cancelled);
        }

        self.enter(item, state, ItemState::Writing);
        let target_dir = item.target_dir(&self.config.output_root);
        let written = writer::write(&target_dir, &item.base_name, &artifacts)
            .map_err(ItemFailure::at(*state))?;
        if self.config.copies_textures() {
            if let Some(texture) = scene.textures().first() {
                writer::write_file(&target_dir, &texture.asset.file_name, &texture.asset.bytes)
                    .map_err(ItemFailure::at(*state))?;
            }
        }
        debug!(
            source = %scene.source().display(),
            files = written.len(),
            "wrote outputs"
        );

        Ok(ItemOutcome::Exported)
    }

    fn enter(&self, item: &WorkItem, state: &mut ItemState, next: ItemState) {
        debug!(model = %item.base_name, from = %state, to = %next, "item state");
        *state = next;
    }
}

/// Reject artifact sets whose extensions differ from what `target` writes.
fn check_artifacts(target: ExportTarget, artifacts: &[Artifact]) -> Result<()> {
    let produced = artifacts.iter().map(|a| a.extension);
    if produced.eq(target.extensions().iter().copied()) {
        Ok(())
    } else {
        let found: Vec<&str> = artifacts.iter().map(|a| a.extension).collect();
        Err(ConvertError::Export(format!(
            "{} exporter produced [{}], expected [{}]",
            target,
            found.join(", "),
            target.extensions().join(", ")
        )))
    }
}

/// Find and read the companion texture of a model, if any.
fn read_texture(dir: &Path, base_name: &str) -> std::io::Result<Option<TextureAsset>> {
    let names = list_file_names(dir)?;
    match resolve_texture(&names, base_name) {
        Some(name) => TextureAsset::load(&dir.join(name)).map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ExportOptions;
    use crate::mesher::build_mesh;
    use crate::texture::tests::png_bytes;
    use crate::types::TextureId;
    use serde_json::json;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    fn chair_model() -> serde_json::Value {
        json!({
            "nodes": [{
                "name": "seat",
                "shape": {
                    "type": "box",
                    "settings": { "size": { "x": 16, "y": 4, "z": 16 } },
                    "textureLayout": {
                        "front": { "offset": { "x": 8, "y": 12 } },
                        "top": { "offset": { "x": 0, "y": 20 }, "angle": 90 }
                    }
                },
                "children": [{
                    "name": "back",
                    "position": { "x": 0, "y": 10, "z": -7 },
                    "shape": {
                        "type": "box",
                        "settings": { "size": { "x": 16, "y": 16, "z": 2 } },
                        "textureLayout": {
                            "front": { "offset": { "x": 32, "y": 0 }, "mirror": { "x": true } }
                        }
                    }
                }]
            }]
        })
    }

    fn write_model(root: &Path, rel: &str, model: &serde_json::Value) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, model.to_string()).unwrap();
        path
    }

    /// What an exporter was handed for one scene.
    #[derive(Debug, Clone)]
    struct Seen {
        uvs: Vec<[f32; 4]>,
        textures: Vec<Option<TextureId>>,
        texture_size: [u32; 2],
        mesh_uvs: Vec<[f32; 2]>,
    }

    struct RecordingExporter {
        seen: Arc<Mutex<Vec<Seen>>>,
    }

    impl SceneExporter for RecordingExporter {
        fn target(&self) -> ExportTarget {
            ExportTarget::Glb
        }

        fn compile(&self, scene: &Scene, _options: &ExportOptions) -> Result<Vec<Artifact>> {
            self.seen.lock().unwrap().push(Seen {
                uvs: scene.faces().map(|f| f.uv).collect(),
                textures: scene.faces().map(|f| f.texture).collect(),
                texture_size: scene.texture_size(),
                mesh_uvs: build_mesh(scene)
                    .groups
                    .iter()
                    .flat_map(|g| g.mesh.vertices.iter().map(|v| v.uv))
                    .collect(),
            });
            Ok(vec![Artifact::new("glb", scene.name().as_bytes().to_vec())])
        }
    }

    fn recording_converter() -> (Converter, Arc<Mutex<Vec<Seen>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let converter = Converter::new(BlockyModelDecoder).with_exporter(RecordingExporter {
            seen: seen.clone(),
        });
        (converter, seen)
    }

    fn reference_uvs(source: &Path) -> Vec<[f32; 4]> {
        let scene = BlockyModelDecoder.decode(&chair_model(), source).unwrap();
        let uvs = scene.faces().map(|f| f.uv).collect();
        scene.close();
        uvs
    }

    #[derive(Default)]
    struct RecordingSink {
        progress: Vec<f32>,
        reports: Vec<BatchReport>,
        cancel_after: Option<(usize, CancelToken)>,
    }

    impl BatchSink for RecordingSink {
        fn progress(&mut self, fraction: f32) {
            self.progress.push(fraction);
            if let Some((after, token)) = &self.cancel_after {
                if self.progress.len() == *after {
                    token.cancel();
                }
            }
        }

        fn finished(&mut self, report: &BatchReport) {
            self.reports.push(report.clone());
        }
    }

    #[test]
    fn test_chair_uvs_scaled_once_by_texture_size() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("models");
        let out = dir.path().join("out");
        let model_path = write_model(&source, "chair.blockymodel", &chair_model());
        fs::write(source.join("chair.png"), png_bytes(32, 16)).unwrap();

        let (converter, seen) = recording_converter();
        let config = BatchConfig::new(&source, &out);
        let report = run_batch(&converter, &config, &mut NullSink, CancelToken::new()).unwrap();
        assert_eq!(report.exported, 1);
        assert_eq!(report.outcome, BatchOutcome::Completed);

        let expected: Vec<[f32; 4]> = reference_uvs(&model_path)
            .into_iter()
            .map(|uv| [uv[0] * 0.5, uv[1] * 0.25, uv[2] * 0.5, uv[3] * 0.25])
            .collect();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].texture_size, [32, 16]);
        assert_eq!(seen[0].uvs, expected);
        let bound = seen[0].textures[0];
        assert!(bound.is_some());
        assert!(seen[0].textures.iter().all(|t| *t == bound));

        assert_eq!(fs::read(out.join("chair.glb")).unwrap(), b"chair");
    }

    #[test]
    fn test_chair_obj_with_texture_copy() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("models");
        let out = dir.path().join("out");
        write_model(&source, "chair.blockymodel", &chair_model());
        let png = png_bytes(32, 16);
        fs::write(source.join("chair.png"), &png).unwrap();

        let config = BatchConfig::new(&source, &out)
            .with_target(ExportTarget::Obj)
            .with_copy_textures(true);
        let report =
            run_batch(&Converter::standard(), &config, &mut NullSink, CancelToken::new()).unwrap();
        assert_eq!(report.exported, 1);

        let obj = fs::read_to_string(out.join("chair.obj")).unwrap();
        let mtl = fs::read_to_string(out.join("chair.mtl")).unwrap();
        assert!(obj.contains("mtllib chair.mtl"));
        assert!(mtl.contains("map_Kd chair.png"));
        assert_eq!(fs::read(out.join("chair.png")).unwrap(), png);
    }

    #[test]
    fn test_glb_mirrors_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        let out = dir.path().join("out");
        write_model(&source, "root.blockymodel", &chair_model());
        write_model(&source, "props/deep/lamp.blockymodel", &chair_model());
        fs::write(source.join("props/deep/lamp.png"), png_bytes(128, 64)).unwrap();

        let config = BatchConfig::new(&source, &out);
        let report =
            run_batch(&Converter::standard(), &config, &mut NullSink, CancelToken::new()).unwrap();
        assert_eq!(report.total, 2);
        assert_eq!(report.exported, 2);

        for path in [out.join("root.glb"), out.join("props/deep/lamp.glb")] {
            let bytes = fs::read(&path).unwrap();
            assert_eq!(&bytes[0..4], b"glTF");
        }
        // Textures are embedded, not copied
        assert!(!out.join("props/deep/lamp.png").exists());
    }

    #[test]
    fn test_malformed_item_does_not_stop_batch() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        let out = dir.path().join("out");
        write_model(&source, "a.blockymodel", &chair_model());
        fs::write(source.join("b.blockymodel"), "{ not json").unwrap();
        write_model(&source, "c.blockymodel", &chair_model());

        let mut sink = RecordingSink::default();
        let config = BatchConfig::new(&source, &out);
        let report =
            run_batch(&Converter::standard(), &config, &mut sink, CancelToken::new()).unwrap();

        assert_eq!(report.total, 3);
        assert_eq!(report.processed, 3);
        assert_eq!(report.exported, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.failed_items, vec![source.join("b.blockymodel")]);
        assert_eq!(report.outcome, BatchOutcome::Completed);

        assert!(out.join("a.glb").exists());
        assert!(!out.join("b.glb").exists());
        assert!(out.join("c.glb").exists());

        let expected: Vec<f32> = vec![1.0 / 3.0, 2.0 / 3.0, 1.0, 0.0];
        assert_eq!(sink.progress, expected);
        assert_eq!(sink.reports, vec![report]);
    }

    #[test]
    fn test_empty_model_is_item_failure() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        write_model(&source, "empty.blockymodel", &json!({ "nodes": [] }));

        let config = BatchConfig::new(&source, dir.path().join("out"));
        let report =
            run_batch(&Converter::standard(), &config, &mut NullSink, CancelToken::new()).unwrap();
        assert_eq!(report.exported, 0);
        assert_eq!(report.failed, 1);
    }

    #[test]
    fn test_cancel_after_first_item_stops_writes() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        let out = dir.path().join("out");
        for name in ["a", "b", "c"] {
            write_model(&source, &format!("{}.blockymodel", name), &chair_model());
        }

        let token = CancelToken::new();
        let mut sink = RecordingSink {
            cancel_after: Some((1, token.clone())),
            ..Default::default()
        };
        let config = BatchConfig::new(&source, &out);
        let report = run_batch(&Converter::standard(), &config, &mut sink, token).unwrap();

        assert_eq!(report.outcome, BatchOutcome::Cancelled);
        assert_eq!(report.processed, 1);
        assert_eq!(report.exported, 1);
        assert!(out.join("a.glb").exists());
        assert!(!out.join("b.glb").exists());
        assert!(!out.join("c.glb").exists());
        assert_eq!(sink.progress, vec![1.0 / 3.0, 0.0]);
        assert_eq!(sink.reports.len(), 1);
    }

    #[test]
    fn test_cancel_before_start_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        let out = dir.path().join("out");
        write_model(&source, "a.blockymodel", &chair_model());

        let token = CancelToken::new();
        token.cancel();
        let config = BatchConfig::new(&source, &out);
        let report = run_batch(&Converter::standard(), &config, &mut NullSink, token).unwrap();

        assert_eq!(report.outcome, BatchOutcome::Cancelled);
        assert_eq!(report.exported, 0);
        assert!(!out.exists());
    }

    #[test]
    fn test_empty_source_is_nothing_to_do() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("readme.txt"), "no models here").unwrap();
        let out = dir.path().join("out");

        let mut sink = RecordingSink::default();
        let config = BatchConfig::new(&source, &out);
        let report =
            run_batch(&Converter::standard(), &config, &mut sink, CancelToken::new()).unwrap();

        assert_eq!(report.outcome, BatchOutcome::NothingToDo);
        assert_eq!(report.total, 0);
        assert!(!out.exists());
        assert_eq!(sink.reports.len(), 1);

        let missing = BatchConfig::new(dir.path().join("missing"), &out);
        let report =
            run_batch(&Converter::standard(), &missing, &mut NullSink, CancelToken::new()).unwrap();
        assert_eq!(report.outcome, BatchOutcome::NothingToDo);
    }

    #[test]
    fn test_missing_exporter_is_setup_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        let out = dir.path().join("out");
        write_model(&source, "a.blockymodel", &chair_model());

        let mut sink = RecordingSink::default();
        let bare = Converter::new(BlockyModelDecoder);
        let config = BatchConfig::new(&source, &out);
        let err = run_batch(&bare, &config, &mut sink, CancelToken::new()).unwrap_err();
        assert!(matches!(err, ConvertError::CodecUnavailable(_)));
        assert!(sink.progress.is_empty());
        assert!(sink.reports.is_empty());
        assert!(!out.exists());

        let (glb_only, _) = recording_converter();
        let obj = config.clone().with_target(ExportTarget::Obj);
        assert!(run_batch(&glb_only, &obj, &mut NullSink, CancelToken::new()).is_err());
    }

    #[test]
    fn test_missing_texture_exports_untextured() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        let model_path = write_model(&source, "chair.blockymodel", &chair_model());
        fs::write(source.join("unrelated.png"), png_bytes(32, 16)).unwrap();

        let (converter, seen) = recording_converter();
        let config = BatchConfig::new(&source, dir.path().join("out"));
        let report = run_batch(&converter, &config, &mut NullSink, CancelToken::new()).unwrap();
        assert_eq!(report.exported, 1);

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].texture_size, [64, 64]);
        assert!(seen[0].textures.iter().all(Option::is_none));
        assert_eq!(seen[0].uvs, reference_uvs(&model_path));
    }

    #[test]
    fn test_reference_size_texture_keeps_uvs_but_binds() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        let model_path = write_model(&source, "chair.blockymodel", &chair_model());
        fs::write(source.join("chair.png"), png_bytes(64, 64)).unwrap();

        let (converter, seen) = recording_converter();
        let config = BatchConfig::new(&source, dir.path().join("out"));
        run_batch(&converter, &config, &mut NullSink, CancelToken::new()).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].uvs, reference_uvs(&model_path));
        assert!(seen[0].textures.iter().all(Option::is_some));
    }

    #[test]
    fn test_texture_ids_are_fresh_per_item() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        for sub in ["a", "b"] {
            write_model(&source, &format!("{}/chair.blockymodel", sub), &chair_model());
            fs::write(source.join(sub).join("chair.png"), png_bytes(32, 32)).unwrap();
        }

        let (converter, seen) = recording_converter();
        let config = BatchConfig::new(&source, dir.path().join("out"));
        run_batch(&converter, &config, &mut NullSink, CancelToken::new()).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_ne!(seen[0].textures[0], seen[1].textures[0]);
    }

    #[test]
    fn test_custom_reference_size() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        let model_path = write_model(&source, "chair.blockymodel", &chair_model());
        fs::write(source.join("chair.png"), png_bytes(32, 16)).unwrap();

        let (converter, seen) = recording_converter();
        let config = BatchConfig::new(&source, dir.path().join("out")).with_reference_size(32);
        run_batch(&converter, &config, &mut NullSink, CancelToken::new()).unwrap();

        let expected: Vec<[f32; 4]> = reference_uvs(&model_path)
            .into_iter()
            .map(|uv| [uv[0], uv[1] * 0.5, uv[2], uv[3] * 0.5])
            .collect();
        assert_eq!(seen.lock().unwrap()[0].uvs, expected);
    }

    #[test]
    fn test_obj_copies_texture_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("models");
        let out = dir.path().join("out");
        write_model(&source, "chair.blockymodel", &chair_model());
        let png = png_bytes(32, 16);
        fs::write(source.join("chair.png"), &png).unwrap();

        let config = BatchConfig::new(&source, &out).with_target(ExportTarget::Obj);
        assert!(!config.copy_textures);
        let report =
            run_batch(&Converter::standard(), &config, &mut NullSink, CancelToken::new()).unwrap();
        assert_eq!(report.exported, 1);

        let mtl = fs::read_to_string(out.join("chair.mtl")).unwrap();
        assert!(mtl.contains("map_Kd chair.png"));
        assert_eq!(fs::read(out.join("chair.png")).unwrap(), png);
    }

    #[test]
    fn test_custom_reference_size_untextured() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        let model_path = write_model(&source, "chair.blockymodel", &chair_model());

        let (converter, seen) = recording_converter();
        let config = BatchConfig::new(&source, dir.path().join("out")).with_reference_size(32);
        run_batch(&converter, &config, &mut NullSink, CancelToken::new()).unwrap();

        // Same model bound to a 32x32 texture: identity rescale, same texture space
        let textured = dir.path().join("textured");
        write_model(&textured, "chair.blockymodel", &chair_model());
        fs::write(textured.join("chair.png"), png_bytes(32, 32)).unwrap();
        let config = BatchConfig::new(&textured, dir.path().join("out2")).with_reference_size(32);
        run_batch(&converter, &config, &mut NullSink, CancelToken::new()).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].texture_size, [32, 32]);
        assert!(seen[0].textures.iter().all(Option::is_none));
        assert_eq!(seen[0].uvs, reference_uvs(&model_path));
        assert_eq!(seen[0].mesh_uvs, seen[1].mesh_uvs);
    }

    /// Exporter claiming OBJ but producing only a mesh file.
    struct MeshOnlyExporter;

    impl SceneExporter for MeshOnlyExporter {
        fn target(&self) -> ExportTarget {
            ExportTarget::Obj
        }

        fn compile(&self, _scene: &Scene, _options: &ExportOptions) -> Result<Vec<Artifact>> {
            Ok(vec![Artifact::new("obj", "o chair\n")])
        }
    }

    #[test]
    fn test_incomplete_artifacts_fail_item() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        let out = dir.path().join("out");
        write_model(&source, "chair.blockymodel", &chair_model());

        let converter = Converter::new(BlockyModelDecoder).with_exporter(MeshOnlyExporter);
        let config = BatchConfig::new(&source, &out).with_target(ExportTarget::Obj);
        let report = run_batch(&converter, &config, &mut NullSink, CancelToken::new()).unwrap();

        assert_eq!(report.exported, 0);
        assert_eq!(report.failed, 1);
        assert!(!out.join("chair.obj").exists());

        let err = check_artifacts(ExportTarget::Obj, &[Artifact::new("obj", "")]).unwrap_err();
        assert!(matches!(err, ConvertError::Export(_)));
        assert!(check_artifacts(ExportTarget::Glb, &[Artifact::new("glb", "")]).is_ok());
    }

    #[test]
    fn test_rerun_overwrites_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        let out = dir.path().join("out");
        write_model(&source, "chair.blockymodel", &chair_model());
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("chair.glb"), "stale").unwrap();

        let config = BatchConfig::new(&source, &out);
        for _ in 0..2 {
            let report =
                run_batch(&Converter::standard(), &config, &mut NullSink, CancelToken::new())
                    .unwrap();
            assert_eq!(report.exported, 1);
            assert_eq!(&fs::read(out.join("chair.glb")).unwrap()[0..4], b"glTF");
        }
    }

    #[test]
    fn test_step_processes_one_item_at_a_time() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        write_model(&source, "a.blockymodel", &chair_model());
        write_model(&source, "b.blockymodel", &chair_model());

        let converter = Converter::standard();
        let config = BatchConfig::new(&source, dir.path().join("out"));
        let mut run =
            BatchRun::new(&converter, &config, scan(&source), CancelToken::new()).unwrap();
        let mut sink = RecordingSink::default();

        assert_eq!(run.total(), 2);
        assert_eq!(run.step(&mut sink), Step::Continue);
        assert_eq!(run.index(), 1);
        assert!(sink.reports.is_empty());

        let report = match run.step(&mut sink) {
            Step::Finished(report) => report,
            Step::Continue => panic!("expected the run to finish"),
        };
        assert_eq!(report.exported, 2);
        assert_eq!(run.step(&mut sink), Step::Finished(report));
        assert_eq!(sink.reports.len(), 1);
    }
}
