//! Discovery of model files under a source root.

use crate::model::MODEL_EXTENSION;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// One model file to convert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// Path of the `.blockymodel` file.
    pub source_path: PathBuf,
    /// File name without the model extension.
    pub base_name: String,
    /// Directory containing the model (searched for its texture).
    pub source_dir: PathBuf,
    /// Directory of the model relative to the scan root; empty at the root.
    pub relative_dir: PathBuf,
}

impl WorkItem {
    /// Build a work item for `path`, found under `root`.
    ///
    /// Returns `None` if the file name does not carry the model extension.
    /// Names that are not valid UTF-8 are kept under a lossy base name.
    pub fn new(root: &Path, path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_string_lossy();
        let base_name = file_name.strip_suffix(MODEL_EXTENSION)?.to_string();
        if matches!(file_name, Cow::Owned(_)) {
            warn!(path = %path.display(), %base_name, "model file name is not valid UTF-8");
        }
        let source_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let relative_dir = source_dir
            .strip_prefix(root)
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Some(Self {
            source_path: path.to_path_buf(),
            base_name,
            source_dir,
            relative_dir,
        })
    }

    /// Directory the item's outputs go to under `output_root`.
    pub fn target_dir(&self, output_root: &Path) -> PathBuf {
        output_root.join(&self.relative_dir)
    }
}

/// Recursively list model files under `root`, in file-name order per directory.
///
/// A missing root yields no items. Unreadable entries are logged and skipped.
pub fn scan(root: &Path) -> Vec<WorkItem> {
    if !root.is_dir() {
        debug!(root = %root.display(), "scan root is not a directory");
        return Vec::new();
    }

    let mut items = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(root = %root.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(item) = WorkItem::new(root, entry.path()) {
            items.push(item);
        }
    }

    debug!(root = %root.display(), count = items.len(), "scanned");
    items
}
