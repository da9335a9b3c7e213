//! Writing exported artifacts into the output tree.

use crate::error::{ConvertError, Result};
use crate::export::Artifact;
use std::fs;
use std::path::{Path, PathBuf};

/// Write every artifact as `<target_dir>/<base_name>.<extension>`.
///
/// Creates `target_dir` (and its parents) if needed and overwrites existing
/// files. Returns the written paths in artifact order. A failed write leaves
/// whatever was already written in place.
pub fn write(target_dir: &Path, base_name: &str, artifacts: &[Artifact]) -> Result<Vec<PathBuf>> {
    ensure_dir(target_dir)?;
    artifacts
        .iter()
        .map(|artifact| {
            let file_name = format!("{}.{}", base_name, artifact.extension);
            write_file(target_dir, &file_name, &artifact.bytes)
        })
        .collect()
}

/// Write `bytes` as `<target_dir>/<file_name>`.
pub fn write_file(target_dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
    ensure_dir(target_dir)?;
    let path = target_dir.join(file_name);
    fs::write(&path, bytes).map_err(|source| ConvertError::Write {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|source| ConvertError::Write {
        path: dir.to_path_buf(),
        source,
    })
}
