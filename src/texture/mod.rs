//! Companion texture loading.
//!
//! Textures are never decoded. The converter only needs their raw bytes
//! (to embed or copy) and their intrinsic pixel size (to repair UVs), and
//! the size is read straight from the PNG header.

pub mod resolver;

pub use resolver::resolve_texture;

use crate::types::REFERENCE_SIZE;
use std::path::Path;

/// Byte offset of the big-endian width in a PNG file (inside the IHDR chunk).
const WIDTH_OFFSET: usize = 16;
/// Byte offset of the big-endian height in a PNG file.
const HEIGHT_OFFSET: usize = 20;

/// A companion texture resolved for one model.
#[derive(Debug, Clone)]
pub struct TextureAsset {
    /// File name as found next to the model (e.g., "chair.png").
    pub file_name: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
    /// Intrinsic width in pixels.
    pub width: u32,
    /// Intrinsic height in pixels.
    pub height: u32,
}

impl TextureAsset {
    /// Build an asset from raw bytes, reading its size from the header.
    ///
    /// A header that cannot be read, or reports a zero dimension, falls
    /// back to the 64×64 reference size for that dimension.
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let (width, height) = read_size(&bytes);
        Self {
            file_name: file_name.into(),
            bytes,
            width: non_zero_or_reference(width),
            height: non_zero_or_reference(height),
        }
    }

    /// Read a texture file from disk.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::from_bytes(file_name, bytes))
    }

}

fn non_zero_or_reference(value: u32) -> u32 {
    if value == 0 {
        REFERENCE_SIZE
    } else {
        value
    }
}

/// Read the intrinsic (width, height) of a PNG from its header.
///
/// Reads the two big-endian `u32`s at offsets 16 and 20. Never fails:
/// buffers too short to hold both fields yield (64, 64).
pub fn read_size(buffer: &[u8]) -> (u32, u32) {
    match (read_u32_be(buffer, WIDTH_OFFSET), read_u32_be(buffer, HEIGHT_OFFSET)) {
        (Some(width), Some(height)) => (width, height),
        _ => (REFERENCE_SIZE, REFERENCE_SIZE),
    }
}

fn read_u32_be(buffer: &[u8], offset: usize) -> Option<u32> {
    let bytes = buffer.get(offset..offset + 4)?;
    Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}
