//! Error types for the batch converter.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using ConvertError.
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Main error type for conversion operations.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// I/O error while reading inputs.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The model description is not valid JSON or does not match the schema.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to inspect an image.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// The model parsed but describes geometry that cannot be decoded.
    #[error("Model decode error: {0}")]
    Decode(String),

    /// The exporter could not serialize the scene.
    #[error("Export error: {0}")]
    Export(String),

    /// A decoder or exporter required by the run is not registered.
    #[error("Codec unavailable: {0}")]
    CodecUnavailable(String),

    /// Writing an output artifact failed.
    #[error("Failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
