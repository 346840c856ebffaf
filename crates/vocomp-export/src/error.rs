//! Error types for vocomp-export

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Export error type
#[derive(Error, Debug)]
pub enum ExportError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Compmap or report JSON could not be parsed or written
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading takes failed
    #[error(transparent)]
    Capture(#[from] vocomp_capture::Error),

    /// Compmap does not describe the given boundary set
    #[error("Compmap mismatch: {0}")]
    CompMapMismatch(String),

    /// No take is available to fill the comp
    #[error("No takes available")]
    NoTakes,

    /// Refusing to overwrite an existing output
    #[error("Output already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    /// Invalid audio data
    #[error("Invalid audio data: {0}")]
    InvalidData(String),
}

/// Result type for export operations
pub type Result<T> = std::result::Result<T, ExportError>;

// Encoder errors surface as I/O errors at the API boundary
impl From<hound::Error> for ExportError {
    fn from(e: hound::Error) -> Self {
        match e {
            hound::Error::IoError(io) => ExportError::Io(io),
            other => ExportError::Io(io::Error::other(other)),
        }
    }
}
