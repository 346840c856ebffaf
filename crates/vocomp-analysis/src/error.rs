//! Error types for vocomp-analysis

use thiserror::Error;

/// Analysis error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Tempo outside the supported range
    #[error("Tempo {0} BPM outside {min}-{max} BPM", min = crate::tempo::MIN_BPM, max = crate::tempo::MAX_BPM)]
    InvalidTempo(u32),

    /// Invalid segmentation parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Boundary list is not strictly increasing inside the loop
    #[error("Invalid boundaries: {0}")]
    InvalidBoundaries(String),
}

/// Result type for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;
