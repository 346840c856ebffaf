//! Error types.

use std::path::PathBuf;
use thiserror::Error;

/// Error type.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// WAV encoding or decoding error.
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    /// Recording error.
    #[error("Recording error: {0}")]
    Recording(String),

    /// Invalid capture configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Takes in a directory disagree on sample rate or length.
    #[error("Inconsistent take set: {0}")]
    InconsistentTakes(String),

    /// Take file not present in the take set.
    #[error("Take {0} not found")]
    TakeNotFound(u32),

    /// Padding the continuous recording failed; the original file is untouched.
    #[error("Padding {path} failed: {source}")]
    Pad {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    /// The continuous recording ended before the given loop was complete.
    #[error("Loop {loop_index} is incomplete ({available} of {required} samples)")]
    IncompleteLoop {
        loop_index: usize,
        available: usize,
        required: usize,
    },

    /// Disk writer thread failed or disconnected.
    #[error("Disk writer error: {0}")]
    Writer(String),
}

/// Result type.
pub type Result<T> = std::result::Result<T, Error>;
