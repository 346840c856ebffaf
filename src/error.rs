//! Centralized error type for the vocomp umbrella crate.
//!
//! Wraps all subsystem errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Capture: {0}")]
    Capture(#[from] vocomp_capture::Error),

    #[error("Analysis: {0}")]
    Analysis(#[from] vocomp_analysis::AnalysisError),

    #[error("Export: {0}")]
    Export(#[from] vocomp_export::ExportError),

    #[error("Session: {0}")]
    Session(String),

    #[error("Batch worker is not running")]
    WorkerStopped,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
