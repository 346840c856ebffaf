//! Loop-recorded vocal comping.
//!
//! A singer records many takes over a looping instrumental; vocomp captures
//! them as one continuous stream, splits it into equally long takes, cuts the
//! loop into phrase segments at quiet valleys, and assembles a comp from the
//! best take per segment.
//!
//! # Example
//!
//! ```ignore
//! use vocomp::prelude::*;
//!
//! let session = Arc::new(
//!     CompSession::builder()
//!         .project_dir("sessions/phrase01")
//!         .sample_rate(48000)
//!         .loop_seconds(8.0)
//!         .build()?,
//! );
//! let worker = BatchWorker::spawn(Arc::clone(&session))?;
//!
//! session.start_recording()?;
//! // audio callback: session.accumulator().append(input, channels);
//! if let Some(recording) = session.stop_recording()? {
//!     worker.submit(BatchJob::Finalize(recording))?;
//! }
//!
//! worker.submit(BatchJob::Segment {
//!     reference: Reference::Take(1),
//!     tempo: Some(Tempo::new(120)?),
//! })?;
//! ```
//!
//! Subsystem crates are re-exported as [`capture`], [`analysis`], and [`export`].

pub mod builder;
pub mod error;
pub mod session;
pub mod worker;

pub use builder::SessionBuilder;
pub use error::{Error, Result};
pub use session::{CompSession, Reference, SessionCounters};
pub use worker::{BatchEvent, BatchJob, BatchWorker, CompOutput};

pub use vocomp_analysis as analysis;
pub use vocomp_capture as capture;
pub use vocomp_export as export;

pub mod prelude {
    pub use crate::{
        BatchEvent, BatchJob, BatchWorker, CompSession, Error, Reference, Result, SessionBuilder,
    };
    pub use std::sync::Arc;
    pub use vocomp_analysis::{BoundarySet, Segmenter, SegmentationConfig, Tempo};
    pub use vocomp_capture::{
        BitDepth, CaptureAccumulator, CaptureConfig, ContinuousRecording, SplitOutcome, TakeSet,
    };
    pub use vocomp_export::{
        CompMap, CompOptions, CompResult, CrossfadeSettings, FadeCurve, SegmentScorer, Winner,
    };
}
