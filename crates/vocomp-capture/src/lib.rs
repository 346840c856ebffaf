//! Loop-synchronized vocal capture.
//!
//! Records one continuous mono take stream while a loop plays, then turns it
//! into discrete, equally long takes.
//!
//! # Features
//!
//! - **Capture accumulator**: real-time append with channel downmix and loop span tracking
//! - **Disk writer**: lock-free ring buffer drained to WAV on a background thread
//! - **Padding**: rounds the recording up to whole loops, atomically on disk
//! - **Splitting**: streams the recording into `take_<N>.wav` files
//! - **Take set**: scanning, validation, and re-import of a take directory
//!
//! # Example
//!
//! ```ignore
//! use vocomp_capture::{CaptureAccumulator, CaptureConfig, CaptureRequest};
//!
//! let acc = CaptureAccumulator::new(CaptureConfig::default());
//! acc.start(CaptureRequest { sample_rate: 44100, loop_length_samples: 176400, tap: None })?;
//! acc.append(&input, 2); // from the audio callback
//! let audio = acc.stop();
//! ```

pub mod error;
pub use error::{Error, Result};

mod config;
pub use config::{BitDepth, CaptureConfig};

pub mod accumulator;
pub mod pad;
pub mod pipeline;
pub mod recording;
pub mod split;
pub mod takes;
pub mod wav;
pub mod writer;

pub use accumulator::{
    CaptureAccumulator, CaptureRequest, CaptureSnapshot, CapturedAudio, TakeSpan,
    MAX_READ_SAMPLES,
};
pub use pad::{pad_recording, PadReport};
pub use pipeline::{finalize_recording, Finalized};
pub use recording::{
    padding_for, parse_recording_index, recording_file_name, ContinuousRecording,
};
pub use split::{split_recording, SplitOutcome, SplitReport, WrittenTake};
pub use takes::{allocate_phrase_dir, parse_take_index, take_file_name, TakeInfo, TakeSet};
pub use wav::{read_mono, MonoAudio};
pub use writer::DiskWriter;
