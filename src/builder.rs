//! Builder for configuring and constructing a `CompSession`.

use crate::session::CompSession;
use crate::{Error, Result};
use std::path::PathBuf;
use vocomp_analysis::SegmentationConfig;
use vocomp_capture::{BitDepth, CaptureConfig};

#[derive(Debug, Clone, Copy, PartialEq)]
enum LoopLength {
    Samples(usize),
    Seconds(f64),
}

/// The loop length is fixed for the lifetime of a session; every take of the
/// session has exactly that many samples.
///
/// # Example
///
/// ```ignore
/// use vocomp::prelude::*;
///
/// let session = CompSession::builder()
///     .project_dir("sessions/phrase01")
///     .sample_rate(48000)
///     .loop_seconds(8.0)
///     .build()?;
/// ```
pub struct SessionBuilder {
    project_dir: Option<PathBuf>,
    sample_rate: u32,
    loop_length: Option<LoopLength>,
    capture: CaptureConfig,
    segmentation: SegmentationConfig,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self {
            project_dir: None,
            sample_rate: 44100,
            loop_length: None,
            capture: CaptureConfig::default(),
            segmentation: SegmentationConfig::default(),
        }
    }
}

impl SessionBuilder {
    /// Directory holding recordings, takes, and comps. Created if missing.
    pub fn project_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.project_dir = Some(dir.into());
        self
    }

    /// Default: 44100
    pub fn sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn loop_samples(mut self, samples: usize) -> Self {
        self.loop_length = Some(LoopLength::Samples(samples));
        self
    }

    /// Rounded to the nearest sample at build time.
    pub fn loop_seconds(mut self, seconds: f64) -> Self {
        self.loop_length = Some(LoopLength::Seconds(seconds));
        self
    }

    pub fn capture_config(mut self, config: CaptureConfig) -> Self {
        self.capture = config;
        self
    }

    /// Default: 16-bit
    pub fn bit_depth(mut self, bit_depth: BitDepth) -> Self {
        self.capture.bit_depth = bit_depth;
        self
    }

    pub fn segmentation(mut self, config: SegmentationConfig) -> Self {
        self.segmentation = config;
        self
    }

    pub fn build(self) -> Result<CompSession> {
        let project_dir = self
            .project_dir
            .ok_or_else(|| Error::Session("project directory not set".into()))?;
        if self.sample_rate == 0 {
            return Err(Error::Session("sample rate must be non-zero".into()));
        }

        let loop_length_samples = match self.loop_length {
            Some(LoopLength::Samples(samples)) => samples,
            Some(LoopLength::Seconds(seconds)) if seconds.is_finite() && seconds > 0.0 => {
                (seconds * self.sample_rate as f64).round() as usize
            }
            Some(LoopLength::Seconds(seconds)) => {
                return Err(Error::Session(format!("invalid loop length {seconds}s")));
            }
            None => return Err(Error::Session("loop length not set".into())),
        };
        if loop_length_samples == 0 {
            return Err(Error::Session("loop length must be non-zero".into()));
        }

        self.capture.validate()?;

        CompSession::open(
            project_dir,
            self.sample_rate,
            loop_length_samples,
            self.capture,
            self.segmentation,
        )
    }
}
