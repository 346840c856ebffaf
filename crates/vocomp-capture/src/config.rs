//! Capture configuration.

use crate::error::{Error, Result};
use hound::{SampleFormat, WavSpec};

/// Sample encoding for recordings and takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitDepth {
    #[default]
    Int16,
    Int24,
    Float32,
}

impl BitDepth {
    /// Bits per sample.
    pub fn bits(&self) -> u16 {
        match self {
            BitDepth::Int16 => 16,
            BitDepth::Int24 => 24,
            BitDepth::Float32 => 32,
        }
    }

    pub fn sample_format(&self) -> SampleFormat {
        match self {
            BitDepth::Float32 => SampleFormat::Float,
            _ => SampleFormat::Int,
        }
    }

    /// Mono WAV spec at the given sample rate.
    pub fn mono_spec(&self, sample_rate: u32) -> WavSpec {
        WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: self.bits(),
            sample_format: self.sample_format(),
        }
    }
}

/// Configuration for the capture buffer, disk writer, and file passes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureConfig {
    /// Initial buffer capacity in seconds (default: 300.0)
    pub max_recording_seconds: f64,
    /// Extra capacity added when the buffer fills up (default: 10.0)
    pub growth_seconds: f64,
    /// Disk writer ring buffer length in seconds (default: 2.0)
    pub ring_seconds: f64,
    /// Block size in samples for padding and splitting passes (default: 4096)
    pub block_size: usize,
    /// Encoding of the continuous recording and takes (default: 16-bit)
    pub bit_depth: BitDepth,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_recording_seconds: 300.0,
            growth_seconds: 10.0,
            ring_seconds: 2.0,
            block_size: 4096,
            bit_depth: BitDepth::Int16,
        }
    }
}

impl CaptureConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.max_recording_seconds > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "max_recording_seconds must be positive, got {}",
                self.max_recording_seconds
            )));
        }
        if !(self.growth_seconds > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "growth_seconds must be positive, got {}",
                self.growth_seconds
            )));
        }
        if !(self.ring_seconds > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "ring_seconds must be positive, got {}",
                self.ring_seconds
            )));
        }
        if self.block_size == 0 {
            return Err(Error::InvalidConfig("block_size must be non-zero".into()));
        }
        Ok(())
    }

    /// Initial capture buffer size in samples.
    ///
    /// Falls back to one minute when the configured duration does not fit.
    pub fn capacity_samples(&self, sample_rate: u32) -> usize {
        let samples = self.max_recording_seconds * sample_rate as f64;
        if samples.is_finite() && samples >= 1.0 {
            samples as usize
        } else {
            sample_rate as usize * 60
        }
    }

    /// Buffer growth step in samples.
    pub fn growth_samples(&self, sample_rate: u32) -> usize {
        ((self.growth_seconds * sample_rate as f64) as usize).max(self.block_size)
    }

    /// Disk writer ring capacity in samples.
    pub fn ring_samples(&self, sample_rate: u32) -> usize {
        ((self.ring_seconds * sample_rate as f64) as usize).max(self.block_size)
    }
}
