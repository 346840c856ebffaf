//! The continuous recording produced by one capture run.

use crate::accumulator::CapturedAudio;
use crate::config::BitDepth;
use std::path::{Path, PathBuf};

/// File name for the continuous recording with the given index.
pub fn recording_file_name(index: u32) -> String {
    format!("full_{index}.wav")
}

/// Parse `full_<N>.wav` into `N`.
pub fn parse_recording_index(file_name: &str) -> Option<u32> {
    file_name
        .strip_prefix("full_")?
        .strip_suffix(".wav")?
        .parse()
        .ok()
}

/// One stopped capture run: samples in memory plus the persisted file.
#[derive(Debug, Clone)]
pub struct ContinuousRecording {
    samples: Vec<f32>,
    loop_length_samples: usize,
    sample_rate: u32,
    bit_depth: BitDepth,
    path: PathBuf,
}

impl ContinuousRecording {
    pub fn new(
        samples: Vec<f32>,
        loop_length_samples: usize,
        sample_rate: u32,
        bit_depth: BitDepth,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            samples,
            loop_length_samples,
            sample_rate,
            bit_depth,
            path: path.into(),
        }
    }

    pub fn from_captured(audio: CapturedAudio, bit_depth: BitDepth, path: impl Into<PathBuf>) -> Self {
        Self::new(
            audio.samples,
            audio.loop_length_samples,
            audio.sample_rate,
            bit_depth,
            path,
        )
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn total_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn loop_length_samples(&self) -> usize {
        self.loop_length_samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn bit_depth(&self) -> BitDepth {
        self.bit_depth
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whole loops contained in the recording.
    pub fn num_loops(&self) -> usize {
        if self.loop_length_samples == 0 {
            0
        } else {
            self.samples.len() / self.loop_length_samples
        }
    }

    /// Zero samples needed to reach the next whole loop.
    pub fn padding_needed(&self) -> usize {
        padding_for(self.samples.len(), self.loop_length_samples)
    }

    pub fn is_loop_aligned(&self) -> bool {
        self.padding_needed() == 0
    }

    pub(crate) fn extend_silence(&mut self, count: usize) {
        self.samples.resize(self.samples.len() + count, 0.0);
    }
}

/// Samples to append so `total` becomes a multiple of `loop_length`.
pub fn padding_for(total: usize, loop_length: usize) -> usize {
    if loop_length == 0 {
        return 0;
    }
    match total % loop_length {
        0 => 0,
        remainder => loop_length - remainder,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padding_for() {
        assert_eq!(padding_for(0, 4), 0);
        assert_eq!(padding_for(8, 4), 0);
        assert_eq!(padding_for(9, 4), 3);
        assert_eq!(padding_for(11, 4), 1);
        assert_eq!(padding_for(5, 0), 0);
    }

    #[test]
    fn test_loop_counts() {
        let rec = ContinuousRecording::new(vec![0.0; 10], 4, 8000, BitDepth::Int16, "full_1.wav");
        assert_eq!(rec.num_loops(), 2);
        assert_eq!(rec.padding_needed(), 2);
        assert!(!rec.is_loop_aligned());
        assert_eq!(recording_file_name(3), "full_3.wav");
        assert_eq!(parse_recording_index("full_3.wav"), Some(3));
        assert_eq!(parse_recording_index("full_3_padded.wav"), None);
    }
}
