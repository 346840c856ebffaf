//! Validated session tempo.

use crate::error::{AnalysisError, Result};

pub const MIN_BPM: u32 = 40;
pub const MAX_BPM: u32 = 240;

/// Integer tempo in beats per minute, within 40-240.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Tempo(u32);

impl Tempo {
    pub fn new(bpm: u32) -> Result<Self> {
        if (MIN_BPM..=MAX_BPM).contains(&bpm) {
            Ok(Self(bpm))
        } else {
            Err(AnalysisError::InvalidTempo(bpm))
        }
    }

    pub fn bpm(&self) -> u32 {
        self.0
    }

    /// Duration of one beat in seconds.
    pub fn beat_seconds(&self) -> f64 {
        60.0 / self.0 as f64
    }
}
