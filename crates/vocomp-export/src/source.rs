//! Where the assembler gets take audio from.

use crate::error::{ExportError, Result};
use std::collections::BTreeMap;
use vocomp_capture::TakeSet;

/// A homogeneous set of takes addressed by index.
pub trait TakeSource {
    fn sample_rate(&self) -> u32;

    /// Length of every take in samples.
    fn take_len(&self) -> usize;

    /// Available take indices, ascending.
    fn indices(&self) -> Vec<u32>;

    /// Decode one take as mono `f32`.
    fn load(&self, index: u32) -> Result<Vec<f32>>;
}

impl TakeSource for TakeSet {
    fn sample_rate(&self) -> u32 {
        TakeSet::sample_rate(self).unwrap_or(0)
    }

    fn take_len(&self) -> usize {
        TakeSet::take_len(self).unwrap_or(0)
    }

    fn indices(&self) -> Vec<u32> {
        TakeSet::indices(self)
    }

    fn load(&self, index: u32) -> Result<Vec<f32>> {
        Ok(self.read(index)?.samples)
    }
}

/// Takes held in memory.
#[derive(Debug, Clone)]
pub struct MemoryTakes {
    sample_rate: u32,
    take_len: usize,
    takes: BTreeMap<u32, Vec<f32>>,
}

impl MemoryTakes {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            take_len: 0,
            takes: BTreeMap::new(),
        }
    }

    /// Add a take; every take must have the same length.
    pub fn insert(&mut self, index: u32, samples: Vec<f32>) -> Result<()> {
        if !self.takes.is_empty() && samples.len() != self.take_len {
            return Err(ExportError::InvalidData(format!(
                "take {} has {} samples, expected {}",
                index,
                samples.len(),
                self.take_len
            )));
        }
        self.take_len = samples.len();
        self.takes.insert(index, samples);
        Ok(())
    }

    pub fn with_take(mut self, index: u32, samples: Vec<f32>) -> Result<Self> {
        self.insert(index, samples)?;
        Ok(self)
    }
}

impl TakeSource for MemoryTakes {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn take_len(&self) -> usize {
        self.take_len
    }

    fn indices(&self) -> Vec<u32> {
        self.takes.keys().copied().collect()
    }

    fn load(&self, index: u32) -> Result<Vec<f32>> {
        self.takes
            .get(&index)
            .cloned()
            .ok_or(ExportError::Capture(vocomp_capture::Error::TakeNotFound(index)))
    }
}
