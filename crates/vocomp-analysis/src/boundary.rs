//! Boundary sets: the shared phrase grid applied to every take.

use crate::error::{AnalysisError, Result};
use std::ops::Range;

/// One phrase segment, half-open `[start, end)` in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Segment {
    pub index: usize,
    pub start: f64,
    pub end: f64,
}

impl Segment {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Ordered interior cut points within `(0, duration)`.
///
/// The boundaries at 0 and at `duration` are implicit. Deserialized sets go
/// through the same checks as [`BoundarySet::new`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RawBoundarySet")
)]
pub struct BoundarySet {
    interior: Vec<f64>,
    duration: f64,
}

#[cfg(feature = "serialization")]
#[derive(serde::Deserialize)]
struct RawBoundarySet {
    interior: Vec<f64>,
    duration: f64,
}

#[cfg(feature = "serialization")]
impl TryFrom<RawBoundarySet> for BoundarySet {
    type Error = AnalysisError;

    fn try_from(raw: RawBoundarySet) -> Result<Self> {
        Self::new(raw.interior, raw.duration)
    }
}

impl BoundarySet {
    /// Build a boundary set, checking that cuts are strictly increasing and
    /// strictly inside the loop.
    pub fn new(interior: Vec<f64>, duration: f64) -> Result<Self> {
        if !(duration.is_finite() && duration >= 0.0) {
            return Err(AnalysisError::InvalidBoundaries(format!(
                "invalid duration {duration}"
            )));
        }
        let mut prev = 0.0;
        for &t in &interior {
            if !(t > prev && t < duration) {
                return Err(AnalysisError::InvalidBoundaries(format!(
                    "boundary {t} not inside ({prev}, {duration})"
                )));
            }
            prev = t;
        }
        Ok(Self { interior, duration })
    }

    /// A single segment spanning the whole loop.
    pub fn whole(duration: f64) -> Self {
        Self {
            interior: Vec::new(),
            duration: if duration.is_finite() { duration.max(0.0) } else { 0.0 },
        }
    }

    /// Rebuild from contiguous `(start, end)` segments.
    pub fn from_segments(segments: &[(f64, f64)]) -> Result<Self> {
        let Some(&(_, duration)) = segments.last() else {
            return Ok(Self::whole(0.0));
        };
        let interior = segments[..segments.len() - 1]
            .iter()
            .map(|&(_, end)| end)
            .collect();
        Self::new(interior, duration)
    }

    pub fn interior(&self) -> &[f64] {
        &self.interior
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Number of segments (interior boundaries + 1).
    pub fn segment_count(&self) -> usize {
        self.interior.len() + 1
    }

    /// All boundaries including 0 and the loop end.
    pub fn all(&self) -> Vec<f64> {
        let mut all = Vec::with_capacity(self.interior.len() + 2);
        all.push(0.0);
        all.extend_from_slice(&self.interior);
        all.push(self.duration);
        all
    }

    pub fn segments(&self) -> Vec<Segment> {
        self.all()
            .windows(2)
            .enumerate()
            .map(|(index, w)| Segment {
                index,
                start: w[0],
                end: w[1],
            })
            .collect()
    }

    /// Sample ranges of each segment for a take of `total_samples`.
    ///
    /// The last range always ends at `total_samples`, so the ranges cover
    /// every sample exactly once.
    pub fn sample_ranges(&self, total_samples: usize, sample_rate: u32) -> Vec<Range<usize>> {
        let mut starts: Vec<usize> = Vec::with_capacity(self.segment_count());
        starts.push(0);
        for &t in &self.interior {
            let pos = ((t * sample_rate as f64).round() as usize).min(total_samples);
            let prev = starts.last().copied().unwrap_or(0);
            starts.push(pos.max(prev));
        }

        starts
            .iter()
            .enumerate()
            .map(|(i, &start)| {
                let end = starts.get(i + 1).copied().unwrap_or(total_samples);
                start..end
            })
            .collect()
    }
}
