//! The compmap: per-segment winning take decisions.
//!
//! Scoring happens elsewhere; this module reads and writes the JSON record
//! and defines the contract a scorer implements.

use crate::error::{ExportError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use vocomp_analysis::{BoundarySet, Segment};

/// Segment times must match the boundary set within this tolerance (seconds).
const TIME_TOLERANCE: f64 = 1e-6;

/// A scored take for one segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Winner {
    /// Take identifier, `take_<N>`.
    pub take: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acc_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emo_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snr_db: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub f0_rmse_c: Option<f64>,
}

impl Winner {
    pub fn for_take(index: u32) -> Self {
        Self {
            take: format!("take_{index}"),
            final_score: None,
            acc_score: None,
            emo_score: None,
            snr_db: None,
            f0_rmse_c: None,
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.final_score = Some(score);
        self
    }

    /// Take index parsed from `take_<N>` (or a bare number).
    pub fn take_index(&self) -> Option<u32> {
        let id = self.take.strip_suffix(".wav").unwrap_or(&self.take);
        id.strip_prefix("take_").unwrap_or(id).parse().ok()
    }
}

/// Decision record for one segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompSegment {
    pub index: usize,
    pub start_s: f64,
    pub end_s: f64,
    #[serde(default)]
    pub winner: Option<Winner>,
    /// Near-equal alternatives, best first.
    #[serde(default)]
    pub candidates: Vec<Winner>,
}

/// Per-segment winners for one phrase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompMap {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phrase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha_pct: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bpm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_take: Option<String>,
    pub segments: Vec<CompSegment>,
}

/// Picks the winning take for a segment.
///
/// Implementations see only the segment and the available take indices and
/// must return exactly one winner, or `None` when nothing qualifies.
pub trait SegmentScorer {
    fn pick(&mut self, segment: &Segment, takes: &[u32]) -> Option<Winner>;
}

impl<F> SegmentScorer for F
where
    F: FnMut(&Segment, &[u32]) -> Option<Winner>,
{
    fn pick(&mut self, segment: &Segment, takes: &[u32]) -> Option<Winner> {
        self(segment, takes)
    }
}

impl CompMap {
    /// Map with no winners over `boundaries`.
    pub fn empty(boundaries: &BoundarySet) -> Self {
        Self {
            segments: boundaries
                .segments()
                .into_iter()
                .map(|s| CompSegment {
                    index: s.index,
                    start_s: s.start,
                    end_s: s.end,
                    winner: None,
                    candidates: Vec::new(),
                })
                .collect(),
            ..Default::default()
        }
    }

    /// Ask `scorer` for a winner in every segment.
    pub fn from_scorer<S: SegmentScorer + ?Sized>(
        boundaries: &BoundarySet,
        takes: &[u32],
        scorer: &mut S,
    ) -> Self {
        let mut map = Self::empty(boundaries);
        for (entry, segment) in map.segments.iter_mut().zip(boundaries.segments()) {
            entry.winner = scorer.pick(&segment, takes);
        }
        map
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Winning take index per segment, in segment order.
    ///
    /// Unparseable take ids count as no winner.
    pub fn winners(&self) -> Vec<Option<u32>> {
        let mut segments: Vec<&CompSegment> = self.segments.iter().collect();
        segments.sort_by_key(|s| s.index);
        segments
            .into_iter()
            .map(|s| s.winner.as_ref().and_then(Winner::take_index))
            .collect()
    }

    /// Check that the segments partition the loop exactly as `boundaries` do.
    pub fn validate_against(&self, boundaries: &BoundarySet) -> Result<()> {
        let expected = boundaries.segments();
        if self.segments.len() != expected.len() {
            return Err(ExportError::CompMapMismatch(format!(
                "{} segments in compmap, {} in boundary set",
                self.segments.len(),
                expected.len()
            )));
        }

        let mut actual: Vec<&CompSegment> = self.segments.iter().collect();
        actual.sort_by_key(|s| s.index);

        for (i, (got, want)) in actual.iter().zip(&expected).enumerate() {
            if got.index != i
                || (got.start_s - want.start).abs() > TIME_TOLERANCE
                || (got.end_s - want.end).abs() > TIME_TOLERANCE
            {
                return Err(ExportError::CompMapMismatch(format!(
                    "segment {} is [{}, {}), expected #{} [{}, {})",
                    got.index, got.start_s, got.end_s, i, want.start, want.end
                )));
            }
        }
        Ok(())
    }
}
