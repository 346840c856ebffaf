//! Comp assembly: stitch winning segments from many takes into one loop.

use crate::crossfade::{apply_crossfade, CrossfadeSettings, FadeWindow};
use crate::dsp::normalize_peak;
use crate::error::{ExportError, Result};
use crate::source::TakeSource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use vocomp_analysis::BoundarySet;

/// Assembly options.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CompOptions {
    pub crossfade: CrossfadeSettings,
    /// Peak-normalize each take to this level (dBFS) before stitching, so
    /// segments from quiet and loud passes sit at a similar level. Off by
    /// default.
    #[serde(default)]
    pub normalize_takes_dbfs: Option<f64>,
    /// Peak-normalize the result to this level (dBFS). Off by default.
    #[serde(default)]
    pub normalize_dbfs: Option<f64>,
}

impl CompOptions {
    pub fn with_crossfade(crossfade: CrossfadeSettings) -> Self {
        Self {
            crossfade,
            normalize_takes_dbfs: None,
            normalize_dbfs: None,
        }
    }
}

/// Why a segment does not use its requested take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Substitution {
    /// The compmap had no winner for the segment.
    NoWinner,
    /// The winning take could not be read.
    MissingTake { requested: u32, reason: String },
}

/// The take used for one segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentChoice {
    pub index: usize,
    pub start_s: f64,
    pub end_s: f64,
    pub start_sample: usize,
    pub end_sample: usize,
    pub take: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substitution: Option<Substitution>,
}

/// Machine-readable description of a comp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompReport {
    pub sample_rate: u32,
    pub total_samples: usize,
    pub crossfade: CrossfadeSettings,
    pub segments: Vec<SegmentChoice>,
}

impl CompReport {
    pub fn substitutions(&self) -> impl Iterator<Item = &SegmentChoice> {
        self.segments.iter().filter(|s| s.substitution.is_some())
    }

    /// True when every segment used its requested take.
    pub fn is_complete(&self) -> bool {
        self.substitutions().next().is_none()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// An assembled comp.
#[derive(Debug, Clone)]
pub struct CompResult {
    pub samples: Vec<f32>,
    pub report: CompReport,
}

impl CompResult {
    pub fn sample_rate(&self) -> u32 {
        self.report.sample_rate
    }
}

/// Build one continuous take from per-segment winners.
///
/// `winners` holds one entry per segment of `boundaries`. Segments without a
/// winner, or whose winner cannot be read, use the lowest-indexed readable
/// take and are flagged in the report. Internal boundaries between different
/// takes are crossfaded over a window centered on the boundary; output
/// length always equals the take length.
pub fn assemble_comp<S: TakeSource + ?Sized>(
    boundaries: &BoundarySet,
    winners: &[Option<u32>],
    source: &S,
    options: &CompOptions,
) -> Result<CompResult> {
    let indices = source.indices();
    if indices.is_empty() {
        return Err(ExportError::NoTakes);
    }
    let sample_rate = source.sample_rate();
    let take_len = source.take_len();
    if sample_rate == 0 || take_len == 0 {
        return Err(ExportError::InvalidData("takes are empty".into()));
    }
    if winners.len() != boundaries.segment_count() {
        return Err(ExportError::CompMapMismatch(format!(
            "{} winners for {} segments",
            winners.len(),
            boundaries.segment_count()
        )));
    }

    let mut cache = TakeCache::new(source, take_len, options.normalize_takes_dbfs);
    let ranges = boundaries.sample_ranges(take_len, sample_rate);
    let segments = boundaries.segments();

    let mut choices = Vec::with_capacity(segments.len());
    for ((segment, range), &requested) in segments.iter().zip(&ranges).zip(winners) {
        let (take, substitution) = match requested {
            None => (cache.default_take(&indices)?, Some(Substitution::NoWinner)),
            Some(index) => match cache.load(index, &indices) {
                Ok(()) => (index, None),
                Err(reason) => {
                    tracing::warn!(
                        "Segment {}: take {} unavailable ({}), using default take",
                        segment.index,
                        index,
                        reason
                    );
                    (
                        cache.default_take(&indices)?,
                        Some(Substitution::MissingTake {
                            requested: index,
                            reason,
                        }),
                    )
                }
            },
        };

        choices.push(SegmentChoice {
            index: segment.index,
            start_s: segment.start,
            end_s: segment.end,
            start_sample: range.start,
            end_sample: range.end,
            take,
            substitution,
        });
    }

    let takes = cache.into_loaded();
    let mut samples = vec![0.0f32; take_len];
    for choice in &choices {
        let take = &takes[&choice.take];
        samples[choice.start_sample..choice.end_sample]
            .copy_from_slice(&take[choice.start_sample..choice.end_sample]);
    }

    let fade_len = options.crossfade.window_samples(sample_rate);
    for pair in choices.windows(2) {
        let (left, right) = (&pair[0], &pair[1]);
        if left.take == right.take {
            continue;
        }
        let window = FadeWindow::centered(
            right.start_sample,
            fade_len,
            left.end_sample - left.start_sample,
            right.end_sample - right.start_sample,
        );
        apply_crossfade(
            &mut samples,
            &takes[&left.take],
            &takes[&right.take],
            window,
            options.crossfade.curve,
        );
    }

    if let Some(target) = options.normalize_dbfs {
        normalize_peak(&mut samples, target);
    }

    let report = CompReport {
        sample_rate,
        total_samples: take_len,
        crossfade: options.crossfade,
        segments: choices,
    };
    tracing::info!(
        "Assembled comp: {} segments, {} substitutions",
        report.segments.len(),
        report.substitutions().count()
    );

    Ok(CompResult { samples, report })
}

/// Loads each take at most once and remembers failures.
struct TakeCache<'a, S: TakeSource + ?Sized> {
    source: &'a S,
    take_len: usize,
    normalize_dbfs: Option<f64>,
    loaded: BTreeMap<u32, Vec<f32>>,
    failed: BTreeMap<u32, String>,
    default: Option<u32>,
}

impl<'a, S: TakeSource + ?Sized> TakeCache<'a, S> {
    fn new(source: &'a S, take_len: usize, normalize_dbfs: Option<f64>) -> Self {
        Self {
            source,
            take_len,
            normalize_dbfs,
            loaded: BTreeMap::new(),
            failed: BTreeMap::new(),
            default: None,
        }
    }

    /// Load `index`, returning a reason on failure.
    fn load(&mut self, index: u32, available: &[u32]) -> std::result::Result<(), String> {
        if self.loaded.contains_key(&index) {
            return Ok(());
        }
        if let Some(reason) = self.failed.get(&index) {
            return Err(reason.clone());
        }

        let result = if available.binary_search(&index).is_err() {
            Err("not in take set".to_string())
        } else {
            match self.source.load(index) {
                Ok(samples) if samples.len() == self.take_len => Ok(samples),
                Ok(samples) => Err(format!(
                    "{} samples, expected {}",
                    samples.len(),
                    self.take_len
                )),
                Err(e) => Err(e.to_string()),
            }
        };

        match result {
            Ok(mut samples) => {
                if let Some(target) = self.normalize_dbfs {
                    normalize_peak(&mut samples, target);
                }
                self.loaded.insert(index, samples);
                Ok(())
            }
            Err(reason) => {
                self.failed.insert(index, reason.clone());
                Err(reason)
            }
        }
    }

    /// Lowest-indexed take that loads.
    fn default_take(&mut self, available: &[u32]) -> Result<u32> {
        if let Some(index) = self.default {
            return Ok(index);
        }
        for &index in available {
            if self.load(index, available).is_ok() {
                self.default = Some(index);
                return Ok(index);
            }
        }
        Err(ExportError::NoTakes)
    }

    fn into_loaded(self) -> BTreeMap<u32, Vec<f32>> {
        self.loaded
    }
}
