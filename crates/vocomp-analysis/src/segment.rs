//! BPM-aware phrase segmentation.
//!
//! Cuts a reference signal at quiet valleys of its RMS envelope, aiming for
//! roughly two-beat segments. Where no valley is available the current
//! segment simply runs long; sustained notes are never bisected.

use crate::boundary::BoundarySet;
use crate::envelope::{RmsEnvelope, DEFAULT_FRAME_SIZE, DEFAULT_HOP_SIZE};
use crate::error::{AnalysisError, Result};
use crate::tempo::Tempo;
use crate::valley::{find_valleys, Valley, ValleyParams};

/// Segmentation parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct SegmentationConfig {
    /// Minimum segment duration in seconds (default: 0.45)
    pub min_seg_dur: f64,
    /// Soft maximum segment duration in seconds (default: 5.0)
    pub max_seg_dur: f64,
    /// Ceiling for the tempo-derived target duration (default: 4.0)
    pub target_cap: f64,
    /// Target duration when no tempo is known (default: 1.2)
    pub fallback_target: f64,
    /// RMS frame length in samples (default: 2048)
    pub frame_size: usize,
    /// RMS hop size in samples (default: 512)
    pub hop_size: usize,
    pub valleys: ValleyParams,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            min_seg_dur: 0.45,
            max_seg_dur: 5.0,
            target_cap: 4.0,
            fallback_target: 1.2,
            frame_size: DEFAULT_FRAME_SIZE,
            hop_size: DEFAULT_HOP_SIZE,
            valleys: ValleyParams::default(),
        }
    }
}

impl SegmentationConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.min_seg_dur > 0.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "min_seg_dur must be positive, got {}",
                self.min_seg_dur
            )));
        }
        if !(self.max_seg_dur >= self.min_seg_dur) {
            return Err(AnalysisError::InvalidConfig(format!(
                "max_seg_dur {} below min_seg_dur {}",
                self.max_seg_dur, self.min_seg_dur
            )));
        }
        if !(self.target_cap > 0.0 && self.fallback_target > 0.0) {
            return Err(AnalysisError::InvalidConfig(
                "target durations must be positive".into(),
            ));
        }
        if self.hop_size == 0 || self.frame_size < self.hop_size {
            return Err(AnalysisError::InvalidConfig(format!(
                "frame_size {} / hop_size {} invalid",
                self.frame_size, self.hop_size
            )));
        }
        Ok(())
    }

    /// Preferred segment duration for `tempo`: two beats, clamped to
    /// `[min_seg_dur, target_cap]`.
    pub fn target_duration(&self, tempo: Option<Tempo>) -> f64 {
        match tempo {
            Some(tempo) => self
                .min_seg_dur
                .max(self.target_cap.min(2.0 * tempo.beat_seconds())),
            None => self.fallback_target,
        }
    }
}

/// Computes boundary sets from a reference signal.
#[derive(Debug, Clone, Default)]
pub struct Segmenter {
    config: SegmentationConfig,
}

impl Segmenter {
    pub fn new(config: SegmentationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SegmentationConfig {
        &self.config
    }

    /// Segment a mono reference signal.
    ///
    /// Malformed input (zero sample rate, non-finite samples) and signals too
    /// short to hold two minimum segments yield a single whole-loop segment.
    pub fn segment(&self, samples: &[f32], sample_rate: u32, tempo: Option<Tempo>) -> BoundarySet {
        if sample_rate == 0 {
            tracing::warn!("Reference has no sample rate, using one segment");
            return BoundarySet::whole(0.0);
        }

        let duration = samples.len() as f64 / sample_rate as f64;
        if samples.iter().any(|s| !s.is_finite()) {
            tracing::warn!("Reference contains non-finite samples, using one segment");
            return BoundarySet::whole(duration);
        }
        if duration <= 2.0 * self.config.min_seg_dur {
            return BoundarySet::whole(duration);
        }

        let envelope = RmsEnvelope::compute(
            samples,
            sample_rate as f64,
            self.config.frame_size,
            self.config.hop_size,
        );
        let valleys = find_valleys(&envelope, duration, &self.config.valleys);
        let target = self.config.target_duration(tempo);
        let interior = self.walk(&valleys, duration, target);

        tracing::debug!(
            "Segmented {:.2}s reference: {} valleys, target {:.2}s, {} segments",
            duration,
            valleys.len(),
            target,
            interior.len() + 1
        );

        BoundarySet::new(interior, duration).unwrap_or_else(|e| {
            tracing::warn!("Discarding boundaries: {}", e);
            BoundarySet::whole(duration)
        })
    }

    /// Greedy forward walk choosing the valley nearest `last + target` in
    /// each window.
    fn walk(&self, valleys: &[Valley], duration: f64, target: f64) -> Vec<f64> {
        let min = self.config.min_seg_dur;
        let max = self.config.max_seg_dur;
        let mut boundaries = Vec::new();
        let mut last = 0.0;

        loop {
            let window_start = last + min;
            // The window has reached the end once no minimum-length tail fits.
            if duration - window_start < min {
                break;
            }
            let window_end = (last + max).min(duration - min);
            if window_end < window_start {
                break;
            }

            let desired = last + target;
            let chosen = valleys
                .iter()
                .map(|v| v.time)
                .filter(|&t| t >= window_start && t <= window_end)
                .min_by(|a, b| (a - desired).abs().total_cmp(&(b - desired).abs()));

            let Some(cut) = chosen else {
                break;
            };
            if cut <= last {
                break;
            }
            boundaries.push(cut);
            last = cut;
        }

        boundaries
    }
}

/// Segment with default parameters.
pub fn segment_reference(samples: &[f32], sample_rate: u32, tempo: Option<Tempo>) -> BoundarySet {
    Segmenter::default().segment(samples, sample_rate, tempo)
}
