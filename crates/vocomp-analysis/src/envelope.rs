//! Short-time RMS envelope.

/// Default analysis frame length in samples
pub const DEFAULT_FRAME_SIZE: usize = 2048;

/// Default hop size (samples between analysis frames)
pub const DEFAULT_HOP_SIZE: usize = 512;

/// RMS values on a fixed hop grid.
///
/// Frame `i` is centered on sample `i * hop_size`; samples outside the
/// signal count as zero.
#[derive(Debug, Clone, PartialEq)]
pub struct RmsEnvelope {
    pub values: Vec<f32>,
    pub hop_size: usize,
    pub sample_rate: f64,
}

impl RmsEnvelope {
    /// Compute the envelope of a mono signal.
    pub fn compute(samples: &[f32], sample_rate: f64, frame_size: usize, hop_size: usize) -> Self {
        let hop_size = hop_size.max(1);
        let frame_size = frame_size.max(1);

        if samples.is_empty() {
            return Self {
                values: Vec::new(),
                hop_size,
                sample_rate,
            };
        }

        let num_frames = 1 + samples.len() / hop_size;
        let half = frame_size / 2;

        let values = (0..num_frames)
            .map(|i| {
                let center = i * hop_size;
                let start = center.saturating_sub(half);
                let end = (center + frame_size - half).min(samples.len());
                let sum_sq: f64 = samples[start.min(end)..end]
                    .iter()
                    .map(|&s| (s as f64) * (s as f64))
                    .sum();
                (sum_sq / frame_size as f64).sqrt() as f32
            })
            .collect();

        Self {
            values,
            hop_size,
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Time in seconds of frame `index`.
    pub fn time_of(&self, index: usize) -> f64 {
        (index * self.hop_size) as f64 / self.sample_rate
    }

    /// Time axis for all frames.
    pub fn times(&self) -> Vec<f64> {
        (0..self.values.len()).map(|i| self.time_of(i)).collect()
    }

    /// Envelope scaled so its maximum is 1.0 (all zeros stays all zeros).
    pub fn normalized(&self) -> Vec<f32> {
        let max = self.values.iter().copied().fold(0.0f32, f32::max);
        if max > 0.0 {
            self.values.iter().map(|&v| v / max).collect()
        } else {
            vec![0.0; self.values.len()]
        }
    }
}
