//! Valley (local energy minimum) detection on an RMS envelope.

use crate::envelope::RmsEnvelope;

/// Valley detection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct ValleyParams {
    /// Percentile of the normalized envelope used as the quiet threshold.
    pub quiet_percentile: f32,
    /// Upper bound for the quiet threshold.
    pub quiet_ceiling: f32,
    /// Frames closer than this to either end are ignored (seconds).
    pub edge_guard: f64,
    /// Valleys closer than this collapse to the quietest one (seconds).
    pub min_spacing: f64,
}

impl Default for ValleyParams {
    fn default() -> Self {
        Self {
            quiet_percentile: 25.0,
            quiet_ceiling: 0.6,
            edge_guard: 0.03,
            min_spacing: 0.18,
        }
    }
}

/// A candidate cut point.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Valley {
    /// Envelope frame index
    pub frame: usize,
    /// Time in seconds
    pub time: f64,
    /// Normalized envelope level (0.0 - 1.0)
    pub level: f32,
}

/// Find quiet local minima in `envelope`.
///
/// A valley must sit at or below the quiet threshold and be strictly lower
/// than its neighbours. A flat run counts once, at its center, and only if
/// both frames bordering the run are higher. Valleys closer than
/// `min_spacing` collapse to the quietest.
pub fn find_valleys(envelope: &RmsEnvelope, duration: f64, params: &ValleyParams) -> Vec<Valley> {
    let n = envelope.len();
    if n < 3 {
        return Vec::new();
    }

    let norm = envelope.normalized();
    let threshold = percentile(&norm, params.quiet_percentile).min(params.quiet_ceiling);

    let mut candidates = Vec::new();
    let mut i = 1;
    while i < n - 1 {
        // Extend over a flat run starting at i.
        let mut j = i;
        while j + 1 < n - 1 && norm[j + 1] == norm[i] {
            j += 1;
        }

        let level = norm[i];
        if level <= threshold && level < norm[i - 1] && level < norm[j + 1] {
            let frame = (i + j) / 2;
            let time = envelope.time_of(frame);
            if time >= params.edge_guard && time <= duration - params.edge_guard {
                candidates.push(Valley { frame, time, level });
            }
        }
        i = j + 1;
    }

    debounce(candidates, params.min_spacing)
}

fn debounce(candidates: Vec<Valley>, min_spacing: f64) -> Vec<Valley> {
    let mut kept: Vec<Valley> = Vec::with_capacity(candidates.len());
    for valley in candidates {
        match kept.last_mut() {
            Some(last) if valley.time - last.time < min_spacing => {
                if valley.level < last.level {
                    *last = valley;
                }
            }
            _ => kept.push(valley),
        }
    }
    kept
}

/// Linear-interpolated percentile (0-100) of `values`.
fn percentile(values: &[f32], pct: f32) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = (pct.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f32;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f32;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(values: Vec<f32>) -> RmsEnvelope {
        // 1 frame = 0.1 s
        RmsEnvelope {
            values,
            hop_size: 1,
            sample_rate: 10.0,
        }
    }

    fn params() -> ValleyParams {
        ValleyParams {
            edge_guard: 0.05,
            min_spacing: 0.25,
            ..Default::default()
        }
    }

    #[test]
    fn test_percentile() {
        assert_eq!(percentile(&[0.0, 1.0, 2.0, 3.0, 4.0], 25.0), 1.0);
        assert_eq!(percentile(&[1.0, 0.0], 50.0), 0.5);
        assert_eq!(percentile(&[], 25.0), 0.0);
    }

    #[test]
    fn test_single_dip() {
        let env = envelope(vec![1.0, 1.0, 1.0, 0.1, 1.0, 1.0, 1.0, 1.0]);
        let valleys = find_valleys(&env, 0.8, &params());
        assert_eq!(valleys.len(), 1);
        assert_eq!(valleys[0].frame, 3);
        assert!((valleys[0].time - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_flat_run_counts_once_at_center() {
        let env = envelope(vec![1.0, 1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
        let valleys = find_valleys(&env, 1.0, &params());
        assert_eq!(valleys.len(), 1);
        assert_eq!(valleys[0].frame, 3);
    }

    #[test]
    fn test_silence_has_no_valleys() {
        let env = envelope(vec![0.0; 20]);
        assert!(find_valleys(&env, 2.0, &params()).is_empty());
    }

    #[test]
    fn test_loud_minimum_rejected() {
        // Shallow dip well above the quiet threshold.
        let mut values = vec![0.1, 0.1, 0.1, 0.1, 0.1];
        values.extend([1.0, 0.95, 1.0, 1.0, 1.0]);
        let env = envelope(values);
        let valleys = find_valleys(&env, 1.0, &params());
        assert!(valleys.iter().all(|v| v.frame != 6));
    }

    #[test]
    fn test_close_valleys_keep_quietest() {
        let env = envelope(vec![1.0, 1.0, 0.3, 1.0, 0.1, 1.0, 1.0, 1.0, 1.0, 1.0]);
        let valleys = find_valleys(&env, 1.0, &params());
        assert_eq!(valleys.len(), 1);
        assert_eq!(valleys[0].frame, 4);
    }

    #[test]
    fn test_edge_guard() {
        let env = envelope(vec![1.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
        let valleys = find_valleys(
            &env,
            0.8,
            &ValleyParams {
                edge_guard: 0.15,
                ..params()
            },
        );
        assert!(valleys.is_empty());
    }
}
