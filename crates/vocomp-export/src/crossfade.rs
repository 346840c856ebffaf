//! Crossfades at internal comp boundaries.

use serde::{Deserialize, Serialize};

/// Shortest crossfade, at amount 0.
pub const MIN_CROSSFADE_MS: f64 = 50.0;

/// Longest crossfade, at amount 100.
pub const MAX_CROSSFADE_MS: f64 = 300.0;

/// Gain law for a crossfade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FadeCurve {
    #[default]
    Linear,
    EqualPower,
}

impl FadeCurve {
    /// `(fade_out, fade_in)` gains at position `t` in `[0, 1]`.
    #[inline]
    pub fn gains(&self, t: f32) -> (f32, f32) {
        match self {
            FadeCurve::Linear => (1.0 - t, t),
            FadeCurve::EqualPower => {
                let angle = t * core::f32::consts::FRAC_PI_2;
                (angle.cos(), angle.sin())
            }
        }
    }
}

/// Crossfade duration and curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossfadeSettings {
    /// Full window length in milliseconds, centered on the boundary.
    pub duration_ms: f64,
    pub curve: FadeCurve,
}

impl Default for CrossfadeSettings {
    fn default() -> Self {
        Self::from_amount(0)
    }
}

impl CrossfadeSettings {
    /// Map a 0-100 user control linearly onto 50-300 ms.
    pub fn from_amount(amount: u8) -> Self {
        let amount = amount.min(100) as f64;
        Self {
            duration_ms: MIN_CROSSFADE_MS + amount * (MAX_CROSSFADE_MS - MIN_CROSSFADE_MS) / 100.0,
            curve: FadeCurve::Linear,
        }
    }

    pub fn from_millis(duration_ms: f64) -> Self {
        Self {
            duration_ms: if duration_ms.is_finite() { duration_ms.max(0.0) } else { 0.0 },
            curve: FadeCurve::Linear,
        }
    }

    pub fn with_curve(mut self, curve: FadeCurve) -> Self {
        self.curve = curve;
        self
    }

    /// Window length in samples.
    pub fn window_samples(&self, sample_rate: u32) -> usize {
        (self.duration_ms / 1000.0 * sample_rate as f64).round() as usize
    }
}

/// Window placement around one boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FadeWindow {
    pub start: usize,
    pub len: usize,
}

impl FadeWindow {
    /// Center a window of at most `len` samples on `boundary`, capped by the
    /// shorter neighbouring segment.
    pub fn centered(boundary: usize, len: usize, before: usize, after: usize) -> Self {
        let len = len.min(before).min(after);
        let half_before = len / 2;
        Self {
            start: boundary - half_before,
            len,
        }
    }

    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Mix `outgoing` into `incoming` over `window` of `out`.
///
/// `out` already holds `incoming` after the boundary and `outgoing` before
/// it; inside the window both sources are summed with `curve` gains.
pub(crate) fn apply_crossfade(
    out: &mut [f32],
    outgoing: &[f32],
    incoming: &[f32],
    window: FadeWindow,
    curve: FadeCurve,
) {
    if window.len == 0 {
        return;
    }
    let len = window.len as f32;
    for (k, n) in (window.start..window.end()).enumerate() {
        let (fade_out, fade_in) = curve.gains((k as f32 + 0.5) / len);
        out[n] = outgoing[n] * fade_out + incoming[n] * fade_in;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_amount_mapping() {
        assert_eq!(CrossfadeSettings::from_amount(0).duration_ms, 50.0);
        assert_eq!(CrossfadeSettings::from_amount(100).duration_ms, 300.0);
        assert_eq!(CrossfadeSettings::from_amount(20).duration_ms, 100.0);
        assert_eq!(CrossfadeSettings::from_amount(255).duration_ms, 300.0);
    }

    #[test]
    fn test_window_samples() {
        let settings = CrossfadeSettings::from_millis(100.0);
        assert_eq!(settings.window_samples(44100), 4410);
        assert_eq!(settings.window_samples(48000), 4800);
    }

    #[test]
    fn test_curves_sum() {
        for t in [0.0f32, 0.25, 0.5, 1.0] {
            let (a, b) = FadeCurve::Linear.gains(t);
            assert_relative_eq!(a + b, 1.0);
            let (a, b) = FadeCurve::EqualPower.gains(t);
            assert_relative_eq!(a * a + b * b, 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_window_capped_by_short_segment() {
        let w = FadeWindow::centered(100, 40, 10, 500);
        assert_eq!(w, FadeWindow { start: 95, len: 10 });
        let w = FadeWindow::centered(100, 40, 500, 500);
        assert_eq!(w, FadeWindow { start: 80, len: 40 });
        assert_eq!(w.end(), 120);
    }

    #[test]
    fn test_apply_crossfade_mixes_only_window() {
        let outgoing = vec![1.0f32; 8];
        let incoming = vec![0.0f32; 8];
        let mut out = vec![1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0];

        apply_crossfade(
            &mut out,
            &outgoing,
            &incoming,
            FadeWindow { start: 2, len: 4 },
            FadeCurve::Linear,
        );

        assert_eq!(out[..2], [1.0, 1.0]);
        assert_relative_eq!(out[2], 0.875);
        assert_relative_eq!(out[5], 0.125);
        assert_eq!(out[6..], [0.0, 0.0]);
    }
}
