//! Output gain helpers.

/// Peak level in dBFS (`-inf` for silence).
pub fn peak_dbfs(samples: &[f32]) -> f64 {
    let peak = samples.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()));
    20.0 * (peak as f64).log10()
}

/// Scale `samples` so their peak sits at `target_db` dBFS.
///
/// Silent input is left unchanged.
pub fn normalize_peak(samples: &mut [f32], target_db: f64) {
    let current_peak = peak_dbfs(samples);
    if !current_peak.is_finite() {
        return;
    }
    let gain = 10.0_f64.powf((target_db - current_peak) / 20.0) as f32;
    for sample in samples.iter_mut() {
        *sample *= gain;
    }
}
