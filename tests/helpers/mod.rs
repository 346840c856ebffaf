//! Test helpers and fixtures for vocomp integration tests
//!
//! ## Tolerance Levels
//!
//! Use the appropriate tolerance from [`tolerances`] module:
//! - `FLOAT_EPSILON` (1e-6): Exact operations (copies, unity gain)
//! - `INT16_EPSILON`: One 16-bit quantization step
//! - `BOUNDARY_TOLERANCE_S`: Boundary placement, a few envelope hops

#![allow(dead_code)]

pub mod tolerances;

use std::path::Path;
use vocomp::capture::wav::write_mono_samples;
use vocomp::capture::BitDepth;

/// Default test sample rate (matches common hardware)
pub const TEST_SAMPLE_RATE: u32 = 44100;

/// Route `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Generate a test signal: sine wave at given frequency and amplitude.
pub fn generate_sine(frequency: f64, amplitude: f32, sample_rate: u32, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            amplitude * (2.0 * std::f64::consts::PI * frequency * t).sin() as f32
        })
        .collect()
}

/// Generate silence (zero samples).
pub fn generate_silence(num_samples: usize) -> Vec<f32> {
    vec![0.0; num_samples]
}

/// Generate white noise (random samples in -amplitude..amplitude).
pub fn generate_noise(num_samples: usize, amplitude: f32, seed: u64) -> Vec<f32> {
    // Simple LCG for reproducible "random" noise
    let mut rng = seed;
    (0..num_samples)
        .map(|_| {
            rng = rng.wrapping_mul(6364136223846793005).wrapping_add(1);
            (((rng >> 33) as f32 / (1u64 << 31) as f32) * 2.0 - 1.0) * amplitude
        })
        .collect()
}

/// Zero `samples` between `start_s` and `end_s`.
pub fn carve_silence(samples: &mut [f32], sample_rate: u32, start_s: f64, end_s: f64) {
    let start = (start_s * sample_rate as f64) as usize;
    let end = ((end_s * sample_rate as f64) as usize).min(samples.len());
    samples[start..end].fill(0.0);
}

/// Calculate RMS of a signal.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// Calculate peak amplitude of a signal.
pub fn peak(samples: &[f32]) -> f32 {
    samples
        .iter()
        .map(|s| s.abs())
        .fold(0.0_f32, |a, b| a.max(b))
}

/// Check if two signals are approximately equal within tolerance.
pub fn signals_approx_equal(a: &[f32], b: &[f32], tolerance: f32) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() <= tolerance)
}

/// Assert that a signal is approximately silent (all values near zero).
pub fn assert_silence(samples: &[f32], tolerance: f32) {
    let max = peak(samples);
    assert!(
        max <= tolerance,
        "Expected silence, but peak amplitude was {}",
        max
    );
}

/// Write a mono WAV file.
pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32, bit_depth: BitDepth) {
    let mut writer =
        hound::WavWriter::create(path, bit_depth.mono_spec(sample_rate)).expect("create wav");
    write_mono_samples(&mut writer, samples, bit_depth).expect("write wav");
    writer.finalize().expect("finalize wav");
}
