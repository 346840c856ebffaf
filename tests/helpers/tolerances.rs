//! Tolerance constants for audio testing.

/// Floating point rounding errors (for copies, exact gain).
pub const FLOAT_EPSILON: f32 = 1e-6;

/// 16-bit quantization step size.
/// Use when comparing against audio that went through a 16-bit file.
pub const INT16_EPSILON: f32 = 1.0 / 32768.0;

/// Boundary placement tolerance in seconds.
/// The RMS envelope hop is 512 samples (~11.6 ms at 44.1 kHz).
pub const BOUNDARY_TOLERANCE_S: f64 = 0.05;
