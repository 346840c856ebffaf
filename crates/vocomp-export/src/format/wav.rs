//! WAV encoder using hound
//!
//! Supports 16-bit, 24-bit, and 32-bit float mono WAV files.

use crate::error::{ExportError, Result};
use hound::WavWriter;
use std::fs::OpenOptions;
use std::io::{BufWriter, ErrorKind};
use std::path::Path;
use vocomp_capture::wav::write_mono_samples;
use vocomp_capture::BitDepth;

/// WAV encoder configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavConfig {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Bit depth
    pub bit_depth: BitDepth,
}

impl Default for WavConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            bit_depth: BitDepth::Int16,
        }
    }
}

impl WavConfig {
    pub fn new(sample_rate: u32, bit_depth: BitDepth) -> Self {
        Self {
            sample_rate,
            bit_depth,
        }
    }
}

/// Encode mono audio to a new WAV file.
///
/// Fails with [`ExportError::AlreadyExists`] instead of overwriting.
pub fn encode_wav_mono_file(samples: &[f32], path: &Path, config: &WavConfig) -> Result<()> {
    let file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            return Err(ExportError::AlreadyExists(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };

    let mut writer = WavWriter::new(
        BufWriter::new(file),
        config.bit_depth.mono_spec(config.sample_rate),
    )?;
    write_mono_samples(&mut writer, samples, config.bit_depth)?;
    writer.finalize()?;

    Ok(())
}

/// Encode mono audio to WAV in memory
///
/// # Returns
/// WAV file bytes
pub fn encode_wav_mono_memory(samples: &[f32], config: &WavConfig) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    {
        let cursor = std::io::Cursor::new(&mut buffer);
        let mut writer = WavWriter::new(cursor, config.bit_depth.mono_spec(config.sample_rate))?;
        write_mono_samples(&mut writer, samples, config.bit_depth)?;
        writer.finalize()?;
    }
    Ok(buffer)
}
