//! Pad the continuous recording up to a whole number of loops.

use crate::error::{Error, Result};
use crate::recording::ContinuousRecording;
use crate::wav::{copy_samples, open_reader, write_mono_samples, write_silence};
use hound::WavWriter;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of a padding pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PadReport {
    /// Zero samples appended in memory.
    pub padded_samples: usize,
    /// Recording length after padding.
    pub total_samples: usize,
    pub num_loops: usize,
}

/// Sibling temporary used while rewriting `path`.
pub fn padded_temp_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "recording".into());
    path.with_file_name(format!("{stem}_padded.wav"))
}

/// Append silence so the recording holds a whole number of loops.
///
/// The file is rewritten through a temporary and renamed over the original;
/// memory is extended only after the file step succeeded. On error both the
/// file and the in-memory recording are left as they were.
///
/// The in-memory samples are authoritative: if the file does not hold exactly
/// the captured samples (for example after disk writer overruns), it is
/// rewritten from memory instead of being padded.
pub fn pad_recording(recording: &mut ContinuousRecording, block_size: usize) -> Result<PadReport> {
    let padding = recording.padding_needed();

    pad_file(recording, padding, block_size).map_err(|e| Error::Pad {
        path: recording.path().to_path_buf(),
        source: Box::new(e),
    })?;

    if padding > 0 {
        recording.extend_silence(padding);
        tracing::info!(
            "Padded {} with {} samples of silence",
            recording.path().display(),
            padding
        );
    }

    Ok(PadReport {
        padded_samples: padding,
        total_samples: recording.total_samples(),
        num_loops: recording.num_loops(),
    })
}

fn pad_file(recording: &ContinuousRecording, padding: usize, block_size: usize) -> Result<()> {
    let path = recording.path();
    let captured = recording.total_samples();
    let mut reader = open_reader(path)?;
    let file_len = reader.len() as usize;
    let matches_memory = file_len == captured && reader.spec().channels == 1;

    if matches_memory && padding == 0 {
        return Ok(());
    }

    let temp = padded_temp_path(path);
    let written = if matches_memory {
        write_padded(&mut reader, &temp, file_len, padding, block_size)
    } else {
        tracing::warn!(
            "{} holds {} of {} captured samples, rewriting from memory",
            path.display(),
            file_len,
            captured
        );
        write_from_memory(recording, &temp, padding)
    };
    drop(reader);

    if let Err(e) = written {
        let _ = fs::remove_file(&temp);
        return Err(e);
    }
    if let Err(e) = fs::rename(&temp, path) {
        let _ = fs::remove_file(&temp);
        return Err(e.into());
    }
    Ok(())
}

fn write_padded<R: std::io::Read>(
    reader: &mut hound::WavReader<R>,
    temp: &Path,
    file_len: usize,
    silence: usize,
    block_size: usize,
) -> Result<()> {
    let spec = reader.spec();
    let mut writer = WavWriter::create(temp, spec)?;
    copy_samples(reader, &mut writer, file_len, block_size)?;
    write_silence(&mut writer, spec.sample_format, silence)?;
    writer.finalize()?;
    Ok(())
}

fn write_from_memory(recording: &ContinuousRecording, temp: &Path, silence: usize) -> Result<()> {
    let bit_depth = recording.bit_depth();
    let spec = bit_depth.mono_spec(recording.sample_rate());
    let mut writer = WavWriter::create(temp, spec)?;
    write_mono_samples(&mut writer, recording.samples(), bit_depth)?;
    write_silence(&mut writer, spec.sample_format, silence)?;
    writer.finalize()?;
    Ok(())
}
