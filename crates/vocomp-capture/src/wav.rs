//! WAV helpers shared by the writer, padder, splitter, and take reader.

use crate::config::BitDepth;
use crate::error::Result;
use hound::{Sample, SampleFormat, WavReader, WavWriter};
use std::fs::File;
use std::io::{BufReader, Read, Seek, Write};
use std::path::Path;

/// Decoded mono audio.
#[derive(Debug, Clone, PartialEq)]
pub struct MonoAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl MonoAudio {
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.samples.len() as f64 / self.sample_rate as f64
        }
    }
}

/// Read a WAV file as mono `f32`, averaging channels.
pub fn read_mono(path: &Path) -> Result<MonoAudio> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<hound::Result<_>>()?,
        SampleFormat::Int => {
            let scale = int_scale(spec.bits_per_sample);
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<hound::Result<_>>()?
        }
    };

    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    Ok(MonoAudio {
        samples,
        sample_rate: spec.sample_rate,
    })
}

/// Write mono `f32` samples in the encoding selected by `bit_depth`.
///
/// The writer's spec must match `bit_depth`.
pub fn write_mono_samples<W: Write + Seek>(
    writer: &mut WavWriter<W>,
    samples: &[f32],
    bit_depth: BitDepth,
) -> hound::Result<()> {
    match bit_depth {
        BitDepth::Int16 => {
            for &sample in samples {
                writer.write_sample(float_to_i16(sample))?;
            }
        }
        BitDepth::Int24 => {
            for &sample in samples {
                writer.write_sample(float_to_i24(sample))?;
            }
        }
        BitDepth::Float32 => {
            for &sample in samples {
                writer.write_sample(sample)?;
            }
        }
    }
    Ok(())
}

/// Copy up to `count` samples from `reader` to `writer` without re-encoding.
///
/// Returns the number of samples copied, which is less than `count` only when
/// the reader runs out.
pub(crate) fn copy_samples<R: Read, W: Write + Seek>(
    reader: &mut WavReader<R>,
    writer: &mut WavWriter<W>,
    count: usize,
    block_size: usize,
) -> Result<usize> {
    match reader.spec().sample_format {
        SampleFormat::Float => copy_typed::<f32, _, _>(reader, writer, count, block_size),
        SampleFormat::Int => copy_typed::<i32, _, _>(reader, writer, count, block_size),
    }
}

fn copy_typed<S: Sample + Copy, R: Read, W: Write + Seek>(
    reader: &mut WavReader<R>,
    writer: &mut WavWriter<W>,
    count: usize,
    block_size: usize,
) -> Result<usize> {
    let mut block: Vec<S> = Vec::with_capacity(block_size);
    let mut samples = reader.samples::<S>();
    let mut copied = 0;

    while copied < count {
        let want = block_size.min(count - copied);
        block.clear();
        for sample in samples.by_ref().take(want) {
            block.push(sample?);
        }
        for &sample in &block {
            writer.write_sample(sample)?;
        }
        copied += block.len();
        if block.len() < want {
            break;
        }
    }

    Ok(copied)
}

/// Append `count` zero samples in the writer's own encoding.
pub(crate) fn write_silence<W: Write + Seek>(
    writer: &mut WavWriter<W>,
    format: SampleFormat,
    count: usize,
) -> hound::Result<()> {
    match format {
        SampleFormat::Float => {
            for _ in 0..count {
                writer.write_sample(0.0f32)?;
            }
        }
        SampleFormat::Int => {
            for _ in 0..count {
                writer.write_sample(0i32)?;
            }
        }
    }
    Ok(())
}

pub(crate) fn open_reader(path: &Path) -> Result<WavReader<BufReader<File>>> {
    Ok(WavReader::open(path)?)
}

#[inline]
fn int_scale(bits: u16) -> f32 {
    (1u32 << (bits.clamp(8, 32) - 1)) as f32
}

/// Convert float sample to 16-bit integer with clipping.
///
/// Inverse of the decoder's scaling, so decoded 16-bit audio re-encodes exactly.
#[inline]
pub fn float_to_i16(sample: f32) -> i16 {
    (sample * 32768.0).round().clamp(-32768.0, 32767.0) as i16
}

/// Convert float sample to 24-bit integer (stored as i32) with clipping.
#[inline]
pub fn float_to_i24(sample: f32) -> i32 {
    (sample * 8388608.0).round().clamp(-8388608.0, 8388607.0) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::WavSpec;

    #[test]
    fn test_float_to_i16() {
        assert_eq!(float_to_i16(0.0), 0);
        assert_eq!(float_to_i16(1.0), 32767);
        assert_eq!(float_to_i16(-1.0), -32768);
        assert_eq!(float_to_i16(1.5), 32767);
        assert_eq!(float_to_i16(-1.5), -32768);
    }

    #[test]
    fn test_float_to_i24() {
        assert_eq!(float_to_i24(0.0), 0);
        assert_eq!(float_to_i24(1.0), 8388607);
        assert_eq!(float_to_i24(-1.0), -8388608);
    }

    #[test]
    fn test_int16_reencodes_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.wav");
        let original: Vec<i16> = vec![0, 1, -1, 12345, -32768, 32767];

        let mut writer = WavWriter::create(&path, BitDepth::Int16.mono_spec(44100)).unwrap();
        for &s in &original {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let decoded = read_mono(&path).unwrap();
        let reencoded: Vec<i16> = decoded.samples.iter().map(|&s| float_to_i16(s)).collect();
        assert_eq!(reencoded, original);
    }

    #[test]
    fn test_read_mono_downmixes_stereo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = WavSpec {
            channels: 2,
            sample_rate: 48000,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for (l, r) in [(0.5f32, 0.25f32), (-1.0, 1.0)] {
            writer.write_sample(l).unwrap();
            writer.write_sample(r).unwrap();
        }
        writer.finalize().unwrap();

        let audio = read_mono(&path).unwrap();
        assert_eq!(audio.sample_rate, 48000);
        assert_eq!(audio.samples, vec![0.375, 0.0]);
    }

    #[test]
    fn test_copy_samples_stops_at_end_of_source() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.wav");
        let dst = dir.path().join("dst.wav");
        let spec = BitDepth::Int16.mono_spec(8000);

        let mut writer = WavWriter::create(&src, spec).unwrap();
        for i in 0..10i16 {
            writer.write_sample(i).unwrap();
        }
        writer.finalize().unwrap();

        let mut reader = open_reader(&src).unwrap();
        let mut writer = WavWriter::create(&dst, spec).unwrap();
        let copied = copy_samples(&mut reader, &mut writer, 64, 3).unwrap();
        write_silence(&mut writer, spec.sample_format, 2).unwrap();
        writer.finalize().unwrap();

        assert_eq!(copied, 10);
        let out: Vec<i16> = WavReader::open(&dst)
            .unwrap()
            .samples::<i16>()
            .map(|s| s.unwrap())
            .collect();
        assert_eq!(out, vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 0, 0]);
    }
}
