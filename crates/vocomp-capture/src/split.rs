//! Split a padded continuous recording into one take per loop.

use crate::error::{Error, Result};
use crate::recording::ContinuousRecording;
use crate::takes::take_file_name;
use crate::wav::{copy_samples, open_reader};
use hound::{WavReader, WavSpec, WavWriter};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

/// A take file produced by the splitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenTake {
    pub index: u32,
    pub path: PathBuf,
    pub samples: usize,
}

/// What a split pass produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitReport {
    pub takes: Vec<WrittenTake>,
    /// Loops that were not written (incomplete source or a failed write).
    pub skipped_loops: usize,
    /// Whether the continuous recording file was deleted.
    pub source_removed: bool,
}

impl SplitReport {
    /// First take index that is still unused after this pass.
    pub fn next_index(&self, first_index: u32) -> u32 {
        first_index + self.takes.len() as u32
    }
}

/// Typed result of a split pass that got far enough to open the source.
#[derive(Debug)]
pub enum SplitOutcome {
    Complete(SplitReport),
    /// Some takes were written; `error` explains why the rest were not.
    Partial { report: SplitReport, error: Error },
}

impl SplitOutcome {
    pub fn report(&self) -> &SplitReport {
        match self {
            SplitOutcome::Complete(report) => report,
            SplitOutcome::Partial { report, .. } => report,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, SplitOutcome::Complete(_))
    }
}

/// Write each whole loop of `recording` as `take_<N>.wav` in `takes_dir`,
/// numbering from `first_index`.
///
/// Takes keep the source's sample rate and encoding. The source file is
/// deleted only once every loop has been written. A write failure removes
/// the partial take, keeps the source, and stops the pass.
pub fn split_recording(
    recording: &ContinuousRecording,
    takes_dir: &Path,
    first_index: u32,
    block_size: usize,
) -> Result<SplitOutcome> {
    let loop_length = recording.loop_length_samples();
    if loop_length == 0 {
        return Err(Error::Recording("loop length must be non-zero".into()));
    }

    let mut reader = open_reader(recording.path())?;
    let spec = reader.spec();
    if spec.channels != 1 {
        return Err(Error::Recording(format!(
            "continuous recording must be mono, found {} channels",
            spec.channels
        )));
    }

    let available = reader.len() as usize;
    let num_loops = recording.num_loops();
    let mut report = SplitReport::default();
    let mut failure = None;

    for loop_index in 0..num_loops {
        let required = (loop_index + 1) * loop_length;
        if available < required {
            tracing::warn!(
                "Loop {} incomplete ({} of {} samples), skipping remaining loops",
                loop_index,
                available,
                required
            );
            failure = Some(Error::IncompleteLoop {
                loop_index,
                available: available.saturating_sub(loop_index * loop_length),
                required: loop_length,
            });
            break;
        }

        let index = first_index + loop_index as u32;
        let path = takes_dir.join(take_file_name(index));
        match write_take(&mut reader, &path, spec, loop_length, block_size) {
            Ok(()) => {
                tracing::debug!("Wrote take {} to {}", index, path.display());
                report.takes.push(WrittenTake {
                    index,
                    path,
                    samples: loop_length,
                });
            }
            Err(e) => {
                tracing::error!("Failed to write take {}: {}", index, e);
                let _ = fs::remove_file(&path);
                failure = Some(e);
                break;
            }
        }
    }
    drop(reader);

    report.skipped_loops = num_loops - report.takes.len();

    match failure {
        Some(error) => Ok(SplitOutcome::Partial { report, error }),
        None => {
            match fs::remove_file(recording.path()) {
                Ok(()) => report.source_removed = true,
                Err(e) => tracing::warn!(
                    "Could not remove {}: {}",
                    recording.path().display(),
                    e
                ),
            }
            tracing::info!("Split recording into {} takes", report.takes.len());
            Ok(SplitOutcome::Complete(report))
        }
    }
}

fn write_take<R: Read>(
    reader: &mut WavReader<R>,
    path: &Path,
    spec: WavSpec,
    length: usize,
    block_size: usize,
) -> Result<()> {
    let mut writer = WavWriter::create(path, spec)?;
    let copied = copy_samples(reader, &mut writer, length, block_size)?;
    writer.finalize()?;
    if copied < length {
        return Err(Error::IncompleteLoop {
            loop_index: 0,
            available: copied,
            required: length,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BitDepth;

    fn write_source(path: &Path, samples: &[i16]) {
        let mut writer = WavWriter::create(path, BitDepth::Int16.mono_spec(1000)).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn read_i16(path: &Path) -> Vec<i16> {
        hound::WavReader::open(path)
            .unwrap()
            .samples::<i16>()
            .map(|s| s.unwrap())
            .collect()
    }

    #[test]
    fn test_split_numbers_from_first_index() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("full_1.wav");
        let samples: Vec<i16> = (0..12).collect();
        write_source(&source, &samples);

        let rec = ContinuousRecording::new(vec![0.0; 12], 4, 1000, BitDepth::Int16, &source);
        let outcome = split_recording(&rec, dir.path(), 5, 3).unwrap();

        assert!(outcome.is_complete());
        let report = outcome.report();
        assert_eq!(report.takes.len(), 3);
        assert_eq!(report.next_index(5), 8);
        assert!(report.source_removed);
        assert!(!source.exists());

        assert_eq!(read_i16(&dir.path().join("take_5.wav")), vec![0, 1, 2, 3]);
        assert_eq!(read_i16(&dir.path().join("take_6.wav")), vec![4, 5, 6, 7]);
        assert_eq!(read_i16(&dir.path().join("take_7.wav")), vec![8, 9, 10, 11]);
    }

    #[test]
    fn test_incomplete_loop_keeps_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("full_1.wav");
        // File lost samples relative to memory.
        write_source(&source, &[1; 6]);

        let rec = ContinuousRecording::new(vec![0.0; 12], 4, 1000, BitDepth::Int16, &source);
        let outcome = split_recording(&rec, dir.path(), 1, 4096).unwrap();

        match outcome {
            SplitOutcome::Partial { report, error } => {
                assert_eq!(report.takes.len(), 1);
                assert_eq!(report.skipped_loops, 2);
                assert!(!report.source_removed);
                assert!(matches!(error, Error::IncompleteLoop { loop_index: 1, .. }));
            }
            SplitOutcome::Complete(_) => panic!("expected partial outcome"),
        }
        assert!(source.exists());
        assert!(!dir.path().join("take_2.wav").exists());
    }

    #[test]
    fn test_missing_source_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let rec = ContinuousRecording::new(
            vec![0.0; 8],
            4,
            1000,
            BitDepth::Int16,
            dir.path().join("nope.wav"),
        );
        assert!(split_recording(&rec, dir.path(), 1, 4096).is_err());
    }
}
