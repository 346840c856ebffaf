//! A comping session: one project directory, one loop, one take set.

use crate::builder::SessionBuilder;
use crate::{Error, Result};
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use vocomp_analysis::{BoundarySet, SegmentationConfig, Segmenter, Tempo};
use vocomp_capture::{
    finalize_recording, parse_recording_index, parse_take_index, read_mono, recording_file_name,
    CaptureAccumulator, CaptureConfig, CaptureRequest, ContinuousRecording, DiskWriter, Finalized,
    MonoAudio, TakeSet,
};
use vocomp_export::{assemble_comp, write_comp, CompArtifact, CompMap, CompOptions, CompResult};

/// Audio to segment against.
#[derive(Debug, Clone)]
pub enum Reference {
    /// A take from the session's take set.
    Take(u32),
    /// Any WAV file, e.g. the instrumental.
    File(PathBuf),
    /// Mono samples already in memory.
    Samples { samples: Vec<f32>, sample_rate: u32 },
}

/// Per-session index counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionCounters {
    pub next_take_index: u32,
    pub next_recording_index: u32,
}

struct ActiveRecording {
    writer: DiskWriter,
    path: PathBuf,
}

/// Owns the capture accumulator, the take directory, and the session's
/// numbering. Batch operations (finalize, import, segment, comp) are plain
/// methods that run one at a time per session, whichever thread calls them;
/// [`BatchWorker`](crate::BatchWorker) runs them off the caller's thread.
pub struct CompSession {
    project_dir: PathBuf,
    sample_rate: u32,
    loop_length_samples: usize,
    capture_config: CaptureConfig,
    segmenter: Segmenter,
    accumulator: Arc<CaptureAccumulator>,
    active: Mutex<Option<ActiveRecording>>,
    counters: Mutex<SessionCounters>,
    /// Held for the whole of every operation touching the take directory.
    batch: Mutex<()>,
}

impl CompSession {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    pub(crate) fn open(
        project_dir: PathBuf,
        sample_rate: u32,
        loop_length_samples: usize,
        capture_config: CaptureConfig,
        segmentation: SegmentationConfig,
    ) -> Result<Self> {
        let segmenter = Segmenter::new(segmentation)?;
        fs::create_dir_all(&project_dir)?;

        let counters = SessionCounters {
            next_take_index: next_free_index(&project_dir, parse_take_index)?,
            next_recording_index: next_free_index(&project_dir, parse_recording_index)?,
        };
        tracing::info!(
            "Opened session {} ({} Hz, loop {} samples, next take {})",
            project_dir.display(),
            sample_rate,
            loop_length_samples,
            counters.next_take_index
        );

        Ok(Self {
            project_dir,
            sample_rate,
            loop_length_samples,
            accumulator: Arc::new(CaptureAccumulator::new(capture_config)),
            capture_config,
            segmenter,
            active: Mutex::new(None),
            counters: Mutex::new(counters),
            batch: Mutex::new(()),
        })
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn loop_length_samples(&self) -> usize {
        self.loop_length_samples
    }

    pub fn loop_seconds(&self) -> f64 {
        self.loop_length_samples as f64 / self.sample_rate as f64
    }

    pub fn capture_config(&self) -> &CaptureConfig {
        &self.capture_config
    }

    pub fn counters(&self) -> SessionCounters {
        *self.counters.lock()
    }

    /// Accumulator to feed from the audio callback.
    pub fn accumulator(&self) -> Arc<CaptureAccumulator> {
        Arc::clone(&self.accumulator)
    }

    pub fn is_recording(&self) -> bool {
        self.accumulator.is_recording()
    }

    /// Start a continuous recording persisted as the next `full_<N>.wav`.
    pub fn start_recording(&self) -> Result<PathBuf> {
        let mut active = self.active.lock();
        if active.is_some() {
            return Err(Error::Session("already recording".into()));
        }

        let index = self.counters.lock().next_recording_index;
        let path = self.project_dir.join(recording_file_name(index));
        let (writer, tap) = DiskWriter::spawn(
            &path,
            self.sample_rate,
            self.capture_config.bit_depth,
            self.capture_config.ring_samples(self.sample_rate),
        )?;

        let started = self.accumulator.start(CaptureRequest {
            sample_rate: self.sample_rate,
            loop_length_samples: self.loop_length_samples,
            tap: Some(tap),
        });
        if let Err(e) = started {
            drop(writer);
            let _ = fs::remove_file(&path);
            return Err(e.into());
        }

        self.counters.lock().next_recording_index = index + 1;
        *active = Some(ActiveRecording {
            writer,
            path: path.clone(),
        });
        Ok(path)
    }

    /// Stop recording and flush the continuous file.
    ///
    /// Returns `None` when nothing was recording.
    pub fn stop_recording(&self) -> Result<Option<ContinuousRecording>> {
        let Some(active) = self.active.lock().take() else {
            return Ok(None);
        };

        let audio = self.accumulator.stop();
        let written = active.writer.finish()?;

        let Some(audio) = audio else {
            return Ok(None);
        };
        if written != audio.samples.len() {
            tracing::warn!(
                "{} holds {} of {} captured samples, finalize rewrites it from memory",
                active.path.display(),
                written,
                audio.samples.len()
            );
        }

        Ok(Some(ContinuousRecording::from_captured(
            audio,
            self.capture_config.bit_depth,
            active.path,
        )))
    }

    /// Pad the recording to whole loops and split it into new takes.
    pub fn finalize(&self, mut recording: ContinuousRecording) -> Result<Finalized> {
        if recording.loop_length_samples() != self.loop_length_samples {
            return Err(Error::Session(format!(
                "recording loop length {} does not match session loop {}",
                recording.loop_length_samples(),
                self.loop_length_samples
            )));
        }
        if recording.sample_rate() != self.sample_rate {
            return Err(Error::Session(format!(
                "recording rate {} Hz does not match session rate {} Hz",
                recording.sample_rate(),
                self.sample_rate
            )));
        }

        let _batch = self.batch.lock();
        let existing = self.scan_takes()?;
        if let Some(len) = existing.take_len() {
            self.check_take_shape("existing takes", len, existing.sample_rate())?;
        }

        let mut counters = self.counters.lock();
        let first = counters.next_take_index;
        let finalized = finalize_recording(
            &mut recording,
            &self.project_dir,
            first,
            self.capture_config.block_size,
        )?;
        counters.next_take_index = finalized.next_take_index(first);

        if let vocomp_capture::SplitOutcome::Partial { error, .. } = &finalized.split {
            tracing::warn!("Recording only partially split: {}", error);
        }
        Ok(finalized)
    }

    /// Current take set. Fails if the takes are inconsistent.
    pub fn takes(&self) -> Result<TakeSet> {
        let _batch = self.batch.lock();
        self.scan_takes()
    }

    fn scan_takes(&self) -> Result<TakeSet> {
        Ok(TakeSet::scan(&self.project_dir)?)
    }

    /// Takes must be one loop long at the session rate.
    fn check_take_shape(&self, what: &str, len: usize, sample_rate: Option<u32>) -> Result<()> {
        if len != self.loop_length_samples || sample_rate != Some(self.sample_rate) {
            return Err(Error::Session(format!(
                "{} are {} samples @ {:?} Hz, session loop is {} samples @ {} Hz",
                what, len, sample_rate, self.loop_length_samples, self.sample_rate
            )));
        }
        Ok(())
    }

    /// Replace the take set with copies of `sources`.
    ///
    /// Every source must be one loop long at the session rate; otherwise the
    /// existing take set is left untouched.
    pub fn import_takes<P: AsRef<Path>>(&self, sources: &[P]) -> Result<TakeSet> {
        if self.is_recording() {
            return Err(Error::Session("cannot import while recording".into()));
        }
        let _batch = self.batch.lock();
        for take in TakeSet::inspect_sources(sources)? {
            self.check_take_shape(
                &format!("imported takes ({})", take.path.display()),
                take.len_samples,
                Some(take.sample_rate),
            )?;
        }

        let set = TakeSet::import(&self.project_dir, sources)?;
        self.counters.lock().next_take_index = set.next_index();
        Ok(set)
    }

    /// Remove every take so the next recording starts at take 1.
    pub fn clear_takes(&self) -> Result<usize> {
        let _batch = self.batch.lock();
        let removed = TakeSet::clear(&self.project_dir)?;
        self.counters.lock().next_take_index = 1;
        Ok(removed)
    }

    /// Compute the boundary set from a reference.
    ///
    /// An unreadable reference yields a single segment spanning the loop;
    /// an inconsistent take set is still an error.
    pub fn segment(&self, reference: &Reference, tempo: Option<Tempo>) -> Result<BoundarySet> {
        let _batch = self.batch.lock();
        let audio = match reference {
            Reference::Take(index) => self.scan_takes()?.read(*index),
            Reference::File(path) => read_mono(path),
            Reference::Samples {
                samples,
                sample_rate,
            } => Ok(MonoAudio {
                samples: samples.clone(),
                sample_rate: *sample_rate,
            }),
        };

        match audio {
            Ok(audio) => Ok(self
                .segmenter
                .segment(&audio.samples, audio.sample_rate, tempo)),
            Err(e) => {
                tracing::warn!("Reference unreadable ({}), using one segment", e);
                Ok(BoundarySet::whole(self.loop_seconds()))
            }
        }
    }

    /// Assemble a comp from per-segment winners over the current take set.
    pub fn comp(
        &self,
        boundaries: &BoundarySet,
        winners: &[Option<u32>],
        options: &CompOptions,
    ) -> Result<CompResult> {
        let _batch = self.batch.lock();
        self.assemble(boundaries, winners, options)
    }

    /// Assemble a comp from a compmap that must match `boundaries`.
    pub fn comp_from_map(
        &self,
        boundaries: &BoundarySet,
        map: &CompMap,
        options: &CompOptions,
    ) -> Result<CompResult> {
        map.validate_against(boundaries)?;
        let _batch = self.batch.lock();
        self.assemble(boundaries, &map.winners(), options)
    }

    fn assemble(
        &self,
        boundaries: &BoundarySet,
        winners: &[Option<u32>],
        options: &CompOptions,
    ) -> Result<CompResult> {
        let takes = self.scan_takes()?;
        Ok(assemble_comp(boundaries, winners, &takes, options)?)
    }

    /// Write a comp as the next `comp_<N>.wav` with its JSON report.
    pub fn write_comp(&self, result: &CompResult) -> Result<CompArtifact> {
        let _batch = self.batch.lock();
        Ok(write_comp(
            &self.project_dir,
            result,
            self.capture_config.bit_depth,
        )?)
    }
}

impl Drop for CompSession {
    fn drop(&mut self) {
        if let Some(active) = self.active.get_mut().take() {
            self.accumulator.stop();
            if let Err(e) = active.writer.finish() {
                tracing::error!("Failed to flush {}: {}", active.path.display(), e);
            }
        }
    }
}

/// One past the highest index among files in `dir` matched by `parse`.
fn next_free_index(dir: &Path, parse: fn(&str) -> Option<u32>) -> Result<u32> {
    let mut highest = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if let Some(index) = entry.file_name().to_str().and_then(parse) {
            highest = highest.max(index);
        }
    }
    Ok(highest + 1)
}
