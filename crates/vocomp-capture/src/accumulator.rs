//! Loop-synchronized capture buffer.
//!
//! The audio callback appends downmixed input into one continuous mono buffer.
//! UI threads read counters and take spans without locking, and copy bounded
//! sample ranges under a short critical section shared with the callback.

use crate::config::CaptureConfig;
use crate::error::{Error, Result};
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use ringbuf::{traits::Producer, HeapProd};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Upper bound on samples copied by one [`CaptureAccumulator::read_range`].
pub const MAX_READ_SAMPLES: usize = 16384;

/// Position of one loop repetition inside the continuous buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TakeSpan {
    /// Zero-based loop repetition.
    pub loop_index: usize,
    pub start_sample: usize,
    pub length: usize,
    /// False for the in-progress loop.
    pub complete: bool,
}

/// Parameters for a new capture run.
pub struct CaptureRequest {
    pub sample_rate: u32,
    pub loop_length_samples: usize,
    /// Ring producer feeding the disk writer, if the run is persisted.
    pub tap: Option<HeapProd<f32>>,
}

/// Audio held by a stopped capture run.
#[derive(Debug, Clone)]
pub struct CapturedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub loop_length_samples: usize,
    /// Samples the disk writer ring could not accept.
    pub dropped_samples: u64,
}

/// Point-in-time view for UI polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSnapshot {
    pub recording: bool,
    pub total_samples: usize,
    pub loop_length_samples: usize,
    pub dropped_samples: u64,
    pub spans: Vec<TakeSpan>,
}

struct CaptureState {
    buffer: Vec<f32>,
    write_pos: usize,
    loop_length: usize,
    sample_rate: u32,
    tap: Option<HeapProd<f32>>,
    completed_loops: usize,
}

impl CaptureState {
    fn idle() -> Self {
        Self {
            buffer: Vec::new(),
            write_pos: 0,
            loop_length: 0,
            sample_rate: 0,
            tap: None,
            completed_loops: 0,
        }
    }
}

/// Continuous mono capture buffer shared between the audio callback and UI.
pub struct CaptureAccumulator {
    state: Mutex<CaptureState>,
    recording: AtomicBool,
    total_samples: AtomicUsize,
    loop_length: AtomicUsize,
    completed_spans: ArcSwap<Vec<TakeSpan>>,
    dropped_samples: AtomicU64,
    config: CaptureConfig,
}

impl CaptureAccumulator {
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            state: Mutex::new(CaptureState::idle()),
            recording: AtomicBool::new(false),
            total_samples: AtomicUsize::new(0),
            loop_length: AtomicUsize::new(0),
            completed_spans: ArcSwap::from_pointee(Vec::new()),
            dropped_samples: AtomicU64::new(0),
            config,
        }
    }

    /// Begin a capture run, discarding whatever the previous run held.
    pub fn start(&self, request: CaptureRequest) -> Result<()> {
        if request.loop_length_samples == 0 {
            return Err(Error::Recording("loop length must be non-zero".into()));
        }
        if request.sample_rate == 0 {
            return Err(Error::Recording("sample rate must be non-zero".into()));
        }

        let capacity = self
            .config
            .capacity_samples(request.sample_rate)
            .max(request.loop_length_samples);

        let mut state = self.state.lock();
        if self.recording.load(Ordering::Acquire) {
            return Err(Error::Recording("capture already running".into()));
        }

        *state = CaptureState {
            buffer: vec![0.0; capacity],
            write_pos: 0,
            loop_length: request.loop_length_samples,
            sample_rate: request.sample_rate,
            tap: request.tap,
            completed_loops: 0,
        };
        self.total_samples.store(0, Ordering::Release);
        self.loop_length
            .store(request.loop_length_samples, Ordering::Release);
        self.dropped_samples.store(0, Ordering::Release);
        self.completed_spans.store(Arc::new(Vec::new()));
        self.recording.store(true, Ordering::Release);

        tracing::info!(
            "Capture started: loop {} samples @ {} Hz, capacity {} samples",
            request.loop_length_samples,
            request.sample_rate,
            capacity
        );
        Ok(())
    }

    /// Append one callback's worth of interleaved input.
    ///
    /// Channels are averaged to mono. Returns the number of mono samples
    /// written, zero when not recording.
    pub fn append(&self, interleaved: &[f32], channels: usize) -> usize {
        if channels == 0 || !self.recording.load(Ordering::Acquire) {
            return 0;
        }

        let frames = interleaved.len() / channels;
        if frames == 0 {
            return 0;
        }

        let mut state = self.state.lock();
        // stop() may have run between the flag check and the lock.
        if !self.recording.load(Ordering::Acquire) {
            return 0;
        }
        let start = state.write_pos;
        let end = start + frames;

        if end > state.buffer.len() {
            let growth = self.config.growth_samples(state.sample_rate).max(frames);
            let new_len = state.buffer.len() + growth;
            state.buffer.resize(new_len, 0.0);
            tracing::debug!("Capture buffer grown to {} samples", new_len);
        }

        let scale = 1.0 / channels as f32;
        for (dst, frame) in state.buffer[start..end]
            .iter_mut()
            .zip(interleaved.chunks_exact(channels))
        {
            *dst = frame.iter().sum::<f32>() * scale;
        }
        state.write_pos = end;

        let CaptureState { buffer, tap, .. } = &mut *state;
        if let Some(tap) = tap.as_mut() {
            let pushed = tap.push_slice(&buffer[start..end]);
            if pushed < frames {
                self.dropped_samples
                    .fetch_add((frames - pushed) as u64, Ordering::Relaxed);
            }
        }

        let loops_now = end / state.loop_length;
        if loops_now > state.completed_loops {
            let loop_length = state.loop_length;
            let mut spans = Vec::clone(&self.completed_spans.load());
            spans.extend((state.completed_loops..loops_now).map(|loop_index| TakeSpan {
                loop_index,
                start_sample: loop_index * loop_length,
                length: loop_length,
                complete: true,
            }));
            state.completed_loops = loops_now;
            self.completed_spans.store(Arc::new(spans));
        }

        self.total_samples.store(end, Ordering::Release);
        frames
    }

    /// Stop the current run and hand over its audio.
    ///
    /// Calling this while not recording does nothing and returns `None`.
    pub fn stop(&self) -> Option<CapturedAudio> {
        let mut state = self.state.lock();
        if !self.recording.swap(false, Ordering::AcqRel) {
            return None;
        }

        let mut samples = std::mem::take(&mut state.buffer);
        samples.truncate(state.write_pos);
        state.write_pos = 0;
        state.tap = None;

        let dropped = self.dropped_samples.load(Ordering::Acquire);
        if dropped > 0 {
            tracing::warn!("Disk writer ring dropped {} samples", dropped);
        }
        tracing::info!(
            "Capture stopped after {} samples ({} complete loops)",
            samples.len(),
            state.completed_loops
        );

        Some(CapturedAudio {
            samples,
            sample_rate: state.sample_rate,
            loop_length_samples: state.loop_length,
            dropped_samples: dropped,
        })
    }

    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::Acquire)
    }

    /// Samples written so far in the current (or last) run.
    pub fn total_samples(&self) -> usize {
        self.total_samples.load(Ordering::Acquire)
    }

    /// Number of samples the disk writer ring rejected.
    pub fn dropped_samples(&self) -> u64 {
        self.dropped_samples.load(Ordering::Relaxed)
    }

    /// Counters and spans without touching the capture lock.
    pub fn snapshot(&self) -> CaptureSnapshot {
        CaptureSnapshot {
            recording: self.is_recording(),
            total_samples: self.total_samples(),
            loop_length_samples: self.loop_length.load(Ordering::Acquire),
            dropped_samples: self.dropped_samples(),
            spans: self.take_spans(),
        }
    }

    /// Completed loop spans plus the in-progress loop, if it has any samples.
    pub fn take_spans(&self) -> Vec<TakeSpan> {
        let mut spans = Vec::clone(&self.completed_spans.load());
        let loop_length = self.loop_length.load(Ordering::Acquire);
        let total = self.total_samples();

        if loop_length > 0 && self.is_recording() {
            let start = spans.len() * loop_length;
            if total > start {
                spans.push(TakeSpan {
                    loop_index: spans.len(),
                    start_sample: start,
                    length: total - start,
                    complete: false,
                });
            }
        }
        spans
    }

    /// Copy up to `len` samples starting at `start` into `out`.
    ///
    /// At most [`MAX_READ_SAMPLES`] are copied per call so the callback is
    /// never held up for long; read larger ranges in chunks. Returns the
    /// number of samples copied.
    pub fn read_range(&self, start: usize, len: usize, out: &mut Vec<f32>) -> usize {
        out.clear();
        let len = len.min(MAX_READ_SAMPLES);
        let state = self.state.lock();
        if start >= state.write_pos {
            return 0;
        }
        let end = state.write_pos.min(start.saturating_add(len));
        out.extend_from_slice(&state.buffer[start..end]);
        end - start
    }
}

impl Default for CaptureAccumulator {
    fn default() -> Self {
        Self::new(CaptureConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringbuf::{
        traits::{Consumer, Observer, Split},
        HeapRb,
    };

    fn small_config() -> CaptureConfig {
        CaptureConfig {
            max_recording_seconds: 1.0,
            growth_seconds: 1.0,
            block_size: 4,
            ..Default::default()
        }
    }

    fn request(loop_len: usize) -> CaptureRequest {
        CaptureRequest {
            sample_rate: 10,
            loop_length_samples: loop_len,
            tap: None,
        }
    }

    #[test]
    fn test_append_downmixes_by_averaging() {
        let acc = CaptureAccumulator::new(small_config());
        acc.start(request(4)).unwrap();

        let written = acc.append(&[1.0, 0.0, 0.5, 0.5, -1.0, 1.0], 2);
        assert_eq!(written, 3);
        assert_eq!(acc.total_samples(), 3);

        let mut out = Vec::new();
        assert_eq!(acc.read_range(0, 16, &mut out), 3);
        assert_eq!(out, vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_not_recording_ignores_input() {
        let acc = CaptureAccumulator::new(small_config());
        assert_eq!(acc.append(&[1.0; 8], 1), 0);
        assert!(acc.stop().is_none());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let acc = CaptureAccumulator::new(small_config());
        acc.start(request(4)).unwrap();
        acc.append(&[0.25; 6], 1);

        let audio = acc.stop().unwrap();
        assert_eq!(audio.samples, vec![0.25; 6]);
        assert_eq!(audio.loop_length_samples, 4);
        assert!(acc.stop().is_none());
        assert!(!acc.is_recording());
    }

    #[test]
    fn test_reads_after_stop_see_nothing() {
        let acc = CaptureAccumulator::new(small_config());
        acc.start(request(4)).unwrap();
        acc.append(&[0.25; 6], 1);
        acc.stop().unwrap();

        let mut out = Vec::new();
        assert_eq!(acc.read_range(0, 4, &mut out), 0);
        assert!(out.is_empty());
        assert_eq!(acc.append(&[0.25; 4], 1), 0);
    }

    #[test]
    fn test_append_racing_stop() {
        let acc = Arc::new(CaptureAccumulator::new(small_config()));
        let feeder = {
            let acc = Arc::clone(&acc);
            std::thread::spawn(move || {
                for _ in 0..20_000 {
                    acc.append(&[0.1; 3], 1);
                }
            })
        };
        for _ in 0..2_000 {
            let _ = acc.start(request(4));
            acc.stop();
        }
        feeder.join().unwrap();
    }

    #[test]
    fn test_read_range_is_bounded() {
        let acc = CaptureAccumulator::new(small_config());
        acc.start(CaptureRequest {
            sample_rate: 48000,
            loop_length_samples: 48000,
            tap: None,
        })
        .unwrap();
        acc.append(&vec![0.5; MAX_READ_SAMPLES + 1000], 1);

        let mut out = Vec::new();
        assert_eq!(acc.read_range(0, usize::MAX, &mut out), MAX_READ_SAMPLES);
        assert_eq!(out.len(), MAX_READ_SAMPLES);
        assert_eq!(acc.read_range(MAX_READ_SAMPLES, usize::MAX, &mut out), 1000);
    }

    #[test]
    fn test_double_start_rejected() {
        let acc = CaptureAccumulator::new(small_config());
        acc.start(request(4)).unwrap();
        assert!(acc.start(request(4)).is_err());
    }

    #[test]
    fn test_buffer_grows_and_preserves_contents() {
        // capacity 10 samples, growth 10 samples
        let acc = CaptureAccumulator::new(small_config());
        acc.start(request(5)).unwrap();

        let input: Vec<f32> = (0..25).map(|i| i as f32).collect();
        for chunk in input.chunks(7) {
            acc.append(chunk, 1);
        }

        let audio = acc.stop().unwrap();
        assert_eq!(audio.samples, input);
    }

    #[test]
    fn test_take_spans_track_loop_crossings() {
        let acc = CaptureAccumulator::new(small_config());
        acc.start(request(4)).unwrap();

        acc.append(&[0.0; 3], 1);
        let spans = acc.take_spans();
        assert_eq!(spans.len(), 1);
        assert!(!spans[0].complete);
        assert_eq!(spans[0].length, 3);

        acc.append(&[0.0; 6], 1);
        let spans = acc.take_spans();
        assert_eq!(spans.len(), 3);
        assert!(spans[0].complete && spans[1].complete);
        assert_eq!(spans[1].start_sample, 4);
        assert_eq!(
            spans[2],
            TakeSpan {
                loop_index: 2,
                start_sample: 8,
                length: 1,
                complete: false,
            }
        );

        let snapshot = acc.snapshot();
        assert!(snapshot.recording);
        assert_eq!(snapshot.total_samples, 9);
        assert_eq!(snapshot.loop_length_samples, 4);
        assert_eq!(snapshot.spans, spans);
    }

    #[test]
    fn test_tap_receives_mono_and_counts_overruns() {
        let (prod, mut cons) = HeapRb::<f32>::new(4).split();
        let acc = CaptureAccumulator::new(small_config());
        acc.start(CaptureRequest {
            sample_rate: 10,
            loop_length_samples: 4,
            tap: Some(prod),
        })
        .unwrap();

        acc.append(&[0.5; 6], 1);
        assert_eq!(cons.occupied_len(), 4);
        assert_eq!(acc.dropped_samples(), 2);

        let mut drained = [0.0f32; 4];
        assert_eq!(cons.pop_slice(&mut drained), 4);
        assert_eq!(drained, [0.5; 4]);
    }
}
