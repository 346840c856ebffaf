//! Disk writer thread for the continuous recording.
//!
//! The audio callback pushes mono samples into a SPSC ring; this thread
//! drains the ring into a WAV file so the callback never touches the disk.

use crate::config::BitDepth;
use crate::error::{Error, Result};
use crate::wav::write_mono_samples;
use hound::WavWriter;
use ringbuf::{
    traits::{Consumer, Observer, Split},
    HeapCons, HeapProd, HeapRb,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

const DRAIN_CHUNK: usize = 4096;

/// Background writer persisting one continuous recording.
pub struct DiskWriter {
    path: PathBuf,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<Result<usize>>>,
}

impl DiskWriter {
    /// Create the file and spawn the writer thread.
    ///
    /// Returns the writer and the ring producer to hand to the capture
    /// accumulator.
    pub fn spawn(
        path: impl Into<PathBuf>,
        sample_rate: u32,
        bit_depth: BitDepth,
        ring_samples: usize,
    ) -> Result<(Self, HeapProd<f32>)> {
        let path = path.into();
        let writer = WavWriter::new(
            BufWriter::new(File::create(&path)?),
            bit_depth.mono_spec(sample_rate),
        )?;

        let (producer, consumer) = HeapRb::<f32>::new(ring_samples.max(1)).split();
        let running = Arc::new(AtomicBool::new(true));
        let thread_running = Arc::clone(&running);

        let handle = thread::Builder::new()
            .name("vocomp-disk-writer".into())
            .spawn(move || writer_loop(consumer, writer, bit_depth, thread_running))?;

        tracing::debug!("Disk writer started for {}", path.display());

        Ok((
            Self {
                path,
                running,
                handle: Some(handle),
            },
            producer,
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drain the ring, finalize the file, and return the samples written.
    pub fn finish(mut self) -> Result<usize> {
        self.running.store(false, Ordering::Release);
        let handle = self
            .handle
            .take()
            .ok_or_else(|| Error::Writer("writer already finished".into()))?;
        let written = handle
            .join()
            .map_err(|_| Error::Writer("writer thread panicked".into()))??;
        tracing::debug!("Disk writer wrote {} samples to {}", written, self.path.display());
        Ok(written)
    }
}

impl Drop for DiskWriter {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn writer_loop(
    mut consumer: HeapCons<f32>,
    mut writer: WavWriter<BufWriter<File>>,
    bit_depth: BitDepth,
    running: Arc<AtomicBool>,
) -> Result<usize> {
    let mut drain_buf = vec![0.0f32; DRAIN_CHUNK];
    let mut written = 0usize;

    loop {
        // Read the flag before draining so samples pushed before stop are kept.
        let keep_running = running.load(Ordering::Acquire);
        let available = consumer.occupied_len();

        if available == 0 {
            if !keep_running {
                break;
            }
            thread::sleep(Duration::from_millis(5));
            continue;
        }

        let to_read = available.min(drain_buf.len());
        let read = consumer.pop_slice(&mut drain_buf[..to_read]);
        write_mono_samples(&mut writer, &drain_buf[..read], bit_depth)?;
        written += read;
    }

    writer.finalize()?;
    Ok(written)
}
