//! Background batch worker.
//!
//! Padding, splitting, segmentation, and comp assembly run one at a time on a
//! single thread per session. Results come back as [`BatchEvent`]s.

use crate::session::{CompSession, Reference};
use crate::{Error, Result};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use vocomp_analysis::{BoundarySet, Tempo};
use vocomp_capture::{ContinuousRecording, Finalized};
use vocomp_export::{CompArtifact, CompOptions, CompResult};

const JOB_QUEUE_CAPACITY: usize = 16;

/// Work submitted to the batch worker.
pub enum BatchJob {
    /// Pad and split a stopped recording.
    Finalize(ContinuousRecording),
    Segment {
        reference: Reference,
        tempo: Option<Tempo>,
    },
    Comp {
        boundaries: BoundarySet,
        winners: Vec<Option<u32>>,
        options: CompOptions,
        /// Also write `comp_<N>.wav` and its report.
        write: bool,
    },
    Shutdown,
}

/// A finished comp and, if requested, where it was written.
#[derive(Debug)]
pub struct CompOutput {
    pub result: CompResult,
    pub artifact: Option<CompArtifact>,
}

/// Completion of one job.
#[derive(Debug)]
pub enum BatchEvent {
    Finalized(Result<Finalized>),
    Segmented(Result<BoundarySet>),
    Comped(Result<CompOutput>),
}

/// Single background thread running a session's batch jobs in order.
pub struct BatchWorker {
    job_tx: Sender<BatchJob>,
    event_rx: Receiver<BatchEvent>,
    thread_handle: Option<JoinHandle<()>>,
}

impl BatchWorker {
    pub fn spawn(session: Arc<CompSession>) -> Result<Self> {
        let (job_tx, job_rx) = bounded(JOB_QUEUE_CAPACITY);
        let (event_tx, event_rx) = unbounded();

        let handle = thread::Builder::new()
            .name("vocomp-batch".into())
            .spawn(move || worker_loop(session, job_rx, event_tx))?;

        Ok(Self {
            job_tx,
            event_rx,
            thread_handle: Some(handle),
        })
    }

    /// Queue a job. Blocks while the queue is full.
    pub fn submit(&self, job: BatchJob) -> Result<()> {
        if self.thread_handle.is_none() {
            return Err(Error::WorkerStopped);
        }
        self.job_tx.send(job).map_err(|_| Error::WorkerStopped)
    }

    /// Completion events, in job order.
    pub fn events(&self) -> &Receiver<BatchEvent> {
        &self.event_rx
    }

    /// Finish queued jobs and join the thread.
    pub fn stop(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            let _ = self.job_tx.send(BatchJob::Shutdown);
            let _ = handle.join();
        }
    }
}

impl Drop for BatchWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop(session: Arc<CompSession>, jobs: Receiver<BatchJob>, events: Sender<BatchEvent>) {
    for job in jobs.iter() {
        let event = match job {
            BatchJob::Shutdown => break,
            BatchJob::Finalize(recording) => BatchEvent::Finalized(session.finalize(recording)),
            BatchJob::Segment { reference, tempo } => {
                BatchEvent::Segmented(session.segment(&reference, tempo))
            }
            BatchJob::Comp {
                boundaries,
                winners,
                options,
                write,
            } => BatchEvent::Comped(run_comp(&session, &boundaries, &winners, &options, write)),
        };

        if events.send(event).is_err() {
            tracing::debug!("Batch event receiver dropped");
        }
    }
    tracing::debug!("Batch worker exiting");
}

fn run_comp(
    session: &CompSession,
    boundaries: &BoundarySet,
    winners: &[Option<u32>],
    options: &CompOptions,
    write: bool,
) -> Result<CompOutput> {
    let result = session.comp(boundaries, winners, options)?;
    let artifact = if write {
        Some(session.write_comp(&result)?)
    } else {
        None
    };
    Ok(CompOutput { result, artifact })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_jobs_complete_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let session = Arc::new(
            CompSession::builder()
                .project_dir(dir.path())
                .sample_rate(1000)
                .loop_samples(500)
                .build()
                .unwrap(),
        );
        let worker = BatchWorker::spawn(Arc::clone(&session)).unwrap();

        worker
            .submit(BatchJob::Segment {
                reference: Reference::Samples {
                    samples: vec![0.0; 500],
                    sample_rate: 1000,
                },
                tempo: None,
            })
            .unwrap();
        worker
            .submit(BatchJob::Comp {
                boundaries: BoundarySet::whole(0.5),
                winners: vec![Some(1)],
                options: CompOptions::default(),
                write: false,
            })
            .unwrap();

        let timeout = Duration::from_secs(5);
        match worker.events().recv_timeout(timeout).unwrap() {
            BatchEvent::Segmented(Ok(boundaries)) => assert_eq!(boundaries.segment_count(), 1),
            other => panic!("unexpected event {other:?}"),
        }
        // No takes recorded yet.
        match worker.events().recv_timeout(timeout).unwrap() {
            BatchEvent::Comped(Err(_)) => {}
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_submit_after_stop_fails() {
        let dir = tempfile::tempdir().unwrap();
        let session = Arc::new(
            CompSession::builder()
                .project_dir(dir.path())
                .loop_samples(100)
                .build()
                .unwrap(),
        );
        let mut worker = BatchWorker::spawn(session).unwrap();
        worker.stop();
        assert!(matches!(
            worker.submit(BatchJob::Shutdown),
            Err(Error::WorkerStopped)
        ));
    }
}
