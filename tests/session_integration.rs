//! End-to-end session tests: record, finalize, segment, and comp through the
//! batch worker.

mod helpers;

use helpers::*;
use std::time::Duration;
use vocomp::prelude::*;

const SR: u32 = 1000;
const LOOP: usize = 800;
const EVENT_TIMEOUT: Duration = Duration::from_secs(10);

fn open_session(dir: &std::path::Path) -> Arc<CompSession> {
    Arc::new(
        CompSession::builder()
            .project_dir(dir)
            .sample_rate(SR)
            .loop_samples(LOOP)
            .build()
            .expect("Failed to create test session"),
    )
}

/// Record `samples` as one pass, feeding the accumulator in callback-sized blocks.
fn record_pass(session: &CompSession, samples: &[f32]) -> ContinuousRecording {
    session.start_recording().unwrap();
    let accumulator = session.accumulator();
    for block in samples.chunks(64) {
        accumulator.append(block, 1);
    }
    session.stop_recording().unwrap().unwrap()
}

fn expect_finalized(worker: &BatchWorker) -> vocomp::capture::Finalized {
    match worker.events().recv_timeout(EVENT_TIMEOUT).unwrap() {
        BatchEvent::Finalized(result) => result.unwrap(),
        other => panic!("expected Finalized, got {other:?}"),
    }
}

#[test]
fn test_two_passes_then_comp() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let session = open_session(dir.path());
    let worker = BatchWorker::spawn(Arc::clone(&session)).unwrap();

    // Pass 1: 2.5 loops of noise, pass 2: exactly one loop.
    let pass_1 = generate_noise(LOOP * 5 / 2, 0.5, 11);
    let recording = record_pass(&session, &pass_1);
    worker.submit(BatchJob::Finalize(recording)).unwrap();
    let finalized = expect_finalized(&worker);
    assert_eq!(finalized.pad.num_loops, 3);
    assert!(finalized.split.is_complete());

    let pass_2 = generate_noise(LOOP, 0.5, 12);
    let recording = record_pass(&session, &pass_2);
    worker.submit(BatchJob::Finalize(recording)).unwrap();
    let finalized = expect_finalized(&worker);
    assert_eq!(finalized.split.report().takes[0].index, 4);

    let takes = session.takes().unwrap();
    assert_eq!(takes.indices(), vec![1, 2, 3, 4]);
    assert_eq!(takes.take_len(), Some(LOOP));

    let boundaries = BoundarySet::new(vec![0.4], 0.8).unwrap();
    worker
        .submit(BatchJob::Comp {
            boundaries: boundaries.clone(),
            winners: vec![Some(4), Some(2)],
            options: CompOptions::with_crossfade(CrossfadeSettings::from_millis(50.0)),
            write: true,
        })
        .unwrap();

    let output = match worker.events().recv_timeout(EVENT_TIMEOUT).unwrap() {
        BatchEvent::Comped(result) => result.unwrap(),
        other => panic!("expected Comped, got {other:?}"),
    };
    assert_eq!(output.result.samples.len(), LOOP);
    assert!(output.result.report.is_complete());

    let artifact = output.artifact.unwrap();
    assert!(artifact.wav_path.ends_with("comp_1.wav"));
    assert!(artifact.report_path.exists());

    // Away from the 50 ms window the comp is take 4, then take 2.
    let take_4 = takes.read(4).unwrap().samples;
    let take_2 = takes.read(2).unwrap().samples;
    assert_eq!(&output.result.samples[..375], &take_4[..375]);
    assert_eq!(&output.result.samples[425..], &take_2[425..]);

    // A second comp never overwrites the first.
    let again = session.comp(&boundaries, &[Some(1), Some(1)], &CompOptions::default()).unwrap();
    let artifact = session.write_comp(&again).unwrap();
    assert_eq!(artifact.index, 2);
    assert_eq!(artifact.report_path.file_name().unwrap(), "comp_2.json");
}

#[test]
fn test_segment_job_against_take() {
    let dir = tempfile::tempdir().unwrap();
    let session = open_session(dir.path());
    let worker = BatchWorker::spawn(Arc::clone(&session)).unwrap();

    let recording = record_pass(&session, &generate_sine(50.0, 0.5, SR, LOOP));
    worker.submit(BatchJob::Finalize(recording)).unwrap();
    expect_finalized(&worker);

    worker
        .submit(BatchJob::Segment {
            reference: Reference::Take(1),
            tempo: Some(Tempo::new(120).unwrap()),
        })
        .unwrap();
    match worker.events().recv_timeout(EVENT_TIMEOUT).unwrap() {
        // 0.8 s is too short for two minimum-length segments.
        BatchEvent::Segmented(result) => assert_eq!(result.unwrap(), BoundarySet::whole(0.8)),
        other => panic!("expected Segmented, got {other:?}"),
    }
}

#[test]
fn test_import_then_comp_from_map() {
    let dir = tempfile::tempdir().unwrap();
    let sources = tempfile::tempdir().unwrap();
    let session = open_session(dir.path());

    let mut paths = Vec::new();
    for seed in 0..2u64 {
        let path = sources.path().join(format!("vocal_{seed}.wav"));
        write_wav(&path, &generate_noise(LOOP, 0.4, seed + 100), SR, BitDepth::Int16);
        paths.push(path);
    }

    let set = session.import_takes(&paths).unwrap();
    assert_eq!(set.indices(), vec![1, 2]);
    assert_eq!(session.counters().next_take_index, 3);

    let boundaries = BoundarySet::whole(0.8);
    let map = CompMap::from_json(
        r#"{
            "segments": [
                { "index": 0, "start_s": 0.0, "end_s": 0.8, "winner": { "take": "take_2" }, "candidates": [] }
            ]
        }"#,
    )
    .unwrap();
    let comp = session
        .comp_from_map(&boundaries, &map, &CompOptions::default())
        .unwrap();
    assert_eq!(comp.samples, set.read(2).unwrap().samples);

    assert_eq!(session.clear_takes().unwrap(), 2);
    assert_eq!(session.counters().next_take_index, 1);
}
