//! Stop-time finalization: pad, then split.

use crate::error::Result;
use crate::pad::{pad_recording, PadReport};
use crate::recording::ContinuousRecording;
use crate::split::{split_recording, SplitOutcome};
use std::path::Path;

/// Outcome of [`finalize_recording`].
#[derive(Debug)]
pub struct Finalized {
    pub pad: PadReport,
    pub split: SplitOutcome,
}

impl Finalized {
    /// Take index to use for the next recording.
    pub fn next_take_index(&self, first_index: u32) -> u32 {
        self.split.report().next_index(first_index)
    }
}

/// Pad the recording to whole loops and split it into takes.
///
/// `Err` means nothing was produced and the recording file is unchanged;
/// a partial split comes back as `Ok` with [`SplitOutcome::Partial`].
pub fn finalize_recording(
    recording: &mut ContinuousRecording,
    takes_dir: &Path,
    first_index: u32,
    block_size: usize,
) -> Result<Finalized> {
    let pad = pad_recording(recording, block_size)?;
    let split = split_recording(recording, takes_dir, first_index, block_size)?;
    Ok(Finalized { pad, split })
}
