//! Comp assembly and rendering for vocomp
//!
//! Turns a boundary set, a take set, and per-segment winners into one
//! continuous comped vocal.
//!
//! # Example
//!
//! ```ignore
//! use vocomp_export::{assemble_comp, write_comp, CompMap, CompOptions, CrossfadeSettings};
//!
//! let map = CompMap::load("compmap.json")?;
//! map.validate_against(&boundaries)?;
//!
//! let options = CompOptions::with_crossfade(CrossfadeSettings::from_amount(40));
//! let result = assemble_comp(&boundaries, &map.winners(), &take_set, &options)?;
//! let artifact = write_comp(project_dir, &result, BitDepth::Int16)?;
//! ```

mod assembler;
mod compmap;
mod crossfade;
mod dsp;
mod error;
mod output;
mod source;

pub mod format;

pub use assembler::{
    assemble_comp, CompOptions, CompReport, CompResult, SegmentChoice, Substitution,
};
pub use compmap::{CompMap, CompSegment, SegmentScorer, Winner};
pub use crossfade::{CrossfadeSettings, FadeCurve, MAX_CROSSFADE_MS, MIN_CROSSFADE_MS};
pub use dsp::{normalize_peak, peak_dbfs};
pub use error::{ExportError, Result};
pub use format::WavConfig;
pub use output::{next_comp_index, write_comp, CompArtifact};
pub use source::{MemoryTakes, TakeSource};
