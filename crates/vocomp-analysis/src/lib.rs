//! # vocomp analysis
//!
//! Phrase segmentation for loop-recorded vocals.
//!
//! This crate provides:
//! - **RMS envelope**: centered short-time energy on a fixed hop grid
//! - **Valley detection**: quiet, strict local minima with spacing debounce
//! - **Segmentation**: a BPM-aware walk that cuts at valleys near a two-beat target
//! - **Boundary sets**: the shared segment grid, mapped to sample ranges per take
//!
//! All functions operate on raw `&[f32]` mono sample buffers.
//!
//! ## Example
//!
//! ```rust
//! use vocomp_analysis::{Segmenter, Tempo};
//!
//! let samples: Vec<f32> = vec![0.0; 44100 * 4];
//! let tempo = Tempo::new(120).unwrap();
//! let boundaries = Segmenter::default().segment(&samples, 44100, Some(tempo));
//!
//! // Silence has no valleys: one segment spanning the loop.
//! assert_eq!(boundaries.segment_count(), 1);
//! ```

pub mod boundary;
pub mod envelope;
pub mod error;
pub mod segment;
pub mod tempo;
pub mod valley;

pub use boundary::{BoundarySet, Segment};
pub use envelope::RmsEnvelope;
pub use error::{AnalysisError, Result};
pub use segment::{segment_reference, SegmentationConfig, Segmenter};
pub use tempo::Tempo;
pub use valley::{find_valleys, Valley, ValleyParams};
