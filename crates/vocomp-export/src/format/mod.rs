//! Output file formats.

pub mod wav;

pub use wav::{encode_wav_mono_file, encode_wav_mono_memory, WavConfig};
