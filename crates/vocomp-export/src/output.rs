//! Comp artifacts on disk: `comp_<N>.wav` plus its `comp_<N>.json` report.

use crate::assembler::CompResult;
use crate::error::Result;
use crate::format::wav::{encode_wav_mono_file, WavConfig};
use std::fs;
use std::path::{Path, PathBuf};
use vocomp_capture::BitDepth;

/// Files written for one comp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompArtifact {
    pub index: u32,
    pub wav_path: PathBuf,
    pub report_path: PathBuf,
}

/// First `N` for which neither `comp_<N>.wav` nor `comp_<N>.json` exists.
pub fn next_comp_index(dir: &Path) -> u32 {
    (1..)
        .find(|n| !comp_path(dir, *n, "wav").exists() && !comp_path(dir, *n, "json").exists())
        .unwrap_or(u32::MAX)
}

fn comp_path(dir: &Path, index: u32, ext: &str) -> PathBuf {
    dir.join(format!("comp_{index}.{ext}"))
}

/// Write `result` as the next unused comp in `dir`. Never overwrites.
pub fn write_comp(dir: &Path, result: &CompResult, bit_depth: BitDepth) -> Result<CompArtifact> {
    fs::create_dir_all(dir)?;
    let index = next_comp_index(dir);
    let wav_path = comp_path(dir, index, "wav");
    let report_path = comp_path(dir, index, "json");

    encode_wav_mono_file(
        &result.samples,
        &wav_path,
        &WavConfig::new(result.sample_rate(), bit_depth),
    )?;
    if let Err(e) = fs::write(&report_path, result.report.to_json()?) {
        let _ = fs::remove_file(&wav_path);
        return Err(e.into());
    }

    tracing::info!("Wrote comp {} to {}", index, wav_path.display());
    Ok(CompArtifact {
        index,
        wav_path,
        report_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::{assemble_comp, CompOptions};
    use crate::source::MemoryTakes;
    use vocomp_analysis::BoundarySet;

    #[test]
    fn test_successive_comps_get_new_files() {
        let dir = tempfile::tempdir().unwrap();
        let takes = MemoryTakes::new(8000).with_take(1, vec![0.5; 800]).unwrap();
        let result = assemble_comp(
            &BoundarySet::whole(0.1),
            &[Some(1)],
            &takes,
            &CompOptions::default(),
        )
        .unwrap();

        let first = write_comp(dir.path(), &result, BitDepth::Int16).unwrap();
        let second = write_comp(dir.path(), &result, BitDepth::Int16).unwrap();

        assert_eq!(first.index, 1);
        assert_eq!(second.index, 2);
        assert!(first.wav_path.exists() && first.report_path.exists());
        assert!(second.wav_path.ends_with("comp_2.wav"));
        assert_eq!(next_comp_index(dir.path()), 3);
    }
}
