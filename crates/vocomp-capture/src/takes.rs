//! The take directory: `take_<N>.wav` files sharing one rate and length.

use crate::error::{Error, Result};
use crate::wav::{read_mono, MonoAudio};
use hound::WavReader;
use std::fs;
use std::path::{Path, PathBuf};

/// File name for the take with the given index.
pub fn take_file_name(index: u32) -> String {
    format!("take_{index}.wav")
}

/// Parse `take_<N>.wav` into `N`.
pub fn parse_take_index(file_name: &str) -> Option<u32> {
    let index: u32 = file_name
        .strip_prefix("take_")?
        .strip_suffix(".wav")?
        .parse()
        .ok()?;
    (index > 0).then_some(index)
}

/// Metadata for one take file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TakeInfo {
    pub index: u32,
    pub path: PathBuf,
    pub sample_rate: u32,
    /// Length in frames.
    pub len_samples: usize,
}

/// All takes in one directory, sorted by index.
#[derive(Debug, Clone)]
pub struct TakeSet {
    dir: PathBuf,
    takes: Vec<TakeInfo>,
}

impl TakeSet {
    /// Read the take set in `dir`.
    ///
    /// Fails with [`Error::InconsistentTakes`] if the takes disagree on
    /// sample rate or length.
    pub fn scan(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut takes = Vec::new();

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(index) = name.to_str().and_then(parse_take_index) else {
                continue;
            };
            if !entry.file_type()?.is_file() {
                continue;
            }
            let (sample_rate, len_samples) = wav_shape(&entry.path())?;
            takes.push(TakeInfo {
                index,
                path: entry.path(),
                sample_rate,
                len_samples,
            });
        }

        takes.sort_by_key(|t| t.index);
        validate(&takes)?;

        tracing::debug!("Found {} takes in {}", takes.len(), dir.display());
        Ok(Self {
            dir: dir.to_path_buf(),
            takes,
        })
    }

    /// Inspect `sources` as a prospective take set, numbered from 1.
    ///
    /// Fails if the files cannot be read or disagree on rate or length.
    pub fn inspect_sources<P: AsRef<Path>>(sources: &[P]) -> Result<Vec<TakeInfo>> {
        if sources.is_empty() {
            return Err(Error::InconsistentTakes("no takes to import".into()));
        }

        let mut found = Vec::with_capacity(sources.len());
        for (i, source) in sources.iter().enumerate() {
            let (sample_rate, len_samples) = wav_shape(source.as_ref())?;
            found.push(TakeInfo {
                index: i as u32 + 1,
                path: source.as_ref().to_path_buf(),
                sample_rate,
                len_samples,
            });
        }
        validate(&found)?;
        Ok(found)
    }

    /// Replace the take set in `dir` with copies of `sources`, numbered from 1.
    ///
    /// Sources are validated and copied to staging files before the existing
    /// takes are removed, so sources may live in `dir` itself. If any copy
    /// fails the existing take set is left as it was.
    pub fn import<P: AsRef<Path>>(dir: impl AsRef<Path>, sources: &[P]) -> Result<Self> {
        let dir = dir.as_ref();
        let found = Self::inspect_sources(sources)?;

        fs::create_dir_all(dir)?;
        let mut staged = Vec::with_capacity(found.len());
        for take in &found {
            let staging = dir.join(staging_file_name(take.index));
            if let Err(e) = fs::copy(&take.path, &staging) {
                let _ = fs::remove_file(&staging);
                for path in &staged {
                    let _ = fs::remove_file(path);
                }
                return Err(e.into());
            }
            staged.push(staging);
        }

        Self::clear(dir)?;
        for (take, staging) in found.iter().zip(&staged) {
            fs::rename(staging, dir.join(take_file_name(take.index)))?;
        }

        tracing::info!("Imported {} takes into {}", found.len(), dir.display());
        Self::scan(dir)
    }

    /// Delete every `take_<N>.wav` in `dir`. Returns how many were removed.
    pub fn clear(dir: impl AsRef<Path>) -> Result<usize> {
        let dir = dir.as_ref();
        if !dir.exists() {
            return Ok(0);
        }
        let mut removed = 0;
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_name().to_str().and_then(parse_take_index).is_some() {
                fs::remove_file(entry.path())?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn len(&self) -> usize {
        self.takes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.takes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TakeInfo> {
        self.takes.iter()
    }

    pub fn indices(&self) -> Vec<u32> {
        self.takes.iter().map(|t| t.index).collect()
    }

    pub fn get(&self, index: u32) -> Option<&TakeInfo> {
        self.takes
            .binary_search_by_key(&index, |t| t.index)
            .ok()
            .map(|i| &self.takes[i])
    }

    pub fn contains(&self, index: u32) -> bool {
        self.get(index).is_some()
    }

    /// Lowest take index, used when a segment has no usable winner.
    pub fn default_index(&self) -> Option<u32> {
        self.takes.first().map(|t| t.index)
    }

    /// Next unused take index (one past the highest).
    pub fn next_index(&self) -> u32 {
        self.takes.last().map_or(1, |t| t.index + 1)
    }

    pub fn sample_rate(&self) -> Option<u32> {
        self.takes.first().map(|t| t.sample_rate)
    }

    pub fn take_len(&self) -> Option<usize> {
        self.takes.first().map(|t| t.len_samples)
    }

    /// Decode one take as mono `f32`.
    pub fn read(&self, index: u32) -> Result<MonoAudio> {
        let take = self.get(index).ok_or(Error::TakeNotFound(index))?;
        read_mono(&take.path)
    }
}

/// First `phraseNN` directory under `root` that is missing or empty.
pub fn allocate_phrase_dir(root: impl AsRef<Path>) -> Result<PathBuf> {
    let root = root.as_ref();
    for n in 1..=u32::MAX {
        let candidate = root.join(format!("phrase{n:02}"));
        if !candidate.exists() || fs::read_dir(&candidate)?.next().is_none() {
            fs::create_dir_all(&candidate)?;
            return Ok(candidate);
        }
    }
    Err(Error::Recording("no free phrase directory".into()))
}

fn staging_file_name(index: u32) -> String {
    format!(".import_{index}.wav")
}

fn wav_shape(path: &Path) -> Result<(u32, usize)> {
    let reader = WavReader::open(path)?;
    Ok((reader.spec().sample_rate, reader.duration() as usize))
}

fn validate(takes: &[TakeInfo]) -> Result<()> {
    let Some(first) = takes.first() else {
        return Ok(());
    };
    for take in &takes[1..] {
        if take.sample_rate != first.sample_rate {
            return Err(Error::InconsistentTakes(format!(
                "{} is {} Hz, {} is {} Hz",
                take.path.display(),
                take.sample_rate,
                first.path.display(),
                first.sample_rate
            )));
        }
        if take.len_samples != first.len_samples {
            return Err(Error::InconsistentTakes(format!(
                "{} has {} samples, {} has {}",
                take.path.display(),
                take.len_samples,
                first.path.display(),
                first.len_samples
            )));
        }
    }
    Ok(())
}
