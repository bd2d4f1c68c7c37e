//! Random subset selection of data files.
//!
//! Picks `n` files uniformly without replacement. A seed makes the pick
//! reproducible; without one the generator is seeded from entropy.

use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use thiserror::Error;
use tracing::info;

use crate::data_loader::{list_data_files, symbol_for, LoadError};

#[derive(Debug, Error)]
pub enum SampleError {
    #[error("sample size must be >= 1")]
    ZeroCount,

    #[error("no data files to sample from")]
    Empty,

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("cannot stage into {0}: it holds the files being sampled")]
    DestIsSource(PathBuf),

    #[error("failed to stage {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Choose `count` of `files` at random, returned sorted by path.
///
/// Asking for more files than exist returns all of them.
pub fn sample_files(
    files: &[PathBuf],
    count: usize,
    seed: Option<u64>,
) -> Result<Vec<PathBuf>, SampleError> {
    if count == 0 {
        return Err(SampleError::ZeroCount);
    }
    if files.is_empty() {
        return Err(SampleError::Empty);
    }

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut chosen: Vec<PathBuf> = files
        .choose_multiple(&mut rng, count.min(files.len()))
        .cloned()
        .collect();
    chosen.sort();
    Ok(chosen)
}

/// List `dir` and sample from it.
pub fn sample_dir(
    dir: &Path,
    extension: &str,
    count: usize,
    seed: Option<u64>,
) -> Result<Vec<PathBuf>, SampleError> {
    let files = list_data_files(dir, extension)?;
    let chosen = sample_files(&files, count, seed)?;
    info!(
        dir = %dir.display(),
        available = files.len(),
        chosen = chosen.len(),
        ?seed,
        "Sampled data files"
    );
    Ok(chosen)
}

/// Copy the chosen files into `dest`, replacing any data files already
/// there with the same extension. Returns the staged paths.
///
/// `dest` must not be a directory any of `files` lives in.
pub fn stage_sample(files: &[PathBuf], dest: &Path) -> Result<Vec<PathBuf>, SampleError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| SampleError::Io { path, source }
    };

    std::fs::create_dir_all(dest).map_err(io_err(dest))?;
    let dest_real = dest.canonicalize().map_err(io_err(dest))?;
    for file in files {
        let parent = match file.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        if parent.canonicalize().map_err(io_err(parent))? == dest_real {
            return Err(SampleError::DestIsSource(dest.to_path_buf()));
        }
    }

    let mut extensions: Vec<String> = files
        .iter()
        .filter_map(|f| f.extension().map(|e| e.to_string_lossy().into_owned()))
        .collect();
    extensions.sort();
    extensions.dedup();
    for ext in &extensions {
        for stale in list_data_files(dest, ext)? {
            std::fs::remove_file(&stale).map_err(io_err(&stale))?;
        }
    }

    let mut staged = Vec::with_capacity(files.len());
    for file in files {
        let Some(name) = file.file_name() else {
            continue;
        };
        let target = dest.join(name);
        std::fs::copy(file, &target).map_err(io_err(file))?;
        staged.push(target);
    }
    info!(
        dest = %dest.display(),
        symbols = ?staged.iter().map(|p| symbol_for(p)).collect::<Vec<_>>(),
        "Staged sample"
    );
    Ok(staged)
}
