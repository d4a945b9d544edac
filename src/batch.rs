//! Batch minification of many archives.
//!
//! Each input is loaded, minified and optionally verified one after the
//! other. Writes are held back until every input has been transformed and
//! are then issued concurrently. A failure is recorded against its own input
//! and never stops the rest of the batch.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Result, anyhow};
use log::debug;

use crate::io::ArchiveStore;
use crate::zip::{self, MinifyStats};

/// How a batch treats its outputs.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Report only, write nothing.
    pub dry_run: bool,
    /// Compare extracted contents before writing.
    pub verify: bool,
    /// Write into this directory instead of replacing the inputs.
    pub output_dir: Option<PathBuf>,
}

impl BatchOptions {
    /// Where the minified form of `input` is written.
    pub fn destination(&self, input: &Path) -> PathBuf {
        match (&self.output_dir, input.file_name()) {
            (Some(dir), Some(name)) => dir.join(name),
            _ => input.to_path_buf(),
        }
    }
}

/// Size accounting for one successfully minified archive.
#[derive(Debug, Clone)]
pub struct Savings {
    pub before: u64,
    pub after: u64,
    /// Time spent in minification alone.
    pub elapsed: Duration,
    pub stats: MinifyStats,
    /// `None` on a dry run.
    pub written_to: Option<PathBuf>,
}

impl Savings {
    pub fn saved(&self) -> u64 {
        self.before.saturating_sub(self.after)
    }

    /// Output size as a percentage of the input size.
    pub fn after_percent(&self) -> f64 {
        percent(self.after, self.before)
    }

    pub fn saved_percent(&self) -> f64 {
        percent(self.saved(), self.before)
    }
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Outcome for one input of a batch.
#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: Result<Savings>,
}

impl FileReport {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Make paths absolute and drop repeats, keeping first occurrences in order.
///
/// Symlinks are not resolved, so two links to one archive stay distinct.
pub fn dedupe_paths<I>(paths: I) -> Vec<PathBuf>
where
    I: IntoIterator,
    I::Item: AsRef<Path>,
{
    let mut seen = HashSet::new();
    paths
        .into_iter()
        .map(|p| {
            let p = p.as_ref();
            std::path::absolute(p).unwrap_or_else(|_| p.to_path_buf())
        })
        .filter(|p| seen.insert(p.clone()))
        .collect()
}

/// Minify every archive in `paths` through `store`.
///
/// Returns one report per distinct input, in input order. When two inputs
/// map to the same destination (same file name under `-o DIR`), the later
/// one fails and nothing is written for it.
pub async fn minify_all<S>(store: Arc<S>, paths: &[PathBuf], options: &BatchOptions) -> Vec<FileReport>
where
    S: ArchiveStore + 'static,
{
    let paths = dedupe_paths(paths);
    let mut reports = Vec::with_capacity(paths.len());
    let mut pending = Vec::new();
    // Destination -> input that claimed it first
    let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::new();

    for path in paths {
        let outcome = match transform(store.as_ref(), &path, options).await {
            Ok((savings, data)) => match &savings.written_to {
                Some(dest) => match claimed.get(dest) {
                    Some(first) => Err(anyhow!(
                        "output {} would overwrite the result for {}",
                        dest.display(),
                        first.display()
                    )),
                    None => {
                        claimed.insert(dest.clone(), path.clone());
                        pending.push((reports.len(), dest.clone(), data));
                        Ok(savings)
                    }
                },
                None => Ok(savings),
            },
            Err(e) => Err(e),
        };
        reports.push(FileReport { path, outcome });
    }

    // All transformations are done; write everything at once
    let handles: Vec<_> = pending
        .into_iter()
        .map(|(index, dest, data)| {
            let store = store.clone();
            let handle = tokio::spawn(async move { store.store(&dest, &data).await });
            (index, handle)
        })
        .collect();

    for (index, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => Err(anyhow!("write task failed: {}", e)),
        };
        if let Err(e) = result {
            reports[index].outcome = Err(e);
        }
    }

    reports
}

/// Load, minify and optionally verify one archive.
async fn transform<S>(store: &S, path: &Path, options: &BatchOptions) -> Result<(Savings, Vec<u8>)>
where
    S: ArchiveStore + ?Sized,
{
    let before = store.load(path).await?;

    let start = Instant::now();
    let minified = zip::minify_with_stats(&before)?;
    let elapsed = start.elapsed();
    debug!(
        "{}: kept {} entries, dropped {} directories in {:?}",
        path.display(),
        minified.stats.entries_kept,
        minified.stats.directories_dropped,
        elapsed
    );

    if options.verify {
        zip::verify_contents(&before, &minified.data)?;
    }

    let savings = Savings {
        before: before.len() as u64,
        after: minified.data.len() as u64,
        elapsed,
        stats: minified.stats,
        written_to: (!options.dry_run).then(|| options.destination(path)),
    };

    Ok((savings, minified.data))
}
