//! Divide-and-conquer merging
//!
//! Merges any number of wordlists into one sorted, deduplicated list. Inputs
//! are first trimmed to the minimum length, then merged pairwise in a
//! recursion that halves the input list at every level, so no single sort
//! invocation sees more than two files. Optionally the result is reduced to
//! the tokens missing from a running "already seen" baseline.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytesize::ByteSize;
use rayon::prelude::*;
use sha2::{Digest, Sha256};

use crate::error::{CombinatorError, Result};
use crate::filter::{filter_file, MinLengthFilter};
use crate::output::{append, delete, ensure_parent, move_file, wordlist_stats};
use crate::progress::RunStats;
use crate::rules::stem;
use crate::scratch::ScratchJob;
use crate::shell::{hex_prefix, Collation, Shell};

/// Largest input list sorted directly without further halving
const MAX_FAN_IN: usize = 2;

pub struct DivideConquerMerger {
    shell: Arc<Shell>,
    scratch_dir: PathBuf,
    filter: MinLengthFilter,
    stats: Arc<RunStats>,
}

impl DivideConquerMerger {
    pub fn new(
        shell: Arc<Shell>,
        scratch_dir: PathBuf,
        min_length: usize,
        stats: Arc<RunStats>,
    ) -> Self {
        Self {
            shell,
            scratch_dir,
            filter: MinLengthFilter::new(min_length),
            stats,
        }
    }

    /// Merge `wordlists` into `destination`
    ///
    /// With a `compare` baseline, `destination` receives only the tokens the
    /// baseline does not contain yet, and the baseline absorbs them.
    pub fn merge(
        &self,
        destination: &Path,
        wordlists: &[PathBuf],
        compare: Option<&Path>,
    ) -> Result<()> {
        log::info!("Merging: {}", destination.display());

        if wordlists.is_empty() {
            return Err(CombinatorError::NothingToMerge {
                destination: destination.to_path_buf(),
            });
        }
        for wordlist in wordlists {
            let metadata = std::fs::metadata(wordlist).map_err(|_| CombinatorError::MissingFile {
                path: wordlist.clone(),
            })?;
            if metadata.len() == 0 {
                return Err(CombinatorError::EmptyInput {
                    path: wordlist.clone(),
                });
            }
        }

        ensure_parent(destination)?;
        delete(destination)?;

        let job = ScratchJob::for_destination(&self.scratch_dir, destination);
        let result = self.merge_job(&job, destination, wordlists, compare);
        if result.is_err() {
            let _ = delete(destination);
        }

        let purged = job.purge()?;
        self.stats.add_scratch_purged(purged as u64);
        result?;

        let stats = wordlist_stats(destination)?;
        log::info!(
            "Merged `{}`: {} words ({})",
            destination.display(),
            stats.lines,
            ByteSize(stats.bytes)
        );
        self.stats.add_merge();
        Ok(())
    }

    fn merge_job(
        &self,
        job: &ScratchJob,
        destination: &Path,
        wordlists: &[PathBuf],
        compare: Option<&Path>,
    ) -> Result<()> {
        let trimmed = self.trim(job, wordlists)?;
        let merged = self.split(job, &trimmed)?;

        match compare {
            Some(compare) => self.subtract_baseline(job, &merged, compare, destination),
            None => move_file(&merged, destination),
        }
    }

    /// Drop short tokens from every input, concurrently
    fn trim(&self, job: &ScratchJob, wordlists: &[PathBuf]) -> Result<Vec<PathBuf>> {
        wordlists
            .par_iter()
            .enumerate()
            .map(|(idx, wordlist)| {
                let name = wordlist
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let trimmed = job.path(&format!("trimmed-{}-{}", idx, name));
                let stats = filter_file(wordlist, &trimmed, &self.filter)?;
                log::debug!(
                    "Trimmed `{}`: kept {} of {} lines",
                    wordlist.display(),
                    stats.kept,
                    stats.lines
                );
                Ok(trimmed)
            })
            .collect()
    }

    /// Resolve `wordlists` to one sorted, deduplicated scratch file
    fn split(&self, job: &ScratchJob, wordlists: &[PathBuf]) -> Result<PathBuf> {
        let output = job.path(&format!("split-{}.txt", digest_of_stems(wordlists)));

        if wordlists.len() <= MAX_FAN_IN {
            self.shell.sort_unique(wordlists, &output)?;
            return Ok(output);
        }

        let mid = wordlists.len() / 2;
        let (left, right) = rayon::join(
            || self.split(job, &wordlists[..mid]),
            || self.split(job, &wordlists[mid..]),
        );
        self.shell.sort_unique(&[left?, right?], &output)?;
        Ok(output)
    }

    /// Write the part of `merged` missing from `compare` to `destination`,
    /// then fold it into `compare`
    fn subtract_baseline(
        &self,
        job: &ScratchJob,
        merged: &Path,
        compare: &Path,
        destination: &Path,
    ) -> Result<()> {
        if !compare.exists() {
            log::warn!(
                "Baseline `{}` does not exist yet, starting an empty one",
                compare.display()
            );
            ensure_parent(compare)?;
            std::fs::File::create(compare).map_err(|e| CombinatorError::file(compare, e))?;
        }

        let candidate = job.path("candidate.txt");
        self.shell
            .sort_file(merged, &candidate, Collation::Bytes, true)?;
        self.shell
            .sort_file(compare, compare, Collation::Bytes, true)?;
        self.shell
            .list_difference(&candidate, compare, destination)?;
        self.shell
            .sort_file(destination, destination, Collation::FoldCase, false)?;

        append(destination, compare)?;
        self.shell
            .sort_file(compare, compare, Collation::Bytes, true)
    }
}

/// Stable scratch name for a group of inputs
fn digest_of_stems(wordlists: &[PathBuf]) -> String {
    let joined = wordlists
        .iter()
        .map(|w| stem(w))
        .collect::<Vec<_>>()
        .join("+");
    hex_prefix(&Sha256::digest(joined.as_bytes()), 16)
}
