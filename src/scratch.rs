//! Job-scoped scratch files
//!
//! Every scratch file a merge creates is named `<job>-<name>`, where the job
//! identifier is derived from the merge destination. Purging removes exactly
//! the files carrying that prefix and leaves unrelated scratch files alone.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::error::{CombinatorError, Result};
use crate::shell::hex_prefix;

/// A run-scoped scratch namespace, purged when dropped
pub struct ScratchJob {
    id: String,
    dir: PathBuf,
}

impl ScratchJob {
    /// Job for a merge into `destination`, with files in `dir`
    pub fn for_destination(dir: &Path, destination: &Path) -> Self {
        Self {
            id: job_id(destination),
            dir: dir.to_path_buf(),
        }
    }

    /// Scratch path tagged with this job
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}-{}", self.id, name))
    }

    /// Delete every file tagged with this job, returning how many went
    pub fn purge(&self) -> Result<usize> {
        let prefix = format!("{}-", self.id);
        log::debug!(
            "Deleting all files starting with `{}` from `{}`",
            prefix,
            self.dir.display()
        );

        let mut removed = 0;
        for entry in WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let tagged = entry
                .file_name()
                .to_str()
                .map(|name| name.starts_with(&prefix))
                .unwrap_or(false);
            if tagged && entry.file_type().is_file() {
                fs::remove_file(entry.path())
                    .map_err(|e| CombinatorError::file(entry.path(), e))?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

impl Drop for ScratchJob {
    fn drop(&mut self) {
        if let Err(e) = self.purge() {
            log::warn!("Could not clean up scratch job {}: {}", self.id, e);
        }
    }
}

/// Deterministic 8-hex-digit identifier for a destination
pub fn job_id(destination: &Path) -> String {
    let digest = Sha256::digest(destination.as_os_str().as_encoded_bytes());
    hex_prefix(&digest, 4)
}
