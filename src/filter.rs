//! Word filtering module
//!
//! Drops tokens shorter than the configured minimum before merging.
//! Length is measured in bytes, so a multi-byte character counts for each
//! of its bytes.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{CombinatorError, Result};
use crate::output::OutputWriter;

/// Read buffer for filtering (1MB)
const READ_BUFFER_SIZE: usize = 1024 * 1024;

/// Keeps tokens at or above a minimum byte length
#[derive(Debug, Clone, Copy)]
pub struct MinLengthFilter {
    min_length: usize,
}

impl MinLengthFilter {
    pub fn new(min_length: usize) -> Self {
        Self { min_length }
    }

    #[inline]
    pub fn matches(&self, word: &[u8]) -> bool {
        word.len() >= self.min_length
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }
}

/// Counts from one filtering pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FilterStats {
    pub lines: u64,
    pub kept: u64,
}

/// Stream `source` into `dest`, keeping only tokens accepted by `filter`
pub fn filter_file(source: &Path, dest: &Path, filter: &MinLengthFilter) -> Result<FilterStats> {
    let file = File::open(source).map_err(|e| CombinatorError::file(source, e))?;
    let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, file);
    let mut writer = OutputWriter::new(dest)?;
    let mut stats = FilterStats::default();
    let mut line = Vec::with_capacity(256);

    loop {
        line.clear();
        let read = reader
            .read_until(b'\n', &mut line)
            .map_err(|e| CombinatorError::file(source, e))?;
        if read == 0 {
            break;
        }

        if line.last() == Some(&b'\n') {
            line.pop();
        }
        stats.lines += 1;

        if filter.matches(&line) {
            writer.write_line(&line)?;
        }
    }

    writer.flush()?;
    stats.kept = writer.lines_written();
    Ok(stats)
}
