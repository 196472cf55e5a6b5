//! Output management module
//!
//! Buffered writing of wordlists plus the file operations the pipeline
//! performs directly (append, move, concatenate, delete).

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{CombinatorError, Result};

/// Default buffer size for file writing (8MB)
const DEFAULT_BUFFER_SIZE: usize = 8 * 1024 * 1024;

/// Output file writer with buffering
pub struct OutputWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    lines_written: u64,
}

impl OutputWriter {
    /// Create (or truncate) an output file
    pub fn new(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| CombinatorError::file(path, e))?;

        Ok(Self {
            writer: BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, file),
            path: path.to_path_buf(),
            lines_written: 0,
        })
    }

    /// Write a token followed by a newline
    pub fn write_line(&mut self, line: &[u8]) -> Result<()> {
        self.writer
            .write_all(line)
            .and_then(|_| self.writer.write_all(b"\n"))
            .map_err(|e| CombinatorError::file(&self.path, e))?;
        self.lines_written += 1;
        Ok(())
    }

    /// Flush the buffer to disk
    pub fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| CombinatorError::file(&self.path, e))
    }

    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }
}

impl Drop for OutputWriter {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

/// Create the parent directory of `destination` if needed
pub fn ensure_parent(destination: &Path) -> Result<()> {
    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            log::debug!("Creating directory `{}`", parent.display());
            fs::create_dir_all(parent).map_err(|e| CombinatorError::file(parent, e))?;
        }
    }
    Ok(())
}

/// Append the contents of `source` to `destination`
///
/// A missing source is reported and skipped.
pub fn append(source: &Path, destination: &Path) -> Result<()> {
    ensure_parent(destination)?;
    if !source.is_file() {
        log::warn!("`{}` not found!", source.display());
        return Ok(());
    }

    log::debug!(" $ cat {} >> {}", source.display(), destination.display());
    let mut reader = File::open(source).map_err(|e| CombinatorError::file(source, e))?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(destination)
        .map_err(|e| CombinatorError::file(destination, e))?;
    let mut writer = BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, file);
    io::copy(&mut reader, &mut writer).map_err(|e| CombinatorError::file(destination, e))?;
    writer
        .flush()
        .map_err(|e| CombinatorError::file(destination, e))
}

/// Move `source` to `destination`, copying across filesystems
pub fn move_file(source: &Path, destination: &Path) -> Result<()> {
    ensure_parent(destination)?;
    log::debug!("Moving `{}` to {}", source.display(), destination.display());

    if fs::rename(source, destination).is_ok() {
        return Ok(());
    }
    fs::copy(source, destination).map_err(|e| CombinatorError::file(destination, e))?;
    fs::remove_file(source).map_err(|e| CombinatorError::file(source, e))
}

/// Copy `source` to `destination`
pub fn copy_file(source: &Path, destination: &Path) -> Result<()> {
    ensure_parent(destination)?;
    log::debug!("Copying `{}` to {}", source.display(), destination.display());
    fs::copy(source, destination).map_err(|e| CombinatorError::file(destination, e))?;
    Ok(())
}

/// Delete a file, ignoring one that does not exist
pub fn delete(destination: &Path) -> Result<()> {
    log::debug!("Deleting `{}`", destination.display());
    match fs::remove_file(destination) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CombinatorError::file(destination, e)),
    }
}

/// Replace `destination` with the concatenation of `wordlists`
pub fn concat<P: AsRef<Path>>(destination: &Path, wordlists: &[P]) -> Result<()> {
    log::debug!("Concatenating: {}", destination.display());
    delete(destination)?;
    ensure_parent(destination)?;
    for wordlist in wordlists {
        append(wordlist.as_ref(), destination)?;
    }
    Ok(())
}

/// Line and byte counts of a wordlist
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WordlistStats {
    pub lines: u64,
    pub bytes: u64,
}

/// Count the lines of a (possibly very large) wordlist
pub fn wordlist_stats(path: &Path) -> Result<WordlistStats> {
    let file = File::open(path).map_err(|e| CombinatorError::file(path, e))?;
    let bytes = file
        .metadata()
        .map_err(|e| CombinatorError::file(path, e))?
        .len();
    if bytes == 0 {
        return Ok(WordlistStats::default());
    }

    // SAFETY: the file is only read, and artifacts are not rewritten while
    // a step that produced them is still running.
    let mmap = unsafe { memmap2::Mmap::map(&file) }.map_err(|e| CombinatorError::file(path, e))?;
    let mut lines = memchr::memchr_iter(b'\n', &mmap).count() as u64;
    if mmap.last() != Some(&b'\n') {
        lines += 1;
    }

    Ok(WordlistStats { lines, bytes })
}
