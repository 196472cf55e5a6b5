//! Error types for the combination pipeline
//!
//! Every failure is raised to the orchestration entry point and ends the run.
//! Nothing is retried: the external tools are deterministic for stable inputs.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Which operand of a pairwise combination is meant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// Errors returned by the combination pipeline
#[derive(Debug, Error)]
pub enum CombinatorError {
    /// One or more startup prerequisites are missing.
    #[error("Failed on startup: {}", .problems.join("; "))]
    Startup { problems: Vec<String> },

    /// A combination operand does not exist.
    #[error("Cannot combine: {side} wordlist `{}` not found", .path.display())]
    MissingOperand { side: Side, path: PathBuf },

    /// A rule, wordlist or list variant does not exist.
    #[error("Resource `{}` not found", .path.display())]
    MissingFile { path: PathBuf },

    /// A merge input is a zero-byte file, which means an upstream step broke.
    #[error("Wordlist `{}` is empty, something is not right. Aborting", .path.display())]
    EmptyInput { path: PathBuf },

    /// A merge was requested without any inputs.
    #[error("Nothing to merge into `{}`", .destination.display())]
    NothingToMerge { destination: PathBuf },

    /// Unrecognised combination mode.
    #[error("Unknown combination mode `{0}` (expected left, right or both)")]
    UnknownMode(String),

    /// An external pipeline stage exited unsuccessfully.
    #[error("Command failed{}: {command}", .code.map(|c| format!(" with exit code {c}")).unwrap_or_default())]
    CommandFailed { command: String, code: Option<i32> },

    /// An external program could not be started.
    #[error("Failed to start `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A file operation on a known path failed.
    #[error("I/O error on `{}`", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CombinatorError {
    /// Attach a path to an I/O error
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, CombinatorError>;
