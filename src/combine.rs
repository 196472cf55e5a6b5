//! Pairwise combination
//!
//! Produces every concatenation of a token from one list with a token from
//! another. A combination is memoized by `(mode, left, right)` in memory and
//! by its artifact name on disk, so the combinator tool runs at most once per
//! artifact.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};

use ahash::RandomState;
use hashbrown::HashMap;

use crate::error::{CombinatorError, Result, Side};
use crate::guard::{hold, KeyedLocks};
use crate::progress::RunStats;
use crate::rules::stem;
use crate::shell::Shell;

/// Which operand supplies the prefixes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombineMode {
    /// `right + left`: right tokens first
    Left,
    /// `left + right`: left tokens first
    Right,
    /// `right + left + right`
    Both,
}

impl fmt::Display for CombineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CombineMode::Left => write!(f, "left"),
            CombineMode::Right => write!(f, "right"),
            CombineMode::Both => write!(f, "both"),
        }
    }
}

impl FromStr for CombineMode {
    type Err = CombinatorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(CombineMode::Left),
            "right" => Ok(CombineMode::Right),
            "both" => Ok(CombineMode::Both),
            _ => Err(CombinatorError::UnknownMode(s.to_string())),
        }
    }
}

/// Memo key of one combination
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CombinationKey {
    pub mode: CombineMode,
    pub left: PathBuf,
    pub right: PathBuf,
}

pub struct PairCombiner {
    shell: Arc<Shell>,
    dest_dir: PathBuf,
    cache: RwLock<HashMap<CombinationKey, PathBuf, RandomState>>,
    locks: KeyedLocks<PathBuf>,
    stats: Arc<RunStats>,
}

impl PairCombiner {
    pub fn new(shell: Arc<Shell>, dest_dir: PathBuf, stats: Arc<RunStats>) -> Self {
        Self {
            shell,
            dest_dir,
            cache: RwLock::new(HashMap::with_hasher(RandomState::new())),
            locks: KeyedLocks::new(),
            stats,
        }
    }

    /// Combine `left` and `right` according to `mode`, returning the artifact
    pub fn combine(&self, mode: CombineMode, left: &Path, right: &Path) -> Result<PathBuf> {
        let key = CombinationKey {
            mode,
            left: left.to_path_buf(),
            right: right.to_path_buf(),
        };
        if let Some(path) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(path.clone());
        }

        if !left.is_file() {
            return Err(CombinatorError::MissingOperand {
                side: Side::Left,
                path: left.to_path_buf(),
            });
        }
        if !right.is_file() {
            return Err(CombinatorError::MissingOperand {
                side: Side::Right,
                path: right.to_path_buf(),
            });
        }

        let artifact = match mode {
            CombineMode::Right => self.produce(left, right)?,
            CombineMode::Left => self.produce(right, left)?,
            CombineMode::Both => {
                // The intermediate is the LEFT artifact of the same pair.
                let intermediate = self.produce(right, left)?;
                self.produce(&intermediate, right)?
            }
        };
        log::info!("Combined `{}`", stem(&artifact));

        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, artifact.clone());
        Ok(artifact)
    }

    /// Number of memoized combinations
    pub fn cached(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Run the combinator with `prefixes` before `suffixes`, unless the
    /// artifact already exists
    fn produce(&self, prefixes: &Path, suffixes: &Path) -> Result<PathBuf> {
        let destination = self
            .dest_dir
            .join(format!("{}+{}.txt", stem(prefixes), stem(suffixes)));

        let slot = self.locks.slot(&destination);
        let _held = hold(&slot);

        if destination.is_file() {
            log::debug!("`{}` already exists, skipping", destination.display());
            self.stats.add_combination_skipped();
            return Ok(destination);
        }

        log::info!("Combining `{}` with `{}`", stem(prefixes), stem(suffixes));
        crate::output::ensure_parent(&destination)?;
        self.shell.combine(prefixes, suffixes, &destination)?;
        self.stats.add_combination_run();
        Ok(destination)
    }
}
