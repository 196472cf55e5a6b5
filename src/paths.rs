//! Path resolution for the three roots a run works in
//!
//! Resolution is a pure function of `(root, name)`; results are memoized for
//! the lifetime of the resolver. A resolver can only be built from roots that
//! startup validation has accepted, so resolving never fails.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use ahash::RandomState;
use hashbrown::HashMap;

/// The directory a logical name is resolved against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Root {
    /// Source wordlists and rules
    Base,
    /// Scratch artifacts
    Temp,
    /// Final wordlists
    Output,
}

impl fmt::Display for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Root::Base => write!(f, "base"),
            Root::Temp => write!(f, "temp"),
            Root::Output => write!(f, "output"),
        }
    }
}

/// Memoized mapping from `(root, name)` to an absolute path
pub struct PathResolver {
    base: PathBuf,
    temp: PathBuf,
    output: PathBuf,
    cache: RwLock<HashMap<(Root, String), PathBuf, RandomState>>,
}

impl PathResolver {
    pub fn new(base: PathBuf, temp: PathBuf, output: PathBuf) -> Self {
        Self {
            base,
            temp,
            output,
            cache: RwLock::new(HashMap::with_hasher(RandomState::new())),
        }
    }

    pub fn root(&self, root: Root) -> &Path {
        match root {
            Root::Base => &self.base,
            Root::Temp => &self.temp,
            Root::Output => &self.output,
        }
    }

    /// Resolve `name` inside `root`
    pub fn resolve(&self, root: Root, name: &str) -> PathBuf {
        let key = (root, name.to_string());
        if let Some(path) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return path.clone();
        }

        let path = self.root(root).join(name);
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_insert(path)
            .clone()
    }

    /// Number of memoized resolutions
    pub fn cached(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
