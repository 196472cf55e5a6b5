//! Pipeline configuration
//!
//! Holds the already-parsed values the pipeline consumes and validates the
//! environment (directories and external binaries) before any work runs.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::cli::Args;
use crate::error::{CombinatorError, Result};
use crate::shell::{comm_supports_nocheck, find_binary};

/// Memory budget handed to `sort -S`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMemory {
    /// Percentage of physical memory (1-100)
    Percent(u8),
    /// Absolute number of bytes
    Bytes(usize),
}

impl SortMemory {
    /// Render as a `sort --buffer-size` argument
    pub fn as_sort_arg(&self) -> String {
        match self {
            SortMemory::Percent(p) => format!("{}%", p),
            SortMemory::Bytes(b) => format!("{}b", b),
        }
    }
}

impl fmt::Display for SortMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortMemory::Percent(p) => write!(f, "{}%", p),
            SortMemory::Bytes(b) => write!(f, "{}", bytesize::ByteSize(*b as u64)),
        }
    }
}

/// Locations (or bare names on `PATH`) of the external tools
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    /// Rule expansion (`hashcat --stdout -r`)
    pub hashcat: PathBuf,
    /// Pairwise combination (hashcat-utils `combinator`)
    pub combinator: PathBuf,
    /// List-relative difference (hashcat-utils `rli2`)
    pub rli2: PathBuf,
    pub sort: PathBuf,
    pub uniq: PathBuf,
    pub comm: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            hashcat: PathBuf::from("hashcat"),
            combinator: PathBuf::from("combinator.bin"),
            rli2: PathBuf::from("rli2.bin"),
            sort: PathBuf::from("sort"),
            uniq: PathBuf::from("uniq"),
            comm: PathBuf::from("comm"),
        }
    }
}

impl ToolPaths {
    fn iter_mut(&mut self) -> [&mut PathBuf; 6] {
        [
            &mut self.hashcat,
            &mut self.combinator,
            &mut self.rli2,
            &mut self.sort,
            &mut self.uniq,
            &mut self.comm,
        ]
    }
}

/// Environment facts established by [`CombinatorConfig::validate`]
#[derive(Debug, Clone)]
pub struct Environment {
    /// Tool paths resolved against `PATH`
    pub tools: ToolPaths,
    /// Whether `comm` accepts `--nocheck-order`
    pub comm_nocheck: bool,
}

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct CombinatorConfig {
    pub base_dir: PathBuf,
    pub temp_dir: PathBuf,
    pub output_dir: PathBuf,
    pub min_length: usize,
    pub cores: usize,
    pub memory: SortMemory,
    pub tools: ToolPaths,
    /// Value of `LC_ALL` for every spawned process
    pub locale: String,
    pub quiet: bool,
}

impl CombinatorConfig {
    pub fn from_args(args: &Args) -> anyhow::Result<Self> {
        Ok(Self {
            base_dir: absolutize(&args.base_dir)?,
            temp_dir: absolutize(&args.temp_dir)?,
            output_dir: absolutize(&args.output_dir)?,
            min_length: args.min_length,
            cores: args.get_cores(),
            memory: args.parse_memory()?,
            tools: ToolPaths {
                hashcat: args.bin_hashcat.clone(),
                combinator: args.bin_combinator.clone(),
                rli2: args.bin_rli2.clone(),
                sort: args.bin_sort.clone(),
                uniq: args.bin_uniq.clone(),
                comm: args.bin_comm.clone(),
            },
            locale: args.locale.clone(),
            quiet: args.quiet,
        })
    }

    /// Check every startup prerequisite, reporting all failures at once
    pub fn validate(&self) -> Result<Environment> {
        let mut problems = Vec::new();

        if !self.temp_dir.is_dir() {
            problems.push(format!(
                "Temporary directory `{}` does not exist!",
                self.temp_dir.display()
            ));
        }
        if !self.base_dir.is_dir() {
            problems.push(format!(
                "Base directory `{}` does not exist!",
                self.base_dir.display()
            ));
        }

        let mut resolved = self.tools.clone();
        for tool in resolved.iter_mut() {
            match find_binary(tool) {
                Some(path) => *tool = path,
                None => problems.push(format!(
                    "Binary `{}` not found - consider adding it to $PATH environment variable",
                    tool.display()
                )),
            }
        }

        if !problems.is_empty() {
            for problem in &problems {
                log::error!("{}", problem);
            }
            return Err(CombinatorError::Startup { problems });
        }

        let comm_nocheck = comm_supports_nocheck(&resolved.comm, &self.locale);
        Ok(Environment {
            tools: resolved,
            comm_nocheck,
        })
    }
}

fn absolutize(path: &Path) -> anyhow::Result<PathBuf> {
    Ok(std::path::absolute(path)?)
}
