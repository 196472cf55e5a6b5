//! Command-line interface definition for wordlist-combinator
//!
//! Provides argument parsing and validation for the combination pipeline.

use clap::{ArgAction, Parser};
use std::path::PathBuf;

use crate::config::SortMemory;

/// Wordlist combination pipeline for password cracking
///
/// Runs a named workflow that expands wordlists with hashcat rules, combines
/// them pairwise and merges the results into sorted, deduplicated lists.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "wordlist-combinator",
    author = "m0h1nd4",
    version,
    about = "Wordlist combination pipeline for password cracking",
    long_about = r#"
Builds large derived wordlists by composing source wordlists and hashcat rules
through rule expansion, pairwise combination, divide-and-conquer merging and
set differences. The heavy lifting is delegated to hashcat, hashcat-utils
(combinator, rli2) and coreutils (sort, uniq, comm).

EXAMPLES:
    # List the available workflows
    wordlist-combinator --list

    # Run the passwords workflow with sources in ./wordlists
    wordlist-combinator -w passwords -b ./wordlists -t /mnt/scratch -o ./out

    # Use half of the memory and 8 cores for sorting
    wordlist-combinator -w passwords --memory 50% --cores 8
"#,
    after_help = "Scratch files are kept in the temporary directory until you remove them."
)]
pub struct Args {
    /// Name of the workflow to run
    #[arg(short, long, value_name = "NAME", required_unless_present = "list")]
    pub workflow: Option<String>,

    /// List available workflows and exit
    #[arg(long, default_value_t = false)]
    pub list: bool,

    /// Base directory holding source wordlists and rules
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub base_dir: PathBuf,

    /// Temporary (scratch) directory, must exist
    #[arg(short, long, value_name = "DIR", default_value = "tmp")]
    pub temp_dir: PathBuf,

    /// Output directory
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Minimal length (in bytes) for a password when merging lists
    #[arg(long, value_name = "NUM", default_value_t = 4)]
    pub min_length: usize,

    /// Number of cores used for sorting (default: all but one)
    #[arg(long, value_name = "NUM")]
    pub cores: Option<usize>,

    /// Memory used for sorting: percentage ("80%") or size ("8GB")
    #[arg(long, value_name = "SIZE", default_value = "80%")]
    pub memory: String,

    /// Number of worker threads (default: auto-detect)
    #[arg(long, value_name = "NUM")]
    pub threads: Option<usize>,

    /// Hashcat binary
    #[arg(long, value_name = "BIN", default_value = "hashcat")]
    pub bin_hashcat: PathBuf,

    /// Hashcat utils `combinator` binary
    #[arg(long, value_name = "BIN", default_value = "combinator.bin")]
    pub bin_combinator: PathBuf,

    /// Hashcat utils `rli2` binary
    #[arg(long, value_name = "BIN", default_value = "rli2.bin")]
    pub bin_rli2: PathBuf,

    /// `sort` binary (GNU coreutils)
    #[arg(long, value_name = "BIN", default_value = "sort")]
    pub bin_sort: PathBuf,

    /// `uniq` binary
    #[arg(long, value_name = "BIN", default_value = "uniq")]
    pub bin_uniq: PathBuf,

    /// `comm` binary
    #[arg(long, value_name = "BIN", default_value = "comm")]
    pub bin_comm: PathBuf,

    /// Locale (LC_ALL) passed to every external tool
    #[arg(long, value_name = "LOCALE", default_value = "C")]
    pub locale: String,

    /// Debug logging
    #[arg(short, long, action = ArgAction::SetTrue, conflicts_with = "quiet")]
    pub debug: bool,

    /// Quiet mode - no logging or progress output
    #[arg(short, long, default_value_t = false)]
    pub quiet: bool,
}

impl Args {
    /// Cores for sorting, defaulting to all but one
    pub fn get_cores(&self) -> usize {
        self.cores.unwrap_or_else(|| {
            let cpus = num_cpus::get();
            if cpus > 1 {
                cpus - 1
            } else {
                cpus
            }
        })
    }

    /// Parse the sort memory budget
    pub fn parse_memory(&self) -> anyhow::Result<SortMemory> {
        parse_memory(&self.memory)
    }

    /// Log level implied by the verbosity flags
    pub fn log_level(&self) -> log::LevelFilter {
        if self.quiet {
            log::LevelFilter::Off
        } else if self.debug {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        }
    }
}

/// Parse a memory budget: "NN%" or a human-readable size
pub fn parse_memory(memory: &str) -> anyhow::Result<SortMemory> {
    let memory = memory.trim();

    if let Some(percent) = memory.strip_suffix('%') {
        let value: u8 = percent
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid memory percentage: '{}'", memory))?;
        if value == 0 || value > 100 {
            anyhow::bail!("Memory percentage must be between 1 and 100, got {}", value);
        }
        return Ok(SortMemory::Percent(value));
    }

    Ok(SortMemory::Bytes(parse_size(memory)?))
}

/// Parse human-readable size string to bytes
fn parse_size(size_str: &str) -> anyhow::Result<usize> {
    let size_str = size_str.trim().to_uppercase();

    let (num_str, multiplier) = if size_str.ends_with("GB") {
        (&size_str[..size_str.len() - 2], 1024 * 1024 * 1024)
    } else if size_str.ends_with("MB") {
        (&size_str[..size_str.len() - 2], 1024 * 1024)
    } else if size_str.ends_with("KB") {
        (&size_str[..size_str.len() - 2], 1024)
    } else if size_str.ends_with('B') {
        (&size_str[..size_str.len() - 1], 1)
    } else {
        (size_str.as_str(), 1)
    };

    let num: usize = num_str
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid size format: '{}'", size_str))?;

    num.checked_mul(multiplier)
        .ok_or_else(|| anyhow::anyhow!("Size too large: '{}'", size_str))
}
