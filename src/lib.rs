//! # Wordlist Combinator
//!
//! Builds password-candidate wordlists by driving hashcat and hashcat-utils.
//!
//! ## Features
//!
//! - **Rule expansion**: Expand wordlists with hashcat rule files
//! - **Combination**: Prefix/suffix combination of two wordlists (left, right, both)
//! - **Merging**: Divide-and-conquer sorted merge with minimum-length trimming
//! - **Deltas**: Emit only the candidates missing from a running baseline
//! - **Variant diffing**: Keep `basic`/`extended`/`all` list families disjoint
//! - **Restartable**: Artifacts that already exist are reused, never rebuilt
//!
//! ## Usage
//!
//! ```bash
//! # Run the built-in passwords workflow
//! wordlist-combinator -w passwords -b . -t tmp -o out
//!
//! # List the known workflows
//! wordlist-combinator --list
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use wordlist_combinator::{Combinator, CombinatorConfig, WorkflowRegistry};
//! use wordlist_combinator::config::{SortMemory, ToolPaths};
//! use std::path::PathBuf;
//!
//! let config = CombinatorConfig {
//!     base_dir: PathBuf::from("/srv/wordlists"),
//!     temp_dir: PathBuf::from("/srv/wordlists/tmp"),
//!     output_dir: PathBuf::from("/srv/wordlists/out"),
//!     min_length: 4,
//!     cores: 8,
//!     memory: SortMemory::Percent(80),
//!     tools: ToolPaths::default(),
//!     locale: "C".to_string(),
//!     quiet: false,
//! };
//!
//! let combinator = Combinator::new(config).unwrap();
//! let registry = WorkflowRegistry::builtin();
//! combinator.run(registry.get("passwords").unwrap()).unwrap();
//! ```

pub mod cli;
pub mod combinator;
pub mod combine;
pub mod config;
pub mod diff;
pub mod error;
pub mod filter;
pub mod guard;
pub mod merge;
pub mod output;
pub mod paths;
pub mod progress;
pub mod rules;
pub mod scratch;
pub mod shell;
pub mod workflow;

#[cfg(all(test, unix))]
mod testutil;

pub use cli::Args;
pub use combinator::Combinator;
pub use combine::CombineMode;
pub use config::CombinatorConfig;
pub use error::{CombinatorError, Result};
pub use workflow::{Workflow, WorkflowRegistry};
