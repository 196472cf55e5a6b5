//! Test fixtures: isolated roots and stand-ins for hashcat and hashcat-utils

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use tempfile::TempDir;

use crate::combine::PairCombiner;
use crate::config::{CombinatorConfig, SortMemory, ToolPaths};
use crate::diff::SetDiffer;
use crate::merge::DivideConquerMerger;
use crate::progress::RunStats;
use crate::rules::RuleApplier;
use crate::shell::{Shell, SortSettings};

/// Supports the `:`, `u`, `l`, `$X` and `^X` rules.
const FAKE_HASHCAT: &str = r#"#!/bin/sh
rule=""
wordlist=""
while [ $# -gt 0 ]; do
  case "$1" in
    -r) rule="$2"; shift 2 ;;
    -*) shift ;;
    *) wordlist="$1"; shift ;;
  esac
done
while IFS= read -r op || [ -n "$op" ]; do
  case "$op" in
    :) cat "$wordlist" ;;
    u) tr '[:lower:]' '[:upper:]' < "$wordlist" ;;
    l) tr '[:upper:]' '[:lower:]' < "$wordlist" ;;
    \$?) sfx="${op#?}"; while IFS= read -r w; do printf '%s%s\n' "$w" "$sfx"; done < "$wordlist" ;;
    ^?) pfx="${op#?}"; while IFS= read -r w; do printf '%s%s\n' "$pfx" "$w"; done < "$wordlist" ;;
  esac
done < "$rule"
"#;

/// Operands always live one directory below the fixture root, so the call
/// log lands in the root.
const FAKE_COMBINATOR: &str = r#"#!/bin/sh
echo "$1 $2" >> "$(dirname "$1")/../combinator.log"
while IFS= read -r l || [ -n "$l" ]; do
  while IFS= read -r r || [ -n "$r" ]; do
    printf '%s%s\n' "$l" "$r"
  done < "$2"
done < "$1"
"#;

const FAKE_RLI2: &str = r#"#!/bin/sh
[ -f "$1" ] && [ -f "$2" ] || exit 2
grep -vxF -f "$2" "$1"
exit 0
"#;

/// `sort` that fails whenever an `*-all.txt` file is involved
const SORT_REFUSING_ALL: &str = r#"#!/bin/sh
for arg in "$@"; do
  case "$arg" in
    *-all.txt) echo "refusing $arg" >&2; exit 3 ;;
  esac
done
exec sort "$@"
"#;

/// Scripts are written once per test process; writing an executable while
/// other threads spawn children risks ETXTBSY.
fn fake_bin_dir() -> &'static Path {
    static BIN: OnceLock<TempDir> = OnceLock::new();
    BIN.get_or_init(|| {
        let dir = TempDir::new().unwrap();
        for (name, script) in [
            ("hashcat", FAKE_HASHCAT),
            ("combinator.bin", FAKE_COMBINATOR),
            ("rli2.bin", FAKE_RLI2),
            ("sort-refusing-all", SORT_REFUSING_ALL),
        ] {
            let path = dir.path().join(name);
            fs::write(&path, script).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        }
        dir
    })
    .path()
}

/// Isolated base (`<root>`), scratch (`<root>/tmp`) and output (`<root>/out`)
pub struct Fixture {
    root: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        fake_bin_dir();
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("tmp")).unwrap();
        fs::create_dir_all(root.path().join("out")).unwrap();
        Self { root }
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn temp_path(&self, name: &str) -> PathBuf {
        self.root().join("tmp").join(name)
    }

    pub fn out_path(&self, name: &str) -> PathBuf {
        self.root().join("out").join(name)
    }

    pub fn config(&self) -> CombinatorConfig {
        let bin = fake_bin_dir();
        CombinatorConfig {
            base_dir: self.root().to_path_buf(),
            temp_dir: self.root().join("tmp"),
            output_dir: self.root().join("out"),
            min_length: 4,
            cores: 1,
            memory: SortMemory::Bytes(16 * 1024 * 1024),
            tools: ToolPaths {
                hashcat: bin.join("hashcat"),
                combinator: bin.join("combinator.bin"),
                rli2: bin.join("rli2.bin"),
                ..ToolPaths::default()
            },
            locale: "C".to_string(),
            quiet: true,
        }
    }

    pub fn shell(&self) -> Arc<Shell> {
        self.shell_for(&self.config())
    }

    pub fn shell_for(&self, config: &CombinatorConfig) -> Arc<Shell> {
        let env = config.validate().unwrap();
        Arc::new(Shell::new(
            env,
            SortSettings {
                temp_dir: config.temp_dir.clone(),
                cores: config.cores,
                memory: config.memory,
            },
            config.locale.clone(),
        ))
    }

    /// A `sort` that refuses to touch `*-all.txt` files
    pub fn sort_refusing_all(&self) -> PathBuf {
        fake_bin_dir().join("sort-refusing-all")
    }

    pub fn rule_applier(&self) -> RuleApplier {
        RuleApplier::new(self.shell(), self.root().join("tmp"), Arc::new(RunStats::new()), true)
    }

    pub fn pair_combiner(&self) -> PairCombiner {
        PairCombiner::new(self.shell(), self.root().join("tmp"), Arc::new(RunStats::new()))
    }

    pub fn merger(&self, min_length: usize) -> DivideConquerMerger {
        DivideConquerMerger::new(
            self.shell(),
            self.root().join("tmp"),
            min_length,
            Arc::new(RunStats::new()),
        )
    }

    pub fn set_differ(&self) -> SetDiffer {
        SetDiffer::new(
            self.shell(),
            self.root().to_path_buf(),
            self.root().join("tmp"),
            Arc::new(RunStats::new()),
        )
    }

    /// Write `lines` (newline-terminated) to `rel` under the root
    pub fn write(&self, rel: &str, lines: &[&str]) -> PathBuf {
        let path = self.root().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let content: String = lines.iter().map(|l| format!("{}\n", l)).collect();
        fs::write(&path, content).unwrap();
        path
    }

    /// How many times the combinator stand-in ran
    pub fn combinator_calls(&self) -> usize {
        fs::read_to_string(self.root().join("combinator.log"))
            .map(|log| log.lines().count())
            .unwrap_or(0)
    }
}

pub fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}
