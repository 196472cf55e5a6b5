//! Rule expansion
//!
//! Applies a hashcat rule file to a wordlist and stores the sorted,
//! deduplicated expansion under a name derived from both inputs. An artifact
//! that already exists is never expanded again, across runs as well.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;

use crate::error::{CombinatorError, Result};
use crate::guard::{hold, KeyedLocks};
use crate::progress::{create_progress_bar, RunStats};
use crate::shell::Shell;

/// Name of the expansion of `wordlist` by `rule`:
/// `<rule stem>-<wordlist parent dir>-<wordlist stem>.txt`
pub fn artifact_name(wordlist: &Path, rule: &Path) -> String {
    let parent = wordlist
        .parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    format!("{}-{}-{}.txt", stem(rule), parent, stem(wordlist))
}

pub(crate) fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub struct RuleApplier {
    shell: Arc<Shell>,
    scratch_dir: PathBuf,
    locks: KeyedLocks<PathBuf>,
    stats: Arc<RunStats>,
    quiet: bool,
}

impl RuleApplier {
    pub fn new(shell: Arc<Shell>, scratch_dir: PathBuf, stats: Arc<RunStats>, quiet: bool) -> Self {
        Self {
            shell,
            scratch_dir,
            locks: KeyedLocks::new(),
            stats,
            quiet,
        }
    }

    /// Expand `wordlist` with `rule` into `dest_dir` (default: scratch)
    pub fn apply(&self, wordlist: &Path, rule: &Path, dest_dir: Option<&Path>) -> Result<PathBuf> {
        let dest_dir = dest_dir.unwrap_or(&self.scratch_dir);
        let destination = dest_dir.join(artifact_name(wordlist, rule));

        let slot = self.locks.slot(&destination);
        let _held = hold(&slot);

        if destination.is_file() {
            log::debug!("`{}` already exists, skipping", destination.display());
            self.stats.add_rule_skipped();
            return Ok(destination);
        }

        for input in [wordlist, rule] {
            if !input.is_file() {
                return Err(CombinatorError::MissingFile {
                    path: input.to_path_buf(),
                });
            }
        }

        log::info!(
            "Processing `{}` with rule `{}`",
            wordlist.display(),
            rule.display()
        );
        crate::output::ensure_parent(&destination)?;
        self.shell.expand_rule(rule, wordlist, &destination)?;
        self.stats.add_rule_expanded();

        Ok(destination)
    }

    /// Apply every rule to every wordlist
    ///
    /// Rules run one after another; the wordlists under one rule are
    /// expanded concurrently.
    pub fn apply_all(&self, wordlists: &[PathBuf], rules: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut produced = Vec::with_capacity(wordlists.len() * rules.len());
        let pb = create_progress_bar(
            (wordlists.len() * rules.len()) as u64,
            "Expanding rules...",
            self.quiet,
        );

        for rule in rules {
            log::info!("Processing wordlists with rules `{}`", rule.display());
            let batch = wordlists
                .par_iter()
                .map(|wordlist| {
                    let result = self.apply(wordlist, rule, None);
                    pb.inc(1);
                    result
                })
                .collect::<Result<Vec<_>>>();
            match batch {
                Ok(paths) => produced.extend(paths),
                Err(e) => {
                    pb.abandon();
                    return Err(e);
                }
            }
        }

        pb.finish_and_clear();
        Ok(produced)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::testutil::{read_lines, Fixture};

    #[test]
    fn test_artifact_name() {
        assert_eq!(
            artifact_name(Path::new("/w/data/keywords.txt"), Path::new("/w/data/hashcat.rule")),
            "hashcat-data-keywords.txt"
        );
    }

    #[test]
    fn test_apply_expands_sorts_and_dedupes() {
        let fixture = Fixture::new();
        let wordlist = fixture.write("data/keywords.txt", &["cerveja", "acapulco", "acapulco"]);
        let rule = fixture.write("data/hashcat.rule", &[":", "u"]);
        let applier = fixture.rule_applier();

        let out = applier.apply(&wordlist, &rule, None).unwrap();

        assert_eq!(out, fixture.temp_path("hashcat-data-keywords.txt"));
        assert_eq!(
            read_lines(&out),
            vec!["ACAPULCO", "acapulco", "CERVEJA", "cerveja"]
        );
    }

    #[test]
    fn test_existing_artifact_is_not_recomputed() {
        let fixture = Fixture::new();
        let wordlist = fixture.write("data/keywords.txt", &["acapulco"]);
        let rule = fixture.write("data/hashcat.rule", &[":", "u"]);
        let existing = fixture.write("tmp/hashcat-data-keywords.txt", &["precomputed"]);
        let applier = fixture.rule_applier();

        let out = applier.apply(&wordlist, &rule, None).unwrap();

        assert_eq!(out, existing);
        assert_eq!(read_lines(&out), vec!["precomputed"]);
    }

    #[test]
    fn test_missing_wordlist() {
        let fixture = Fixture::new();
        let rule = fixture.write("data/hashcat.rule", &[":"]);
        let applier = fixture.rule_applier();

        let err = applier
            .apply(&fixture.root().join("data/nope.txt"), &rule, None)
            .unwrap_err();

        assert!(matches!(err, CombinatorError::MissingFile { .. }));
        assert!(!fixture.temp_path("hashcat-data-nope.txt").exists());
    }

    #[test]
    fn test_apply_into_other_directory() {
        let fixture = Fixture::new();
        let wordlist = fixture.write("data/keywords.txt", &["acapulco"]);
        let rule = fixture.write("data/hashcat.rule", &["u"]);
        let dest_dir = fixture.out_path("expanded");
        let applier = fixture.rule_applier();

        let out = applier.apply(&wordlist, &rule, Some(&dest_dir)).unwrap();

        assert_eq!(out, dest_dir.join("hashcat-data-keywords.txt"));
        assert_eq!(read_lines(&out), vec!["ACAPULCO"]);
        assert!(!fixture.temp_path("hashcat-data-keywords.txt").exists());
    }

    #[test]
    fn test_concurrent_apply_expands_once() {
        let fixture = Fixture::new();
        let wordlist = fixture.write("data/keywords.txt", &["acapulco"]);
        let rule = fixture.write("data/hashcat.rule", &[":"]);
        let stats = Arc::new(RunStats::new());
        let applier = RuleApplier::new(
            fixture.shell(),
            fixture.root().join("tmp"),
            Arc::clone(&stats),
            true,
        );

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    applier.apply(&wordlist, &rule, None).unwrap();
                });
            }
        });

        assert_eq!(stats.get_rules_expanded(), 1);
        assert_eq!(stats.get_rules_skipped(), 3);
        assert_eq!(
            read_lines(&fixture.temp_path("hashcat-data-keywords.txt")),
            vec!["acapulco"]
        );
    }

    #[test]
    fn test_apply_all() {
        let fixture = Fixture::new();
        let a = fixture.write("data/a.txt", &["one"]);
        let b = fixture.write("data/b.txt", &["two"]);
        let upper = fixture.write("data/upper.rule", &["u"]);
        let same = fixture.write("data/same.rule", &[":"]);
        let applier = fixture.rule_applier();

        let produced = applier.apply_all(&[a, b], &[upper, same]).unwrap();

        assert_eq!(produced.len(), 4);
        assert_eq!(read_lines(&fixture.temp_path("upper-data-a.txt")), vec!["ONE"]);
        assert_eq!(read_lines(&fixture.temp_path("same-data-b.txt")), vec!["two"]);
    }
}
