//! Variant differencing for named list families
//!
//! A family `<prefix>-{basic,extended,all}.txt` lives in one directory under
//! the base root. Differencing prunes from `extended` everything already in
//! `basic`, normalizes `basic` in place and rebuilds `all` as the sorted
//! union of the two.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{CombinatorError, Result};
use crate::output::{concat, delete, move_file};
use crate::progress::RunStats;
use crate::shell::{Collation, Shell};

/// Variant names of a list family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffVariants {
    pub left: String,
    pub right: String,
    pub output: String,
}

impl Default for DiffVariants {
    fn default() -> Self {
        Self {
            left: "basic".to_string(),
            right: "extended".to_string(),
            output: "all".to_string(),
        }
    }
}

pub struct SetDiffer {
    shell: Arc<Shell>,
    base_dir: PathBuf,
    scratch_dir: PathBuf,
    stats: Arc<RunStats>,
}

impl SetDiffer {
    pub fn new(shell: Arc<Shell>, base_dir: PathBuf, scratch_dir: PathBuf, stats: Arc<RunStats>) -> Self {
        Self {
            shell,
            base_dir,
            scratch_dir,
            stats,
        }
    }

    /// Difference the family `list_prefix` found in `path` (relative to base)
    pub fn diff(&self, path: &Path, list_prefix: &str, variants: &DiffVariants) -> Result<()> {
        let dir = self.base_dir.join(path);
        let left_file = dir.join(format!("{}-{}.txt", list_prefix, variants.left));
        let right_file = dir.join(format!("{}-{}.txt", list_prefix, variants.right));
        let output_file = dir.join(format!("{}-{}.txt", list_prefix, variants.output));

        for file in [&left_file, &right_file] {
            if !file.is_file() {
                return Err(CombinatorError::MissingFile { path: file.clone() });
            }
        }

        log::info!("Diffing `{}` in `{}`", list_prefix, dir.display());
        let left_temp = self
            .scratch_dir
            .join(format!("{}-diff-{}.txt", list_prefix, variants.left));
        let right_temp = self
            .scratch_dir
            .join(format!("{}-diff-{}.txt", list_prefix, variants.right));

        self.shell
            .sort_file(&left_file, &left_temp, Collation::Bytes, true)?;
        self.shell
            .sort_file(&right_file, &right_temp, Collation::Bytes, true)?;
        self.shell
            .set_difference(&left_temp, &right_temp, &right_file)?;
        delete(&right_temp)?;

        delete(&left_file)?;
        move_file(&left_temp, &left_file)?;

        let output_temp = self
            .scratch_dir
            .join(format!("{}-diff-{}.txt", list_prefix, variants.output));
        concat(&output_temp, &[&left_file, &right_file])?;
        if let Err(e) = self
            .shell
            .sort_file(&output_temp, &output_temp, Collation::FoldCase, false)
        {
            let _ = delete(&output_temp);
            return Err(e);
        }
        move_file(&output_temp, &output_file)?;

        self.stats.add_diff();
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::testutil::{read_lines, Fixture};

    #[test]
    fn test_diff_prunes_extended_and_builds_all() {
        let fixture = Fixture::new();
        let basic = fixture.write("data/lists/pw-basic.txt", &["zeta", "alpha", "beta"]);
        let extended = fixture.write("data/lists/pw-extended.txt", &["beta", "Gamma", "alpha", "delta"]);
        let differ = fixture.set_differ();

        differ
            .diff(Path::new("data/lists"), "pw", &DiffVariants::default())
            .unwrap();

        assert_eq!(read_lines(&basic), vec!["alpha", "beta", "zeta"]);
        assert_eq!(read_lines(&extended), vec!["Gamma", "delta"]);
        assert_eq!(
            read_lines(&fixture.root().join("data/lists/pw-all.txt")),
            vec!["alpha", "beta", "delta", "Gamma", "zeta"]
        );
    }

    #[test]
    fn test_diff_is_idempotent() {
        let fixture = Fixture::new();
        fixture.write("data/pw-basic.txt", &["one", "two"]);
        fixture.write("data/pw-extended.txt", &["two", "three"]);
        let differ = fixture.set_differ();
        let variants = DiffVariants::default();

        differ.diff(Path::new("data"), "pw", &variants).unwrap();
        let snapshot: Vec<_> = ["basic", "extended", "all"]
            .iter()
            .map(|v| read_lines(&fixture.root().join(format!("data/pw-{}.txt", v))))
            .collect();

        differ.diff(Path::new("data"), "pw", &variants).unwrap();
        let again: Vec<_> = ["basic", "extended", "all"]
            .iter()
            .map(|v| read_lines(&fixture.root().join(format!("data/pw-{}.txt", v))))
            .collect();

        assert_eq!(snapshot, again);
    }

    #[test]
    fn test_extended_already_known_becomes_empty() {
        let fixture = Fixture::new();
        fixture.write("data/pw-basic.txt", &["one", "two", "three"]);
        let extended = fixture.write("data/pw-extended.txt", &["three", "one"]);
        let differ = fixture.set_differ();

        differ
            .diff(Path::new("data"), "pw", &DiffVariants::default())
            .unwrap();

        assert!(read_lines(&extended).is_empty());
        assert_eq!(
            read_lines(&fixture.root().join("data/pw-all.txt")),
            vec!["one", "three", "two"]
        );
    }

    #[test]
    fn test_failed_sort_keeps_previous_all() {
        let fixture = Fixture::new();
        fixture.write("data/pw-basic.txt", &["one"]);
        fixture.write("data/pw-extended.txt", &["two"]);
        let all = fixture.write("data/pw-all.txt", &["previous"]);
        let mut config = fixture.config();
        config.tools.sort = fixture.sort_refusing_all();
        let differ = SetDiffer::new(
            fixture.shell_for(&config),
            fixture.root().to_path_buf(),
            fixture.root().join("tmp"),
            Arc::new(RunStats::new()),
        );

        let err = differ
            .diff(Path::new("data"), "pw", &DiffVariants::default())
            .unwrap_err();

        assert!(matches!(err, CombinatorError::CommandFailed { .. }));
        assert_eq!(read_lines(&all), vec!["previous"]);
        assert!(!fixture.temp_path("pw-diff-all.txt").exists());
    }

    #[test]
    fn test_custom_variants_and_missing_file() {
        let fixture = Fixture::new();
        fixture.write("data/pw-old.txt", &["a"]);
        let differ = fixture.set_differ();
        let variants = DiffVariants {
            left: "old".to_string(),
            right: "new".to_string(),
            output: "merged".to_string(),
        };

        let err = differ.diff(Path::new("data"), "pw", &variants).unwrap_err();

        assert!(matches!(err, CombinatorError::MissingFile { path } if path.ends_with("pw-new.txt")));
    }
}
