//! Orchestration runner
//!
//! Owns one instance of every pipeline component for the duration of a run
//! and drives a [`Workflow`] through its setup and process steps. Memo
//! caches live as long as the `Combinator`, i.e. one orchestration run.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::combine::{CombineMode, PairCombiner};
use crate::config::CombinatorConfig;
use crate::diff::{DiffVariants, SetDiffer};
use crate::error::Result;
use crate::merge::DivideConquerMerger;
use crate::output;
use crate::paths::{PathResolver, Root};
use crate::progress::{format_duration, RunStats};
use crate::rules::RuleApplier;
use crate::shell::{Shell, SortSettings};
use crate::workflow::Workflow;

pub struct Combinator {
    config: CombinatorConfig,
    shell: Arc<Shell>,
    paths: PathResolver,
    rules: RuleApplier,
    combiner: PairCombiner,
    merger: DivideConquerMerger,
    differ: SetDiffer,
    stats: Arc<RunStats>,
}

impl Combinator {
    /// Validate the environment and assemble the pipeline
    pub fn new(config: CombinatorConfig) -> Result<Self> {
        let env = config.validate()?;
        let shell = Arc::new(Shell::new(
            env,
            SortSettings {
                temp_dir: config.temp_dir.clone(),
                cores: config.cores,
                memory: config.memory,
            },
            config.locale.clone(),
        ));
        let stats = Arc::new(RunStats::new());
        let temp = config.temp_dir.clone();

        Ok(Self {
            paths: PathResolver::new(
                config.base_dir.clone(),
                temp.clone(),
                config.output_dir.clone(),
            ),
            rules: RuleApplier::new(
                Arc::clone(&shell),
                temp.clone(),
                Arc::clone(&stats),
                config.quiet,
            ),
            combiner: PairCombiner::new(Arc::clone(&shell), temp.clone(), Arc::clone(&stats)),
            merger: DivideConquerMerger::new(
                Arc::clone(&shell),
                temp.clone(),
                config.min_length,
                Arc::clone(&stats),
            ),
            differ: SetDiffer::new(
                Arc::clone(&shell),
                config.base_dir.clone(),
                temp,
                Arc::clone(&stats),
            ),
            shell,
            stats,
            config,
        })
    }

    /// Run `workflow`: setup, then process
    pub fn run(&self, workflow: &dyn Workflow) -> Result<()> {
        let time_start = Instant::now();
        log::info!("Processing with workflow: {}", workflow.name());
        log::info!("Base directory: {}", self.config.base_dir.display());
        log::info!("Temporary directory: {}", self.config.temp_dir.display());
        log::info!("Output directory: {}", self.config.output_dir.display());
        log::info!("Using {} cores", self.config.cores);
        log::info!("Using {} of memory", self.config.memory);
        log::debug!("Tools: {:?}", self.shell.tools());

        workflow.setup(self)?;
        workflow.process(self)?;

        log::info!("Total time: {}", format_duration(time_start.elapsed()));
        log::info!(
            "Done! You may want to clean up the temporary directory yourself: {}",
            self.config.temp_dir.display()
        );
        Ok(())
    }

    pub fn config(&self) -> &CombinatorConfig {
        &self.config
    }

    pub fn stats(&self) -> Arc<RunStats> {
        Arc::clone(&self.stats)
    }

    /// Path of `name` under the base (source) root
    pub fn base(&self, name: &str) -> PathBuf {
        self.paths.resolve(Root::Base, name)
    }

    /// Path of `name` under the scratch root
    pub fn temp(&self, name: &str) -> PathBuf {
        self.paths.resolve(Root::Temp, name)
    }

    /// Path of `name` under the output root
    pub fn output(&self, name: &str) -> PathBuf {
        self.paths.resolve(Root::Output, name)
    }

    /// Expand `wordlist` with `rule` into the scratch root
    pub fn rule(&self, wordlist: &Path, rule: &Path) -> Result<PathBuf> {
        self.rules.apply(wordlist, rule, None)
    }

    /// Expand `wordlist` with `rule` into `dest_dir`
    pub fn rule_into(&self, wordlist: &Path, rule: &Path, dest_dir: &Path) -> Result<PathBuf> {
        self.rules.apply(wordlist, rule, Some(dest_dir))
    }

    /// Expand every wordlist with every rule
    pub fn apply_rules(&self, wordlists: &[PathBuf], rules: &[PathBuf]) -> Result<Vec<PathBuf>> {
        self.rules.apply_all(wordlists, rules)
    }

    pub fn combine(&self, mode: CombineMode, left: &Path, right: &Path) -> Result<PathBuf> {
        self.combiner.combine(mode, left, right)
    }

    /// `left + right`
    pub fn right(&self, left: &Path, right: &Path) -> Result<PathBuf> {
        self.combine(CombineMode::Right, left, right)
    }

    /// `right + left`
    pub fn left(&self, left: &Path, right: &Path) -> Result<PathBuf> {
        self.combine(CombineMode::Left, left, right)
    }

    /// `right + left + right`
    pub fn both(&self, left: &Path, right: &Path) -> Result<PathBuf> {
        self.combine(CombineMode::Both, left, right)
    }

    pub fn merge(&self, destination: &Path, wordlists: &[PathBuf], compare: Option<&Path>) -> Result<()> {
        self.merger.merge(destination, wordlists, compare)
    }

    /// Replace `destination` with the plain concatenation of `wordlists`
    pub fn concat(&self, destination: &Path, wordlists: &[PathBuf]) -> Result<()> {
        output::concat(destination, wordlists)
    }

    pub fn append(&self, source: &Path, destination: &Path) -> Result<()> {
        output::append(source, destination)
    }

    pub fn move_file(&self, source: &Path, destination: &Path) -> Result<()> {
        output::move_file(source, destination)
    }

    pub fn copy_file(&self, source: &Path, destination: &Path) -> Result<()> {
        output::copy_file(source, destination)
    }

    pub fn delete(&self, path: &Path) -> Result<()> {
        output::delete(path)
    }

    /// Difference `<prefix>-basic/extended` into `<prefix>-all` under `path`
    pub fn diff(&self, path: &str, list_prefix: &str) -> Result<()> {
        self.diff_variants(path, list_prefix, &DiffVariants::default())
    }

    pub fn diff_variants(&self, path: &str, list_prefix: &str, variants: &DiffVariants) -> Result<()> {
        self.differ.diff(Path::new(path), list_prefix, variants)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::error::CombinatorError;
    use crate::testutil::{read_lines, Fixture};
    use crate::workflow::WorkflowRegistry;

    const PASSWORDS: &[&str] = &[
        "!ACAPULCO", "!acapulco", "!ACAPULCO!", "!acapulco!", "!ACAPULCO123", "!acapulco123",
        "!CERVEJA", "!cerveja", "!CERVEJA!", "!cerveja!", "!CERVEJA123", "!cerveja123",
        "123ACAPULCO", "123acapulco", "123ACAPULCO!", "123acapulco!", "123ACAPULCO123",
        "123acapulco123", "123CERVEJA", "123cerveja", "123CERVEJA!", "123cerveja!",
        "123CERVEJA123", "123cerveja123", "ACAPULCO!", "acapulco!", "ACAPULCO123",
        "acapulco123", "CERVEJA!", "cerveja!", "CERVEJA123", "cerveja123",
    ];

    fn seed_passwords(fixture: &Fixture) {
        fixture.write("data/keywords.txt", &["acapulco", "cerveja"]);
        fixture.write("data/hashcat.rule", &[":", "u"]);
        fixture.write("data/bits.txt", &["!", "123"]);
    }

    #[test]
    fn test_passwords_workflow_end_to_end() {
        let fixture = Fixture::new();
        seed_passwords(&fixture);
        let combinator = Combinator::new(fixture.config()).unwrap();
        let registry = WorkflowRegistry::builtin();

        combinator.run(registry.get("passwords").unwrap()).unwrap();

        assert_eq!(read_lines(&fixture.out_path("passwords.txt")), PASSWORDS);
        let stats = combinator.stats();
        assert_eq!(stats.get_rules_expanded(), 1);
        assert_eq!(stats.get_combinations_run(), 3);
        assert_eq!(stats.get_merges(), 1);
    }

    #[test]
    fn test_rerun_reuses_artifacts() {
        let fixture = Fixture::new();
        seed_passwords(&fixture);
        let registry = WorkflowRegistry::builtin();
        let workflow = registry.get("passwords").unwrap();

        Combinator::new(fixture.config()).unwrap().run(workflow).unwrap();
        let second = Combinator::new(fixture.config()).unwrap();
        second.run(workflow).unwrap();

        assert_eq!(fixture.combinator_calls(), 3);
        assert_eq!(second.stats().get_rules_skipped(), 1);
        assert_eq!(read_lines(&fixture.out_path("passwords.txt")), PASSWORDS);
    }

    #[test]
    fn test_startup_failure_for_missing_binary() {
        let fixture = Fixture::new();
        let mut config = fixture.config();
        config.tools.hashcat = PathBuf::from("weedcat");

        let err = Combinator::new(config).err().unwrap();

        assert!(err.to_string().contains("Failed on startup"));
    }

    #[test]
    fn test_startup_failure_for_missing_temp() {
        let fixture = Fixture::new();
        let mut config = fixture.config();
        config.temp_dir = fixture.root().join("DOES_NOT_EXIST");

        assert!(matches!(
            Combinator::new(config),
            Err(CombinatorError::Startup { .. })
        ));
    }

    #[test]
    fn test_rule_into_output_root() {
        let fixture = Fixture::new();
        seed_passwords(&fixture);
        let combinator = Combinator::new(fixture.config()).unwrap();

        let out = combinator
            .rule_into(
                &combinator.base("data/keywords.txt"),
                &combinator.base("data/hashcat.rule"),
                &combinator.output("rules"),
            )
            .unwrap();

        assert_eq!(out, fixture.out_path("rules/hashcat-data-keywords.txt"));
        assert_eq!(read_lines(&out).len(), 4);
    }

    #[test]
    fn test_file_helpers() {
        let fixture = Fixture::new();
        let combinator = Combinator::new(fixture.config()).unwrap();
        let a = fixture.write("data/a.txt", &["one"]);
        let b = fixture.write("data/b.txt", &["two"]);
        let joined = combinator.output("nested/joined.txt");

        combinator.concat(&joined, &[a.clone(), b.clone()]).unwrap();
        combinator.append(&a, &joined).unwrap();
        combinator.copy_file(&joined, &combinator.temp("copy.txt")).unwrap();
        combinator.move_file(&b, &combinator.temp("moved.txt")).unwrap();
        combinator.delete(&a).unwrap();

        assert_eq!(read_lines(&joined), vec!["one", "two", "one"]);
        assert_eq!(read_lines(&fixture.temp_path("copy.txt")), vec!["one", "two", "one"]);
        assert_eq!(read_lines(&fixture.temp_path("moved.txt")), vec!["two"]);
        assert!(!a.exists());
        assert!(!b.exists());
    }

    #[test]
    fn test_path_roots() {
        let fixture = Fixture::new();
        let combinator = Combinator::new(fixture.config()).unwrap();

        assert_eq!(combinator.base("data/bits.txt"), fixture.root().join("data/bits.txt"));
        assert_eq!(combinator.temp("x.txt"), fixture.temp_path("x.txt"));
        assert_eq!(combinator.output("y.txt"), fixture.out_path("y.txt"));
    }
}
