//! Workflow definitions
//!
//! A workflow declares its source wordlists and rules and drives the
//! pipeline in its `process` step. Workflows are selected by name from a
//! static registry.

use std::path::PathBuf;

use crate::combinator::Combinator;
use crate::error::Result;

/// One wordlist-building recipe
pub trait Workflow: Send + Sync {
    /// Name used to select the workflow
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// Source wordlists, relative to the base root
    fn wordlists(&self) -> Vec<&str> {
        Vec::new()
    }

    /// Rule files, relative to the base root
    fn rules(&self) -> Vec<&str> {
        Vec::new()
    }

    /// Prepare artifacts; expands every wordlist with every rule by default
    fn setup(&self, combinator: &Combinator) -> Result<()> {
        let wordlists: Vec<PathBuf> = self
            .wordlists()
            .into_iter()
            .map(|w| combinator.base(w))
            .collect();
        let rules: Vec<PathBuf> = self
            .rules()
            .into_iter()
            .map(|r| combinator.base(r))
            .collect();

        if !wordlists.is_empty() && !rules.is_empty() {
            combinator.apply_rules(&wordlists, &rules)?;
        }
        Ok(())
    }

    /// The workflow-specific sequence of combine, merge and diff steps
    fn process(&self, combinator: &Combinator) -> Result<()>;
}

/// Known workflows, looked up by name
pub struct WorkflowRegistry {
    workflows: Vec<Box<dyn Workflow>>,
}

impl WorkflowRegistry {
    pub fn new() -> Self {
        Self {
            workflows: Vec::new(),
        }
    }

    /// Registry holding the built-in workflows
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(Passwords));
        registry.register(Box::new(PasswordsDelta));
        registry
    }

    /// Add a workflow, replacing one with the same name
    pub fn register(&mut self, workflow: Box<dyn Workflow>) {
        self.workflows.retain(|w| w.name() != workflow.name());
        self.workflows.push(workflow);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Workflow> {
        self.workflows
            .iter()
            .find(|w| w.name() == name)
            .map(|w| &**w)
    }

    pub fn names(&self) -> Vec<&str> {
        self.workflows.iter().map(|w| w.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Workflow> {
        self.workflows.iter().map(|w| &**w)
    }
}

impl Default for WorkflowRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Keywords expanded by rules, surrounded by special-character bits
pub struct Passwords;

impl Workflow for Passwords {
    fn name(&self) -> &str {
        "passwords"
    }

    fn description(&self) -> &str {
        "data/keywords.txt x data/hashcat.rule, combined with data/bits.txt into passwords.txt"
    }

    fn wordlists(&self) -> Vec<&str> {
        vec!["data/keywords.txt"]
    }

    fn rules(&self) -> Vec<&str> {
        vec!["data/hashcat.rule"]
    }

    fn process(&self, c: &Combinator) -> Result<()> {
        let keywords = c.temp("hashcat-data-keywords.txt");
        let bits = c.base("data/bits.txt");

        c.merge(
            &c.output("passwords.txt"),
            &[
                c.right(&keywords, &bits)?,
                c.left(&keywords, &bits)?,
                c.both(&keywords, &bits)?,
            ],
            None,
        )
    }
}

/// Only the passwords not seen in the `passwords-all` family yet
pub struct PasswordsDelta;

impl Workflow for PasswordsDelta {
    fn name(&self) -> &str {
        "passwords-delta"
    }

    fn description(&self) -> &str {
        "normalizes data/passwords-{basic,extended,all}, then writes unseen combinations to passwords-new.txt"
    }

    fn wordlists(&self) -> Vec<&str> {
        vec!["data/keywords.txt"]
    }

    fn rules(&self) -> Vec<&str> {
        vec!["data/hashcat.rule"]
    }

    fn process(&self, c: &Combinator) -> Result<()> {
        c.diff("data", "passwords")?;

        let keywords = c.temp("hashcat-data-keywords.txt");
        let bits = c.base("data/bits.txt");
        let baseline = c.base("data/passwords-all.txt");

        c.merge(
            &c.output("passwords-new.txt"),
            &[c.right(&keywords, &bits)?, c.left(&keywords, &bits)?],
            Some(&baseline),
        )
    }
}
