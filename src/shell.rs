//! External tool invocation
//!
//! Every heavy operation (rule expansion, pairwise combination, sorting,
//! set differences) is delegated to an external program. Programs are
//! chained into pipelines whose final stdout lands in a file; the collation
//! locale is passed to each process explicitly.

use std::ffi::OsStr;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};

use sha2::{Digest, Sha256};

use crate::config::{Environment, SortMemory, ToolPaths};
use crate::error::{CombinatorError, Result};

/// Ordering used by `sort`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collation {
    /// Case-folded, ties broken by byte order (`sort -f`)
    FoldCase,
    /// Plain byte order, as required by `comm` and `rli2`
    Bytes,
}

/// Settings shared by every `sort` invocation
#[derive(Debug, Clone)]
pub struct SortSettings {
    pub temp_dir: PathBuf,
    pub cores: usize,
    pub memory: SortMemory,
}

/// A chain of commands connected stdout to stdin
pub struct Pipeline {
    stages: Vec<Command>,
}

impl Pipeline {
    pub fn new(first: Command) -> Self {
        Self {
            stages: vec![first],
        }
    }

    /// Append a stage reading the previous stage's output
    pub fn pipe(mut self, next: Command) -> Self {
        self.stages.push(next);
        self
    }

    /// Run the pipeline, truncating `dest` with the final output
    pub fn write_to(self, dest: &Path) -> Result<()> {
        let file = File::create(dest).map_err(|e| CombinatorError::file(dest, e))?;
        self.run_into(file, dest, ">")
    }

    /// Run the pipeline, appending the final output to `dest`
    pub fn append_to(self, dest: &Path) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dest)
            .map_err(|e| CombinatorError::file(dest, e))?;
        self.run_into(file, dest, ">>")
    }

    /// Run the pipeline, writing into `<dest>.part` and renaming on success
    ///
    /// A failed run never leaves a file at `dest`.
    pub fn write_atomic(self, dest: &Path) -> Result<()> {
        let partial = partial_path(dest);
        match self.write_to(&partial) {
            Ok(()) => fs::rename(&partial, dest).map_err(|e| CombinatorError::file(dest, e)),
            Err(e) => {
                let _ = fs::remove_file(&partial);
                Err(e)
            }
        }
    }

    /// Run the pipeline for its side effects only
    pub fn run(self) -> Result<()> {
        let description = self.to_string();
        log::debug!(" $ {}", description);
        self.execute(Stdio::inherit(), description)
    }

    fn run_into(self, file: File, dest: &Path, redirect: &str) -> Result<()> {
        let description = format!("{} {} {}", self, redirect, dest.display());
        log::debug!(" $ {}", description);
        self.execute(Stdio::from(file), description)
    }

    fn execute(self, sink: Stdio, description: String) -> Result<()> {
        let count = self.stages.len();
        let mut children: Vec<Child> = Vec::with_capacity(count);
        let mut sink = Some(sink);

        for (idx, mut cmd) in self.stages.into_iter().enumerate() {
            if let Some(prev) = children.last_mut() {
                if let Some(stdout) = prev.stdout.take() {
                    cmd.stdin(Stdio::from(stdout));
                }
            }
            if idx + 1 == count {
                if let Some(sink) = sink.take() {
                    cmd.stdout(sink);
                }
            } else {
                cmd.stdout(Stdio::piped());
            }

            match cmd.spawn() {
                Ok(child) => children.push(child),
                Err(source) => {
                    for mut child in children {
                        let _ = child.kill();
                        let _ = child.wait();
                    }
                    return Err(CombinatorError::Spawn {
                        program: cmd.get_program().to_string_lossy().into_owned(),
                        source,
                    });
                }
            }
        }

        settle(children.into_iter().map(|mut child| child.wait()), description)
    }
}

/// Fold the exit of every stage into one result
///
/// Every status is consumed, so no stage is left unreaped after an error.
fn settle(
    statuses: impl IntoIterator<Item = io::Result<ExitStatus>>,
    description: String,
) -> Result<()> {
    let mut failure = None;
    let mut wait_error = None;
    for status in statuses {
        match status {
            Ok(status) if !status.success() => {
                failure.get_or_insert(status.code());
            }
            Ok(_) => {}
            Err(e) => {
                wait_error.get_or_insert(e);
            }
        }
    }

    if let Some(e) = wait_error {
        return Err(CombinatorError::Io(e));
    }
    match failure {
        Some(code) => Err(CombinatorError::CommandFailed {
            command: description,
            code,
        }),
        None => Ok(()),
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, cmd) in self.stages.iter().enumerate() {
            if idx > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{}", cmd.get_program().to_string_lossy())?;
            for arg in cmd.get_args() {
                write!(f, " {}", arg.to_string_lossy())?;
            }
        }
        Ok(())
    }
}

/// Path used while an artifact is being written
pub fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

/// Builder of tool invocations for one pipeline run
#[derive(Debug, Clone)]
pub struct Shell {
    tools: ToolPaths,
    sort: SortSettings,
    locale: String,
    comm_nocheck: bool,
}

impl Shell {
    pub fn new(env: Environment, sort: SortSettings, locale: impl Into<String>) -> Self {
        Self {
            tools: env.tools,
            sort,
            locale: locale.into(),
            comm_nocheck: env.comm_nocheck,
        }
    }

    pub fn tools(&self) -> &ToolPaths {
        &self.tools
    }

    fn command(&self, program: &Path) -> Command {
        let mut cmd = Command::new(program);
        cmd.env("LC_ALL", &self.locale);
        cmd
    }

    /// `sort` with the configured parallelism, memory and scratch directory
    pub fn sort_command(&self, collation: Collation, unique: bool) -> Command {
        let mut cmd = self.command(&self.tools.sort);
        if collation == Collation::FoldCase {
            cmd.arg("-f");
        }
        cmd.arg("-T")
            .arg(&self.sort.temp_dir)
            .arg(format!("--parallel={}", self.sort.cores.max(1)))
            .arg("-S")
            .arg(self.sort.memory.as_sort_arg());
        if unique {
            cmd.arg("-u");
        }
        cmd
    }

    fn uniq_command(&self) -> Command {
        self.command(&self.tools.uniq)
    }

    /// `hashcat --stdout -r rule wordlist | sort | uniq > dest`
    pub fn expand_rule(&self, rule: &Path, wordlist: &Path, dest: &Path) -> Result<()> {
        let mut hashcat = self.command(&self.tools.hashcat);
        hashcat
            .arg("--stdout")
            .arg(format!("--session={}", session_name(rule, wordlist)))
            .arg("-r")
            .arg(rule)
            .arg(wordlist)
            .stderr(Stdio::null());

        Pipeline::new(hashcat)
            .pipe(self.sort_command(Collation::FoldCase, false))
            .pipe(self.uniq_command())
            .write_atomic(dest)
    }

    /// `combinator left right > dest`: left tokens prefix right tokens
    pub fn combine(&self, left: &Path, right: &Path, dest: &Path) -> Result<()> {
        let mut combinator = self.command(&self.tools.combinator);
        combinator.arg(left).arg(right);
        Pipeline::new(combinator).write_atomic(dest)
    }

    /// Sort `source` into `output` (which may be the same file)
    pub fn sort_file(
        &self,
        source: &Path,
        output: &Path,
        collation: Collation,
        unique: bool,
    ) -> Result<()> {
        let mut sort = self.sort_command(collation, unique);
        sort.arg(source).arg("-o").arg(output);
        Pipeline::new(sort).run()
    }

    /// `sort inputs... | uniq > output`
    pub fn sort_unique<P: AsRef<OsStr>>(&self, inputs: &[P], output: &Path) -> Result<()> {
        let mut sort = self.sort_command(Collation::FoldCase, false);
        sort.args(inputs);
        Pipeline::new(sort).pipe(self.uniq_command()).write_to(output)
    }

    /// `rli2 candidate baseline > output`: candidate lines absent from baseline
    pub fn list_difference(&self, candidate: &Path, baseline: &Path, output: &Path) -> Result<()> {
        let mut rli2 = self.command(&self.tools.rli2);
        rli2.arg(candidate).arg(baseline);
        Pipeline::new(rli2).write_to(output)
    }

    /// `comm -13 left right > output`: lines unique to `right`
    pub fn set_difference(&self, left: &Path, right: &Path, output: &Path) -> Result<()> {
        let mut comm = self.command(&self.tools.comm);
        if self.comm_nocheck {
            comm.arg("--nocheck-order");
        }
        comm.arg("-13").arg(left).arg(right);
        Pipeline::new(comm).write_atomic(output)
    }
}

/// hashcat session name, distinct for each (rule, wordlist) pair
fn session_name(rule: &Path, wordlist: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(rule.as_os_str().as_encoded_bytes());
    hasher.update(b"\n");
    hasher.update(wordlist.as_os_str().as_encoded_bytes());
    format!("wordlist-combinator-{}", hex_prefix(&hasher.finalize(), 8))
}

/// Lowercase hex of the first `bytes` bytes of a digest
pub fn hex_prefix(digest: &[u8], bytes: usize) -> String {
    use std::fmt::Write as _;

    let mut hex = String::with_capacity(bytes * 2);
    for b in digest.iter().take(bytes) {
        let _ = write!(hex, "{b:02x}");
    }
    hex
}

/// Resolve a program the way a shell would: paths as-is, bare names on `PATH`
pub fn find_binary(name: &Path) -> Option<PathBuf> {
    if name.components().count() > 1 {
        return is_executable(name).then(|| name.to_path_buf());
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Whether `comm` understands `--nocheck-order` (BSD `comm` does not)
pub fn comm_supports_nocheck(comm: &Path, locale: &str) -> bool {
    let null = if cfg!(windows) { "NUL" } else { "/dev/null" };
    Command::new(comm)
        .env("LC_ALL", locale)
        .arg("--nocheck-order")
        .arg(null)
        .arg(null)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}
