use std::path::{Path, PathBuf};

use orca_core::error::{OrcaError, Result};
use orca_core::{CommandRunner, CommandSpec, HostCommandRunner};
use tracing::debug;

/// A local branch as listed by `git branch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub name: String,
    pub current: bool,
}

/// Parses `git branch --list` output. Only the first line marked with `*`
/// is taken as the current branch.
pub fn parse_branches(output: &str) -> Vec<Branch> {
    let mut branches = Vec::new();
    let mut seen_current = false;

    for line in output.lines() {
        let current = !seen_current && line.starts_with('*');
        seen_current |= current;

        let name = line.trim_start_matches('*').trim();
        if name.is_empty() {
            continue;
        }
        branches.push(Branch {
            name: name.to_string(),
            current,
        });
    }
    branches
}

/// The version control operations workspace setup and the `g` helpers need.
///
/// Branch operations act on the repository containing `dir`.
pub trait VersionControl {
    /// Top-level directory of the repository containing `path`.
    fn repository_root(&self, path: &Path) -> Result<PathBuf>;

    fn clone_repository(&self, url: &str, target: &Path) -> Result<()>;

    fn is_repository(&self, dir: &Path) -> bool;

    fn branches(&self, dir: &Path) -> Result<Vec<Branch>>;

    /// `branch` may be `-` for the previously checked out branch.
    fn checkout(&self, dir: &Path, branch: &str) -> Result<()>;

    fn pull(&self, dir: &Path, branch: &str) -> Result<()>;

    fn push(&self, dir: &Path, branch: &str, force: bool) -> Result<()>;

    fn rebase_interactive(&self, dir: &Path, commits: u32) -> Result<()>;

    /// Drops the last `commits` commits along with any uncommitted changes.
    fn reset_hard(&self, dir: &Path, commits: u32) -> Result<()>;

    /// One line per commit, newest first.
    fn log_oneline(&self, dir: &Path) -> Result<Vec<String>>;
}

/// [`VersionControl`] backed by the `git` CLI.
#[derive(Debug, Clone, Default)]
pub struct GitCli<R = HostCommandRunner> {
    runner: R,
}

impl GitCli {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: CommandRunner> GitCli<R> {
    pub fn with_runner(runner: R) -> Self {
        Self { runner }
    }
}

impl<R: CommandRunner> VersionControl for GitCli<R> {
    fn repository_root(&self, path: &Path) -> Result<PathBuf> {
        let dir = if path.is_dir() {
            path
        } else {
            path.parent().unwrap_or(path)
        };

        let spec = CommandSpec::new("git")
            .args(["rev-parse", "--show-toplevel"])
            .current_dir(dir);
        let root = self.runner.capture(&spec)?.stdout.trim().to_string();

        if root.is_empty() {
            return Err(OrcaError::Config(format!(
                "{} is not inside a git repository",
                path.display()
            )));
        }

        debug!(path = %path.display(), root = %root, "resolved repository root");
        Ok(PathBuf::from(root))
    }

    fn clone_repository(&self, url: &str, target: &Path) -> Result<()> {
        if url.is_empty() || target.as_os_str().is_empty() {
            return Err(OrcaError::InvalidInput {
                target: "git clone".to_string(),
                message: "repository URL and target cannot be empty".to_string(),
            });
        }

        self.runner.run(
            &CommandSpec::new("git")
                .arg("clone")
                .arg(url)
                .arg(target.to_string_lossy()),
        )
    }

    fn is_repository(&self, dir: &Path) -> bool {
        let spec = CommandSpec::new("git")
            .args(["rev-parse", "--is-inside-work-tree"])
            .current_dir(dir);
        match self.runner.capture(&spec) {
            Ok(output) => output.stdout.trim() == "true",
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "not inside a git work tree");
                false
            }
        }
    }

    fn branches(&self, dir: &Path) -> Result<Vec<Branch>> {
        let spec = CommandSpec::new("git")
            .args(["branch", "--list"])
            .current_dir(dir);
        Ok(parse_branches(&self.runner.capture(&spec)?.stdout))
    }

    fn checkout(&self, dir: &Path, branch: &str) -> Result<()> {
        self.runner.run(
            &CommandSpec::new("git")
                .args(["checkout", branch])
                .current_dir(dir),
        )
    }

    fn pull(&self, dir: &Path, branch: &str) -> Result<()> {
        self.runner.run(
            &CommandSpec::new("git")
                .args(["pull", "origin", branch])
                .current_dir(dir),
        )
    }

    fn push(&self, dir: &Path, branch: &str, force: bool) -> Result<()> {
        let mut spec = CommandSpec::new("git").arg("push");
        if force {
            spec = spec.arg("-f");
        }
        self.runner
            .run(&spec.args(["origin", branch]).current_dir(dir))
    }

    fn rebase_interactive(&self, dir: &Path, commits: u32) -> Result<()> {
        self.runner.run(
            &CommandSpec::new("git")
                .args(["rebase", "-i"])
                .arg(format!("HEAD~{commits}"))
                .current_dir(dir),
        )
    }

    fn reset_hard(&self, dir: &Path, commits: u32) -> Result<()> {
        self.runner.run(
            &CommandSpec::new("git")
                .args(["reset", "--hard"])
                .arg(format!("HEAD~{commits}"))
                .current_dir(dir),
        )
    }

    fn log_oneline(&self, dir: &Path) -> Result<Vec<String>> {
        let spec = CommandSpec::new("git")
            .args(["log", "--oneline"])
            .current_dir(dir);
        Ok(self
            .runner
            .capture(&spec)?
            .stdout
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect())
    }
}
