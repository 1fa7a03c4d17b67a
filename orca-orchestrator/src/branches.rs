//! Everyday branch workflows behind `orca g`.
//!
//! Every operation first checks that the working directory is inside a git
//! work tree. Choices that need a human go through [`Prompt`].

use std::path::{Path, PathBuf};

use orca_core::error::Result as CoreResult;
use tracing::debug;

use crate::error::{OrchestratorError, Result};
use crate::git::{Branch, VersionControl};

/// Interactive decisions the workflows may need.
pub trait Prompt {
    /// Index of the chosen option, or `None` when the user backs out.
    fn select(&self, title: &str, options: &[String]) -> CoreResult<Option<usize>>;

    fn confirm(&self, question: &str) -> CoreResult<bool>;
}

/// Branches matching a search, split around the current one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchListing {
    pub current: Option<String>,
    pub others: Vec<String>,
}

impl BranchListing {
    pub fn is_empty(&self) -> bool {
        self.current.is_none() && self.others.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    Switched(String),
    AlreadyCurrent(String),
}

impl CheckoutOutcome {
    pub fn branch(&self) -> &str {
        match self {
            CheckoutOutcome::Switched(name) | CheckoutOutcome::AlreadyCurrent(name) => name,
        }
    }
}

pub struct BranchWorkflow<'a> {
    vcs: &'a dyn VersionControl,
    prompt: &'a dyn Prompt,
    dir: PathBuf,
}

impl<'a> BranchWorkflow<'a> {
    pub fn new(vcs: &'a dyn VersionControl, prompt: &'a dyn Prompt, dir: impl Into<PathBuf>) -> Self {
        Self {
            vcs,
            prompt,
            dir: dir.into(),
        }
    }

    fn dir(&self) -> &Path {
        &self.dir
    }

    fn ensure_repository(&self) -> Result<()> {
        if self.vcs.is_repository(self.dir()) {
            Ok(())
        } else {
            Err(OrchestratorError::InvalidExecutionContext(
                "this command must be executed from within a git repository".to_string(),
            ))
        }
    }

    /// Branches whose name contains `search` (case-sensitive).
    fn search(&self, search: &str) -> Result<Vec<Branch>> {
        Ok(self
            .vcs
            .branches(self.dir())?
            .into_iter()
            .filter(|branch| branch.name.contains(search))
            .collect())
    }

    fn current_branch(&self) -> Result<String> {
        self.vcs
            .branches(self.dir())?
            .into_iter()
            .find(|branch| branch.current)
            .map(|branch| branch.name)
            .ok_or(OrchestratorError::CurrentBranchUnknown)
    }

    pub fn branches(&self, search: &str) -> Result<BranchListing> {
        self.ensure_repository()?;

        let mut listing = BranchListing::default();
        for branch in self.search(search)? {
            if branch.current {
                listing.current = Some(branch.name);
            } else {
                listing.others.push(branch.name);
            }
        }
        Ok(listing)
    }

    /// Checks out the single branch matching `search`, asking when several
    /// match. `-` returns to the previous branch.
    pub fn checkout(&self, search: &str, pull: bool) -> Result<CheckoutOutcome> {
        self.ensure_repository()?;
        let outcome = self.switch_to(search)?;

        if pull {
            self.vcs.pull(self.dir(), outcome.branch())?;
        }
        Ok(outcome)
    }

    fn switch_to(&self, search: &str) -> Result<CheckoutOutcome> {
        if search == "-" {
            self.vcs.checkout(self.dir(), "-")?;
            return Ok(CheckoutOutcome::Switched(self.current_branch()?));
        }

        let matches = self.search(search)?;
        if let Some(current) = matches.iter().find(|b| b.current && b.name == search) {
            return Ok(CheckoutOutcome::AlreadyCurrent(current.name.clone()));
        }

        let candidates: Vec<String> = matches
            .into_iter()
            .filter(|branch| !branch.current)
            .map(|branch| branch.name)
            .collect();

        let chosen = match candidates.len() {
            0 => {
                return Err(OrchestratorError::NoBranchesFound {
                    search: search.to_string(),
                })
            }
            1 => candidates[0].clone(),
            _ => {
                let index = self
                    .prompt
                    .select("Which branch?", &candidates)?
                    .ok_or(OrchestratorError::Aborted)?;
                candidates
                    .get(index)
                    .cloned()
                    .ok_or(OrchestratorError::Aborted)?
            }
        };

        debug!(branch = %chosen, "checking out branch");
        self.vcs.checkout(self.dir(), &chosen)?;
        Ok(CheckoutOutcome::Switched(chosen))
    }

    /// Pulls the current branch from `origin`.
    pub fn pull(&self) -> Result<String> {
        self.ensure_repository()?;
        let branch = self.current_branch()?;
        self.vcs.pull(self.dir(), &branch)?;
        Ok(branch)
    }

    /// Pushes the current branch to `origin`.
    pub fn push(&self, force: bool) -> Result<String> {
        self.ensure_repository()?;
        let branch = self.current_branch()?;
        self.vcs.push(self.dir(), &branch, force)?;
        Ok(branch)
    }

    pub fn rebase_interactive(&self, commits: u32) -> Result<()> {
        self.ensure_repository()?;
        self.vcs.rebase_interactive(self.dir(), commits)?;
        Ok(())
    }

    /// Hard-resets away the last `commits` commits. Returns `false` when the
    /// user declines the confirmation.
    pub fn undo(&self, commits: u32, skip_confirmation: bool) -> Result<bool> {
        self.ensure_repository()?;

        if !skip_confirmation
            && !self
                .prompt
                .confirm("You might lose some precious changes, are you sure?")?
        {
            return Ok(false);
        }

        self.vcs.reset_hard(self.dir(), commits)?;
        Ok(true)
    }

    /// The newest `limit` commits, one line each.
    pub fn log(&self, limit: usize) -> Result<Vec<String>> {
        self.ensure_repository()?;
        let mut lines = self.vcs.log_oneline(self.dir())?;
        lines.truncate(limit);
        Ok(lines)
    }
}
