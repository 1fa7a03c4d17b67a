//! `orca g`: git shortcuts for the repository in the current directory.

use std::io;

use anyhow::{Context, Result};
use dialoguer::{theme::ColorfulTheme, Confirm, Select};
use orca_core::error::Result as CoreResult;
use orca_core::{orca_info, orca_println, orca_success, OrcaError};
use orca_orchestrator::{BranchWorkflow, CheckoutOutcome, GitCli, Prompt};

use crate::cli::GSubcommand;

/// Asks on the terminal.
struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn select(&self, title: &str, options: &[String]) -> CoreResult<Option<usize>> {
        Select::with_theme(&ColorfulTheme::default())
            .with_prompt(title)
            .items(options)
            .default(0)
            .interact_opt()
            .map_err(|e| OrcaError::Io(io::Error::other(e)))
    }

    fn confirm(&self, question: &str) -> CoreResult<bool> {
        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(question)
            .default(false)
            .interact()
            .map_err(|e| OrcaError::Io(io::Error::other(e)))
    }
}

pub fn handle_g_command(command: GSubcommand) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to determine the current directory")?;
    let git = GitCli::new();
    let prompt = TerminalPrompt;
    let workflow = BranchWorkflow::new(&git, &prompt, cwd);

    match command {
        GSubcommand::Co { search, pull } => match workflow.checkout(&search, pull)? {
            CheckoutOutcome::AlreadyCurrent(_) => orca_info!("Branch is already checked out!"),
            CheckoutOutcome::Switched(branch) => orca_success!("Checked out {branch}"),
        },
        GSubcommand::Branches { search } => {
            let listing = workflow.branches(&search)?;
            if listing.is_empty() {
                orca_info!("No matching branches found!");
            }
            if let Some(current) = &listing.current {
                orca_success!("[current] {current}");
            }
            for branch in &listing.others {
                orca_println!("  {branch}");
            }
        }
        GSubcommand::Pull => {
            let branch = workflow.pull()?;
            orca_success!("Pulled {branch}");
        }
        GSubcommand::Rbi { number } => workflow.rebase_interactive(number)?,
        GSubcommand::Push { force } => {
            let branch = workflow.push(force)?;
            orca_success!("Pushed {branch}");
        }
        GSubcommand::Undo { number, yes } => {
            if !workflow.undo(number, yes)? {
                orca_info!("Aborting");
            }
        }
        GSubcommand::Logl { number } => {
            for line in workflow.log(number)? {
                orca_println!("{line}");
            }
        }
    }
    Ok(())
}
