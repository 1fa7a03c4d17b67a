// External crates
use clap::Parser;

// Internal imports
use orca_core::{orca_error, orca_error_hint, OrcaError};
use orca_orchestrator::OrchestratorError;

// Local modules
mod cli;
mod commands;

use cli::Args;
use commands::execute_command;

fn main() {
    let args = Args::parse();

    if let Err(e) = execute_command(args) {
        orca_error!("{e:#}");
        if let Some(hint) = hint_for(&e) {
            orca_error_hint!("{hint}");
        }
        std::process::exit(1);
    }
}

fn hint_for(error: &anyhow::Error) -> Option<&'static str> {
    let core = match error.downcast_ref::<OrchestratorError>() {
        Some(OrchestratorError::Core(core)) => core,
        Some(_) => return None,
        None => error.downcast_ref::<OrcaError>()?,
    };

    match core {
        OrcaError::UnknownWorkspace(_) => Some("Run `orca ws ls` to see registered workspaces"),
        OrcaError::Dependency(_) => Some("Run `orca check` after installing the missing tools"),
        _ => None,
    }
}
