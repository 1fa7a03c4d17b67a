//! Workspace registration and checkout commands.

use anyhow::Result;
use orca_config::ConfigManager;
use orca_core::{orca_info, orca_println, orca_success};
use orca_orchestrator::{CloneOutcome, CloneRequest, GitCli, WorkspaceManager};

use crate::cli::WsSubcommand;

pub fn handle_ws_command(store: &mut ConfigManager, command: WsSubcommand) -> Result<()> {
    let mut manager = WorkspaceManager::new(store, GitCli::new());

    match command {
        WsSubcommand::Init { dir, file } => {
            let name = manager.init(&dir, &file)?;
            orca_success!("Registered workspace '{name}'");
            orca_info!("Run `orca ws clone -w {name}` to check out its projects");
        }
        WsSubcommand::Ls => {
            for listing in manager.list() {
                let marker = if listing.current { "*" } else { " " };
                orca_println!("{marker} {}\t{}", listing.name, listing.path.display());
            }
        }
        WsSubcommand::Switch { name } => {
            manager.switch(&name)?;
            orca_success!("Switched to workspace '{name}'");
        }
        WsSubcommand::Clone {
            workspace,
            project,
            target,
        } => {
            let outcomes = manager.clone_projects(&CloneRequest {
                workspace,
                project,
                target,
            })?;
            for outcome in outcomes {
                match outcome {
                    CloneOutcome::Registered { project, path } => {
                        orca_success!("{project} registered at {}", path.display())
                    }
                    CloneOutcome::Cloned { project, path } => {
                        orca_success!("{project} cloned into {}", path.display())
                    }
                    CloneOutcome::Skipped { .. } => {}
                }
            }
        }
    }
    Ok(())
}
