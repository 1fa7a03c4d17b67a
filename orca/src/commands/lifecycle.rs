//! Commands driving the containers of a workspace.

use anyhow::{Context, Result};
use orca_compose::{
    CertificateAuthority, DockerCompose, ExecRequest, FileComposeParser, MkcertAuthority,
    OverlayGenerator,
};
use orca_config::ConfigManager;
use orca_core::{orca_print, orca_println, user_paths, HostCommandRunner};
use orca_orchestrator::{Controller, Scope};

use crate::cli::ShowSubcommand;

pub type HostCompose = DockerCompose<HostCommandRunner, OverlayGenerator>;

/// Compose runner executing on the host, writing overlays under the user's
/// overlay directory.
pub fn host_compose() -> Result<HostCompose> {
    let certificates = MkcertAuthority::new(user_paths::tls_dir()?).certificates_directory();
    let overlays = OverlayGenerator::new(
        FileComposeParser::new(),
        user_paths::overlay_dir()?,
        certificates,
    );
    Ok(DockerCompose::new(HostCommandRunner, overlays))
}

pub fn controller(store: &ConfigManager) -> Result<Controller<'_, HostCompose>> {
    let cwd = std::env::current_dir().context("Failed to determine the current directory")?;
    Ok(Controller::new(store, host_compose()?, cwd))
}

pub fn handle_up(store: &ConfigManager, scope: &Scope) -> Result<()> {
    controller(store)?.up(scope)?;
    Ok(())
}

pub fn handle_down(store: &ConfigManager, scope: &Scope) -> Result<()> {
    controller(store)?.down(scope)?;
    Ok(())
}

pub fn handle_logs(store: &ConfigManager, scope: &Scope, service: Option<&str>) -> Result<()> {
    controller(store)?.logs(scope, service)?;
    Ok(())
}

pub fn handle_exec(
    store: &ConfigManager,
    scope: &Scope,
    service: String,
    args: Vec<String>,
) -> Result<()> {
    controller(store)?.exec_or_run(scope, &ExecRequest::new(service, args))?;
    Ok(())
}

pub fn handle_extension(
    store: &ConfigManager,
    scope: &Scope,
    name: &str,
    args: &[String],
) -> Result<()> {
    controller(store)?.execute_extension(scope, name, args)?;
    Ok(())
}

pub fn handle_hosts(store: &ConfigManager, workspace: Option<&str>) -> Result<()> {
    for line in controller(store)?.hosts(workspace)? {
        orca_println!("{line}");
    }
    Ok(())
}

pub fn handle_show_command(store: &ConfigManager, command: ShowSubcommand) -> Result<()> {
    let controller = controller(store)?;
    match command {
        ShowSubcommand::Command { scope } => {
            orca_println!("{}", controller.show_compose_command(&scope.scope())?);
        }
        ShowSubcommand::Config { scope } => {
            orca_print!("{}", controller.show_compose_config(&scope.scope())?);
        }
    }
    Ok(())
}
