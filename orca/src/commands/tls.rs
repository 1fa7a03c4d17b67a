use anyhow::Result;
use orca_compose::{CertificateAuthority, MkcertAuthority};
use orca_config::ConfigManager;
use orca_core::command_stream::check_tools;
use orca_core::{orca_info, orca_success, user_paths};
use orca_orchestrator::Scope;

use crate::cli::TlsSubcommand;
use crate::commands::lifecycle::controller;

pub fn handle_tls_command(store: &ConfigManager, command: TlsSubcommand) -> Result<()> {
    match command {
        TlsSubcommand::Generate { workspace } => handle_generate(store, workspace),
    }
}

fn handle_generate(store: &ConfigManager, workspace: Option<String>) -> Result<()> {
    let ctx = controller(store)?.resolve(&Scope::new(workspace, None))?;
    let certificates = ctx.workspace.unique_tls_certificates();
    if certificates.is_empty() {
        orca_info!("Workspace '{}' declares no TLS certificates", ctx.workspace.name);
        return Ok(());
    }

    check_tools(&["mkcert"])?;
    let authority = MkcertAuthority::new(user_paths::tls_dir()?);
    authority.generate(&ctx.workspace)?;

    orca_success!(
        "Generated {} certificate(s) in {}",
        certificates.len(),
        authority.certificates_directory().display()
    );
    Ok(())
}
