// Command handlers

use anyhow::{Context, Result};
use clap::CommandFactory;
use clap_complete::Shell;
use orca_config::{ConfigManager, LoggingSettings};
use orca_core::{orca_println, orca_success};
use orca_logging::{init_subscriber, LoggingOptions};
use tracing::debug;

use crate::cli::{Args, Command};

pub mod config;
pub mod git;
pub mod lifecycle;
pub mod tls;
pub mod ws;

/// Main command dispatcher
pub fn execute_command(args: Args) -> Result<()> {
    // Commands that work without a user configuration
    match &args.command {
        Command::Version => return handle_version(),
        Command::Completion { shell } => return handle_completion(*shell),
        _ => {}
    }

    let mut store = ConfigManager::load_default().context("Failed to load user configuration")?;
    init_logging(&args, store.logging())?;
    debug!(path = %store.path().display(), "loaded user configuration");

    match args.command {
        Command::Up { scope } => {
            debug!("Handling up command");
            lifecycle::handle_up(&store, &scope.scope())
        }
        Command::Down { scope } => {
            debug!("Handling down command");
            lifecycle::handle_down(&store, &scope.scope())
        }
        Command::Logs { scope, service } => {
            debug!("Handling logs command");
            lifecycle::handle_logs(&store, &scope.scope(), service.as_deref())
        }
        Command::Exec {
            scope,
            service,
            args,
        } => {
            debug!("Handling exec command for service {}", service);
            lifecycle::handle_exec(&store, &scope.scope(), service, args)
        }
        Command::Ext { scope, name, args } => {
            debug!("Handling extension command {}", name);
            lifecycle::handle_extension(&store, &scope.scope(), &name, &args)
        }
        Command::Hosts { workspace } => {
            debug!("Handling hosts command");
            lifecycle::handle_hosts(&store, workspace.as_deref())
        }
        Command::Show { command } => {
            debug!("Handling show command");
            lifecycle::handle_show_command(&store, command)
        }
        Command::Ws { command } => {
            debug!("Handling workspace command");
            ws::handle_ws_command(&mut store, command)
        }
        Command::Tls { command } => {
            debug!("Handling tls command");
            tls::handle_tls_command(&store, command)
        }
        Command::Config { command } => {
            debug!("Handling config command");
            config::handle_config_command(&store, command)
        }
        Command::G { command } => {
            debug!("Handling g command");
            git::handle_g_command(command)
        }
        Command::Check => {
            debug!("Handling check command");
            orca_orchestrator::check()?;
            orca_success!("All required tools are installed");
            Ok(())
        }
        Command::Version => handle_version(),
        Command::Completion { shell } => handle_completion(shell),
    }
}

/// `ORCA_LOG` wins over the flags, which win over the persisted settings.
fn init_logging(args: &Args, settings: &LoggingSettings) -> Result<()> {
    let format = match args.log_format {
        Some(format) => format,
        None => settings
            .format
            .parse()
            .context("Invalid logging format in user configuration")?,
    };
    let options = LoggingOptions {
        level: args
            .log_level
            .clone()
            .unwrap_or_else(|| settings.level.clone()),
        format,
    };

    init_subscriber(&options).context("Failed to initialize logging")?;
    Ok(())
}

fn handle_version() -> Result<()> {
    orca_println!("orca {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}

fn handle_completion(shell: Shell) -> Result<()> {
    let mut cmd = Args::command();
    clap_complete::generate(shell, &mut cmd, "orca", &mut std::io::stdout());
    Ok(())
}
