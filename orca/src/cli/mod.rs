// CLI argument parsing and definitions

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use orca_config::WORKSPACE_FILE_NAME;
use orca_logging::LogFormat;
use orca_orchestrator::Scope;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "orca")]
#[command(about = "Run multi-repository development environments with docker compose")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Log level (trace, debug, info, warn, error or none)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log output format (text or json)
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,
}

/// Selects the workspace and project a command applies to. Anything left out
/// is taken from the current directory, then from the selected workspace.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ScopeArgs {
    /// Workspace name
    #[arg(short, long)]
    pub workspace: Option<String>,

    /// Project name within the workspace
    #[arg(short, long)]
    pub project: Option<String>,
}

impl ScopeArgs {
    pub fn scope(&self) -> Scope {
        Scope::new(self.workspace.clone(), self.project.clone())
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum ShowSubcommand {
    /// Print the docker compose invocation for a project
    Command {
        #[command(flatten)]
        scope: ScopeArgs,
    },
    /// Print the merged compose configuration of a project
    Config {
        #[command(flatten)]
        scope: ScopeArgs,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum WsSubcommand {
    /// Register the workspace defined in a directory
    Init {
        /// Directory containing the workspace definition
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Name of the workspace definition file
        #[arg(long, default_value = WORKSPACE_FILE_NAME)]
        file: String,
    },
    /// List registered workspaces
    Ls,
    /// Select the workspace used when none is given
    Switch {
        /// Workspace name
        name: String,
    },
    /// Check out the projects of a workspace
    Clone {
        /// Workspace name (defaults to the selected workspace)
        #[arg(short, long)]
        workspace: Option<String>,

        /// Clone only this project
        #[arg(short, long)]
        project: Option<String>,

        /// Directory receiving the checkouts; with --project, the checkout itself
        #[arg(long)]
        target: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum TlsSubcommand {
    /// Issue the certificates a workspace declares
    Generate {
        /// Workspace name (defaults to the selected workspace)
        #[arg(short, long)]
        workspace: Option<String>,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum ConfigSubcommand {
    /// Print the user configuration
    Show {
        /// Print as JSON instead of YAML
        #[arg(long)]
        json: bool,
    },
    /// Print the location of the user configuration file
    Path,
}

#[derive(Debug, Clone, Subcommand)]
pub enum GSubcommand {
    /// Check out the branch matching a search, or `-` for the previous one
    Co {
        /// Part of the branch name (case-sensitive)
        #[arg(default_value = "")]
        search: String,

        /// Pull the branch from origin after checking it out
        #[arg(short, long)]
        pull: bool,
    },
    /// List local branches, optionally filtered
    Branches {
        /// Part of the branch name (case-sensitive)
        #[arg(default_value = "")]
        search: String,
    },
    /// Pull the current branch from origin
    Pull,
    /// Interactively rebase the latest commits
    Rbi {
        /// Number of commits to rebase
        #[arg(short, long, default_value_t = 2)]
        number: u32,
    },
    /// Push the current branch to origin
    Push {
        /// Force the push
        #[arg(short, long)]
        force: bool,
    },
    /// Drop the latest commits and any uncommitted changes
    Undo {
        /// Number of commits to drop
        #[arg(short, long, default_value_t = 1)]
        number: u32,

        /// Skip the confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Show the latest commits, one line each
    Logl {
        /// Number of commits to show
        #[arg(short, long, default_value_t = 10)]
        number: usize,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Start projects, dependencies first
    Up {
        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// Stop projects, dependents first
    Down {
        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// Follow the logs of a project
    Logs {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Only show logs of this service
        #[arg(short, long)]
        service: Option<String>,
    },

    /// Run a command in a project service
    Exec {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Service to run the command in
        #[arg(short, long)]
        service: String,

        /// Command and arguments
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Run a project extension
    Ext {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Extension name
        name: String,

        /// Arguments appended to the extension command
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Print /etc/hosts entries for a workspace
    Hosts {
        /// Workspace name (defaults to the selected workspace)
        #[arg(short, long)]
        workspace: Option<String>,
    },

    /// Inspect the compose setup of a project
    Show {
        #[command(subcommand)]
        command: ShowSubcommand,
    },

    /// Manage workspaces
    Ws {
        #[command(subcommand)]
        command: WsSubcommand,
    },

    /// Manage TLS certificates
    Tls {
        #[command(subcommand)]
        command: TlsSubcommand,
    },

    /// Inspect the user configuration
    Config {
        #[command(subcommand)]
        command: ConfigSubcommand,
    },

    /// Shortcuts for everyday git work in the current repository
    G {
        #[command(subcommand)]
        command: GSubcommand,
    },

    /// Verify the required tools are installed
    Check,

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },

    /// Show version information
    Version,
}
