//! Configuration for orca.
//!
//! Two kinds of configuration live here:
//! - the per-user store (`~/.orca/orca.yaml`) recording which workspaces are
//!   registered, where each project is checked out, and the selected workspace
//! - the definition documents authored in repositories
//!   (`orca.workspace.yaml`, `orca.project.yaml`), loaded read-only into the
//!   [`Workspace`] and [`Project`] views used by the rest of the system

pub mod definitions;
pub mod model;
pub mod user_config;
pub mod workspace_repo;

pub use model::{
    ComposeFiles, EnvFile, Extension, ExtraComposeFile, LoaderCondition, NetworkOverlay,
    OverlayConfig, Project, ProjectConfig, Repository, UnconfiguredProject,
    UnconfiguredWorkspace, Workspace,
};
pub use user_config::{
    ConfigManager, ConfigStore, LoggingSettings, ProjectEntry, ProjectMeta, UserConfig,
    WorkspaceEntry, WorkspaceMeta,
};
pub use workspace_repo::WorkspaceRepository;

/// File name of a workspace definition document.
pub const WORKSPACE_FILE_NAME: &str = "orca.workspace.yaml";

/// File name of the project definition document at the root of a checkout.
pub const PROJECT_FILE_NAME: &str = "orca.project.yaml";
