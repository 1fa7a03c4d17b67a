//! Per-user configuration store.
//!
//! This module defines the structure of `~/.orca/orca.yaml`, which records the
//! registered workspaces, the local checkout path of every registered project,
//! the currently selected workspace and the logging defaults.

use std::path::{Path, PathBuf};

use orca_core::error::{OrcaError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Logging defaults applied when no CLI flag or env filter overrides them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "none".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectEntry {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceEntry {
    pub name: String,
    /// Location of the workspace definition document.
    pub path: PathBuf,
    #[serde(default)]
    pub projects: Vec<ProjectEntry>,
}

impl WorkspaceEntry {
    pub fn project(&self, name: &str) -> Option<&ProjectEntry> {
        self.projects.iter().find(|p| p.name == name)
    }
}

/// Root structure of the persisted user configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default)]
    pub logging: LoggingSettings,

    #[serde(default)]
    pub workspaces: Vec<WorkspaceEntry>,

    #[serde(rename = "currentWorkspace", default)]
    pub current_workspace: String,
}

impl UserConfig {
    pub fn workspace(&self, name: &str) -> Result<&WorkspaceEntry> {
        self.workspaces
            .iter()
            .find(|ws| ws.name == name)
            .ok_or_else(|| OrcaError::UnknownWorkspace(name.to_string()))
    }

    fn workspace_mut(&mut self, name: &str) -> Result<&mut WorkspaceEntry> {
        self.workspaces
            .iter_mut()
            .find(|ws| ws.name == name)
            .ok_or_else(|| OrcaError::UnknownWorkspace(name.to_string()))
    }

    pub fn workspace_exists(&self, name: &str) -> bool {
        self.workspaces.iter().any(|ws| ws.name == name)
    }

    pub fn add_workspace(&mut self, name: &str, path: &Path) -> Result<()> {
        if self.workspace_exists(name) {
            return Err(OrcaError::WorkspaceAlreadyExists(name.to_string()));
        }

        self.workspaces.push(WorkspaceEntry {
            name: name.to_string(),
            path: path.to_path_buf(),
            projects: Vec::new(),
        });
        Ok(())
    }

    pub fn switch_workspace(&mut self, name: &str) -> Result<()> {
        if !self.workspace_exists(name) {
            return Err(OrcaError::UnknownWorkspace(name.to_string()));
        }
        self.current_workspace = name.to_string();
        Ok(())
    }

    /// Records where a project is checked out, adding the entry if needed.
    pub fn set_project_path(&mut self, workspace: &str, project: &str, path: &Path) -> Result<()> {
        let ws = self.workspace_mut(workspace)?;

        match ws.projects.iter_mut().find(|p| p.name == project) {
            Some(entry) => entry.path = path.to_path_buf(),
            None => ws.projects.push(ProjectEntry {
                name: project.to_string(),
                path: path.to_path_buf(),
            }),
        }
        Ok(())
    }
}

/// Location data for a registered workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceMeta {
    pub name: String,
    pub path: PathBuf,
    pub projects: Vec<ProjectMeta>,
}

/// Location data for a registered project checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectMeta {
    pub name: String,
    pub path: PathBuf,
    pub workspace_name: String,
}

fn workspace_meta(entry: &WorkspaceEntry) -> WorkspaceMeta {
    WorkspaceMeta {
        name: entry.name.clone(),
        path: entry.path.clone(),
        projects: entry
            .projects
            .iter()
            .map(|p| project_meta(&entry.name, p))
            .collect(),
    }
}

fn project_meta(workspace: &str, entry: &ProjectEntry) -> ProjectMeta {
    ProjectMeta {
        name: entry.name.clone(),
        path: entry.path.clone(),
        workspace_name: workspace.to_string(),
    }
}

/// Capability interface over the persisted user configuration.
pub trait ConfigStore {
    /// Name of the selected workspace; empty when none was ever selected.
    fn current_workspace(&self) -> &str;

    fn workspace_exists(&self, name: &str) -> bool;

    fn get_workspace_meta(&self, name: &str) -> Result<WorkspaceMeta>;

    fn get_project_meta(&self, workspace: &str, name: &str) -> Result<ProjectMeta>;

    fn get_all_workspace_meta(&self) -> Vec<WorkspaceMeta>;

    fn get_all_project_meta(&self) -> Vec<ProjectMeta>;

    fn project_exists(&self, workspace: &str, name: &str) -> Result<bool>;

    fn add_workspace(&mut self, name: &str, path: &Path) -> Result<()>;

    fn switch_workspace(&mut self, name: &str) -> Result<()>;

    fn set_project_path(&mut self, workspace: &str, project: &str, path: &Path) -> Result<()>;
}

impl ConfigStore for UserConfig {
    fn current_workspace(&self) -> &str {
        &self.current_workspace
    }

    fn workspace_exists(&self, name: &str) -> bool {
        UserConfig::workspace_exists(self, name)
    }

    fn get_workspace_meta(&self, name: &str) -> Result<WorkspaceMeta> {
        self.workspace(name).map(workspace_meta)
    }

    fn get_project_meta(&self, workspace: &str, name: &str) -> Result<ProjectMeta> {
        let ws = self.workspace(workspace)?;
        ws.project(name)
            .map(|p| project_meta(&ws.name, p))
            .ok_or_else(|| OrcaError::UnknownProject {
                workspace: workspace.to_string(),
                project: name.to_string(),
            })
    }

    fn get_all_workspace_meta(&self) -> Vec<WorkspaceMeta> {
        self.workspaces.iter().map(workspace_meta).collect()
    }

    fn get_all_project_meta(&self) -> Vec<ProjectMeta> {
        self.workspaces
            .iter()
            .flat_map(|ws| ws.projects.iter().map(|p| project_meta(&ws.name, p)))
            .collect()
    }

    fn project_exists(&self, workspace: &str, name: &str) -> Result<bool> {
        Ok(self.workspace(workspace)?.project(name).is_some())
    }

    fn add_workspace(&mut self, name: &str, path: &Path) -> Result<()> {
        UserConfig::add_workspace(self, name, path)
    }

    fn switch_workspace(&mut self, name: &str) -> Result<()> {
        UserConfig::switch_workspace(self, name)
    }

    fn set_project_path(&mut self, workspace: &str, project: &str, path: &Path) -> Result<()> {
        UserConfig::set_project_path(self, workspace, project, path)
    }
}

/// File-backed [`ConfigStore`]. Every mutation is written straight to disk.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
    config: UserConfig,
}

impl ConfigManager {
    /// Load the configuration at `path`, writing the default file if missing.
    pub fn load_or_create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if !path.exists() {
            debug!(path = %path.display(), "creating default user configuration");
            let manager = Self {
                path,
                config: UserConfig::default(),
            };
            manager.save()?;
            return Ok(manager);
        }

        let contents = std::fs::read_to_string(&path)?;
        let config: UserConfig = if contents.trim().is_empty() {
            UserConfig::default()
        } else {
            serde_yaml_ng::from_str(&contents).map_err(|e| OrcaError::InvalidYaml {
                path: path.clone(),
                message: e.to_string(),
            })?
        };

        Ok(Self { path, config })
    }

    /// Load from the standard location (see [`orca_core::user_paths`]).
    pub fn load_default() -> Result<Self> {
        Self::load_or_create(orca_core::user_paths::config_file_path()?)
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml_ng::to_string(&self.config)?;
        std::fs::write(&self.path, yaml)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &UserConfig {
        &self.config
    }

    pub fn logging(&self) -> &LoggingSettings {
        &self.config.logging
    }

    fn mutate<F>(&mut self, change: F) -> Result<()>
    where
        F: FnOnce(&mut UserConfig) -> Result<()>,
    {
        let mut updated = self.config.clone();
        change(&mut updated)?;

        let previous = std::mem::replace(&mut self.config, updated);
        if let Err(err) = self.save() {
            self.config = previous;
            return Err(err);
        }
        Ok(())
    }
}

impl ConfigStore for ConfigManager {
    fn current_workspace(&self) -> &str {
        self.config.current_workspace()
    }

    fn workspace_exists(&self, name: &str) -> bool {
        self.config.workspace_exists(name)
    }

    fn get_workspace_meta(&self, name: &str) -> Result<WorkspaceMeta> {
        self.config.get_workspace_meta(name)
    }

    fn get_project_meta(&self, workspace: &str, name: &str) -> Result<ProjectMeta> {
        self.config.get_project_meta(workspace, name)
    }

    fn get_all_workspace_meta(&self) -> Vec<WorkspaceMeta> {
        self.config.get_all_workspace_meta()
    }

    fn get_all_project_meta(&self) -> Vec<ProjectMeta> {
        self.config.get_all_project_meta()
    }

    fn project_exists(&self, workspace: &str, name: &str) -> Result<bool> {
        self.config.project_exists(workspace, name)
    }

    fn add_workspace(&mut self, name: &str, path: &Path) -> Result<()> {
        self.mutate(|config| config.add_workspace(name, path))
    }

    fn switch_workspace(&mut self, name: &str) -> Result<()> {
        self.mutate(|config| config.switch_workspace(name))
    }

    fn set_project_path(&mut self, workspace: &str, project: &str, path: &Path) -> Result<()> {
        self.mutate(|config| config.set_project_path(workspace, project, path))
    }
}
