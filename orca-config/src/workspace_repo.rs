use std::path::Path;

use orca_core::error::{OrcaError, Result};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::definitions::{ProjectDefinition, WorkspaceDefinition, WorkspaceProjectDefinition};
use crate::model::{
    OverlayConfig, Project, ProjectConfig, Repository, UnconfiguredProject,
    UnconfiguredWorkspace, Workspace,
};
use crate::user_config::{ConfigStore, ProjectMeta};
use crate::PROJECT_FILE_NAME;

fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.is_file() {
        return Err(OrcaError::FileNotFound(path.to_path_buf()));
    }

    let contents = std::fs::read_to_string(path)?;
    serde_yaml_ng::from_str(&contents).map_err(|e| OrcaError::InvalidYaml {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Builds [`Workspace`] views from definition documents and the user's store.
pub struct WorkspaceRepository<'a> {
    store: &'a dyn ConfigStore,
}

impl<'a> WorkspaceRepository<'a> {
    pub fn new(store: &'a dyn ConfigStore) -> Self {
        Self { store }
    }

    /// Load a registered workspace and every project declared in it.
    ///
    /// Projects that are not registered locally are still returned, with
    /// `is_registered` unset and an empty configuration.
    pub fn load(&self, name: &str) -> Result<Workspace> {
        let meta = self.store.get_workspace_meta(name)?;
        debug!(workspace = %meta.name, path = %meta.path.display(), "loading workspace");

        let definition: WorkspaceDefinition = read_yaml(&meta.path)?;
        if definition.name != meta.name {
            return Err(OrcaError::Config(format!(
                "workspace registered as '{}' is now named '{}' in {}; run `orca ws init` to register it under the new name",
                meta.name,
                definition.name,
                meta.path.display()
            )));
        }

        let overlay = OverlayConfig {
            network: (&definition.overlays.network).into(),
        };

        let mut projects = Vec::with_capacity(definition.projects.len());
        for declared in &definition.projects {
            let project = match self.store.get_project_meta(&meta.name, &declared.name) {
                Ok(project_meta) => load_project(declared, &project_meta)?,
                Err(OrcaError::UnknownProject { .. }) => unregistered_project(declared),
                Err(err) => return Err(err),
            };
            projects.push(project);
        }

        if let Some(owner) = &overlay.network.create_in {
            if !projects.iter().any(|p| &p.name == owner) {
                return Err(OrcaError::Config(format!(
                    "network overlay of workspace '{}' is created in unknown project '{owner}'",
                    meta.name
                )));
            }
        }

        Ok(Workspace {
            name: meta.name,
            config_path: meta.path,
            projects,
            overlay,
        })
    }

    /// Read a workspace definition without consulting the user's store.
    pub fn load_unconfigured(path: &Path) -> Result<UnconfiguredWorkspace> {
        let definition: WorkspaceDefinition = read_yaml(path)?;

        Ok(UnconfiguredWorkspace {
            name: definition.name,
            config_path: path.to_path_buf(),
            projects: definition
                .projects
                .iter()
                .map(|p| UnconfiguredProject {
                    name: p.name.clone(),
                    repository: (&p.repository).into(),
                })
                .collect(),
        })
    }
}

fn load_project(declared: &WorkspaceProjectDefinition, meta: &ProjectMeta) -> Result<Project> {
    let path = meta.path.join(PROJECT_FILE_NAME);
    debug!(project = %declared.name, path = %path.display(), "loading project definition");
    let definition: ProjectDefinition = read_yaml(&path)?;

    Ok(Project {
        name: declared.name.clone(),
        repository: Repository::from(&declared.repository),
        dir: meta.path.clone(),
        requires: declared.requires.clone(),
        config: ProjectConfig::from(&definition),
        is_registered: true,
    })
}

fn unregistered_project(declared: &WorkspaceProjectDefinition) -> Project {
    Project {
        name: declared.name.clone(),
        repository: Repository::from(&declared.repository),
        dir: Default::default(),
        requires: declared.requires.clone(),
        config: ProjectConfig::default(),
        is_registered: false,
    }
}
