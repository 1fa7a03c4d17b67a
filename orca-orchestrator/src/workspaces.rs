//! Registering workspaces and checking out their projects.

use std::path::{Path, PathBuf};

use orca_config::{ConfigStore, Project, Repository, WorkspaceRepository};
use orca_core::{orca_info, OrcaError};
use tracing::{debug, info};

use crate::error::Result;
use crate::git::VersionControl;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceListing {
    pub name: String,
    pub path: PathBuf,
    pub current: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloneRequest {
    /// Defaults to the current workspace.
    pub workspace: Option<String>,
    /// Defaults to every project of the workspace.
    pub project: Option<String>,
    /// Directory receiving the checkouts. With a single project this is the
    /// checkout itself.
    pub target: Option<PathBuf>,
}

/// What happened to one project during a clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloneOutcome {
    /// The project lives in the workspace repository and was registered there.
    Registered { project: String, path: PathBuf },
    Cloned { project: String, path: PathBuf },
    /// Already checked out and registered.
    Skipped { project: String, path: PathBuf },
}

pub struct WorkspaceManager<'a, V> {
    store: &'a mut dyn ConfigStore,
    vcs: V,
}

impl<'a, V: VersionControl> WorkspaceManager<'a, V> {
    pub fn new(store: &'a mut dyn ConfigStore, vcs: V) -> Self {
        Self { store, vcs }
    }

    /// Register the workspace defined at `{source_dir}/{file_name}` under its
    /// declared name. Returns that name.
    pub fn init(&mut self, source_dir: &Path, file_name: &str) -> Result<String> {
        let path = source_dir.join(file_name);
        if !path.is_file() {
            return Err(OrcaError::FileNotFound(path).into());
        }

        let path = std::fs::canonicalize(&path).map_err(OrcaError::from)?;
        let definition = WorkspaceRepository::load_unconfigured(&path)?;
        if definition.name.is_empty() {
            return Err(OrcaError::Config(format!(
                "workspace definition {} does not declare a name",
                path.display()
            ))
            .into());
        }

        self.store.add_workspace(&definition.name, &path)?;
        info!(workspace = %definition.name, path = %path.display(), "registered workspace");
        Ok(definition.name)
    }

    pub fn list(&self) -> Vec<WorkspaceListing> {
        let current = self.store.current_workspace();
        self.store
            .get_all_workspace_meta()
            .into_iter()
            .map(|meta| WorkspaceListing {
                current: meta.name == current,
                name: meta.name,
                path: meta.path,
            })
            .collect()
    }

    pub fn switch(&mut self, name: &str) -> Result<()> {
        self.store.switch_workspace(name)?;
        Ok(())
    }

    /// Check out the projects of a workspace and record where they live.
    pub fn clone_projects(&mut self, request: &CloneRequest) -> Result<Vec<CloneOutcome>> {
        let name = match request.workspace.as_deref().filter(|s| !s.is_empty()) {
            Some(name) => name.to_string(),
            None => self.store.current_workspace().to_string(),
        };
        let meta = self.store.get_workspace_meta(&name)?;
        let workspace = WorkspaceRepository::new(&*self.store).load(&meta.name)?;

        let target_dir = match &request.target {
            Some(target) => absolute(target)?,
            None => self.default_target(&meta.path)?,
        };
        debug!(workspace = %meta.name, target = %target_dir.display(), "cloning workspace projects");

        match request.project.as_deref() {
            Some(project_name) => {
                let project = workspace.project(project_name)?;
                let into = if request.target.is_some() {
                    target_dir
                } else {
                    target_dir.join(&project.name)
                };
                Ok(vec![self.clone_project(&meta.name, &meta.path, project, &into)?])
            }
            None => workspace
                .projects
                .iter()
                .map(|project| {
                    self.clone_project(&meta.name, &meta.path, project, &target_dir.join(&project.name))
                })
                .collect(),
        }
    }

    /// The directory holding the workspace repository.
    fn default_target(&self, workspace_file: &Path) -> Result<PathBuf> {
        let root = self.vcs.repository_root(workspace_file)?;
        root.parent().map(Path::to_path_buf).ok_or_else(|| {
            OrcaError::Config(format!(
                "repository root {} has no parent directory to clone into",
                root.display()
            ))
            .into()
        })
    }

    fn clone_project(
        &mut self,
        workspace: &str,
        workspace_file: &Path,
        project: &Project,
        into: &Path,
    ) -> Result<CloneOutcome> {
        let registered = self.store.project_exists(workspace, &project.name)?;

        let url = match &project.repository {
            Repository::SameAsWorkspace => {
                orca_info!("Registering workspace repository as project: {}", project.name);
                let root = self.vcs.repository_root(workspace_file)?;
                self.store.set_project_path(workspace, &project.name, &root)?;
                return Ok(CloneOutcome::Registered {
                    project: project.name.clone(),
                    path: root,
                });
            }
            Repository::Remote(url) => url,
        };

        if into.exists() {
            if registered {
                orca_info!("Skipping '{}' as it already exists", project.name);
                return Ok(CloneOutcome::Skipped {
                    project: project.name.clone(),
                    path: into.to_path_buf(),
                });
            }
            return Err(OrcaError::Config(format!(
                "cannot clone '{}' into {}: directory already exists",
                project.name,
                into.display()
            ))
            .into());
        }

        if let Some(parent) = into.parent() {
            std::fs::create_dir_all(parent).map_err(OrcaError::from)?;
        }

        orca_info!("Cloning '{url}' into {}...", into.display());
        self.vcs.clone_repository(url, into)?;
        self.store.set_project_path(workspace, &project.name, into)?;

        Ok(CloneOutcome::Cloned {
            project: project.name.clone(),
            path: into.to_path_buf(),
        })
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir().map_err(OrcaError::from)?.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OrchestratorError;
    use crate::test_utils::{FakeVcs, WorkspaceFixture};
    use orca_config::{ConfigManager, WORKSPACE_FILE_NAME};

    #[test]
    fn test_init_registers_declared_name() {
        let mut f = WorkspaceFixture::unregistered();
        let dir = f.project_dir("gateway");
        let mut manager = WorkspaceManager::new(&mut f.store, FakeVcs::new(&dir));

        assert_eq!(manager.init(&dir, WORKSPACE_FILE_NAME).unwrap(), "dev");
        assert!(matches!(
            manager.init(&dir, WORKSPACE_FILE_NAME),
            Err(OrchestratorError::Core(OrcaError::WorkspaceAlreadyExists(name))) if name == "dev"
        ));

        let reloaded = ConfigManager::load_or_create(f.store.path()).unwrap();
        let meta = reloaded.get_workspace_meta("dev").unwrap();
        assert!(meta.path.ends_with(WORKSPACE_FILE_NAME));
    }

    #[test]
    fn test_init_missing_file() {
        let mut f = WorkspaceFixture::unregistered();
        let dir = f.root.join("nowhere");
        let mut manager = WorkspaceManager::new(&mut f.store, FakeVcs::new(&dir));

        assert!(matches!(
            manager.init(&dir, WORKSPACE_FILE_NAME),
            Err(OrchestratorError::Core(OrcaError::FileNotFound(_)))
        ));
    }

    #[test]
    fn test_list_marks_current() {
        let mut f = WorkspaceFixture::new();
        let dir = f.project_dir("gateway");
        let mut manager = WorkspaceManager::new(&mut f.store, FakeVcs::new(&dir));

        let listed = manager.list();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].current);

        assert!(manager.switch("prod").is_err());
        manager.switch("dev").unwrap();
    }

    #[test]
    fn test_clone_all_projects() {
        let mut f = WorkspaceFixture::unregistered();
        let ws_root = f.project_dir("gateway");
        f.store.add_workspace("dev", &f.workspace_file()).unwrap();
        std::fs::remove_dir_all(f.project_dir("web")).unwrap();
        std::fs::remove_dir_all(f.project_dir("api")).unwrap();

        let mut manager = WorkspaceManager::new(&mut f.store, FakeVcs::new(&ws_root));
        let outcomes = manager
            .clone_projects(&CloneRequest {
                workspace: Some("dev".to_string()),
                ..CloneRequest::default()
            })
            .unwrap();

        assert_eq!(
            outcomes,
            vec![
                CloneOutcome::Registered {
                    project: "gateway".to_string(),
                    path: ws_root.clone(),
                },
                CloneOutcome::Cloned {
                    project: "api".to_string(),
                    path: f.root.join("api"),
                },
                CloneOutcome::Cloned {
                    project: "web".to_string(),
                    path: f.root.join("web"),
                },
            ]
        );
        assert_eq!(
            manager.vcs.clones()[0],
            ("git@example.com:acme/api.git".to_string(), f.root.join("api"))
        );
        drop(manager);
        assert_eq!(
            f.store.get_project_meta("dev", "web").unwrap().path,
            f.root.join("web")
        );
    }

    #[test]
    fn test_clone_skips_registered_checkouts() {
        let mut f = WorkspaceFixture::new();
        let ws_root = f.project_dir("gateway");
        let mut manager = WorkspaceManager::new(&mut f.store, FakeVcs::new(&ws_root));

        let outcomes = manager
            .clone_projects(&CloneRequest {
                project: Some("api".to_string()),
                ..CloneRequest::default()
            })
            .unwrap();

        assert!(matches!(&outcomes[0], CloneOutcome::Skipped { project, .. } if project == "api"));
        assert!(manager.vcs.clones().is_empty());
    }

    #[test]
    fn test_clone_refuses_unregistered_existing_directory() {
        let mut f = WorkspaceFixture::unregistered();
        let ws_root = f.project_dir("gateway");
        f.store.add_workspace("dev", &f.workspace_file()).unwrap();
        let mut manager = WorkspaceManager::new(&mut f.store, FakeVcs::new(&ws_root));

        let err = manager
            .clone_projects(&CloneRequest {
                workspace: Some("dev".to_string()),
                project: Some("api".to_string()),
                target: None,
            })
            .unwrap_err();

        assert!(matches!(err, OrchestratorError::Core(OrcaError::Config(_))));
    }

    #[test]
    fn test_single_project_target_is_the_checkout() {
        let mut f = WorkspaceFixture::unregistered();
        let ws_root = f.project_dir("gateway");
        let target = f.root.join("elsewhere/api-checkout");
        f.store.add_workspace("dev", &f.workspace_file()).unwrap();
        let mut manager = WorkspaceManager::new(&mut f.store, FakeVcs::new(&ws_root));

        let outcomes = manager
            .clone_projects(&CloneRequest {
                workspace: Some("dev".to_string()),
                project: Some("api".to_string()),
                target: Some(target.clone()),
            })
            .unwrap();

        assert_eq!(
            outcomes,
            vec![CloneOutcome::Cloned {
                project: "api".to_string(),
                path: target,
            }]
        );
    }
}
