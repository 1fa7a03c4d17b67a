//! Resolution of the workspace and project a command targets.

use std::path::Path;

use orca_config::{ConfigStore, Project, ProjectMeta, Workspace, WorkspaceRepository};
use orca_core::OrcaError;
use tracing::debug;

use crate::error::{OrchestratorError, Result};

/// Workspace and project named on the command line, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    pub workspace: Option<String>,
    pub project: Option<String>,
}

impl Scope {
    pub fn new(workspace: Option<String>, project: Option<String>) -> Self {
        Self {
            workspace: workspace.filter(|s| !s.is_empty()),
            project: project.filter(|s| !s.is_empty()),
        }
    }

    pub fn workspace(name: impl Into<String>) -> Self {
        Self::new(Some(name.into()), None)
    }

    pub fn project(workspace: Option<&str>, project: impl Into<String>) -> Self {
        Self::new(workspace.map(str::to_string), Some(project.into()))
    }
}

/// The resolved target of a command: a workspace and, optionally, one of its
/// projects. Without a project the command applies to every project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeContext {
    pub workspace: Workspace,
    pub project: Option<Project>,
}

impl RuntimeContext {
    /// The single project the operation needs, or an execution context error.
    pub fn require_project(&self, operation: &str) -> Result<&Project> {
        self.project.as_ref().ok_or_else(|| {
            OrchestratorError::InvalidExecutionContext(format!(
                "{operation} must be executed within a project context; pass --project or run it from a project directory"
            ))
        })
    }
}

/// `{project}:{workspace}[{dir}]`, used to prefix progress and failures.
pub fn project_label(workspace: &Workspace, project: &Project) -> String {
    format!(
        "{}:{}[{}]",
        project.name,
        workspace.name,
        project.dir.display()
    )
}

pub struct ContextResolver<'a> {
    store: &'a dyn ConfigStore,
}

impl<'a> ContextResolver<'a> {
    pub fn new(store: &'a dyn ConfigStore) -> Self {
        Self { store }
    }

    /// Resolve `scope`, falling back to `cwd` when it names nothing.
    ///
    /// 1. workspace and project: that project of that workspace
    /// 2. project only: that project of the current workspace
    /// 3. workspace only: every project of that workspace
    /// 4. neither: the registered project whose checkout contains `cwd`,
    ///    otherwise every project of the current workspace
    pub fn resolve(&self, scope: &Scope, cwd: &Path) -> Result<RuntimeContext> {
        let workspace = scope.workspace.as_deref().filter(|s| !s.is_empty());
        let project = scope.project.as_deref().filter(|s| !s.is_empty());

        match (workspace, project) {
            (Some(ws), Some(p)) => self.build(ws, Some(p)),
            (None, Some(p)) => self.build(self.store.current_workspace(), Some(p)),
            (Some(ws), None) => self.build(ws, None),
            (None, None) => match self.project_at(cwd) {
                Some(meta) => {
                    debug!(
                        workspace = %meta.workspace_name,
                        project = %meta.name,
                        cwd = %cwd.display(),
                        "resolved context from working directory"
                    );
                    self.build(&meta.workspace_name, Some(&meta.name))
                }
                None => self.build(self.store.current_workspace(), None),
            },
        }
    }

    /// The registered project whose checkout contains `cwd`. Nested checkouts
    /// resolve to the deepest one.
    fn project_at(&self, cwd: &Path) -> Option<ProjectMeta> {
        self.store
            .get_all_project_meta()
            .into_iter()
            .filter(|meta| !meta.path.as_os_str().is_empty() && cwd.starts_with(&meta.path))
            .max_by_key(|meta| meta.path.components().count())
    }

    fn build(&self, workspace: &str, project: Option<&str>) -> Result<RuntimeContext> {
        if workspace.is_empty() {
            return Err(OrcaError::Config(
                "no workspace selected; pass --workspace or run `orca ws switch <name>`".to_string(),
            )
            .into());
        }

        let workspace = WorkspaceRepository::new(self.store).load(workspace)?;
        let project = match project {
            Some(name) => Some(workspace.project(name)?.clone()),
            None => None,
        };

        Ok(RuntimeContext { workspace, project })
    }
}
