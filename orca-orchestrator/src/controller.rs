//! Lifecycle operations over a resolved runtime context.

use std::path::PathBuf;

use orca_compose::{ComposeRunner, ExecRequest};
use orca_config::{ConfigStore, Project};
use orca_core::command_stream::check_tools;
use orca_core::{orca_progress, orca_success, OrcaError};
use orca_dag::Graph;
use tracing::{debug, info};

use crate::context::{project_label, ContextResolver, RuntimeContext, Scope};
use crate::error::{OrchestratorError, Result};

/// Tools every lifecycle operation shells out to.
pub const REQUIRED_TOOLS: &[&str] = &["docker", "git"];

/// Projects in the order they start: dependencies before dependents.
pub fn startup_order(ctx: &RuntimeContext) -> Result<Vec<String>> {
    if let Some(project) = &ctx.project {
        return Ok(vec![project.name.clone()]);
    }
    Ok(Graph::from_nodes(&ctx.workspace.projects)?.topological_keys_from_roots()?)
}

/// Projects in the order they stop: dependents before dependencies.
pub fn shutdown_order(ctx: &RuntimeContext) -> Result<Vec<String>> {
    if let Some(project) = &ctx.project {
        return Ok(vec![project.name.clone()]);
    }
    Ok(Graph::from_nodes(&ctx.workspace.projects)?.topological_keys_from_leaves()?)
}

pub struct Controller<'a, C> {
    resolver: ContextResolver<'a>,
    compose: C,
    cwd: PathBuf,
}

impl<'a, C: ComposeRunner> Controller<'a, C> {
    /// `cwd` is used to infer the project when a command names neither a
    /// workspace nor a project.
    pub fn new(store: &'a dyn ConfigStore, compose: C, cwd: impl Into<PathBuf>) -> Self {
        Self {
            resolver: ContextResolver::new(store),
            compose,
            cwd: cwd.into(),
        }
    }

    pub fn compose(&self) -> &C {
        &self.compose
    }

    pub fn resolve(&self, scope: &Scope) -> Result<RuntimeContext> {
        self.resolver.resolve(scope, &self.cwd)
    }

    /// Start the targeted projects, dependencies first. Stops at the first
    /// failure; projects already started are left running.
    pub fn up(&self, scope: &Scope) -> Result<()> {
        let ctx = self.resolve(scope)?;
        let plan = self.plan(&ctx, startup_order(&ctx)?)?;
        info!(workspace = %ctx.workspace.name, projects = ?plan.iter().map(|p| &p.name).collect::<Vec<_>>(), "starting projects");

        for project in plan {
            let label = project_label(&ctx.workspace, project);
            orca_progress!("{label} starting...");
            self.compose
                .up(&ctx.workspace, project)
                .map_err(|e| e.labelled(&label))?;
            orca_success!("{label} started");
        }
        Ok(())
    }

    /// Stop the targeted projects, dependents first.
    pub fn down(&self, scope: &Scope) -> Result<()> {
        let ctx = self.resolve(scope)?;
        let plan = self.plan(&ctx, shutdown_order(&ctx)?)?;
        info!(workspace = %ctx.workspace.name, projects = ?plan.iter().map(|p| &p.name).collect::<Vec<_>>(), "stopping projects");

        for project in plan {
            let label = project_label(&ctx.workspace, project);
            orca_progress!("{label} stopping...");
            self.compose
                .down(&ctx.workspace, project)
                .map_err(|e| e.labelled(&label))?;
            orca_success!("{label} stopped");
        }
        Ok(())
    }

    /// Look up every planned project up front so an unusable plan fails
    /// before any container is touched.
    fn plan<'c>(&self, ctx: &'c RuntimeContext, order: Vec<String>) -> Result<Vec<&'c Project>> {
        order
            .iter()
            .map(|name| -> Result<&'c Project> {
                let project = match &ctx.project {
                    Some(p) if &p.name == name => p,
                    _ => ctx.workspace.project(name)?,
                };
                if !project.is_registered {
                    return Err(OrcaError::Config(format!(
                        "project '{}' of workspace '{}' is not checked out; run `orca ws clone -w {} -p {}`",
                        project.name, ctx.workspace.name, ctx.workspace.name, project.name
                    ))
                    .into());
                }
                Ok(project)
            })
            .collect()
    }

    /// `/etc/hosts` lines for every host the workspace declares.
    pub fn hosts(&self, workspace: Option<&str>) -> Result<Vec<String>> {
        let ctx = self.resolve(&Scope::new(workspace.map(str::to_string), None))?;
        Ok(ctx
            .workspace
            .unique_hosts()
            .into_iter()
            .map(|host| format!("127.0.0.1    {host}"))
            .collect())
    }

    /// The compose invocation for the targeted project.
    pub fn show_compose_command(&self, scope: &Scope) -> Result<String> {
        let ctx = self.resolve(scope)?;
        let project = ctx.require_project("show command")?;
        self.compose
            .command_line(&ctx.workspace, project)
            .map_err(|e| e.labelled(project_label(&ctx.workspace, project)).into())
    }

    /// The merged compose document for the targeted project.
    pub fn show_compose_config(&self, scope: &Scope) -> Result<String> {
        let ctx = self.resolve(scope)?;
        let project = ctx.require_project("show config")?;
        self.compose
            .show_config(&ctx.workspace, project)
            .map_err(|e| e.labelled(project_label(&ctx.workspace, project)).into())
    }

    pub fn logs(&self, scope: &Scope, service: Option<&str>) -> Result<()> {
        let ctx = self.resolve(scope)?;
        let project = ctx.require_project("logs")?;
        self.compose
            .logs(&ctx.workspace, project, service)
            .map_err(|e| e.labelled(project_label(&ctx.workspace, project)).into())
    }

    /// Attach to the service's container when it is running, otherwise start
    /// a one-off container for the command.
    pub fn exec_or_run(&self, scope: &Scope, request: &ExecRequest) -> Result<()> {
        let ctx = self.resolve(scope)?;
        let project = ctx.require_project("exec")?;
        self.dispatch(&ctx, project, request)
    }

    /// Run a project extension. Arguments replace the extension's defaults.
    pub fn execute_extension(&self, scope: &Scope, name: &str, args: &[String]) -> Result<()> {
        let ctx = self.resolve(scope)?;
        let project = ctx.require_project("Extensions")?;

        let extension =
            project
                .extension(name)
                .ok_or_else(|| OrchestratorError::UnknownExtension {
                    project: project.name.clone(),
                    name: name.to_string(),
                })?;

        let Some(service) = &extension.service else {
            return Err(OrchestratorError::ExtensionWithoutService {
                name: extension.name.clone(),
            });
        };

        let request = ExecRequest::new(service.clone(), extension.command_line(args))
            .with_workdir(extension.chdir.clone());
        debug!(extension = %name, service = %service, args = ?request.args, "executing extension");
        self.dispatch(&ctx, project, &request)
    }

    fn dispatch(&self, ctx: &RuntimeContext, project: &Project, request: &ExecRequest) -> Result<()> {
        let label = project_label(&ctx.workspace, project);
        let running = self
            .compose
            .is_service_running(&ctx.workspace, project, &request.service)
            .map_err(|e| e.labelled(&label))?;

        let result = if running {
            self.compose.exec(&ctx.workspace, project, request)
        } else {
            debug!(service = %request.service, "service not running, starting one-off container");
            self.compose.run(&ctx.workspace, project, request)
        };
        result.map_err(|e| e.labelled(&label).into())
    }
}

/// Verify the external tools are installed, reporting all missing ones.
pub fn check() -> Result<()> {
    check_tools(REQUIRED_TOOLS)?;
    Ok(())
}
