use orca_config::{Project, Workspace};
use orca_core::error::Result;
use orca_core::CommandRunner;
use tracing::debug;

use crate::command::{self, ComposeInvocation};
use crate::overlay::OverlaySource;

/// A one-off command against a project service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecRequest {
    pub service: String,
    pub workdir: Option<String>,
    pub args: Vec<String>,
}

impl ExecRequest {
    pub fn new(service: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            service: service.into(),
            workdir: None,
            args,
        }
    }

    pub fn with_workdir(mut self, workdir: Option<String>) -> Self {
        self.workdir = workdir;
        self
    }
}

/// Runs the composition tool for a single project.
pub trait ComposeRunner {
    fn up(&self, workspace: &Workspace, project: &Project) -> Result<()>;
    fn down(&self, workspace: &Workspace, project: &Project) -> Result<()>;
    /// The merged compose document as reported by the tool.
    fn show_config(&self, workspace: &Workspace, project: &Project) -> Result<String>;
    /// The base invocation a user would type to drive the project by hand.
    fn command_line(&self, workspace: &Workspace, project: &Project) -> Result<String>;
    fn logs(&self, workspace: &Workspace, project: &Project, service: Option<&str>) -> Result<()>;
    /// Attach to the running container of a service.
    fn exec(&self, workspace: &Workspace, project: &Project, request: &ExecRequest) -> Result<()>;
    /// Start a throwaway container for a service.
    fn run(&self, workspace: &Workspace, project: &Project, request: &ExecRequest) -> Result<()>;
    fn is_service_running(
        &self,
        workspace: &Workspace,
        project: &Project,
        service: &str,
    ) -> Result<bool>;
}

/// [`ComposeRunner`] backed by the `docker compose` CLI.
pub struct DockerCompose<R, O> {
    runner: R,
    overlays: O,
}

impl<R: CommandRunner, O: OverlaySource> DockerCompose<R, O> {
    pub fn new(runner: R, overlays: O) -> Self {
        Self { runner, overlays }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn overlays(&self) -> &O {
        &self.overlays
    }

    fn with_invocation<T>(
        &self,
        workspace: &Workspace,
        project: &Project,
        f: impl FnOnce(&ComposeInvocation<'_>) -> Result<T>,
    ) -> Result<T> {
        let overlay = self.overlays.create_or_retrieve(workspace, project)?;
        f(&ComposeInvocation::new(workspace, project, &overlay))
    }
}

/// An attached session the user left with Ctrl-C ends normally.
fn tolerate_interrupt(result: Result<()>) -> Result<()> {
    match result {
        Err(e) if e.is_interrupted_session() => {
            debug!("interactive session interrupted by user");
            Ok(())
        }
        other => other,
    }
}

impl<R: CommandRunner, O: OverlaySource> ComposeRunner for DockerCompose<R, O> {
    fn up(&self, workspace: &Workspace, project: &Project) -> Result<()> {
        self.with_invocation(workspace, project, |compose| self.runner.run(&compose.up()))
    }

    fn down(&self, workspace: &Workspace, project: &Project) -> Result<()> {
        self.runner.run(&command::down(workspace, project))
    }

    fn show_config(&self, workspace: &Workspace, project: &Project) -> Result<String> {
        self.with_invocation(workspace, project, |compose| {
            Ok(self.runner.capture(&compose.config())?.stdout)
        })
    }

    fn command_line(&self, workspace: &Workspace, project: &Project) -> Result<String> {
        self.with_invocation(workspace, project, |compose| {
            Ok(compose.base().command_line())
        })
    }

    fn logs(&self, workspace: &Workspace, project: &Project, service: Option<&str>) -> Result<()> {
        self.with_invocation(workspace, project, |compose| {
            tolerate_interrupt(self.runner.run(&compose.logs(service)))
        })
    }

    fn exec(&self, workspace: &Workspace, project: &Project, request: &ExecRequest) -> Result<()> {
        self.with_invocation(workspace, project, |compose| {
            let spec = compose.exec(&request.service, request.workdir.as_deref(), &request.args);
            tolerate_interrupt(self.runner.run(&spec))
        })
    }

    fn run(&self, workspace: &Workspace, project: &Project, request: &ExecRequest) -> Result<()> {
        self.with_invocation(workspace, project, |compose| {
            let spec = compose.run(&request.service, request.workdir.as_deref(), &request.args);
            tolerate_interrupt(self.runner.run(&spec))
        })
    }

    fn is_service_running(
        &self,
        workspace: &Workspace,
        project: &Project,
        service: &str,
    ) -> Result<bool> {
        self.with_invocation(workspace, project, |compose| {
            let ps = self.runner.capture(&compose.ps_quiet(service))?;
            let Some(container_id) = ps.stdout.lines().map(str::trim).find(|l| !l.is_empty())
            else {
                debug!(service = %service, "no container for service");
                return Ok(false);
            };

            let inspect = self
                .runner
                .capture(&command::inspect_running(container_id))?;
            let running = inspect.stdout.trim() == "true";
            debug!(service = %service, container = %container_id, running, "checked service state");
            Ok(running)
        })
    }
}
