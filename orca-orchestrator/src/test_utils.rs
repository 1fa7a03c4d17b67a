//! Fixtures and fakes shared by orchestrator tests and downstream crates.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use orca_compose::{ComposeRunner, ExecRequest};
use orca_config::{
    ConfigManager, ConfigStore, Project, Workspace, PROJECT_FILE_NAME, WORKSPACE_FILE_NAME,
};
use orca_core::error::{OrcaError, Result as CoreResult};
use tempfile::TempDir;

use crate::branches::Prompt;
use crate::context::ContextResolver;
use crate::git::{parse_branches, Branch, VersionControl};

pub const WORKSPACE_YAML: &str = r#"
name: dev
overlays:
  network:
    enabled: true
    createIn: gateway
projects:
  - name: gateway
    repository:
      self: true
  - name: api
    repository:
      ssh: git@example.com:acme/api.git
    requires: [gateway]
  - name: web
    repository:
      ssh: git@example.com:acme/web.git
    requires: [api]
"#;

pub const GATEWAY_PROJECT_YAML: &str = r#"
composeFiles:
  primary: compose.yaml
hosts: [gateway.dev.local]
tlsCerts: ["*.dev.local"]
"#;

pub const API_PROJECT_YAML: &str = r#"
composeFiles:
  primary: docker-compose.yaml
hosts: [api.dev.local, gateway.dev.local]
extensions:
  - name: artisan
    service: app
    command: php artisan
    defaultArgs: [list]
  - name: lint
    command: ./bin/lint
"#;

pub const WEB_PROJECT_YAML: &str = r#"
composeFiles:
  primary: docker-compose.yaml
hosts: [web.dev.local]
"#;

/// Three checked-out projects (`gateway` <- `api` <- `web`) registered in a
/// throwaway user configuration with `dev` selected.
pub struct WorkspaceFixture {
    _temp: TempDir,
    pub root: PathBuf,
    pub store: ConfigManager,
}

impl Default for WorkspaceFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkspaceFixture {
    pub fn new() -> Self {
        let mut fixture = Self::unregistered();
        let root = fixture.root.clone();

        fixture
            .store
            .add_workspace("dev", &root.join("gateway").join(WORKSPACE_FILE_NAME))
            .expect("register workspace");
        for name in ["gateway", "api", "web"] {
            fixture
                .store
                .set_project_path("dev", name, &root.join(name))
                .expect("register project");
        }
        fixture.store.switch_workspace("dev").expect("select workspace");
        fixture
    }

    /// The checkouts exist on disk but nothing is registered.
    pub fn unregistered() -> Self {
        let temp = TempDir::new().expect("create temp dir");
        let root = temp.path().to_path_buf();

        write(&root.join("gateway").join(WORKSPACE_FILE_NAME), WORKSPACE_YAML);
        write(&root.join("gateway").join(PROJECT_FILE_NAME), GATEWAY_PROJECT_YAML);
        write(&root.join("api").join(PROJECT_FILE_NAME), API_PROJECT_YAML);
        write(&root.join("web").join(PROJECT_FILE_NAME), WEB_PROJECT_YAML);

        let store = ConfigManager::load_or_create(root.join("home/.orca/orca.yaml"))
            .expect("create user config");

        Self {
            _temp: temp,
            root,
            store,
        }
    }

    pub fn project_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn workspace_file(&self) -> PathBuf {
        self.root.join("gateway").join(WORKSPACE_FILE_NAME)
    }

    pub fn resolver(&self) -> ContextResolver<'_> {
        ContextResolver::new(&self.store)
    }
}

fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create fixture dir");
    }
    fs::write(path, contents).expect("write fixture file");
}

/// Records every compose call as `"{op} {workspace}/{project} ..."`.
#[derive(Default)]
pub struct RecordingCompose {
    calls: Mutex<Vec<String>>,
    running: HashSet<String>,
    failing: Option<(String, i32)>,
}

impl RecordingCompose {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `service` as running in every project.
    pub fn with_running(mut self, service: &str) -> Self {
        self.running.insert(service.to_string());
        self
    }

    /// Fail every call for `project` with the given exit code.
    pub fn failing_for(mut self, project: &str, code: i32) -> Self {
        self.failing = Some((project.to_string(), code));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, op: &str, ws: &Workspace, p: &Project, detail: &[&str]) -> CoreResult<()> {
        let mut line = format!("{op} {}/{}", ws.name, p.name);
        for part in detail.iter().filter(|d| !d.is_empty()) {
            line.push(' ');
            line.push_str(part);
        }
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(line.clone());
        }

        match &self.failing {
            Some((project, code)) if *project == p.name => Err(OrcaError::Command {
                command: format!("docker compose {line}"),
                code: Some(*code),
                stderr: String::new(),
            }),
            _ => Ok(()),
        }
    }

    fn request_detail(request: &ExecRequest) -> String {
        let mut parts = Vec::new();
        if let Some(dir) = &request.workdir {
            parts.push(format!("--workdir {dir}"));
        }
        parts.push(request.service.clone());
        parts.extend(request.args.iter().cloned());
        parts.join(" ")
    }
}

impl ComposeRunner for RecordingCompose {
    fn up(&self, workspace: &Workspace, project: &Project) -> CoreResult<()> {
        self.record("up", workspace, project, &[])
    }

    fn down(&self, workspace: &Workspace, project: &Project) -> CoreResult<()> {
        self.record("down", workspace, project, &[])
    }

    fn show_config(&self, workspace: &Workspace, project: &Project) -> CoreResult<String> {
        self.record("config", workspace, project, &[])?;
        Ok(format!("name: orca-{}-{}\n", workspace.name, project.name))
    }

    fn command_line(&self, workspace: &Workspace, project: &Project) -> CoreResult<String> {
        Ok(format!(
            "docker compose -p orca-{}-{}",
            workspace.name, project.name
        ))
    }

    fn logs(&self, workspace: &Workspace, project: &Project, service: Option<&str>) -> CoreResult<()> {
        self.record("logs", workspace, project, &[service.unwrap_or("")])
    }

    fn exec(&self, workspace: &Workspace, project: &Project, request: &ExecRequest) -> CoreResult<()> {
        self.record("exec", workspace, project, &[Self::request_detail(request).as_str()])
    }

    fn run(&self, workspace: &Workspace, project: &Project, request: &ExecRequest) -> CoreResult<()> {
        self.record("run", workspace, project, &[Self::request_detail(request).as_str()])
    }

    fn is_service_running(
        &self,
        workspace: &Workspace,
        project: &Project,
        service: &str,
    ) -> CoreResult<bool> {
        self.record("running", workspace, project, &[service])?;
        Ok(self.running.contains(service))
    }
}

/// Version control stand-in: clones create the target directory, branch
/// operations are recorded as `"{git args}"` against a fixed branch list.
pub struct FakeVcs {
    root: PathBuf,
    clones: Mutex<Vec<(String, PathBuf)>>,
    branches: Vec<Branch>,
    log: Vec<String>,
    calls: Mutex<Vec<String>>,
}

impl FakeVcs {
    /// Every path reports `root` as its repository root; only paths below
    /// `root` count as inside the repository.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            clones: Mutex::new(Vec::new()),
            branches: Vec::new(),
            log: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Branch names as `git branch` prints them; a leading `*` marks the
    /// current one.
    pub fn with_branches(mut self, branches: &[&str]) -> Self {
        self.branches = parse_branches(&branches.join("\n"));
        self
    }

    pub fn with_log(mut self, lines: &[&str]) -> Self {
        self.log = lines.iter().map(|line| line.to_string()).collect();
        self
    }

    pub fn clones(&self) -> Vec<(String, PathBuf)> {
        self.clones.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Mutating branch operations in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: String) -> CoreResult<()> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        Ok(())
    }
}

impl VersionControl for FakeVcs {
    fn repository_root(&self, _path: &Path) -> CoreResult<PathBuf> {
        Ok(self.root.clone())
    }

    fn clone_repository(&self, url: &str, target: &Path) -> CoreResult<()> {
        fs::create_dir_all(target)?;
        if let Ok(mut clones) = self.clones.lock() {
            clones.push((url.to_string(), target.to_path_buf()));
        }
        Ok(())
    }

    fn is_repository(&self, dir: &Path) -> bool {
        dir.starts_with(&self.root)
    }

    fn branches(&self, _dir: &Path) -> CoreResult<Vec<Branch>> {
        Ok(self.branches.clone())
    }

    fn checkout(&self, _dir: &Path, branch: &str) -> CoreResult<()> {
        self.record(format!("checkout {branch}"))
    }

    fn pull(&self, _dir: &Path, branch: &str) -> CoreResult<()> {
        self.record(format!("pull origin {branch}"))
    }

    fn push(&self, _dir: &Path, branch: &str, force: bool) -> CoreResult<()> {
        let flag = if force { "-f " } else { "" };
        self.record(format!("push {flag}origin {branch}"))
    }

    fn rebase_interactive(&self, _dir: &Path, commits: u32) -> CoreResult<()> {
        self.record(format!("rebase -i HEAD~{commits}"))
    }

    fn reset_hard(&self, _dir: &Path, commits: u32) -> CoreResult<()> {
        self.record(format!("reset --hard HEAD~{commits}"))
    }

    fn log_oneline(&self, _dir: &Path) -> CoreResult<Vec<String>> {
        Ok(self.log.clone())
    }
}

/// Answers prompts from a script and remembers what was asked. By default
/// it backs out of every choice and declines every confirmation.
#[derive(Default)]
pub struct ScriptedPrompt {
    selection: Option<usize>,
    confirm: bool,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn selecting(index: usize) -> Self {
        Self {
            selection: Some(index),
            ..Self::default()
        }
    }

    pub fn confirming() -> Self {
        Self {
            confirm: true,
            ..Self::default()
        }
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().map(|a| a.clone()).unwrap_or_default()
    }

    fn ask(&self, question: String) {
        if let Ok(mut asked) = self.asked.lock() {
            asked.push(question);
        }
    }
}

impl Prompt for ScriptedPrompt {
    fn select(&self, title: &str, options: &[String]) -> CoreResult<Option<usize>> {
        self.ask(format!("{title} [{}]", options.join(", ")));
        Ok(self.selection)
    }

    fn confirm(&self, question: &str) -> CoreResult<bool> {
        self.ask(question.to_string());
        Ok(self.confirm)
    }
}
