//! Drives the controller through the real compose runner and overlay
//! generator, recording the commands instead of executing them.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use orca_compose::overlay::{NETWORK_KEY, TLS_INJECT_CERTS_LABEL};
use orca_compose::{DockerCompose, ExecRequest, FileComposeParser, OverlayDocument, OverlayGenerator};
use orca_config::{ConfigManager, ConfigStore, PROJECT_FILE_NAME, WORKSPACE_FILE_NAME};
use orca_core::error::Result as CoreResult;
use orca_core::{CapturedOutput, CommandRunner, CommandSpec, OrcaError};
use orca_orchestrator::{Controller, OrchestratorError, Scope};
use tempfile::TempDir;

#[derive(Default)]
struct RecordingRunner {
    commands: Mutex<Vec<CommandSpec>>,
    interrupt_sessions: bool,
}

impl RecordingRunner {
    fn lines(&self) -> Vec<String> {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .map(CommandSpec::command_line)
            .collect()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, spec: &CommandSpec) -> CoreResult<()> {
        self.commands.lock().unwrap().push(spec.clone());
        if self.interrupt_sessions && spec.args.iter().any(|a| a == "-it") {
            return Err(OrcaError::Command {
                command: spec.command_line(),
                code: Some(130),
                stderr: String::new(),
            });
        }
        Ok(())
    }

    fn capture(&self, spec: &CommandSpec) -> CoreResult<CapturedOutput> {
        self.commands.lock().unwrap().push(spec.clone());
        Ok(CapturedOutput::default())
    }
}

struct Env {
    _temp: TempDir,
    root: PathBuf,
    store: ConfigManager,
}

fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn env() -> Env {
    let temp = TempDir::new().unwrap();
    let root = temp.path().to_path_buf();

    write(
        &root.join("db").join(WORKSPACE_FILE_NAME),
        r#"
name: shop
overlays:
  network:
    enabled: true
    createIn: db
projects:
  - name: db
    repository: { self: true }
  - name: api
    repository: { ssh: "git@example.com:shop/api.git" }
    requires: [db]
"#,
    );
    write(
        &root.join("db").join(PROJECT_FILE_NAME),
        "composeFiles:\n  primary: compose.yaml\n",
    );
    write(
        &root.join("db").join("compose.yaml"),
        "services:\n  postgres:\n    image: postgres:16\n",
    );
    write(
        &root.join("api").join(PROJECT_FILE_NAME),
        "composeFiles:\n  primary: compose.yaml\nextensions:\n  - name: console\n    service: app\n    chdir: /srv\n    command: bin/console\n",
    );
    write(
        &root.join("api").join("compose.yaml"),
        format!("services:\n  app:\n    image: shop/api\n    labels:\n      {TLS_INJECT_CERTS_LABEL}: /etc/ssl/shop\n").as_str(),
    );

    let mut store = ConfigManager::load_or_create(root.join("home/orca.yaml")).unwrap();
    store
        .add_workspace("shop", &root.join("db").join(WORKSPACE_FILE_NAME))
        .unwrap();
    store.set_project_path("shop", "db", &root.join("db")).unwrap();
    store.set_project_path("shop", "api", &root.join("api")).unwrap();
    store.switch_workspace("shop").unwrap();

    Env {
        _temp: temp,
        root,
        store,
    }
}

fn compose(env: &Env, runner: RecordingRunner) -> DockerCompose<RecordingRunner, OverlayGenerator> {
    let overlays = OverlayGenerator::new(
        FileComposeParser::with_environment(Default::default()),
        env.root.join("home/overlays"),
        env.root.join("home/tls/certs"),
    );
    DockerCompose::new(runner, overlays)
}

#[test]
fn test_up_generates_overlays_and_starts_in_dependency_order() {
    let env = env();
    let controller = Controller::new(&env.store, compose(&env, RecordingRunner::default()), "/");

    controller.up(&Scope::default()).unwrap();

    let db_overlay = env.root.join("home/overlays/shop/db.yaml");
    let api_overlay = env.root.join("home/overlays/shop/api.yaml");
    let lines = controller.compose_runner_lines();
    assert_eq!(
        lines,
        vec![
            format!(
                "docker compose -f compose.yaml -f {} -p orca-shop-db up -d",
                db_overlay.display()
            ),
            format!(
                "docker compose -f compose.yaml -f {} -p orca-shop-api up -d",
                api_overlay.display()
            ),
        ]
    );

    let db: OverlayDocument =
        serde_yaml_ng::from_str(&fs::read_to_string(&db_overlay).unwrap()).unwrap();
    let api: OverlayDocument =
        serde_yaml_ng::from_str(&fs::read_to_string(&api_overlay).unwrap()).unwrap();

    assert!(!db.networks[NETWORK_KEY].external);
    assert!(api.networks[NETWORK_KEY].external);
    assert_eq!(
        api.services["app"].networks[NETWORK_KEY].aliases,
        vec!["app.api.shop.local"]
    );
    assert_eq!(api.services["app"].volumes[0].target, "/etc/ssl/shop/");
}

#[test]
fn test_down_runs_without_overlays_in_reverse_order() {
    let env = env();
    let controller = Controller::new(&env.store, compose(&env, RecordingRunner::default()), "/");

    controller.down(&Scope::workspace("shop")).unwrap();

    assert_eq!(
        controller.compose_runner_lines(),
        vec![
            "docker compose -f compose.yaml -p orca-shop-api down",
            "docker compose -f compose.yaml -p orca-shop-db down",
        ]
    );
    assert!(!env.root.join("home/overlays").exists());
}

#[test]
fn test_extension_starts_one_off_container_when_service_is_down() {
    let env = env();
    let runner = RecordingRunner {
        interrupt_sessions: true,
        ..RecordingRunner::default()
    };
    let controller = Controller::new(&env.store, compose(&env, runner), env.root.join("api/src"));

    controller
        .execute_extension(&Scope::default(), "console", &["cache:clear".to_string()])
        .unwrap();

    let lines = controller.compose_runner_lines();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("ps -q app"));
    assert!(lines[1].ends_with("run --rm -it --workdir /srv app bin/console cache:clear"));
}

#[test]
fn test_exec_outside_a_project_is_rejected() {
    let env = env();
    let controller = Controller::new(&env.store, compose(&env, RecordingRunner::default()), "/");

    let err = controller
        .exec_or_run(&Scope::default(), &ExecRequest::new("app", Vec::new()))
        .unwrap_err();

    assert!(matches!(err, OrchestratorError::InvalidExecutionContext(_)));
    assert!(controller.compose_runner_lines().is_empty());
}

#[test]
fn test_missing_dependency_aborts_before_any_command() {
    let env = env();
    let ws_file = env.root.join("db").join(WORKSPACE_FILE_NAME);
    let definition = fs::read_to_string(&ws_file).unwrap();
    fs::write(&ws_file, definition.replace("requires: [db]", "requires: [cache]")).unwrap();

    let controller = Controller::new(&env.store, compose(&env, RecordingRunner::default()), "/");
    let err = controller.up(&Scope::workspace("shop")).unwrap_err();

    assert_eq!(
        err.to_string(),
        "Invalid dependency graph: cannot add parent 'cache' to 'api'"
    );
    assert!(controller.compose_runner_lines().is_empty());
}

trait RunnerLines {
    fn compose_runner_lines(&self) -> Vec<String>;
}

impl RunnerLines for Controller<'_, DockerCompose<RecordingRunner, OverlayGenerator>> {
    fn compose_runner_lines(&self) -> Vec<String> {
        self.compose().runner().lines()
    }
}
