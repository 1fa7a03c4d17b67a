//! Construction of `docker compose` invocations for a project.

use std::path::Path;

use orca_config::{Project, Workspace};
use orca_core::CommandSpec;

pub const DOCKER: &str = "docker";

/// Compose project name isolating a project's containers: `orca-{ws}-{project}`.
pub fn project_label(workspace: &Workspace, project: &Project) -> String {
    format!("orca-{}-{}", workspace.name, project.name)
}

/// `docker inspect` invocation printing whether a container is running.
pub fn inspect_running(container_id: &str) -> CommandSpec {
    CommandSpec::new(DOCKER).args(["inspect", "-f", "{{.State.Running}}", container_id])
}

/// A project's compose files plus its overlay, ready to take a subcommand.
pub struct ComposeInvocation<'a> {
    workspace: &'a Workspace,
    project: &'a Project,
    overlay: &'a Path,
}

impl<'a> ComposeInvocation<'a> {
    pub fn new(workspace: &'a Workspace, project: &'a Project, overlay: &'a Path) -> Self {
        Self {
            workspace,
            project,
            overlay,
        }
    }

    /// `docker compose -f primary [-f extra]... -f overlay -p label [--env-file f]...`
    pub fn base(&self) -> CommandSpec {
        let files = &self.project.config.compose_files;
        let mut spec = CommandSpec::new(DOCKER)
            .arg("compose")
            .arg("-f")
            .arg(files.primary.to_string_lossy());

        for extra in files.active_extras() {
            spec = spec.arg("-f").arg(extra.path.to_string_lossy());
        }

        spec = spec
            .arg("-f")
            .arg(self.overlay.to_string_lossy())
            .arg("-p")
            .arg(project_label(self.workspace, self.project));

        for env_file in &self.project.config.env_files {
            spec = spec.arg("--env-file").arg(env_file.path.to_string_lossy());
        }

        spec.current_dir(&self.project.dir)
    }

    pub fn up(&self) -> CommandSpec {
        self.base().args(["up", "-d"])
    }

    pub fn config(&self) -> CommandSpec {
        self.base().arg("config")
    }

    pub fn logs(&self, service: Option<&str>) -> CommandSpec {
        let spec = self.base().args(["logs", "-f"]);
        match service {
            Some(service) => spec.arg(service),
            None => spec,
        }
    }

    pub fn exec(&self, service: &str, workdir: Option<&str>, args: &[String]) -> CommandSpec {
        with_workdir(self.base().args(["exec", "-it"]), workdir)
            .arg(service)
            .args(args.iter().cloned())
    }

    pub fn run(&self, service: &str, workdir: Option<&str>, args: &[String]) -> CommandSpec {
        with_workdir(self.base().args(["run", "--rm", "-it"]), workdir)
            .arg(service)
            .args(args.iter().cloned())
    }

    pub fn ps_quiet(&self, service: &str) -> CommandSpec {
        self.base().args(["ps", "-q", service])
    }
}

fn with_workdir(spec: CommandSpec, workdir: Option<&str>) -> CommandSpec {
    match workdir {
        Some(dir) => spec.args(["--workdir", dir]),
        None => spec,
    }
}

/// `docker compose -f primary -p label down`. The overlay is not needed to
/// tear a project down.
pub fn down(workspace: &Workspace, project: &Project) -> CommandSpec {
    CommandSpec::new(DOCKER)
        .arg("compose")
        .arg("-f")
        .arg(project.config.compose_files.primary.to_string_lossy())
        .arg("-p")
        .arg(project_label(workspace, project))
        .arg("down")
        .current_dir(&project.dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use orca_config::{
        ComposeFiles, EnvFile, ExtraComposeFile, LoaderCondition, OverlayConfig, ProjectConfig,
        Repository,
    };
    use std::path::PathBuf;

    fn workspace() -> Workspace {
        Workspace {
            name: "dev".to_string(),
            config_path: PathBuf::from("/src/ws/orca.workspace.yaml"),
            projects: Vec::new(),
            overlay: OverlayConfig::default(),
        }
    }

    fn project(extras: Vec<ExtraComposeFile>) -> Project {
        Project {
            name: "api".to_string(),
            repository: Repository::Remote("git@example.com:acme/api.git".to_string()),
            dir: PathBuf::from("/src/api"),
            requires: Vec::new(),
            config: ProjectConfig {
                compose_files: ComposeFiles {
                    primary: PathBuf::from("docker-compose.yaml"),
                    extras,
                },
                env_files: vec![EnvFile {
                    path: PathBuf::from(".env"),
                }],
                ..ProjectConfig::default()
            },
            is_registered: true,
        }
    }

    #[test]
    fn test_base_command() {
        let ws = workspace();
        let p = project(Vec::new());
        let overlay = PathBuf::from("/home/u/.orca/overlays/dev/api.yaml");
        let spec = ComposeInvocation::new(&ws, &p, &overlay).base();

        assert_eq!(
            spec.command_line(),
            "docker compose -f docker-compose.yaml -f /home/u/.orca/overlays/dev/api.yaml -p orca-dev-api --env-file .env"
        );
        assert_eq!(spec.dir, Some(PathBuf::from("/src/api")));
    }

    #[test]
    fn test_extras_follow_host_conditions() {
        let ws = workspace();
        let p = project(vec![
            ExtraComposeFile {
                path: PathBuf::from("always.yaml"),
                when: Vec::new(),
            },
            ExtraComposeFile {
                path: PathBuf::from("never.yaml"),
                when: vec![LoaderCondition {
                    os: Some("not-a-real-os".to_string()),
                    ..LoaderCondition::default()
                }],
            },
            ExtraComposeFile {
                path: PathBuf::from("here.yaml"),
                when: vec![LoaderCondition {
                    os: Some(std::env::consts::OS.to_string()),
                    arch: Some(std::env::consts::ARCH.to_string()),
                    property: None,
                }],
            },
        ]);
        let overlay = PathBuf::from("/o.yaml");
        let line = ComposeInvocation::new(&ws, &p, &overlay).base().command_line();

        assert!(line.starts_with(
            "docker compose -f docker-compose.yaml -f always.yaml -f here.yaml -f /o.yaml"
        ));
        assert!(!line.contains("never.yaml"));
    }

    #[test]
    fn test_subcommands() {
        let ws = workspace();
        let p = project(Vec::new());
        let overlay = PathBuf::from("/o.yaml");
        let compose = ComposeInvocation::new(&ws, &p, &overlay);
        let base = compose.base().command_line();
        let args = vec!["bash".to_string(), "-l".to_string()];

        assert_eq!(compose.up().command_line(), format!("{base} up -d"));
        assert_eq!(compose.config().command_line(), format!("{base} config"));
        assert_eq!(compose.logs(None).command_line(), format!("{base} logs -f"));
        assert_eq!(
            compose.logs(Some("app")).command_line(),
            format!("{base} logs -f app")
        );
        assert_eq!(
            compose.exec("app", None, &args).command_line(),
            format!("{base} exec -it app bash -l")
        );
        assert_eq!(
            compose.run("app", Some("/srv"), &args).command_line(),
            format!("{base} run --rm -it --workdir /srv app bash -l")
        );
        assert_eq!(
            compose.ps_quiet("app").command_line(),
            format!("{base} ps -q app")
        );
    }

    #[test]
    fn test_down_skips_overlay() {
        let spec = down(&workspace(), &project(Vec::new()));
        assert_eq!(
            spec.command_line(),
            "docker compose -f docker-compose.yaml -p orca-dev-api down"
        );
        assert_eq!(spec.dir, Some(PathBuf::from("/src/api")));
    }

    #[test]
    fn test_inspect_running_state() {
        assert_eq!(
            inspect_running("abc123").command_line(),
            "docker inspect -f {{.State.Running}} abc123"
        );
    }
}
