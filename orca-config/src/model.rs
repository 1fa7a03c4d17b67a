use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use orca_core::error::{OrcaError, Result};
use orca_core::orca_warning;
use orca_dag::Graphable;
use tracing::debug;

use crate::definitions::{
    ExtensionDefinition, LoaderConditionDefinition, NetworkOverlayDefinition, ProjectDefinition,
    RepositoryDefinition,
};

/// Where a project's source comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Repository {
    /// Cloned from a remote over SSH.
    Remote(String),
    /// The checkout that holds the workspace definition.
    SameAsWorkspace,
}

impl From<&RepositoryDefinition> for Repository {
    fn from(def: &RepositoryDefinition) -> Self {
        if def.is_self {
            Repository::SameAsWorkspace
        } else {
            Repository::Remote(def.ssh.clone())
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoaderCondition {
    pub os: Option<String>,
    pub arch: Option<String>,
    pub property: Option<String>,
}

impl From<&LoaderConditionDefinition> for LoaderCondition {
    fn from(def: &LoaderConditionDefinition) -> Self {
        Self {
            os: def.os.clone().filter(|s| !s.is_empty()),
            arch: def.arch.clone().filter(|s| !s.is_empty()),
            property: def.property.as_ref().map(|p| p.name.clone()),
        }
    }
}

impl LoaderCondition {
    /// Whether the condition holds on a host with the given OS and architecture.
    pub fn matches(&self, os: &str, arch: &str) -> bool {
        if let Some(property) = &self.property {
            debug!(property = %property, "skipping extra compose file with property condition");
            orca_warning!("Property condition '{property}' is not supported; the compose file is skipped");
            return false;
        }

        self.os.as_deref().map_or(true, |want| want == os)
            && self.arch.as_deref().map_or(true, |want| want == arch)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraComposeFile {
    pub path: PathBuf,
    pub when: Vec<LoaderCondition>,
}

impl ExtraComposeFile {
    /// Included when every condition matches; no conditions means always.
    pub fn applies_to(&self, os: &str, arch: &str) -> bool {
        self.when.iter().all(|c| c.matches(os, arch))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposeFiles {
    pub primary: PathBuf,
    pub extras: Vec<ExtraComposeFile>,
}

impl ComposeFiles {
    /// Extra files that apply to the machine orca is running on.
    pub fn active_extras(&self) -> impl Iterator<Item = &ExtraComposeFile> {
        self.extras
            .iter()
            .filter(|e| e.applies_to(std::env::consts::OS, std::env::consts::ARCH))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvFile {
    pub path: PathBuf,
}

/// A named command bound to one of the project's services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    pub name: String,
    pub chdir: Option<String>,
    pub command: String,
    pub service: Option<String>,
    pub default_args: Vec<String>,
}

impl From<&ExtensionDefinition> for Extension {
    fn from(def: &ExtensionDefinition) -> Self {
        Self {
            name: def.name.clone(),
            chdir: Some(def.chdir.clone()).filter(|s| !s.is_empty()),
            command: def.command.clone(),
            service: Some(def.service.clone()).filter(|s| !s.is_empty()),
            default_args: def.default_args.clone(),
        }
    }
}

impl Extension {
    /// Full argument vector: the command split on whitespace, followed by
    /// `args` when any were given, otherwise by the default arguments.
    pub fn command_line(&self, args: &[String]) -> Vec<String> {
        let trailing = if args.is_empty() {
            &self.default_args
        } else {
            args
        };

        self.command
            .split_whitespace()
            .map(str::to_string)
            .chain(trailing.iter().cloned())
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectConfig {
    pub compose_files: ComposeFiles,
    pub env_files: Vec<EnvFile>,
    pub hosts: Vec<String>,
    pub tls_certificates: Vec<String>,
    pub extensions: Vec<Extension>,
}

impl From<&ProjectDefinition> for ProjectConfig {
    fn from(def: &ProjectDefinition) -> Self {
        Self {
            compose_files: ComposeFiles {
                primary: PathBuf::from(&def.compose_files.primary),
                extras: def
                    .compose_files
                    .extras
                    .iter()
                    .map(|e| ExtraComposeFile {
                        path: PathBuf::from(&e.path),
                        when: e.when.iter().map(LoaderCondition::from).collect(),
                    })
                    .collect(),
            },
            env_files: def
                .env_files
                .iter()
                .map(|e| EnvFile {
                    path: PathBuf::from(&e.path),
                })
                .collect(),
            hosts: def.hosts.clone(),
            tls_certificates: def.tls_certs.clone(),
            extensions: def.extensions.iter().map(Extension::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub name: String,
    pub repository: Repository,
    /// Local checkout; empty when the project is not registered.
    pub dir: PathBuf,
    pub requires: Vec<String>,
    pub config: ProjectConfig,
    pub is_registered: bool,
}

impl Project {
    /// Resolve a path from the project definition against the checkout.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.dir.join(path)
        }
    }

    pub fn primary_compose_file(&self) -> PathBuf {
        self.resolve_path(&self.config.compose_files.primary)
    }

    pub fn env_file_paths(&self) -> Vec<PathBuf> {
        self.config
            .env_files
            .iter()
            .map(|e| self.resolve_path(&e.path))
            .collect()
    }

    pub fn extension(&self, name: &str) -> Option<&Extension> {
        self.config.extensions.iter().find(|e| e.name == name)
    }
}

impl Graphable for Project {
    fn key(&self) -> &str {
        &self.name
    }

    fn parents(&self) -> &[String] {
        &self.requires
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkOverlay {
    pub enabled: bool,
    /// The single project that creates the shared network; others join it.
    pub create_in: Option<String>,
    pub disable_aliases: bool,
    pub alias_pattern: Option<String>,
}

impl From<&NetworkOverlayDefinition> for NetworkOverlay {
    fn from(def: &NetworkOverlayDefinition) -> Self {
        Self {
            enabled: def.enabled,
            create_in: Some(def.create_in.clone()).filter(|s| !s.is_empty()),
            disable_aliases: def.disable_aliases,
            alias_pattern: Some(def.alias_pattern.clone()).filter(|s| !s.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlayConfig {
    pub network: NetworkOverlay,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    pub name: String,
    pub config_path: PathBuf,
    pub projects: Vec<Project>,
    pub overlay: OverlayConfig,
}

impl Workspace {
    pub fn project(&self, name: &str) -> Result<&Project> {
        self.projects
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| OrcaError::UnknownProject {
                workspace: self.name.clone(),
                project: name.to_string(),
            })
    }

    /// Every host declared by any project, sorted and de-duplicated.
    pub fn unique_hosts(&self) -> Vec<String> {
        self.projects
            .iter()
            .flat_map(|p| p.config.hosts.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Every TLS certificate name declared by any project, sorted and de-duplicated.
    pub fn unique_tls_certificates(&self) -> Vec<String> {
        self.projects
            .iter()
            .flat_map(|p| p.config.tls_certificates.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnconfiguredProject {
    pub name: String,
    pub repository: Repository,
}

/// A workspace definition read without consulting the user configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnconfiguredWorkspace {
    pub name: String,
    pub config_path: PathBuf,
    pub projects: Vec<UnconfiguredProject>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(name: &str, hosts: &[&str], certs: &[&str]) -> Project {
        Project {
            name: name.to_string(),
            repository: Repository::Remote(String::new()),
            dir: PathBuf::from(format!("/src/{name}")),
            requires: Vec::new(),
            config: ProjectConfig {
                hosts: hosts.iter().map(|s| s.to_string()).collect(),
                tls_certificates: certs.iter().map(|s| s.to_string()).collect(),
                ..ProjectConfig::default()
            },
            is_registered: true,
        }
    }

    fn extension(command: &str, default_args: &[&str]) -> Extension {
        Extension {
            name: "ext".to_string(),
            chdir: None,
            command: command.to_string(),
            service: Some("app".to_string()),
            default_args: default_args.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_unique_hosts_and_certificates_are_sorted_and_deduplicated() {
        let ws = Workspace {
            name: "dev".to_string(),
            config_path: PathBuf::from("/src/ws/orca.workspace.yaml"),
            projects: vec![
                project("b", &["web.dev.local", "api.dev.local"], &["*.dev.local"]),
                project("a", &["api.dev.local"], &["*.dev.local", "admin.local"]),
            ],
            overlay: OverlayConfig::default(),
        };

        assert_eq!(ws.unique_hosts(), vec!["api.dev.local", "web.dev.local"]);
        assert_eq!(
            ws.unique_tls_certificates(),
            vec!["*.dev.local", "admin.local"]
        );
    }

    #[test]
    fn test_workspace_project_lookup() {
        let ws = Workspace {
            name: "dev".to_string(),
            config_path: PathBuf::new(),
            projects: vec![project("api", &[], &[])],
            overlay: OverlayConfig::default(),
        };

        assert_eq!(ws.project("api").unwrap().name, "api");
        assert!(matches!(
            ws.project("web"),
            Err(OrcaError::UnknownProject { workspace, project }) if workspace == "dev" && project == "web"
        ));
    }

    #[test]
    fn test_relative_paths_resolve_against_checkout() {
        let mut p = project("api", &[], &[]);
        p.config.compose_files.primary = PathBuf::from("docker-compose.yaml");
        p.config.env_files = vec![
            EnvFile {
                path: PathBuf::from(".env"),
            },
            EnvFile {
                path: PathBuf::from("/etc/shared.env"),
            },
        ];

        assert_eq!(
            p.primary_compose_file(),
            PathBuf::from("/src/api/docker-compose.yaml")
        );
        assert_eq!(
            p.env_file_paths(),
            vec![
                PathBuf::from("/src/api/.env"),
                PathBuf::from("/etc/shared.env")
            ]
        );
    }

    #[test]
    fn test_extension_arguments_replace_defaults() {
        let ext = extension("php artisan", &["migrate", "--seed"]);

        assert_eq!(
            ext.command_line(&[]),
            vec!["php", "artisan", "migrate", "--seed"]
        );
        assert_eq!(
            ext.command_line(&["tinker".to_string()]),
            vec!["php", "artisan", "tinker"]
        );
    }

    #[test]
    fn test_loader_conditions() {
        let any = LoaderCondition::default();
        let linux_arm = LoaderCondition {
            os: Some("linux".to_string()),
            arch: Some("aarch64".to_string()),
            property: None,
        };
        let property = LoaderCondition {
            property: Some("feature".to_string()),
            ..LoaderCondition::default()
        };

        assert!(any.matches("macos", "x86_64"));
        assert!(linux_arm.matches("linux", "aarch64"));
        assert!(!linux_arm.matches("linux", "x86_64"));
        assert!(!property.matches("linux", "x86_64"));

        let extra = ExtraComposeFile {
            path: PathBuf::from("arm.yaml"),
            when: vec![linux_arm],
        };
        assert!(extra.applies_to("linux", "aarch64"));
        assert!(!extra.applies_to("macos", "aarch64"));

        let unconditional = ExtraComposeFile {
            path: PathBuf::from("always.yaml"),
            when: Vec::new(),
        };
        assert!(unconditional.applies_to("windows", "x86"));
    }
}
