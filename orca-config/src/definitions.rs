//! Serde shapes of the documents users author in their repositories.
//!
//! These mirror the YAML exactly; [`crate::model`] holds the resolved views.

use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RepositoryDefinition {
    #[serde(default)]
    pub ssh: String,

    /// The project lives in the same checkout as the workspace definition.
    #[serde(default, rename = "self")]
    pub is_self: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkspaceProjectDefinition {
    pub name: String,
    #[serde(default)]
    pub repository: RepositoryDefinition,
    #[serde(default)]
    pub requires: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkOverlayDefinition {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub create_in: String,
    #[serde(default)]
    pub disable_aliases: bool,
    #[serde(default)]
    pub alias_pattern: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OverlaysDefinition {
    #[serde(default)]
    pub network: NetworkOverlayDefinition,
}

/// `orca.workspace.yaml`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkspaceDefinition {
    pub name: String,
    #[serde(default)]
    pub overlays: OverlaysDefinition,
    #[serde(default)]
    pub projects: Vec<WorkspaceProjectDefinition>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PropertyConditionDefinition {
    pub name: String,
    #[serde(default)]
    pub value: Option<serde_yaml_ng::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoaderConditionDefinition {
    #[serde(default)]
    pub os: Option<String>,
    #[serde(default)]
    pub arch: Option<String>,
    #[serde(default)]
    pub property: Option<PropertyConditionDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExtraComposeFileDefinition {
    pub path: String,
    #[serde(default)]
    pub when: Vec<LoaderConditionDefinition>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ComposeFilesDefinition {
    #[serde(default)]
    pub primary: String,
    #[serde(default)]
    pub extras: Vec<ExtraComposeFileDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EnvFileDefinition {
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionDefinition {
    pub name: String,
    #[serde(default)]
    pub chdir: String,
    pub command: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub default_args: Vec<String>,
}

/// `orca.project.yaml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDefinition {
    #[serde(default)]
    pub compose_files: ComposeFilesDefinition,
    #[serde(default)]
    pub env_files: Vec<EnvFileDefinition>,
    #[serde(default)]
    pub hosts: Vec<String>,
    #[serde(default)]
    pub tls_certs: Vec<String>,
    #[serde(default)]
    pub extensions: Vec<ExtensionDefinition>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_definition_parses_overlays() {
        let def: WorkspaceDefinition = serde_yaml_ng::from_str(
            r#"
name: dev
overlays:
  network:
    enabled: true
    createIn: gateway
    aliasPattern: "{{ Service }}.{{ Workspace }}.test"
projects:
  - name: gateway
    repository:
      self: true
  - name: api
    repository:
      ssh: git@example.com:acme/api.git
    requires: [gateway]
"#,
        )
        .unwrap();

        assert!(def.overlays.network.enabled);
        assert_eq!(def.overlays.network.create_in, "gateway");
        assert!(!def.overlays.network.disable_aliases);
        assert!(def.projects[0].repository.is_self);
        assert_eq!(def.projects[1].requires, vec!["gateway".to_string()]);
    }

    #[test]
    fn test_project_definition_parses_all_sections() {
        let def: ProjectDefinition = serde_yaml_ng::from_str(
            r#"
composeFiles:
  primary: docker-compose.yaml
  extras:
    - path: docker-compose.arm.yaml
      when:
        - arch: aarch64
envFiles:
  - path: .env
hosts: [api.dev.local]
tlsCerts: ["*.dev.local"]
extensions:
  - name: test
    service: app
    command: cargo test
    defaultArgs: [--all]
"#,
        )
        .unwrap();

        assert_eq!(def.compose_files.primary, "docker-compose.yaml");
        assert_eq!(def.compose_files.extras[0].when[0].arch.as_deref(), Some("aarch64"));
        assert_eq!(def.env_files[0].path, ".env");
        assert_eq!(def.tls_certs, vec!["*.dev.local".to_string()]);
        assert_eq!(def.extensions[0].default_args, vec!["--all".to_string()]);
        assert_eq!(def.extensions[0].chdir, "");
    }
}
