use std::cell::Cell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use orca_compose::overlay::{
    ALIASES_OVERLAID_LABEL, NETWORK_KEY, NETWORK_NAME, NETWORK_OVERLAID_LABEL,
    TLS_INJECT_CERTS_LABEL, TLS_INJECT_CERTS_LABEL_ALT,
};
use orca_compose::{
    ComposeParser, ComposeSource, FileComposeParser, OverlayDocument, OverlayGenerator,
    OverlaySource, SourceService,
};
use orca_config::{
    ComposeFiles, NetworkOverlay, OverlayConfig, Project, ProjectConfig, Repository, Workspace,
};
use orca_core::error::Result;
use orca_core::OrcaError;
use tempfile::TempDir;

/// Returns a fixed document and counts how often it was asked to parse.
struct CountingParser {
    source: ComposeSource,
    calls: Cell<usize>,
}

impl CountingParser {
    fn new(services: &[(&str, &[(&str, &str)])]) -> Self {
        let services = services
            .iter()
            .map(|(name, labels)| {
                let labels = labels
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect();
                (name.to_string(), SourceService { labels })
            })
            .collect::<BTreeMap<_, _>>();

        Self {
            source: ComposeSource { services },
            calls: Cell::new(0),
        }
    }
}

impl ComposeParser for CountingParser {
    fn parse(&self, _compose_file: &Path, _env_files: &[PathBuf]) -> Result<ComposeSource> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.source.clone())
    }
}

fn project(name: &str) -> Project {
    Project {
        name: name.to_string(),
        repository: Repository::Remote(format!("git@example.com:acme/{name}.git")),
        dir: PathBuf::from(format!("/src/{name}")),
        requires: Vec::new(),
        config: ProjectConfig {
            compose_files: ComposeFiles {
                primary: PathBuf::from("docker-compose.yaml"),
                extras: Vec::new(),
            },
            ..ProjectConfig::default()
        },
        is_registered: true,
    }
}

fn workspace(network: NetworkOverlay) -> Workspace {
    Workspace {
        name: "dev".to_string(),
        config_path: PathBuf::from("/src/gateway/orca.workspace.yaml"),
        projects: vec![project("gateway"), project("backend")],
        overlay: OverlayConfig { network },
    }
}

fn network_enabled() -> NetworkOverlay {
    NetworkOverlay {
        enabled: true,
        create_in: Some("gateway".to_string()),
        disable_aliases: false,
        alias_pattern: None,
    }
}

fn read_overlay(path: &Path) -> OverlayDocument {
    serde_yaml_ng::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_second_call_reuses_the_existing_file() {
    let temp = TempDir::new().unwrap();
    let parser = CountingParser::new(&[("api", &[])]);
    let generator = OverlayGenerator::new(parser, temp.path().join("overlays"), "/tls/certs");
    let ws = workspace(network_enabled());
    let backend = ws.project("backend").unwrap();

    let first = generator.create_or_retrieve(&ws, backend).unwrap();
    let written = std::fs::read_to_string(&first).unwrap();
    let second = generator.create_or_retrieve(&ws, backend).unwrap();

    assert_eq!(first, temp.path().join("overlays/dev/backend.yaml"));
    assert_eq!(first, second);
    assert_eq!(std::fs::read_to_string(&second).unwrap(), written);
}

#[test]
fn test_existing_overlay_is_not_reparsed() {
    let temp = TempDir::new().unwrap();
    let ws = workspace(network_enabled());
    let backend = ws.project("backend").unwrap();

    let generator = OverlayGenerator::new(
        CountingParser::new(&[("api", &[])]),
        temp.path(),
        "/tls/certs",
    );
    generator.create_or_retrieve(&ws, backend).unwrap();
    generator.create_or_retrieve(&ws, backend).unwrap();

    let overlay = generator.overlay_path(&ws, backend);
    std::fs::write(&overlay, "{}\n").unwrap();
    generator.create_or_retrieve(&ws, backend).unwrap();

    assert_eq!(std::fs::read_to_string(&overlay).unwrap(), "{}\n");
}

#[test]
fn test_network_is_created_by_owner_and_joined_by_others() {
    let temp = TempDir::new().unwrap();
    let parser = CountingParser::new(&[("api", &[]), ("worker", &[])]);
    let generator = OverlayGenerator::new(parser, temp.path(), "/tls/certs");
    let ws = workspace(network_enabled());

    let owner = read_overlay(
        &generator
            .create_or_retrieve(&ws, ws.project("gateway").unwrap())
            .unwrap(),
    );
    let member = read_overlay(
        &generator
            .create_or_retrieve(&ws, ws.project("backend").unwrap())
            .unwrap(),
    );

    assert_eq!(owner.networks[NETWORK_KEY].name, NETWORK_NAME);
    assert!(!owner.networks[NETWORK_KEY].external);
    assert!(member.networks[NETWORK_KEY].external);

    let api = &member.services["api"];
    assert_eq!(
        api.networks[NETWORK_KEY].aliases,
        vec!["api.backend.dev.local".to_string()]
    );
    assert!(api.labels.contains_key(NETWORK_OVERLAID_LABEL));
    assert!(api.labels.contains_key(ALIASES_OVERLAID_LABEL));
    assert_eq!(
        member.services["worker"].networks[NETWORK_KEY].aliases,
        vec!["worker.backend.dev.local".to_string()]
    );
}

#[test]
fn test_custom_alias_pattern_is_rendered() {
    let temp = TempDir::new().unwrap();
    let parser = CountingParser::new(&[("api", &[])]);
    let generator = OverlayGenerator::new(parser, temp.path(), "/tls/certs");
    let ws = workspace(NetworkOverlay {
        alias_pattern: Some("{{ .Service }}-{{ .Project }}.{{ .Workspace }}.test".to_string()),
        ..network_enabled()
    });

    let doc = generator
        .build(&ws, ws.project("backend").unwrap(), &generator_source(&["api"]))
        .unwrap();

    assert_eq!(
        doc.services["api"].networks[NETWORK_KEY].aliases,
        vec!["api-backend.dev.test".to_string()]
    );
}

fn generator_source(services: &[&str]) -> ComposeSource {
    ComposeSource {
        services: services
            .iter()
            .map(|s| (s.to_string(), SourceService::default()))
            .collect(),
    }
}

#[test]
fn test_aliases_can_be_disabled() {
    let temp = TempDir::new().unwrap();
    let generator = OverlayGenerator::new(CountingParser::new(&[]), temp.path(), "/tls/certs");
    let ws = workspace(NetworkOverlay {
        disable_aliases: true,
        ..network_enabled()
    });

    let doc = generator
        .build(&ws, ws.project("backend").unwrap(), &generator_source(&["api"]))
        .unwrap();

    let api = &doc.services["api"];
    assert!(api.networks[NETWORK_KEY].aliases.is_empty());
    assert!(api.labels.contains_key(NETWORK_OVERLAID_LABEL));
    assert!(!api.labels.contains_key(ALIASES_OVERLAID_LABEL));
}

#[test]
fn test_disabled_network_produces_empty_overlay() {
    let temp = TempDir::new().unwrap();
    let generator = OverlayGenerator::new(
        CountingParser::new(&[("api", &[])]),
        temp.path(),
        "/tls/certs",
    );
    let ws = workspace(NetworkOverlay::default());

    let path = generator
        .create_or_retrieve(&ws, ws.project("backend").unwrap())
        .unwrap();

    assert_eq!(std::fs::read_to_string(path).unwrap(), "{}\n");
}

#[test]
fn test_certificates_are_mounted_into_marked_services() {
    let temp = TempDir::new().unwrap();
    let parser = CountingParser::new(&[
        ("api", &[(TLS_INJECT_CERTS_LABEL, "/etc/ssl/orca")]),
        ("db", &[]),
    ]);
    let generator = OverlayGenerator::new(parser, temp.path(), "/home/u/.orca/tls/certs");
    let ws = workspace(NetworkOverlay::default());

    let doc = read_overlay(
        &generator
            .create_or_retrieve(&ws, ws.project("backend").unwrap())
            .unwrap(),
    );

    let volumes = &doc.services["api"].volumes;
    assert_eq!(volumes.len(), 1);
    assert_eq!(volumes[0].kind, "bind");
    assert_eq!(volumes[0].source, "/home/u/.orca/tls/certs/");
    assert_eq!(volumes[0].target, "/etc/ssl/orca/");
    assert!(!doc.services.contains_key("db"));
}

#[test]
fn test_both_marker_spellings_are_recognised() {
    let temp = TempDir::new().unwrap();
    let parser = CountingParser::new(&[
        ("api", &[(TLS_INJECT_CERTS_LABEL_ALT, "/etc/ssl/alt")]),
        (
            "web",
            &[
                (TLS_INJECT_CERTS_LABEL, "/etc/ssl/web"),
                (TLS_INJECT_CERTS_LABEL_ALT, "/etc/ssl/ignored"),
            ],
        ),
    ]);
    let generator = OverlayGenerator::new(parser, temp.path(), "/tls/certs");
    let ws = workspace(NetworkOverlay::default());

    let doc = read_overlay(
        &generator
            .create_or_retrieve(&ws, ws.project("backend").unwrap())
            .unwrap(),
    );

    assert_eq!(TLS_INJECT_CERTS_LABEL, "orca.pantoptescloud.tls/inject-certs");
    assert_eq!(doc.services["api"].volumes[0].target, "/etc/ssl/alt/");
    assert_eq!(doc.services["web"].volumes.len(), 1);
    assert_eq!(doc.services["web"].volumes[0].target, "/etc/ssl/web/");
}

#[test]
fn test_empty_or_root_mount_target_is_rejected() {
    for target in ["", "/"] {
        let temp = TempDir::new().unwrap();
        let parser = CountingParser::new(&[("api", &[(TLS_INJECT_CERTS_LABEL, target)])]);
        let generator = OverlayGenerator::new(parser, temp.path(), "/tls/certs");
        let ws = workspace(NetworkOverlay::default());
        let backend = ws.project("backend").unwrap();

        match generator.create_or_retrieve(&ws, backend) {
            Err(OrcaError::InvalidOverlayModifier { service, label, .. }) => {
                assert_eq!(service, "api");
                assert_eq!(label, TLS_INJECT_CERTS_LABEL);
            }
            other => panic!("unexpected result for {target:?}: {other:?}"),
        }
        assert!(!generator.overlay_path(&ws, backend).exists());
    }
}

#[test]
fn test_overlay_is_generated_from_compose_file_on_disk() {
    let temp = TempDir::new().unwrap();
    let checkout = temp.path().join("backend");
    std::fs::create_dir_all(&checkout).unwrap();
    std::fs::write(
        checkout.join("docker-compose.yaml"),
        "services:\n  ${APP}:\n    image: nginx\n    labels:\n      - \"orca.panoptescloud.tls/inject-certs=/certs\"\n",
    )
    .unwrap();
    std::fs::write(checkout.join(".env"), "APP=web\n").unwrap();

    let mut ws = workspace(network_enabled());
    ws.projects[1].dir = checkout.clone();
    ws.projects[1].config.env_files = vec![orca_config::EnvFile {
        path: PathBuf::from(".env"),
    }];

    let parser = FileComposeParser::with_environment(Default::default());
    let generator = OverlayGenerator::new(parser, temp.path().join("overlays"), "/tls/certs");
    let doc = read_overlay(
        &generator
            .create_or_retrieve(&ws, ws.project("backend").unwrap())
            .unwrap(),
    );

    let web = &doc.services["web"];
    assert_eq!(web.networks[NETWORK_KEY].aliases, vec!["web.backend.dev.local"]);
    assert_eq!(web.volumes[0].target, "/certs/");
}
