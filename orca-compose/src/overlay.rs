use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use orca_config::{Project, Workspace};
use orca_core::error::{OrcaError, Result};
use regex::Regex;
use tera::{Context, Tera};
use tracing::{debug, info};

use crate::document::{BindVolume, NetworkAttachment, OverlayDocument, OverlayNetwork};
use crate::parser::{ComposeParser, ComposeSource, FileComposeParser};

pub const NETWORK_KEY: &str = "orca";
pub const NETWORK_NAME: &str = "orca-ws";

pub const NETWORK_OVERLAID_LABEL: &str = "orca.panoptescloud.overlay-enabled/network";
pub const ALIASES_OVERLAID_LABEL: &str = "orca.panoptescloud.overlay-enabled/aliases";
pub const TLS_INJECT_CERTS_LABEL: &str = "orca.pantoptescloud.tls/inject-certs";
/// Also recognised as a trust injection marker.
pub const TLS_INJECT_CERTS_LABEL_ALT: &str = "orca.panoptescloud.tls/inject-certs";

const TLS_INJECT_CERTS_LABELS: [&str; 2] = [TLS_INJECT_CERTS_LABEL, TLS_INJECT_CERTS_LABEL_ALT];

pub const DEFAULT_ALIAS_TEMPLATE: &str = "{{ Service }}.{{ Project }}.{{ Workspace }}.local";

// `{{ .Service }}` is accepted as a spelling of `{{ Service }}`.
static DOTTED_VARIABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{(-?)\s*\.([A-Za-z_])")
        .expect("Template variable regex should compile - this is a static pattern")
});

/// Render a DNS alias for a service from an alias template.
pub fn render_alias(template: &str, service: &str, project: &str, workspace: &str) -> Result<String> {
    let normalized = DOTTED_VARIABLE.replace_all(template, "{{$1 $2");

    let mut context = Context::new();
    context.insert("Service", service);
    context.insert("Project", project);
    context.insert("Workspace", workspace);

    Tera::one_off(&normalized, &context, false).map_err(|e| OrcaError::Template {
        template: template.to_string(),
        message: describe_tera_error(&e),
    })
}

fn describe_tera_error(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Normalize a bind mount target to end with `/`, rejecting empty and root.
pub fn normalize_bind_target(target: &str) -> std::result::Result<String, &'static str> {
    if target.is_empty() {
        return Err("cannot be empty");
    }

    let trimmed = target.trim_end_matches('/');
    if trimmed.is_empty() {
        return Err("cannot be root directory (/)");
    }

    Ok(format!("{trimmed}/"))
}

/// Produces the overlay file for a project.
pub trait OverlaySource {
    /// Path of the project's overlay, generating it only when absent.
    fn create_or_retrieve(&self, workspace: &Workspace, project: &Project) -> Result<PathBuf>;
}

pub struct OverlayGenerator<P = FileComposeParser> {
    parser: P,
    overlay_dir: PathBuf,
    certs_dir: PathBuf,
}

impl<P: ComposeParser> OverlayGenerator<P> {
    pub fn new(parser: P, overlay_dir: impl Into<PathBuf>, certs_dir: impl Into<PathBuf>) -> Self {
        Self {
            parser,
            overlay_dir: overlay_dir.into(),
            certs_dir: certs_dir.into(),
        }
    }

    pub fn overlay_dir(&self) -> &Path {
        &self.overlay_dir
    }

    /// `{overlay_dir}/{workspace}/{project}.yaml`
    pub fn overlay_path(&self, workspace: &Workspace, project: &Project) -> PathBuf {
        self.overlay_dir
            .join(&workspace.name)
            .join(format!("{}.yaml", project.name))
    }

    /// Build the overlay document for a parsed compose file.
    pub fn build(
        &self,
        workspace: &Workspace,
        project: &Project,
        source: &ComposeSource,
    ) -> Result<OverlayDocument> {
        let mut overlay = OverlayDocument::default();

        if workspace.overlay.network.enabled {
            self.add_network(&mut overlay, workspace, project, source)?;
        }
        self.add_tls_mounts(&mut overlay, source)?;

        Ok(overlay)
    }

    fn add_network(
        &self,
        overlay: &mut OverlayDocument,
        workspace: &Workspace,
        project: &Project,
        source: &ComposeSource,
    ) -> Result<()> {
        let network = &workspace.overlay.network;
        let owns_network = network.create_in.as_deref() == Some(project.name.as_str());

        overlay.networks.insert(
            NETWORK_KEY.to_string(),
            OverlayNetwork {
                name: NETWORK_NAME.to_string(),
                external: !owns_network,
                labels: [(NETWORK_OVERLAID_LABEL.to_string(), String::new())].into(),
            },
        );

        let template = network
            .alias_pattern
            .as_deref()
            .unwrap_or(DEFAULT_ALIAS_TEMPLATE);

        for name in source.services.keys() {
            let mut attachment = NetworkAttachment::default();
            let service = overlay.service_mut(name);
            service
                .labels
                .insert(NETWORK_OVERLAID_LABEL.to_string(), String::new());

            if !network.disable_aliases {
                service
                    .labels
                    .insert(ALIASES_OVERLAID_LABEL.to_string(), String::new());
                attachment.aliases = vec![render_alias(
                    template,
                    name,
                    &project.name,
                    &workspace.name,
                )?];
            }

            service.networks.insert(NETWORK_KEY.to_string(), attachment);
        }

        Ok(())
    }

    fn add_tls_mounts(&self, overlay: &mut OverlayDocument, source: &ComposeSource) -> Result<()> {
        let certs_source = format!(
            "{}/",
            self.certs_dir.to_string_lossy().trim_end_matches('/')
        );

        for (name, service) in &source.services {
            let Some((label, target)) = TLS_INJECT_CERTS_LABELS
                .iter()
                .find_map(|label| service.label(label).map(|target| (*label, target)))
            else {
                continue;
            };

            let target = normalize_bind_target(target).map_err(|message| {
                OrcaError::InvalidOverlayModifier {
                    service: name.clone(),
                    label: label.to_string(),
                    message: message.to_string(),
                }
            })?;

            overlay
                .service_mut(name)
                .volumes
                .push(BindVolume::bind(certs_source.clone(), target));
        }

        Ok(())
    }
}

impl<P: ComposeParser> OverlaySource for OverlayGenerator<P> {
    fn create_or_retrieve(&self, workspace: &Workspace, project: &Project) -> Result<PathBuf> {
        let path = self.overlay_path(workspace, project);
        if path.is_file() {
            debug!(path = %path.display(), "reusing existing overlay");
            return Ok(path);
        }

        let source = self
            .parser
            .parse(&project.primary_compose_file(), &project.env_file_paths())?;
        let overlay = self.build(workspace, project, &source)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, overlay.to_yaml()?)?;

        info!(
            workspace = %workspace.name,
            project = %project.name,
            path = %path.display(),
            "generated compose overlay"
        );
        Ok(path)
    }
}
