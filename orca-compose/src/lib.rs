//! Docker compose integration.
//!
//! Projects keep their own compose files untouched. Everything orca adds
//! (the shared workspace network, DNS aliases, certificate mounts) lives in a
//! generated overlay file passed to `docker compose` as an extra `-f`.

pub mod command;
pub mod document;
pub mod overlay;
pub mod parser;
pub mod runner;
pub mod tls;

pub use command::ComposeInvocation;
pub use document::{BindVolume, NetworkAttachment, OverlayDocument, OverlayNetwork, OverlayService};
pub use overlay::{OverlayGenerator, OverlaySource};
pub use parser::{ComposeParser, ComposeSource, FileComposeParser, SourceService};
pub use runner::{ComposeRunner, DockerCompose, ExecRequest};
pub use tls::{CertificateAuthority, MkcertAuthority};
