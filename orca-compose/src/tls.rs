//! Locally trusted TLS material for workspace hosts.

use std::path::{Path, PathBuf};

use orca_config::Workspace;
use orca_core::error::{OrcaError, Result};
use orca_core::{CommandRunner, CommandSpec, HostCommandRunner};
use tracing::{debug, info};

pub const MKCERT: &str = "mkcert";
pub const ROOT_CA_FILE: &str = "rootCA.pem";

/// Issues certificates that services mount through the overlay.
pub trait CertificateAuthority {
    /// Ensure every certificate the workspace declares exists. Safe to repeat.
    fn generate(&self, workspace: &Workspace) -> Result<()>;

    /// Directory bind-mounted into services that ask for certificates.
    fn certificates_directory(&self) -> PathBuf;
}

/// File stem for a certificate name; wildcards are not valid in file names.
pub fn certificate_file_stem(name: &str) -> String {
    name.replace('*', "_")
}

/// [`CertificateAuthority`] backed by the `mkcert` CLI.
pub struct MkcertAuthority<R = HostCommandRunner> {
    runner: R,
    tls_dir: PathBuf,
}

impl MkcertAuthority {
    pub fn new(tls_dir: impl Into<PathBuf>) -> Self {
        Self::with_runner(HostCommandRunner, tls_dir)
    }
}

impl<R: CommandRunner> MkcertAuthority<R> {
    pub fn with_runner(runner: R, tls_dir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            tls_dir: tls_dir.into(),
        }
    }

    fn certificate_paths(&self, name: &str) -> (PathBuf, PathBuf) {
        let stem = certificate_file_stem(name);
        let certs = self.certificates_directory();
        (
            certs.join(format!("{stem}.cert")),
            certs.join(format!("{stem}.key")),
        )
    }

    fn issue(&self, name: &str) -> Result<()> {
        let (cert, key) = self.certificate_paths(name);
        if cert.is_file() && key.is_file() {
            debug!(certificate = %name, "certificate already exists");
            return Ok(());
        }

        let spec = CommandSpec::new(MKCERT)
            .arg("-cert-file")
            .arg(cert.to_string_lossy())
            .arg("-key-file")
            .arg(key.to_string_lossy())
            .arg(name);
        self.runner.capture(&spec)?;

        info!(certificate = %name, path = %cert.display(), "issued certificate");
        Ok(())
    }

    fn copy_root_ca(&self, certs_dir: &Path) -> Result<()> {
        let target = certs_dir.join(ROOT_CA_FILE);
        if target.is_file() {
            return Ok(());
        }

        let output = self.runner.capture(&CommandSpec::new(MKCERT).arg("-CAROOT"))?;
        let ca_root = output.stdout.trim();
        if ca_root.is_empty() {
            return Err(OrcaError::Config(
                "mkcert did not report a CA root directory".to_string(),
            ));
        }

        let source = Path::new(ca_root).join(ROOT_CA_FILE);
        if !source.is_file() {
            return Err(OrcaError::FileNotFound(source));
        }
        std::fs::copy(&source, &target)?;

        debug!(from = %source.display(), to = %target.display(), "copied root CA");
        Ok(())
    }
}

impl<R: CommandRunner> CertificateAuthority for MkcertAuthority<R> {
    fn generate(&self, workspace: &Workspace) -> Result<()> {
        let certs_dir = self.certificates_directory();
        std::fs::create_dir_all(&certs_dir)?;

        for name in workspace.unique_tls_certificates() {
            self.issue(&name)?;
        }

        self.copy_root_ca(&certs_dir)
    }

    fn certificates_directory(&self) -> PathBuf {
        self.tls_dir.join("certs")
    }
}
