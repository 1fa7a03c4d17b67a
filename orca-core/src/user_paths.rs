//! Locations of the files orca keeps under the user's home directory.
//!
//! Every location can be redirected with an environment variable, which is
//! how tests and alternative setups keep their state out of `~/.orca`.

use crate::error::{OrcaError, Result};
use std::env;
use std::path::PathBuf;

pub const CONFIG_PATH_ENV: &str = "ORCA_CONFIG_PATH";
pub const OVERLAY_DIR_ENV: &str = "ORCA_OVERLAY_DIR";
pub const TLS_DIR_ENV: &str = "ORCA_TLS_DIR";

fn env_override(key: &str) -> Option<PathBuf> {
    env::var_os(key)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Get the orca home directory (`~/.orca`).
pub fn orca_home() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| OrcaError::Config("Cannot determine home directory".to_string()))?;
    Ok(home.join(".orca"))
}

/// Path of the persisted user configuration.
///
/// Priority order:
/// 1. `ORCA_CONFIG_PATH`
/// 2. `~/.orca/orca.yaml`
pub fn config_file_path() -> Result<PathBuf> {
    match env_override(CONFIG_PATH_ENV) {
        Some(path) => Ok(path),
        None => Ok(orca_home()?.join("orca.yaml")),
    }
}

/// Root directory for generated compose overlays.
pub fn overlay_dir() -> Result<PathBuf> {
    match env_override(OVERLAY_DIR_ENV) {
        Some(path) => Ok(path),
        None => Ok(orca_home()?.join("overlays")),
    }
}

/// Root directory for TLS material. Certificates live in its `certs` child.
pub fn tls_dir() -> Result<PathBuf> {
    match env_override(TLS_DIR_ENV) {
        Some(path) => Ok(path),
        None => Ok(orca_home()?.join("tls")),
    }
}
