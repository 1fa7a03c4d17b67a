use anyhow::{Context, Result};
use orca_config::ConfigManager;
use orca_core::{orca_print, orca_println};

use crate::cli::ConfigSubcommand;

pub fn handle_config_command(store: &ConfigManager, command: ConfigSubcommand) -> Result<()> {
    match command {
        ConfigSubcommand::Show { json: true } => {
            let json = serde_json::to_string_pretty(store.config())
                .context("Failed to serialize user configuration")?;
            orca_println!("{json}");
        }
        ConfigSubcommand::Show { json: false } => {
            let yaml = serde_yaml_ng::to_string(store.config())
                .context("Failed to serialize user configuration")?;
            orca_print!("{yaml}");
        }
        ConfigSubcommand::Path => {
            orca_println!("{}", store.path().display());
        }
    }
    Ok(())
}
