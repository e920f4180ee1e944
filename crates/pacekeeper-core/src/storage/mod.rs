mod config;

pub use config::{AlertsConfig, Config, PaceConfig, SourceConfig};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the configuration directory.
///
/// `PACEKEEPER_CONFIG_DIR` wins when set. Otherwise `~/.config/pacekeeper[-dev]/`,
/// with the `-dev` suffix when `PACEKEEPER_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("PACEKEEPER_CONFIG_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("PACEKEEPER_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("pacekeeper-dev")
            } else {
                base_dir.join("pacekeeper")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::SaveFailed {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}
