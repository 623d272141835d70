// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{error::Error, path::PathBuf};

use davsync_core::{APP_NAME, Config, LocalDb, get_config_dir};
use tokio::fs;

const DAVSYNC_CONFIG_ENV: &str = "DAVSYNC_CONFIG";

/// Loads and normalizes the configuration.
///
/// The file is looked up in this order: `path`, the `DAVSYNC_CONFIG`
/// environment variable, then `davsync/config.toml` in the user config
/// directory.
///
/// # Errors
///
/// Returns an error if no file is found or it cannot be read, parsed or
/// normalized.
#[tracing::instrument]
pub async fn parse_config(path: Option<PathBuf>) -> Result<Config, Box<dyn Error>> {
    let path = if let Some(path) = path {
        path
    } else if let Ok(env_path) = std::env::var(DAVSYNC_CONFIG_ENV) {
        PathBuf::from(env_path)
    } else {
        let config = get_config_dir()?.join(format!("{APP_NAME}/config.toml"));
        if !config.exists() {
            return Err(format!("No config found at: {}", config.display()).into());
        }
        config
    };

    let content = fs::read_to_string(&path)
        .await
        .map_err(|e| format!("Failed to read config file at {}: {}", path.display(), e))?;
    let mut config: Config = toml::from_str(&content)
        .map_err(|e| format!("Failed to parse config file at {}: {}", path.display(), e))?;
    config.normalize()?;
    Ok(config)
}

/// Opens the local database, creating the state directory on first use.
pub async fn open_db(config: &Config) -> Result<LocalDb, Box<dyn Error>> {
    if let Some(dir) = &config.state_dir {
        fs::create_dir_all(dir)
            .await
            .map_err(|e| format!("Failed to create state directory {}: {}", dir.display(), e))?;
    }
    Ok(LocalDb::open(config.db_path().as_deref()).await?)
}
