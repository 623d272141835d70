// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;
use std::path::{Path, PathBuf};

use davsync_dav::DavConfig;
use davsync_entity::EntityKind;
use serde::{Deserialize, Deserializer, de};

use crate::engine::SyncConfig;

/// The name of the application.
pub const APP_NAME: &str = "davsync";

/// File name of the local database inside the state directory.
pub const DB_FILE_NAME: &str = "davsync.db";

/// Configuration for davsync.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Directory for storing application state.
    #[serde(default)]
    pub state_dir: Option<PathBuf>,

    /// The server holding the collections.
    pub server: DavConfig,

    /// Tuning for sync passes.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Collections to keep in sync.
    #[serde(default)]
    pub collections: Vec<CollectionConfig>,
}

/// A collection to keep in sync.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CollectionConfig {
    /// Path of the collection on the server, e.g. `/dav/calendars/me/tasks/`.
    pub path: String,

    /// Kind of entities in the collection.
    #[serde(deserialize_with = "deserialize_kind")]
    pub kind: EntityKind,
}

impl Config {
    /// Normalize the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a path cannot be expanded or a value is out of
    /// range.
    pub fn normalize(&mut self) -> Result<(), Box<dyn Error>> {
        if self.server.base_url.trim().is_empty() {
            return Err("server.base_url must not be empty".into());
        }
        self.server.validate()?;

        if self.sync.multiget_batch_size == 0 {
            return Err("sync.multiget_batch_size must be at least 1".into());
        }

        for collection in &self.collections {
            if collection.path.trim().is_empty() {
                return Err("collection path must not be empty".into());
            }
        }

        // Normalize state directory
        match &self.state_dir {
            Some(a) => {
                self.state_dir = Some(
                    expand_path(a)
                        .map_err(|e| format!("Failed to expand state directory path: {e}"))?,
                );
            }

            None => match get_state_dir() {
                Ok(a) => self.state_dir = Some(a.join(APP_NAME)),
                Err(e) => tracing::warn!(err = %e, "failed to get state directory"),
            },
        }

        Ok(())
    }

    /// Path of the local database, `None` to keep it in memory.
    pub fn db_path(&self) -> Option<PathBuf> {
        self.state_dir.as_ref().map(|dir| dir.join(DB_FILE_NAME))
    }
}

fn deserialize_kind<'de, D>(deserializer: D) -> Result<EntityKind, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(|_| {
        de::Error::custom(format!(
            "unknown collection kind `{s}`, expected one of event, task or contact"
        ))
    })
}

/// Handle tilde (~) and environment variables in the path
///
/// # Errors
///
/// Returns an error if the home or config directory cannot be determined.
pub fn expand_path(path: &Path) -> Result<PathBuf, Box<dyn Error>> {
    if path.is_absolute() {
        return Ok(path.to_owned());
    }

    let path = path.to_str().ok_or("Invalid path")?;

    // Handle tilde and home directory
    let home_prefixes: &[&str] = if cfg!(unix) {
        &["~/", "$HOME/", "${HOME}/"]
    } else {
        &[r"~\", "~/", r"%UserProfile%\", r"%UserProfile%/"]
    };
    for prefix in home_prefixes {
        if let Some(stripped) = path.strip_prefix(prefix) {
            return Ok(get_home_dir()?.join(stripped));
        }
    }

    // Handle config directories
    let config_prefixes: &[&str] = if cfg!(unix) {
        &["$XDG_CONFIG_HOME/", "${XDG_CONFIG_HOME}/"]
    } else {
        &[r"%LOCALAPPDATA%\", "%LOCALAPPDATA%/"]
    };
    for prefix in config_prefixes {
        if let Some(stripped) = path.strip_prefix(prefix) {
            return Ok(get_config_dir()?.join(stripped));
        }
    }

    Ok(path.into())
}

fn get_home_dir() -> Result<PathBuf, Box<dyn Error>> {
    dirs::home_dir().ok_or_else(|| "User-specific home directory not found".into())
}

/// The user-specific config directory.
///
/// # Errors
///
/// Returns an error if the directory cannot be determined.
pub fn get_config_dir() -> Result<PathBuf, Box<dyn Error>> {
    #[cfg(unix)]
    let config_dir = xdg::BaseDirectories::new().get_config_home();
    #[cfg(not(unix))]
    let config_dir = dirs::config_dir();
    config_dir.ok_or_else(|| "User-specific config directory not found".into())
}

fn get_state_dir() -> Result<PathBuf, Box<dyn Error>> {
    #[cfg(unix)]
    let state_dir = xdg::BaseDirectories::new().get_state_home();
    #[cfg(not(unix))]
    let state_dir = dirs::data_dir();
    state_dir.ok_or_else(|| "User-specific state directory not found".into())
}
