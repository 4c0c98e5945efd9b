//! Shell configuration, read from `tabdesk.toml` in the application root.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tabdesk_store::StoreConfig;
use tracing::{info, warn};

pub const CONFIG_FILE_NAME: &str = "tabdesk.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginsConfig {
    /// Plugin ids that are never loaded.
    #[serde(default)]
    pub disabled: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub plugins: PluginsConfig,
}

impl ShellConfig {
    /// Loads `tabdesk.toml` from `root`.
    pub fn load(root: &Path) -> Self {
        Self::load_from(&root.join(CONFIG_FILE_NAME))
    }

    /// Loads config from an explicit path. A missing, unreadable or malformed
    /// file falls back to defaults with a warning.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            info!("No config file at {:?}, using defaults", path);
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<ShellConfig>(&contents) {
                Ok(config) => {
                    info!("Loaded config from {:?}", path);
                    config
                }
                Err(e) => {
                    warn!("Failed to parse config {:?}: {}. Using defaults.", path, e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read config {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Store config with its path resolved against the application root.
    pub fn store_config(&self, root: &Path) -> StoreConfig {
        self.store.clone().resolved_against(root)
    }

    pub fn db_path(&self, root: &Path) -> PathBuf {
        self.store_config(root).path
    }
}
