//! Store configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default database location, relative to the application root.
pub const DEFAULT_DB_PATH: &str = "data/tabdesk.db";

/// How upserts in the category and plugin registries treat `created_at`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertMode {
    /// Replace the whole row. `created_at` is reset on every write, so a record
    /// means "known since the last write".
    #[default]
    Replace,
    /// Update in place on conflict. `created_at` keeps the first-insert time.
    PreserveCreated,
}

/// Configuration for opening a [`Store`](crate::Store).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_path")]
    pub path: PathBuf,
    #[serde(default, rename = "upsert")]
    pub upsert_mode: UpsertMode,
}

fn default_path() -> PathBuf {
    PathBuf::from(DEFAULT_DB_PATH)
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            upsert_mode: UpsertMode::default(),
        }
    }
}

impl StoreConfig {
    /// Config pointing at an explicit database file.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_upsert_mode(mut self, mode: UpsertMode) -> Self {
        self.upsert_mode = mode;
        self
    }

    /// Resolves a relative `path` against `root`; absolute paths are kept.
    pub fn resolved_against(mut self, root: &Path) -> Self {
        if self.path.is_relative() {
            self.path = root.join(&self.path);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_path_against_root() {
        let cfg = StoreConfig::default().resolved_against(Path::new("/opt/tabdesk"));
        assert_eq!(cfg.path, PathBuf::from("/opt/tabdesk/data/tabdesk.db"));
    }

    #[test]
    fn keeps_absolute_path() {
        let cfg = StoreConfig::at("/var/lib/t.db").resolved_against(Path::new("/opt"));
        assert_eq!(cfg.path, PathBuf::from("/var/lib/t.db"));
    }

    #[test]
    fn upsert_mode_parses_snake_case() {
        let mode: UpsertMode = serde_json::from_str("\"preserve_created\"").unwrap();
        assert_eq!(mode, UpsertMode::PreserveCreated);
    }
}
