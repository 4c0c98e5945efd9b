//! Tabdesk shell.
//!
//! Headless host for tab plugins. Reads `tabdesk.toml`, opens the shared
//! store, loads the built-in plugins and exposes the quick-value panel.

pub mod app;
pub mod config;
pub mod plugins;
pub mod quick;

pub use app::App;
pub use config::{CONFIG_FILE_NAME, PluginsConfig, ShellConfig};
