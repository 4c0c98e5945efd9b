//! Plugin host for Tabdesk.
//!
//! Plugins implement a fixed contract ([`Plugin`]): metadata, lifecycle
//! hooks and a tab surface. They are made available through a
//! [`PluginLoader`] and driven by the [`PluginManager`], which also keeps the
//! store's plugin registry current. Each plugin reaches the shared store
//! through its own [`PluginContext`].

mod context;
mod error;
mod loader;
mod manager;
mod plugin;

pub use context::PluginContext;
pub use error::PluginHostError;
pub use loader::{PluginFactory, PluginLoader, StaticLoader};
pub use manager::{PluginManager, TabInfo};
pub use plugin::{Plugin, PluginMetadata, TabSurface};
