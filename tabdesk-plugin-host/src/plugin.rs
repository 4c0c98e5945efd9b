//! The contract every hosted plugin implements.

use crate::error::PluginHostError;
use serde::{Deserialize, Serialize};

/// Descriptive fields shown in the registry and on the tab strip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginMetadata {
    /// Unique identifier, stable across versions.
    pub id: String,
    /// Display name, also used as the tab title.
    pub name: String,
    pub version: String,
    pub author: String,
    #[serde(default)]
    pub description: String,
}

impl PluginMetadata {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: "1.0.0".into(),
            author: String::new(),
            description: String::new(),
        }
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// What a plugin puts in its tab. The host decides how to present it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TabSurface {
    pub heading: String,
    pub lines: Vec<String>,
}

impl TabSurface {
    pub fn new(heading: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            lines: Vec::new(),
        }
    }

    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }
}

/// A hosted plugin.
///
/// Plugins receive a [`PluginContext`](crate::PluginContext) at construction
/// and use it for all persistence. Hooks default to no-ops.
pub trait Plugin {
    fn metadata(&self) -> &PluginMetadata;

    /// Builds the tab contents.
    fn surface(&self) -> TabSurface;

    /// Called once after the plugin is registered, before its tab is shown.
    fn on_load(&mut self) -> Result<(), PluginHostError> {
        Ok(())
    }

    /// Called before the plugin is dropped.
    fn on_unload(&mut self) -> Result<(), PluginHostError> {
        Ok(())
    }

    /// Called when the plugin's tab becomes the active one.
    fn on_tab_selected(&mut self) {}

    /// Handles a named command from the shell and returns a short reply.
    fn handle_command(&mut self, command: &str, args: &[String]) -> Result<String, PluginHostError> {
        let _ = args;
        Err(PluginHostError::CommandNotSupported {
            plugin_id: self.metadata().id.clone(),
            command: command.to_string(),
        })
    }
}
