//! Central plugin lifecycle manager.
//!
//! Owns the discovered factories and the loaded plugin instances, keeps the
//! plugin registry in the store up to date, and answers tab queries for the
//! shell.

use crate::context::PluginContext;
use crate::error::PluginHostError;
use crate::loader::{PluginFactory, PluginLoader};
use crate::plugin::{Plugin, PluginMetadata, TabSurface};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use tabdesk_store::Store;
use tracing::{debug, info, warn};

/// One tab as the shell shows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub surface: TabSurface,
}

pub struct PluginManager {
    store: Rc<Store>,
    factories: HashMap<String, PluginFactory>,
    /// Discovery order, used to order tabs.
    discovered: Vec<String>,
    plugins: HashMap<String, Box<dyn Plugin>>,
    disabled: HashSet<String>,
}

impl PluginManager {
    pub fn new(store: Rc<Store>) -> Self {
        Self {
            store,
            factories: HashMap::new(),
            discovered: Vec::new(),
            plugins: HashMap::new(),
            disabled: HashSet::new(),
        }
    }

    /// Plugin ids that discovery should skip.
    pub fn with_disabled<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.disabled = ids.into_iter().map(Into::into).collect();
        self
    }

    // ================================================================
    // Discovery / Loading
    // ================================================================

    /// Collects factories from `loader`, replacing any previously discovered
    /// factory with the same id. Returns the ids found, in loader order.
    pub fn discover(&mut self, loader: &mut dyn PluginLoader) -> Vec<String> {
        let mut ids = Vec::new();
        for factory in loader.discover() {
            let id = factory.id().to_string();
            if self.disabled.contains(&id) {
                info!(plugin_id = %id, "Plugin disabled by config, skipping");
                continue;
            }
            let meta = factory.metadata();
            info!(plugin_id = %id, name = %meta.name, version = %meta.version, "Plugin discovered");
            if !self.discovered.contains(&id) {
                self.discovered.push(id.clone());
            }
            self.factories.insert(id.clone(), factory);
            ids.push(id);
        }
        ids
    }

    /// Instantiates a discovered plugin, records it in the registry and runs
    /// its `on_load` hook. Loading an already loaded plugin is a no-op.
    pub fn load_plugin(&mut self, plugin_id: &str) -> Result<(), PluginHostError> {
        if self.plugins.contains_key(plugin_id) {
            return Ok(());
        }
        let factory = self
            .factories
            .get(plugin_id)
            .ok_or_else(|| PluginHostError::PluginNotFound(plugin_id.to_string()))?;

        let ctx = PluginContext::new(Rc::clone(&self.store), plugin_id);
        let mut plugin = factory.instantiate(ctx)?;
        if plugin.metadata().id != plugin_id {
            return Err(PluginHostError::InitializationFailed {
                plugin_id: plugin_id.to_string(),
                message: format!("instance reports id '{}'", plugin.metadata().id),
            });
        }

        let meta = plugin.metadata().clone();
        self.store
            .plugins()
            .register(&meta.id, &meta.name, &meta.version, &meta.author)?;
        plugin.on_load().map_err(|e| PluginHostError::HookFailed {
            plugin_id: plugin_id.to_string(),
            hook: "on_load",
            message: e.to_string(),
        })?;
        self.store.plugins().touch(plugin_id)?;

        info!(plugin_id = %plugin_id, "Plugin loaded");
        self.plugins.insert(plugin_id.to_string(), plugin);
        Ok(())
    }

    /// Loads every discovered plugin. Failures are logged and skipped so one
    /// broken plugin leaves the rest usable. Returns the ids that loaded.
    pub fn load_all(&mut self) -> Vec<String> {
        let ids = self.discovered.clone();
        ids.into_iter()
            .filter(|id| match self.load_plugin(id) {
                Ok(()) => true,
                Err(e) => {
                    warn!(plugin_id = %id, "Plugin failed to load: {}", e);
                    false
                }
            })
            .collect()
    }

    /// Runs `on_unload` and drops the instance. Hook failures are logged.
    pub fn unload_plugin(&mut self, plugin_id: &str) -> Result<(), PluginHostError> {
        match self.plugins.remove(plugin_id) {
            Some(mut plugin) => {
                if let Err(e) = plugin.on_unload() {
                    warn!(plugin_id = %plugin_id, "on_unload failed: {}", e);
                }
                info!(plugin_id = %plugin_id, "Plugin unloaded");
                Ok(())
            }
            None => Err(PluginHostError::PluginNotFound(plugin_id.to_string())),
        }
    }

    pub fn reload_plugin(&mut self, plugin_id: &str) -> Result<(), PluginHostError> {
        match self.unload_plugin(plugin_id) {
            Ok(()) | Err(PluginHostError::PluginNotFound(_)) => {}
            Err(e) => return Err(e),
        }
        self.load_plugin(plugin_id)
    }

    /// Unloads everything, in reverse load order. Used at shutdown.
    pub fn unload_all(&mut self) {
        let ids: Vec<String> = self.loaded_ids().into_iter().rev().collect();
        for id in ids {
            if let Err(e) = self.unload_plugin(&id) {
                warn!(plugin_id = %id, "Unload failed: {}", e);
            }
        }
    }

    // ================================================================
    // Plugin access
    // ================================================================

    pub fn get_plugin(&self, plugin_id: &str) -> Option<&dyn Plugin> {
        self.plugins.get(plugin_id).map(|p| p.as_ref())
    }

    pub fn is_loaded(&self, plugin_id: &str) -> bool {
        self.plugins.contains_key(plugin_id)
    }

    /// Ids of loaded plugins, in discovery order.
    pub fn loaded_ids(&self) -> Vec<String> {
        self.discovered
            .iter()
            .filter(|id| self.plugins.contains_key(*id))
            .cloned()
            .collect()
    }

    pub fn loaded_plugins(&self) -> Vec<&PluginMetadata> {
        self.discovered
            .iter()
            .filter_map(|id| self.plugins.get(id))
            .map(|p| p.metadata())
            .collect()
    }

    // ================================================================
    // Tabs
    // ================================================================

    /// One entry per loaded plugin, in discovery order.
    pub fn tabs(&self) -> Vec<TabInfo> {
        self.discovered
            .iter()
            .filter_map(|id| self.plugins.get(id))
            .map(|p| {
                let meta = p.metadata();
                TabInfo {
                    id: meta.id.clone(),
                    name: meta.name.clone(),
                    description: meta.description.clone(),
                    surface: p.surface(),
                }
            })
            .collect()
    }

    /// Activates a tab: runs the plugin's hook and stamps its `last_used`.
    pub fn select_tab(&mut self, plugin_id: &str) -> Result<TabSurface, PluginHostError> {
        let plugin = self
            .plugins
            .get_mut(plugin_id)
            .ok_or_else(|| PluginHostError::PluginNotFound(plugin_id.to_string()))?;
        plugin.on_tab_selected();
        let surface = plugin.surface();
        self.store.plugins().touch(plugin_id)?;
        debug!(plugin_id = %plugin_id, "Tab selected");
        Ok(surface)
    }

    /// Sends a command to a loaded plugin.
    pub fn send_command(
        &mut self,
        plugin_id: &str,
        command: &str,
        args: &[String],
    ) -> Result<String, PluginHostError> {
        let plugin = self
            .plugins
            .get_mut(plugin_id)
            .ok_or_else(|| PluginHostError::PluginNotFound(plugin_id.to_string()))?;
        plugin.handle_command(command, args)
    }

    /// First loaded plugin whose tab title contains `query`, ignoring case.
    pub fn search_tabs(&self, query: &str) -> Option<String> {
        if query.is_empty() {
            return None;
        }
        let needle = query.to_lowercase();
        self.discovered
            .iter()
            .filter_map(|id| self.plugins.get(id))
            .find(|p| p.metadata().name.to_lowercase().contains(&needle))
            .map(|p| p.metadata().id.clone())
    }
}
