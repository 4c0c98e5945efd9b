//! Composition root: opens the store once and wires it into the plugin host.

use crate::config::ShellConfig;
use crate::plugins::builtin_loader;
use crate::quick::QuickValues;
use anyhow::{Context, Result};
use std::path::Path;
use std::rc::Rc;
use tabdesk_plugin_host::PluginManager;
use tabdesk_store::Store;
use tracing::{info, warn};

pub struct App {
    store: Rc<Store>,
    manager: PluginManager,
}

impl App {
    /// Opens the database under `root`, then discovers and loads the built-in
    /// plugins that are not disabled.
    pub fn start(config: &ShellConfig, root: &Path) -> Result<Self> {
        let store_config = config.store_config(root);
        let store = Store::open(&store_config)
            .with_context(|| format!("failed to open database at {:?}", store_config.path))?;
        Ok(Self::with_store(Rc::new(store), config))
    }

    /// Wires an already opened store. Used by tests with in-memory stores.
    pub fn with_store(store: Rc<Store>, config: &ShellConfig) -> Self {
        let mut manager = PluginManager::new(Rc::clone(&store))
            .with_disabled(config.plugins.disabled.iter().cloned());
        manager.discover(&mut builtin_loader());
        let loaded = manager.load_all();
        info!(count = loaded.len(), "Shell started");
        Self { store, manager }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn manager(&self) -> &PluginManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut PluginManager {
        &mut self.manager
    }

    pub fn quick(&self) -> QuickValues<'_> {
        QuickValues::new(&self.store)
    }

    /// Unloads plugins in reverse order and closes the database.
    pub fn shutdown(self) -> Result<()> {
        let Self { store, mut manager } = self;
        manager.unload_all();
        drop(manager);
        match Rc::try_unwrap(store) {
            Ok(store) => store.close().context("failed to close database")?,
            Err(_) => warn!("Store still shared at shutdown, leaving it to drop"),
        }
        info!("Shell stopped");
        Ok(())
    }
}
