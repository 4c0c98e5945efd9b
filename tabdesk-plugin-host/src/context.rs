//! Per-plugin handle onto the shared store.

use serde::Serialize;
use serde_json::{Value, json};
use std::rc::Rc;
use tabdesk_store::{Decoded, Encoding, Store, StoreResult};

/// Handed to a plugin at construction. Cloning is cheap; every clone shares
/// the same store.
#[derive(Clone)]
pub struct PluginContext {
    store: Rc<Store>,
    plugin_id: String,
}

impl PluginContext {
    pub fn new(store: Rc<Store>, plugin_id: impl Into<String>) -> Self {
        Self {
            store,
            plugin_id: plugin_id.into(),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn plugin_id(&self) -> &str {
        &self.plugin_id
    }

    /// Reads a global entry shared by all plugins.
    pub fn global(&self, key: &str, default: impl Into<Decoded>) -> StoreResult<Decoded> {
        self.store.global().get(key, default, Encoding::Structured)
    }

    pub fn set_global<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StoreResult<()> {
        self.store.global().set(key, value, Encoding::Structured)
    }

    /// Global key holding this plugin's settings.
    pub fn settings_key(&self) -> String {
        format!("plugin_{}_settings", self.plugin_id)
    }

    /// This plugin's settings object; `{}` when nothing was saved.
    pub fn settings(&self) -> StoreResult<Value> {
        Ok(self.global(&self.settings_key(), json!({}))?.into_json())
    }

    pub fn save_settings(&self, settings: &Value) -> StoreResult<()> {
        self.set_global(&self.settings_key(), settings)
    }
}
