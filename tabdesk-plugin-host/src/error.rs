//! Error types for the plugin host.

use tabdesk_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PluginHostError {
    #[error("plugin not found: {0}")]
    PluginNotFound(String),

    #[error("plugin initialization failed: {plugin_id}: {message}")]
    InitializationFailed { plugin_id: String, message: String },

    #[error("plugin '{plugin_id}' failed in {hook}: {message}")]
    HookFailed {
        plugin_id: String,
        hook: &'static str,
        message: String,
    },

    #[error("command '{command}' not supported by plugin '{plugin_id}'")]
    CommandNotSupported { plugin_id: String, command: String },

    #[error("command '{command}' failed in plugin '{plugin_id}': {message}")]
    CommandFailed {
        plugin_id: String,
        command: String,
        message: String,
    },

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
