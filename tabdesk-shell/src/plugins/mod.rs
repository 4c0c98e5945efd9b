//! Plugins compiled into the shell.

pub mod rate_history;

use rate_history::RateHistoryPlugin;
use tabdesk_plugin_host::StaticLoader;

/// Loader holding every built-in plugin, in tab order.
pub fn builtin_loader() -> StaticLoader {
    let mut loader = StaticLoader::new();
    loader.register(RateHistoryPlugin::factory());
    loader
}
