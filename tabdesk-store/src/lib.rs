//! SQLite persistence layer for Tabdesk.
//!
//! One [`Store`] owns the only connection to the application database and
//! exposes it through a handful of components:
//!
//! - row-level CRUD over arbitrary tables ([`Store::insert`], [`Store::select`], ...)
//! - [`TableManager`]: schema-on-demand tables for plugins, with `_system_`
//!   tables shielded from drop/clear
//! - [`GlobalData`]: values under a single string key
//! - [`DynamicData`]: values under a `(category, key)` pair
//! - [`PluginRegistry`]: which plugins are known and when each was last used
//!
//! Values are stored as text tagged `json` or `raw`. Reads never fail on bad
//! JSON; they hand back [`Decoded::Fallback`] with the stored text instead.
//!
//! Table and column names are checked against an identifier allow-list before
//! they reach SQL text. Filter clauses are caller-written and trusted; their
//! values are always bound parameters.

mod config;
mod dynamic;
mod error;
mod global;
mod ident;
mod plugins;
mod row;
mod store;
mod tables;
mod value;

pub use config::{DEFAULT_DB_PATH, StoreConfig, UpsertMode};
pub use dynamic::{DynamicData, DynamicEntry};
pub use error::{StoreError, StoreResult};
pub use global::GlobalData;
pub use ident::{is_valid_identifier, validate_identifier};
pub use plugins::{PluginRecord, PluginRegistry};
pub use row::{Filter, Row, Select, SqlValue};
pub use store::{ExecOutcome, Store};
pub use tables::{SYSTEM_TABLE_PREFIX, TableManager, is_system_table};
pub use value::{Decoded, Encoding};

/// UTC time with fixed microsecond width, so that text ordering matches
/// chronological ordering even across local clock changes.
pub(crate) fn timestamp_now() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.6fZ")
        .to_string()
}
