//! Plugin metadata registry (`_system_plugins`).
//!
//! Tracks which plugins are known and when each was last activated. The
//! registry never owns plugin lifecycle; that belongs to the host.

use crate::config::UpsertMode;
use crate::error::StoreResult;
use crate::row::{Filter, Row, Select, SqlValue};
use crate::store::Store;
use crate::timestamp_now;
use serde::Serialize;

pub(crate) const TABLE: &str = "_system_plugins";

/// A known plugin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginRecord {
    pub id: String,
    pub name: String,
    pub version: String,
    pub author: String,
    pub created_at: String,
    pub last_used: String,
    /// Free-form JSON configuration, if any was stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Value>,
}

impl PluginRecord {
    fn from_row(row: &Row) -> Self {
        let text = |col: &str| row.get_str(col).unwrap_or_default().to_string();
        Self {
            id: text("id"),
            name: text("name"),
            version: text("version"),
            author: text("author"),
            created_at: text("created_at"),
            last_used: text("last_used"),
            config: row
                .get_str("config")
                .and_then(|c| serde_json::from_str(c).ok()),
        }
    }
}

pub struct PluginRegistry<'s> {
    store: &'s Store,
}

impl<'s> PluginRegistry<'s> {
    pub(crate) fn new(store: &'s Store) -> Self {
        Self { store }
    }

    /// Registers `id`, overwriting name, version and author if it is known.
    ///
    /// `last_used` is stamped to now. `created_at` is reset too under
    /// [`UpsertMode::Replace`], and kept under [`UpsertMode::PreserveCreated`].
    pub fn register(&self, id: &str, name: &str, version: &str, author: &str) -> StoreResult<()> {
        let sql = match self.store.upsert_mode() {
            UpsertMode::Replace => {
                "INSERT OR REPLACE INTO _system_plugins
                 (id, name, version, author, created_at, last_used)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)"
            }
            UpsertMode::PreserveCreated => {
                "INSERT INTO _system_plugins
                 (id, name, version, author, created_at, last_used)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                     name = excluded.name,
                     version = excluded.version,
                     author = excluded.author,
                     last_used = excluded.last_used"
            }
        };
        self.store.execute(
            sql,
            &[
                SqlValue::Text(id.to_string()),
                SqlValue::Text(name.to_string()),
                SqlValue::Text(version.to_string()),
                SqlValue::Text(author.to_string()),
                SqlValue::Text(timestamp_now()),
            ],
        )?;
        Ok(())
    }

    /// Stamps `last_used`. Unknown ids are ignored; returns whether a record
    /// was touched.
    pub fn touch(&self, id: &str) -> StoreResult<bool> {
        let changed = self.store.update(
            TABLE,
            &[("last_used", SqlValue::Text(timestamp_now()))],
            &Filter::new("id = ?", [id.to_string()]),
        )?;
        Ok(changed > 0)
    }

    pub fn get(&self, id: &str) -> StoreResult<Option<PluginRecord>> {
        let row = self
            .store
            .select_one(&Select::table(TABLE).filter(Filter::new("id = ?", [id.to_string()])))?;
        Ok(row.as_ref().map(PluginRecord::from_row))
    }

    /// All known plugins, most recently used first.
    pub fn list_all(&self) -> StoreResult<Vec<PluginRecord>> {
        let rows = self.store.fetch_all(
            "SELECT * FROM _system_plugins ORDER BY last_used DESC, rowid DESC",
            &[],
        )?;
        Ok(rows.iter().map(PluginRecord::from_row).collect())
    }

    /// Stores a JSON configuration blob on an existing record.
    pub fn set_config(&self, id: &str, config: &serde_json::Value) -> StoreResult<bool> {
        let changed = self.store.update(
            TABLE,
            &[("config", SqlValue::Text(config.to_string()))],
            &Filter::new("id = ?", [id.to_string()]),
        )?;
        Ok(changed > 0)
    }
}
