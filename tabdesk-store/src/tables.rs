//! Schema-on-demand table management for extension-owned tables.

use crate::error::StoreResult;
use crate::ident::validate_identifier;
use crate::row::SqlValue;
use crate::store::Store;
use tracing::info;

/// Prefix marking tables owned by the store itself. Such tables are never
/// dropped or cleared through [`TableManager`].
pub const SYSTEM_TABLE_PREFIX: &str = "_system_";

/// Returns true for names carrying the reserved system prefix. SQLite table
/// names are case-insensitive, so the prefix is too.
pub fn is_system_table(name: &str) -> bool {
    has_prefix_ignore_case(name, SYSTEM_TABLE_PREFIX)
}

fn has_prefix_ignore_case(name: &str, prefix: &str) -> bool {
    name.get(..prefix.len())
        .is_some_and(|p| p.eq_ignore_ascii_case(prefix))
}

/// Creates, drops and clears dynamic tables.
pub struct TableManager<'s> {
    store: &'s Store,
}

impl<'s> TableManager<'s> {
    pub(crate) fn new(store: &'s Store) -> Self {
        Self { store }
    }

    pub fn table_exists(&self, name: &str) -> StoreResult<bool> {
        let row = self.store.fetch_one(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
            &[SqlValue::Text(name.to_string())],
        )?;
        Ok(row.is_some())
    }

    /// Creates `name` with an `id INTEGER PRIMARY KEY AUTOINCREMENT` column
    /// followed by `columns`, unless a table of that name already exists.
    ///
    /// Declared types are used verbatim. An existing table is left alone even
    /// if its columns differ from `columns`. Returns whether a table was created.
    pub fn ensure_table(&self, name: &str, columns: &[(&str, &str)]) -> StoreResult<bool> {
        validate_identifier(name)?;
        if self.table_exists(name)? {
            return Ok(false);
        }

        let mut defs = vec!["id INTEGER PRIMARY KEY AUTOINCREMENT".to_string()];
        for (column, declared_type) in columns {
            defs.push(format!("{} {declared_type}", validate_identifier(column)?));
        }
        self.store
            .execute(&format!("CREATE TABLE {name} ({})", defs.join(", ")), &[])?;
        info!(table = name, columns = columns.len(), "Dynamic table created");
        Ok(true)
    }

    /// Drops `name`. System tables are silently left in place.
    pub fn drop_table(&self, name: &str) -> StoreResult<()> {
        if is_system_table(name) {
            return Ok(());
        }
        validate_identifier(name)?;
        self.store.execute(&format!("DROP TABLE IF EXISTS {name}"), &[])?;
        Ok(())
    }

    /// Deletes every row of `name`. System tables are silently left in place.
    pub fn clear_table(&self, name: &str) -> StoreResult<()> {
        if is_system_table(name) {
            return Ok(());
        }
        validate_identifier(name)?;
        self.store.execute(&format!("DELETE FROM {name}"), &[])?;
        Ok(())
    }

    /// Names of extension-owned tables, sorted.
    pub fn list_tables(&self) -> StoreResult<Vec<String>> {
        let rows = self.store.fetch_all(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
            &[],
        )?;
        Ok(rows
            .iter()
            .filter_map(|r| r.get_str("name"))
            .filter(|name| !is_system_table(name) && !has_prefix_ignore_case(name, "sqlite_"))
            .map(String::from)
            .collect())
    }
}
