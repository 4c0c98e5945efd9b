//! The generic store: sole owner of the SQLite connection.
//!
//! Every mutating call runs in SQLite's autocommit mode, so each method is its
//! own atomic unit. Nothing here batches writes across calls; a sequence of
//! inserts interrupted midway leaves the earlier ones committed.

use crate::config::{StoreConfig, UpsertMode};
use crate::dynamic::DynamicData;
use crate::error::{StoreError, StoreResult};
use crate::global::GlobalData;
use crate::ident::{validate_identifier, validate_order_by};
use crate::plugins::PluginRegistry;
use crate::row::{Filter, Row, Select, SqlValue};
use crate::tables::TableManager;
use rusqlite::{Connection, params_from_iter};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Result of a mutating statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecOutcome {
    pub rows_affected: usize,
    /// Row id of the most recent successful insert on this connection.
    pub last_insert_id: i64,
}

/// Persistent store backed by a single SQLite connection.
///
/// Not `Sync`: the store expects one thread of control, the way a GUI event
/// loop runs handlers to completion. Share it with `Rc`.
pub struct Store {
    conn: Connection,
    path: Option<PathBuf>,
    upsert_mode: UpsertMode,
}

impl Store {
    /// Opens (or creates) the store described by `config`, creating the
    /// containing directory and the system tables on first use.
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(&config.path)?;
        let store = Self {
            conn,
            path: Some(config.path.clone()),
            upsert_mode: config.upsert_mode,
        };
        store.init_schema()?;
        info!(path = %config.path.display(), mode = ?config.upsert_mode, "Store opened");
        Ok(store)
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::open_in_memory_with(UpsertMode::default())
    }

    pub fn open_in_memory_with(upsert_mode: UpsertMode) -> StoreResult<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
            path: None,
            upsert_mode,
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StoreResult<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS _system_plugins (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                version TEXT,
                author TEXT,
                created_at TEXT,
                last_used TEXT,
                config TEXT
            );

            CREATE TABLE IF NOT EXISTS _system_global_data (
                key TEXT PRIMARY KEY,
                value TEXT,
                data_type TEXT,
                updated_at TEXT
            );

            CREATE TABLE IF NOT EXISTS _system_dynamic_data (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                category TEXT NOT NULL,
                data_key TEXT NOT NULL,
                data_value TEXT,
                data_type TEXT,
                created_at TEXT,
                updated_at TEXT,
                UNIQUE(category, data_key)
            );
            ",
        )?;
        Ok(())
    }

    /// Path of the backing file, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn upsert_mode(&self) -> UpsertMode {
        self.upsert_mode
    }

    // ── Component facades ────────────────────────────────────────

    pub fn tables(&self) -> TableManager<'_> {
        TableManager::new(self)
    }

    pub fn global(&self) -> GlobalData<'_> {
        GlobalData::new(self)
    }

    pub fn dynamic(&self) -> DynamicData<'_> {
        DynamicData::new(self)
    }

    pub fn plugins(&self) -> PluginRegistry<'_> {
        PluginRegistry::new(self)
    }

    // ── Raw statements ───────────────────────────────────────────

    /// Runs a mutating statement and commits it immediately.
    pub fn execute(&self, sql: &str, params: &[SqlValue]) -> StoreResult<ExecOutcome> {
        debug!(sql, "execute");
        let rows_affected = self.conn.execute(sql, params_from_iter(params))?;
        Ok(ExecOutcome {
            rows_affected,
            last_insert_id: self.conn.last_insert_rowid(),
        })
    }

    /// Runs a query and returns every row in result order.
    pub fn fetch_all(&self, sql: &str, params: &[SqlValue]) -> StoreResult<Vec<Row>> {
        debug!(sql, "fetch_all");
        let mut stmt = self.conn.prepare(sql)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let rows = stmt.query_map(params_from_iter(params), |row| Row::read(row, &names))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Runs a query and returns its first row, if any.
    pub fn fetch_one(&self, sql: &str, params: &[SqlValue]) -> StoreResult<Option<Row>> {
        debug!(sql, "fetch_one");
        let mut stmt = self.conn.prepare(sql)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mut rows = stmt.query(params_from_iter(params))?;
        match rows.next()? {
            Some(row) => Ok(Some(Row::read(row, &names)?)),
            None => Ok(None),
        }
    }

    /// Read-only escape hatch for extension code. Any table may be queried,
    /// including system ones.
    pub fn execute_sql(&self, sql: &str, params: &[SqlValue]) -> StoreResult<Vec<Row>> {
        self.fetch_all(sql, params)
    }

    // ── Row-level CRUD ───────────────────────────────────────────

    /// Inserts one row and returns its identity value.
    pub fn insert(&self, table: &str, fields: &[(&str, SqlValue)]) -> StoreResult<i64> {
        let sql = insert_sql(table, fields.iter().map(|(c, _)| *c))?;
        let values: Vec<&SqlValue> = fields.iter().map(|(_, v)| v).collect();
        debug!(sql = %sql, "insert");
        self.conn.execute(&sql, params_from_iter(values))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Inserts many rows in a single commit. Column names come from the first
    /// row; later rows are matched by name, with missing columns bound as NULL.
    /// A later row naming a column the first row lacks is rejected before
    /// anything is written. Either every row lands or none does.
    pub fn bulk_insert(&self, table: &str, rows: &[Vec<(&str, SqlValue)>]) -> StoreResult<usize> {
        let Some(first) = rows.first() else {
            return Ok(0);
        };
        let columns: Vec<&str> = first.iter().map(|(c, _)| *c).collect();
        let sql = insert_sql(table, columns.iter().copied())?;
        if let Some((column, _)) = rows
            .iter()
            .flatten()
            .find(|(c, _)| !columns.contains(c))
        {
            return Err(StoreError::UnexpectedColumn {
                table: table.to_string(),
                column: column.to_string(),
            });
        }
        debug!(sql = %sql, rows = rows.len(), "bulk_insert");

        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(&sql)?;
            for row in rows {
                let values = columns.iter().map(|col| {
                    row.iter()
                        .find(|(c, _)| c == col)
                        .map_or(SqlValue::Null, |(_, v)| v.clone())
                });
                stmt.execute(params_from_iter(values))?;
            }
        }
        tx.commit()?;
        Ok(rows.len())
    }

    /// Updates the rows matching `filter`; returns how many changed.
    pub fn update(
        &self,
        table: &str,
        fields: &[(&str, SqlValue)],
        filter: &Filter,
    ) -> StoreResult<usize> {
        validate_identifier(table)?;
        if fields.is_empty() {
            return Err(StoreError::EmptyFields(table.to_string()));
        }
        let assignments = fields
            .iter()
            .map(|(c, _)| validate_identifier(c).map(|c| format!("{c} = ?")))
            .collect::<StoreResult<Vec<_>>>()?;
        let sql = format!(
            "UPDATE {table} SET {} WHERE {}",
            assignments.join(", "),
            filter.clause()
        );
        let values = fields.iter().map(|(_, v)| v).chain(filter.params());
        debug!(sql = %sql, "update");
        Ok(self.conn.execute(&sql, params_from_iter(values))?)
    }

    /// Deletes the rows matching `filter`; returns how many were removed.
    pub fn delete(&self, table: &str, filter: &Filter) -> StoreResult<usize> {
        validate_identifier(table)?;
        let sql = format!("DELETE FROM {table} WHERE {}", filter.clause());
        debug!(sql = %sql, "delete");
        Ok(self.conn.execute(&sql, params_from_iter(filter.params()))?)
    }

    pub fn select(&self, query: &Select<'_>) -> StoreResult<Vec<Row>> {
        validate_identifier(query.table)?;
        let columns = if query.columns.is_empty() {
            "*".to_string()
        } else {
            query
                .columns
                .iter()
                .map(|c| validate_identifier(c))
                .collect::<StoreResult<Vec<_>>>()?
                .join(", ")
        };

        let mut sql = format!("SELECT {columns} FROM {}", query.table);
        if let Some(filter) = &query.filter {
            sql.push_str(" WHERE ");
            sql.push_str(filter.clause());
        }
        if let Some(order_by) = query.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(&validate_order_by(order_by)?);
        }
        if let Some(limit) = query.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let params = query.filter.as_ref().map_or(&[][..], Filter::params);
        self.fetch_all(&sql, params)
    }

    /// First row of `select` with `LIMIT 1`.
    pub fn select_one(&self, query: &Select<'_>) -> StoreResult<Option<Row>> {
        let query = query.clone().limit(1);
        Ok(self.select(&query)?.into_iter().next())
    }

    pub fn count(&self, table: &str, filter: Option<&Filter>) -> StoreResult<i64> {
        validate_identifier(table)?;
        let mut sql = format!("SELECT COUNT(*) AS count FROM {table}");
        if let Some(filter) = filter {
            sql.push_str(" WHERE ");
            sql.push_str(filter.clause());
        }
        let params = filter.map_or(&[][..], Filter::params);
        let row = self.fetch_one(&sql, params)?;
        Ok(row.and_then(|r| r.get_i64("count")).unwrap_or(0))
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Writes a consistent copy of the database to `dest`, replacing any
    /// existing file there.
    pub fn export_to(&self, dest: &Path) -> StoreResult<()> {
        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        if dest.exists() {
            std::fs::remove_file(dest)?;
        }
        let target = dest.to_string_lossy().into_owned();
        self.conn.execute("VACUUM INTO ?1", [target])?;
        info!(dest = %dest.display(), "Store exported");
        Ok(())
    }

    /// Closes the connection, reporting any error SQLite raises on close.
    pub fn close(self) -> StoreResult<()> {
        self.conn.close().map_err(|(_, e)| StoreError::Database(e))?;
        debug!("Store closed");
        Ok(())
    }
}

fn insert_sql<'c>(table: &str, columns: impl Iterator<Item = &'c str>) -> StoreResult<String> {
    validate_identifier(table)?;
    let columns = columns
        .map(|c| validate_identifier(c).map(str::to_string))
        .collect::<StoreResult<Vec<_>>>()?;
    if columns.is_empty() {
        return Err(StoreError::EmptyFields(table.to_string()));
    }
    let placeholders = vec!["?"; columns.len()].join(", ");
    Ok(format!(
        "INSERT INTO {table} ({}) VALUES ({placeholders})",
        columns.join(", ")
    ))
}
