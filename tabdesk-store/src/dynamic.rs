//! Category-scoped entries (`_system_dynamic_data`).
//!
//! A two-level `(category, key)` namespace for small per-plugin records that
//! don't warrant a dedicated table.

use crate::config::UpsertMode;
use crate::error::StoreResult;
use crate::row::{Filter, Row, Select, SqlValue};
use crate::store::Store;
use crate::timestamp_now;
use crate::value::{Decoded, Encoding, decode, encode};
use serde::Serialize;

pub(crate) const TABLE: &str = "_system_dynamic_data";

/// One stored entry as listed by [`DynamicData::list_category`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DynamicEntry {
    pub id: i64,
    pub category: String,
    pub key: String,
    /// Stored text, undecoded.
    pub value: String,
    /// Encoding tag recorded at write time (`json` or `raw`).
    pub data_type: String,
    pub created_at: String,
    pub updated_at: String,
}

impl DynamicEntry {
    fn from_row(row: &Row) -> Self {
        let text = |col: &str| row.get_str(col).unwrap_or_default().to_string();
        Self {
            id: row.get_i64("id").unwrap_or_default(),
            category: text("category"),
            key: text("data_key"),
            value: text("data_value"),
            data_type: text("data_type"),
            created_at: text("created_at"),
            updated_at: text("updated_at"),
        }
    }

    pub fn encoding(&self) -> Encoding {
        Encoding::from_tag(&self.data_type)
    }

    /// Decodes the value according to its recorded tag.
    pub fn decode(&self) -> Decoded {
        decode(self.value.clone(), self.encoding())
    }
}

pub struct DynamicData<'s> {
    store: &'s Store,
}

impl<'s> DynamicData<'s> {
    pub(crate) fn new(store: &'s Store) -> Self {
        Self { store }
    }

    /// Upserts `(category, key)`.
    ///
    /// Under [`UpsertMode::Replace`] the row is rewritten and `created_at`
    /// resets to now; under [`UpsertMode::PreserveCreated`] only the value,
    /// tag and `updated_at` change.
    pub fn set<T: Serialize + ?Sized>(
        &self,
        category: &str,
        key: &str,
        value: &T,
        encoding: Encoding,
    ) -> StoreResult<()> {
        let sql = match self.store.upsert_mode() {
            UpsertMode::Replace => {
                "INSERT OR REPLACE INTO _system_dynamic_data
                 (category, data_key, data_value, data_type, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)"
            }
            UpsertMode::PreserveCreated => {
                "INSERT INTO _system_dynamic_data
                 (category, data_key, data_value, data_type, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                 ON CONFLICT(category, data_key) DO UPDATE SET
                     data_value = excluded.data_value,
                     data_type = excluded.data_type,
                     updated_at = excluded.updated_at"
            }
        };
        self.store.execute(
            sql,
            &[
                SqlValue::Text(category.to_string()),
                SqlValue::Text(key.to_string()),
                SqlValue::Text(encode(value, encoding)?),
                SqlValue::Text(encoding.tag().to_string()),
                SqlValue::Text(timestamp_now()),
            ],
        )?;
        Ok(())
    }

    /// Reads `(category, key)`, decoding by the tag recorded at write time.
    pub fn get(
        &self,
        category: &str,
        key: &str,
        default: impl Into<Decoded>,
    ) -> StoreResult<Decoded> {
        Ok(match self.entry(category, key)? {
            Some(entry) => entry.decode(),
            None => default.into(),
        })
    }

    pub fn entry(&self, category: &str, key: &str) -> StoreResult<Option<DynamicEntry>> {
        let row = self.store.select_one(&Select::table(TABLE).filter(Filter::new(
            "category = ? AND data_key = ?",
            [category.to_string(), key.to_string()],
        )))?;
        Ok(row.as_ref().map(DynamicEntry::from_row))
    }

    /// Entries of `category`, most recently updated first.
    pub fn list_category(&self, category: &str) -> StoreResult<Vec<DynamicEntry>> {
        let rows = self.store.select(
            &Select::table(TABLE)
                .filter(Filter::new("category = ?", [category.to_string()]))
                .order_by("updated_at DESC, id DESC"),
        )?;
        Ok(rows.iter().map(DynamicEntry::from_row).collect())
    }

    pub fn remove(&self, category: &str, key: &str) -> StoreResult<bool> {
        let removed = self.store.delete(
            TABLE,
            &Filter::new(
                "category = ? AND data_key = ?",
                [category.to_string(), key.to_string()],
            ),
        )?;
        Ok(removed > 0)
    }

    /// Removes every entry of `category`; returns how many went.
    pub fn clear_category(&self, category: &str) -> StoreResult<usize> {
        self.store
            .delete(TABLE, &Filter::new("category = ?", [category.to_string()]))
    }
}
