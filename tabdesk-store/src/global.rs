//! Global key/value entries (`_system_global_data`).

use crate::error::StoreResult;
use crate::row::{Filter, Select, SqlValue};
use crate::store::Store;
use crate::timestamp_now;
use crate::value::{Decoded, Encoding, decode, encode};
use serde::Serialize;

pub(crate) const TABLE: &str = "_system_global_data";

/// Values stored under a single unique string key.
pub struct GlobalData<'s> {
    store: &'s Store,
}

impl<'s> GlobalData<'s> {
    pub(crate) fn new(store: &'s Store) -> Self {
        Self { store }
    }

    /// Creates or overwrites `key`.
    pub fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        encoding: Encoding,
    ) -> StoreResult<()> {
        let stored = encode(value, encoding)?;
        self.store.execute(
            "INSERT OR REPLACE INTO _system_global_data (key, value, data_type, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            &[
                SqlValue::Text(key.to_string()),
                SqlValue::Text(stored),
                SqlValue::Text(encoding.tag().to_string()),
                SqlValue::Text(timestamp_now()),
            ],
        )?;
        Ok(())
    }

    /// Reads `key`, decoding with the encoding requested here rather than the
    /// one recorded at write time. Absent keys yield `default` unchanged.
    pub fn get(
        &self,
        key: &str,
        default: impl Into<Decoded>,
        encoding: Encoding,
    ) -> StoreResult<Decoded> {
        Ok(self.lookup(key, encoding)?.unwrap_or_else(|| default.into()))
    }

    /// Like [`get`](Self::get) but reports absence as `None`.
    pub fn lookup(&self, key: &str, encoding: Encoding) -> StoreResult<Option<Decoded>> {
        let row = self.store.select_one(
            &Select::table(TABLE)
                .columns(&["value"])
                .filter(Filter::new("key = ?", [key.to_string()])),
        )?;
        Ok(row.map(|r| decode(r.get_str("value").unwrap_or_default().to_string(), encoding)))
    }

    /// Deletes `key`; returns whether it existed.
    pub fn remove(&self, key: &str) -> StoreResult<bool> {
        let removed = self
            .store
            .delete(TABLE, &Filter::new("key = ?", [key.to_string()]))?;
        Ok(removed > 0)
    }

    /// All keys, sorted.
    pub fn keys(&self) -> StoreResult<Vec<String>> {
        let rows = self
            .store
            .select(&Select::table(TABLE).columns(&["key"]).order_by("key"))?;
        Ok(rows
            .iter()
            .filter_map(|r| r.get_str("key"))
            .map(String::from)
            .collect())
    }
}
