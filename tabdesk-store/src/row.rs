//! Row, filter and query-builder types used by the generic store.

use serde_json::{Map, Number, Value as JsonValue};

/// A dynamically typed SQLite value. Used for bound parameters and row cells.
pub use rusqlite::types::Value as SqlValue;

/// One result row: column names in select order with their values.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    cells: Vec<(String, SqlValue)>,
}

impl Row {
    pub(crate) fn read(row: &rusqlite::Row<'_>, names: &[String]) -> rusqlite::Result<Self> {
        let mut cells = Vec::with_capacity(names.len());
        for (idx, name) in names.iter().enumerate() {
            cells.push((name.clone(), row.get::<_, SqlValue>(idx)?));
        }
        Ok(Self { cells })
    }

    /// Returns the value of `column`, if the row has it.
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v)
    }

    pub fn get_str(&self, column: &str) -> Option<&str> {
        match self.get(column)? {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn get_i64(&self, column: &str) -> Option<i64> {
        match self.get(column)? {
            SqlValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Reads a numeric column as `f64`. Integer cells are widened.
    pub fn get_f64(&self, column: &str) -> Option<f64> {
        match self.get(column)? {
            SqlValue::Real(f) => Some(*f),
            SqlValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Converts the row into a JSON object keyed by column name.
    pub fn to_json(&self) -> Map<String, JsonValue> {
        self.cells
            .iter()
            .map(|(name, value)| (name.clone(), sql_to_json(value)))
            .collect()
    }
}

fn sql_to_json(value: &SqlValue) -> JsonValue {
    match value {
        SqlValue::Null => JsonValue::Null,
        SqlValue::Integer(i) => JsonValue::from(*i),
        SqlValue::Real(f) => Number::from_f64(*f).map_or(JsonValue::Null, JsonValue::Number),
        SqlValue::Text(s) => JsonValue::String(s.clone()),
        SqlValue::Blob(b) => JsonValue::from(b.clone()),
    }
}

/// A caller-written `WHERE` fragment with bound parameters.
///
/// The clause text is trusted: it must come from code, never from user input.
/// Values belong in `params` and are bound with `?` placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    clause: String,
    params: Vec<SqlValue>,
}

impl Filter {
    pub fn new<V>(clause: impl Into<String>, params: impl IntoIterator<Item = V>) -> Self
    where
        V: Into<SqlValue>,
    {
        Self {
            clause: clause.into(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    /// A clause without parameters.
    pub fn raw(clause: impl Into<String>) -> Self {
        Self {
            clause: clause.into(),
            params: Vec::new(),
        }
    }

    pub fn clause(&self) -> &str {
        &self.clause
    }

    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }
}

/// Builder for [`Store::select`](crate::Store::select).
#[derive(Debug, Clone)]
pub struct Select<'a> {
    pub(crate) table: &'a str,
    pub(crate) columns: Vec<&'a str>,
    pub(crate) filter: Option<Filter>,
    pub(crate) order_by: Option<&'a str>,
    pub(crate) limit: Option<usize>,
}

impl<'a> Select<'a> {
    /// Selects all columns of `table`.
    pub fn table(table: &'a str) -> Self {
        Self {
            table,
            columns: Vec::new(),
            filter: None,
            order_by: None,
            limit: None,
        }
    }

    /// Restricts the column list. An empty list means `*`.
    pub fn columns(mut self, columns: &[&'a str]) -> Self {
        self.columns = columns.to_vec();
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// `ORDER BY` terms, e.g. `"updated_at DESC, id DESC"`.
    pub fn order_by(mut self, order_by: &'a str) -> Self {
        self.order_by = Some(order_by);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}
