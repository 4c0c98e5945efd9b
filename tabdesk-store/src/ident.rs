//! Allow-list validation for schema identifiers.
//!
//! Table names, column names and `ORDER BY` terms are interpolated into SQL
//! text, so they must pass these checks before any statement is built.
//! Values always travel as bound parameters instead.

use crate::error::{StoreError, StoreResult};

/// Longest identifier accepted.
pub const MAX_IDENTIFIER_LEN: usize = 64;

/// Returns true if `name` matches `[A-Za-z_][A-Za-z0-9_]*` and fits the length cap.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    name.len() <= MAX_IDENTIFIER_LEN
        && (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validates a single identifier, returning it unchanged on success.
pub fn validate_identifier(name: &str) -> StoreResult<&str> {
    if is_valid_identifier(name) {
        Ok(name)
    } else {
        Err(StoreError::InvalidIdentifier(name.to_string()))
    }
}

/// Validates an `ORDER BY` clause of the form `col [ASC|DESC], ...` and
/// returns it normalized (single spaces, upper-case direction).
pub fn validate_order_by(clause: &str) -> StoreResult<String> {
    let mut terms = Vec::new();
    for term in clause.split(',') {
        let mut parts = term.split_whitespace();
        let column = parts
            .next()
            .ok_or_else(|| StoreError::InvalidIdentifier(clause.to_string()))?;
        validate_identifier(column)?;
        let direction = match parts.next() {
            None => None,
            Some(d) if d.eq_ignore_ascii_case("asc") => Some("ASC"),
            Some(d) if d.eq_ignore_ascii_case("desc") => Some("DESC"),
            Some(_) => return Err(StoreError::InvalidIdentifier(clause.to_string())),
        };
        if parts.next().is_some() {
            return Err(StoreError::InvalidIdentifier(clause.to_string()));
        }
        terms.push(match direction {
            Some(d) => format!("{column} {d}"),
            None => column.to_string(),
        });
    }
    Ok(terms.join(", "))
}
