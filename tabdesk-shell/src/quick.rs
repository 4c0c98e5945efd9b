//! Quick-value panel: a handful of numbers kept in global data, with a daily
//! history for the exchange rate.

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;
use tabdesk_store::{Decoded, Encoding, Filter, Select, SqlValue, Store};
use tracing::{debug, info};

pub const RATE_HISTORY_TABLE: &str = "rmb_rate_history";
pub const RATE_DATE_KEY: &str = "global_rmb_rate_date";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickField {
    RmbRate,
    StaminaCost,
    EnergyCost,
}

impl QuickField {
    pub const ALL: [QuickField; 3] = [Self::RmbRate, Self::StaminaCost, Self::EnergyCost];

    pub fn name(self) -> &'static str {
        match self {
            Self::RmbRate => "rmb_rate",
            Self::StaminaCost => "stamina_cost",
            Self::EnergyCost => "energy_cost",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::RmbRate => "RMB rate",
            Self::StaminaCost => "Stamina cost",
            Self::EnergyCost => "Energy cost",
        }
    }

    /// Global data key the value is stored under.
    pub fn global_key(self) -> String {
        format!("global_{}", self.name())
    }
}

impl fmt::Display for QuickField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for QuickField {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .with_context(|| format!("unknown quick field '{s}'"))
    }
}

/// One recorded exchange rate.
#[derive(Debug, Clone, PartialEq)]
pub struct RateRecord {
    pub record_date: String,
    pub rate: f64,
}

pub struct QuickValues<'s> {
    store: &'s Store,
}

impl<'s> QuickValues<'s> {
    pub fn new(store: &'s Store) -> Self {
        Self { store }
    }

    pub fn ensure_schema(&self) -> Result<()> {
        self.store.tables().ensure_table(
            RATE_HISTORY_TABLE,
            &[("rate", "REAL NOT NULL"), ("record_date", "TEXT NOT NULL")],
        )?;
        Ok(())
    }

    /// Current text of `field`, empty when never saved.
    pub fn get(&self, field: QuickField) -> Result<String> {
        let value = self
            .store
            .global()
            .get(&field.global_key(), "", Encoding::Structured)?;
        Ok(match value {
            Decoded::Structured(v) => v.as_str().map(String::from).unwrap_or_else(|| v.to_string()),
            Decoded::Raw(s) | Decoded::Fallback(s) => s,
        })
    }

    /// Stores `value` for `field`. Blank input is ignored and returns `false`.
    ///
    /// Saving the exchange rate also records it for `today`, replacing any
    /// earlier rate recorded that day.
    pub fn save(&self, field: QuickField, value: &str, today: NaiveDate) -> Result<bool> {
        let value = value.trim();
        if value.is_empty() {
            debug!(field = %field, "Blank quick value ignored");
            return Ok(false);
        }

        if field == QuickField::RmbRate {
            let rate: f64 = value
                .parse()
                .with_context(|| format!("rmb_rate must be a number, got '{value}'"))?;
            if !rate.is_finite() {
                bail!("rmb_rate must be finite, got '{value}'");
            }
            self.record_rate(rate, today)?;
            self.store
                .global()
                .set(RATE_DATE_KEY, &today.format("%Y-%m-%d").to_string(), Encoding::Structured)?;
        }

        self.store
            .global()
            .set(&field.global_key(), value, Encoding::Structured)?;
        info!(field = %field, value, "Quick value saved");
        Ok(true)
    }

    fn record_rate(&self, rate: f64, day: NaiveDate) -> Result<()> {
        self.ensure_schema()?;
        let date = day.format("%Y-%m-%d").to_string();
        let same_day = Filter::new("record_date = ?", [date.clone()]);
        let existing = self.store.select_one(
            &Select::table(RATE_HISTORY_TABLE)
                .columns(&["id"])
                .filter(same_day.clone()),
        )?;
        match existing.and_then(|r| r.get_i64("id")) {
            Some(id) => {
                self.store.update(
                    RATE_HISTORY_TABLE,
                    &[("rate", SqlValue::Real(rate))],
                    &Filter::new("id = ?", [id]),
                )?;
            }
            None => {
                self.store.insert(
                    RATE_HISTORY_TABLE,
                    &[
                        ("rate", SqlValue::Real(rate)),
                        ("record_date", SqlValue::Text(date)),
                    ],
                )?;
            }
        }
        Ok(())
    }

    /// Recorded rates, oldest first.
    pub fn history(&self) -> Result<Vec<RateRecord>> {
        self.ensure_schema()?;
        let rows = self.store.select(
            &Select::table(RATE_HISTORY_TABLE)
                .columns(&["record_date", "rate"])
                .order_by("record_date ASC"),
        )?;
        Ok(rows
            .iter()
            .filter_map(|r| {
                Some(RateRecord {
                    record_date: r.get_str("record_date")?.to_string(),
                    rate: r.get_f64("rate")?,
                })
            })
            .collect())
    }
}
