//! Exchange-rate history tab: daily prices with 7/15/30-day moving averages.

use chrono::{Duration, Local};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tabdesk_plugin_host::{
    Plugin, PluginContext, PluginFactory, PluginHostError, PluginMetadata, TabSurface,
};
use tabdesk_store::{Select, SqlValue, StoreResult};
use tracing::info;

pub const PLUGIN_ID: &str = "rate_history";
pub const TABLE: &str = "rate_history";

/// Selectable chart periods, in days.
pub const PERIODS: [usize; 3] = [7, 15, 30];
/// Moving-average windows drawn over the loaded period.
pub const MA_WINDOWS: [usize; 3] = [7, 15, 30];

const SAMPLE_DAYS: i64 = 60;
const SAMPLE_BASE_RATE: f64 = 7.2;
const SAMPLE_SPREAD: f64 = 0.3;

#[derive(Debug, Clone, PartialEq)]
pub struct RatePoint {
    pub date: String,
    pub price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct Settings {
    period: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self { period: PERIODS[0] }
    }
}

/// Simple moving average. Positions before a full window are `None`, and a
/// series shorter than `window` yields all `None`.
pub fn moving_average(prices: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 || prices.len() < window {
        return vec![None; prices.len()];
    }
    (0..prices.len())
        .map(|i| {
            (i + 1 >= window).then(|| {
                let slice = &prices[i + 1 - window..=i];
                slice.iter().sum::<f64>() / window as f64
            })
        })
        .collect()
}

pub struct RateHistoryPlugin {
    meta: PluginMetadata,
    ctx: PluginContext,
    period: usize,
}

impl RateHistoryPlugin {
    pub fn metadata() -> PluginMetadata {
        PluginMetadata::new(PLUGIN_ID, "Rate History")
            .version("2.0.0")
            .author("Tabdesk")
            .description("Exchange-rate history with moving averages")
    }

    pub fn factory() -> PluginFactory {
        PluginFactory::new(Self::metadata(), |ctx| {
            Ok(Box::new(Self::new(ctx)) as Box<dyn Plugin>)
        })
    }

    pub fn new(ctx: PluginContext) -> Self {
        Self {
            meta: Self::metadata(),
            ctx,
            period: PERIODS[0],
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Switches the displayed period and remembers it in plugin settings.
    pub fn set_period(&mut self, days: usize) -> Result<(), PluginHostError> {
        if !PERIODS.contains(&days) {
            return Err(PluginHostError::CommandFailed {
                plugin_id: PLUGIN_ID.to_string(),
                command: "period".to_string(),
                message: format!("unsupported period {days}, expected one of {PERIODS:?}"),
            });
        }
        self.period = days;
        let settings = serde_json::to_value(Settings { period: days })?;
        self.ctx.save_settings(&settings)?;
        Ok(())
    }

    fn ensure_schema(&self) -> StoreResult<()> {
        self.ctx.store().tables().ensure_table(
            TABLE,
            &[("date", "TEXT NOT NULL UNIQUE"), ("price", "REAL NOT NULL")],
        )?;
        Ok(())
    }

    /// Fills an empty table with random prices for the last 60 days.
    fn seed_sample_data(&self) -> StoreResult<usize> {
        let store = self.ctx.store();
        if store.select_one(&Select::table(TABLE))?.is_some() {
            return Ok(0);
        }
        let today = Local::now().date_naive();
        let mut rng = rand::thread_rng();
        let rows: Vec<Vec<(&str, SqlValue)>> = (0..SAMPLE_DAYS)
            .map(|i| {
                let date = today - Duration::days(SAMPLE_DAYS - i);
                let jitter = rng.gen_range(-SAMPLE_SPREAD..SAMPLE_SPREAD);
                let price = ((SAMPLE_BASE_RATE + jitter) * 10_000.0).round() / 10_000.0;
                vec![
                    ("date", SqlValue::Text(date.format("%Y-%m-%d").to_string())),
                    ("price", SqlValue::Real(price)),
                ]
            })
            .collect();
        let inserted = store.bulk_insert(TABLE, &rows)?;
        info!(rows = inserted, "Seeded sample rate history");
        Ok(inserted)
    }

    /// The most recent `days` points, oldest first.
    pub fn load_points(&self, days: usize) -> StoreResult<Vec<RatePoint>> {
        let rows = self.ctx.store().select(
            &Select::table(TABLE)
                .columns(&["date", "price"])
                .order_by("date DESC")
                .limit(days),
        )?;
        let mut points: Vec<RatePoint> = rows
            .iter()
            .filter_map(|r| {
                Some(RatePoint {
                    date: r.get_str("date")?.to_string(),
                    price: r.get_f64("price")?,
                })
            })
            .collect();
        points.reverse();
        Ok(points)
    }

    fn render(&self) -> StoreResult<TabSurface> {
        let heading = format!("{} ({} days)", self.meta.name, self.period);
        let points = self.load_points(self.period)?;
        let Some(latest) = points.last() else {
            return Ok(TabSurface::new(heading).line("No data"));
        };

        let prices: Vec<f64> = points.iter().map(|p| p.price).collect();
        let low = prices.iter().copied().fold(f64::INFINITY, f64::min);
        let high = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let averages = MA_WINDOWS
            .iter()
            .map(|&w| {
                let last = moving_average(&prices, w).last().copied().flatten();
                match last {
                    Some(v) => format!("MA{w} {v:.4}"),
                    None => format!("MA{w} -"),
                }
            })
            .collect::<Vec<_>>()
            .join("  ");

        let mut surface = TabSurface::new(heading)
            .line(format!("Latest {} {:.4}", latest.date, latest.price))
            .line(format!("Low {low:.4}  High {high:.4}"))
            .line(averages);
        for point in &points {
            surface = surface.line(format!("{}  {:.4}", point.date, point.price));
        }
        Ok(surface)
    }
}

impl Plugin for RateHistoryPlugin {
    fn metadata(&self) -> &PluginMetadata {
        &self.meta
    }

    fn surface(&self) -> TabSurface {
        self.render().unwrap_or_else(|e| {
            TabSurface::new(self.meta.name.clone()).line(format!("Unavailable: {e}"))
        })
    }

    fn on_load(&mut self) -> Result<(), PluginHostError> {
        self.ensure_schema()?;
        self.seed_sample_data()?;
        let settings: Settings = serde_json::from_value(self.ctx.settings()?).unwrap_or_default();
        if PERIODS.contains(&settings.period) {
            self.period = settings.period;
        }
        Ok(())
    }

    fn handle_command(&mut self, command: &str, args: &[String]) -> Result<String, PluginHostError> {
        match command {
            "period" => {
                let days = args
                    .first()
                    .and_then(|a| a.parse::<usize>().ok())
                    .ok_or_else(|| PluginHostError::CommandFailed {
                        plugin_id: PLUGIN_ID.to_string(),
                        command: command.to_string(),
                        message: "expected a number of days".to_string(),
                    })?;
                self.set_period(days)?;
                Ok(format!("period set to {days} days"))
            }
            _ => Err(PluginHostError::CommandNotSupported {
                plugin_id: PLUGIN_ID.to_string(),
                command: command.to_string(),
            }),
        }
    }
}
