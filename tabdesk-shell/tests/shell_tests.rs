//! End-to-end tests for the shell: built-in plugins, quick values and the
//! application lifecycle.

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::rc::Rc;
use tabdesk_plugin_host::{PluginContext, PluginHostError};
use tabdesk_shell::config::{CONFIG_FILE_NAME, PluginsConfig};
use tabdesk_shell::plugins::rate_history::{self, PLUGIN_ID};
use tabdesk_shell::quick::{QuickField, RATE_DATE_KEY, RATE_HISTORY_TABLE};
use tabdesk_shell::{App, ShellConfig};
use tabdesk_store::{Decoded, Encoding, SqlValue, Store};

fn memory_app() -> App {
    let store = Rc::new(Store::open_in_memory().unwrap());
    App::with_store(store, &ShellConfig::default())
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ============================================================================
// Rate history plugin
// ============================================================================

#[test]
fn rate_history_seeds_sixty_days_once() {
    let mut app = memory_app();
    assert!(app.manager().is_loaded(PLUGIN_ID));
    assert_eq!(app.store().count(rate_history::TABLE, None).unwrap(), 60);

    app.manager_mut().reload_plugin(PLUGIN_ID).unwrap();
    assert_eq!(app.store().count(rate_history::TABLE, None).unwrap(), 60);
}

#[test]
fn rate_history_prices_stay_near_base() {
    let app = memory_app();
    let rows = app
        .store()
        .fetch_all("SELECT price FROM rate_history", &[])
        .unwrap();
    for row in rows {
        let price = row.get_f64("price").unwrap();
        assert!((6.9..=7.5).contains(&price), "price {price} out of range");
    }
}

#[test]
fn rate_history_surface_shows_default_period() {
    let app = memory_app();
    let tabs = app.manager().tabs();
    assert_eq!(tabs.len(), 1);

    let surface = &tabs[0].surface;
    assert_eq!(surface.heading, "Rate History (7 days)");
    // latest, low/high, averages, then one line per day
    assert_eq!(surface.lines.len(), 3 + 7);
    assert!(surface.lines[2].starts_with("MA7 "));
    assert!(surface.lines[2].contains("MA15 -"));
}

#[test]
fn rate_history_period_persists_across_reload() {
    let mut app = memory_app();
    let reply = app
        .manager_mut()
        .send_command(PLUGIN_ID, "period", &["30".to_string()])
        .unwrap();
    assert_eq!(reply, "period set to 30 days");

    app.manager_mut().reload_plugin(PLUGIN_ID).unwrap();
    let surface = app.manager_mut().select_tab(PLUGIN_ID).unwrap();
    assert_eq!(surface.heading, "Rate History (30 days)");
    assert_eq!(surface.lines.len(), 3 + 30);

    let settings = app
        .store()
        .global()
        .get("plugin_rate_history_settings", serde_json::json!({}), Encoding::Structured)
        .unwrap()
        .into_json();
    assert_eq!(settings, serde_json::json!({ "period": 30 }));
}

#[test]
fn rate_history_rejects_unknown_period() {
    let mut app = memory_app();
    let err = app
        .manager_mut()
        .send_command(PLUGIN_ID, "period", &["10".to_string()])
        .unwrap_err();
    assert!(matches!(err, PluginHostError::CommandFailed { .. }));

    let err = app
        .manager_mut()
        .send_command(PLUGIN_ID, "zoom", &[])
        .unwrap_err();
    assert!(matches!(err, PluginHostError::CommandNotSupported { .. }));
}

#[test]
fn selecting_by_search_finds_rate_tab() {
    let app = memory_app();
    assert_eq!(app.manager().search_tabs("history").as_deref(), Some(PLUGIN_ID));
    assert_eq!(app.manager().search_tabs("weather"), None);
}

// ============================================================================
// Quick values
// ============================================================================

#[test]
fn saving_rate_records_global_and_history() {
    let app = memory_app();
    let quick = app.quick();

    assert!(quick.save(QuickField::RmbRate, "7.23", day(2024, 3, 1)).unwrap());
    assert_eq!(quick.get(QuickField::RmbRate).unwrap(), "7.23");

    let stamped = app
        .store()
        .global()
        .get(RATE_DATE_KEY, "", Encoding::Structured)
        .unwrap();
    assert_eq!(stamped.as_str(), Some("2024-03-01"));

    let history = quick.history().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].record_date, "2024-03-01");
    assert!((history[0].rate - 7.23).abs() < 1e-9);
}

#[test]
fn saving_rate_twice_a_day_keeps_one_row() {
    let app = memory_app();
    let quick = app.quick();

    quick.save(QuickField::RmbRate, "7.23", day(2024, 3, 1)).unwrap();
    quick.save(QuickField::RmbRate, "7.31", day(2024, 3, 1)).unwrap();
    quick.save(QuickField::RmbRate, "7.10", day(2024, 3, 2)).unwrap();

    let rates: Vec<(String, f64)> = quick
        .history()
        .unwrap()
        .into_iter()
        .map(|r| (r.record_date, r.rate))
        .collect();
    assert_eq!(
        rates,
        vec![("2024-03-01".to_string(), 7.31), ("2024-03-02".to_string(), 7.10)]
    );
    assert_eq!(app.store().count(RATE_HISTORY_TABLE, None).unwrap(), 2);
}

#[test]
fn quick_values_read_back_as_strings_through_plugin_context() {
    let store = Rc::new(Store::open_in_memory().unwrap());
    let app = App::with_store(Rc::clone(&store), &ShellConfig::default());
    let quick = app.quick();
    quick.save(QuickField::RmbRate, "7.23", day(2024, 3, 1)).unwrap();
    quick.save(QuickField::StaminaCost, "007", day(2024, 3, 1)).unwrap();

    let ctx = PluginContext::new(store, "reader");
    assert_eq!(
        ctx.global("global_rmb_rate", "").unwrap(),
        Decoded::Structured(json!("7.23"))
    );
    assert_eq!(
        ctx.global("global_stamina_cost", "").unwrap(),
        Decoded::Structured(json!("007"))
    );
    assert_eq!(quick.get(QuickField::StaminaCost).unwrap(), "007");

    let row = app
        .store()
        .fetch_one(
            "SELECT value, data_type FROM _system_global_data WHERE key = ?1",
            &[SqlValue::Text("global_rmb_rate".into())],
        )
        .unwrap()
        .unwrap();
    assert_eq!(row.get_str("value"), Some("\"7.23\""));
    assert_eq!(row.get_str("data_type"), Some("json"));
}

#[test]
fn blank_quick_value_is_ignored() {
    let app = memory_app();
    let quick = app.quick();
    quick.save(QuickField::StaminaCost, "120", day(2024, 3, 1)).unwrap();

    assert!(!quick.save(QuickField::StaminaCost, "   ", day(2024, 3, 1)).unwrap());
    assert_eq!(quick.get(QuickField::StaminaCost).unwrap(), "120");
}

#[test]
fn non_numeric_rate_is_rejected() {
    let app = memory_app();
    let quick = app.quick();

    assert!(quick.save(QuickField::RmbRate, "seven", day(2024, 3, 1)).is_err());
    assert_eq!(quick.get(QuickField::RmbRate).unwrap(), "");
    assert!(quick.history().unwrap().is_empty());
}

#[test]
fn other_fields_skip_history() {
    let app = memory_app();
    let quick = app.quick();
    quick.save(QuickField::EnergyCost, "35", day(2024, 3, 1)).unwrap();

    assert_eq!(quick.get(QuickField::EnergyCost).unwrap(), "35");
    assert!(quick.history().unwrap().is_empty());
}

// ============================================================================
// Application lifecycle
// ============================================================================

#[test]
fn start_creates_database_under_root() {
    let dir = tempfile::tempdir().unwrap();
    let config = ShellConfig::load(dir.path());
    let app = App::start(&config, dir.path()).unwrap();

    let records = app.store().plugins().list_all().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, PLUGIN_ID);
    assert_eq!(records[0].version, "2.0.0");
    app.shutdown().unwrap();

    assert!(dir.path().join("data/tabdesk.db").exists());
}

#[test]
fn data_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = ShellConfig::default();

    let app = App::start(&config, dir.path()).unwrap();
    app.quick()
        .save(QuickField::StaminaCost, "80", day(2024, 3, 1))
        .unwrap();
    app.shutdown().unwrap();

    let app = App::start(&config, dir.path()).unwrap();
    assert_eq!(app.quick().get(QuickField::StaminaCost).unwrap(), "80");
    assert_eq!(app.store().count(rate_history::TABLE, None).unwrap(), 60);
    app.shutdown().unwrap();
}

#[test]
fn disabled_plugins_are_not_loaded() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        "[plugins]\ndisabled = [\"rate_history\"]\n",
    )
    .unwrap();

    let config = ShellConfig::load(dir.path());
    assert_eq!(
        config.plugins,
        PluginsConfig {
            disabled: vec![PLUGIN_ID.to_string()]
        }
    );

    let app = App::start(&config, dir.path()).unwrap();
    assert!(app.manager().tabs().is_empty());
    assert!(!app.store().tables().table_exists(rate_history::TABLE).unwrap());
    app.shutdown().unwrap();
}

#[test]
fn export_writes_copy_with_plugin_data() {
    let dir = tempfile::tempdir().unwrap();
    let app = App::start(&ShellConfig::default(), dir.path()).unwrap();
    let dest = dir.path().join("backup/copy.db");
    app.store().export_to(&dest).unwrap();
    app.shutdown().unwrap();

    let copy = Store::open(&tabdesk_store::StoreConfig::at(&dest)).unwrap();
    assert_eq!(copy.count(rate_history::TABLE, None).unwrap(), 60);
}
