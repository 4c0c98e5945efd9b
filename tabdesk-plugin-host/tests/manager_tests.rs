//! Integration tests for the plugin manager, driven through a static loader
//! and an in-memory store.

use pretty_assertions::assert_eq;
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;
use tabdesk_plugin_host::*;
use tabdesk_store::{Decoded, Store};

type HookLog = Rc<RefCell<Vec<String>>>;

struct Recorder {
    meta: PluginMetadata,
    ctx: PluginContext,
    log: HookLog,
    fail_load: bool,
}

impl Plugin for Recorder {
    fn metadata(&self) -> &PluginMetadata {
        &self.meta
    }

    fn surface(&self) -> TabSurface {
        TabSurface::new(self.meta.name.clone()).line(format!("id={}", self.ctx.plugin_id()))
    }

    fn on_load(&mut self) -> Result<(), PluginHostError> {
        self.log.borrow_mut().push(format!("load:{}", self.meta.id));
        if self.fail_load {
            return Err(PluginHostError::InitializationFailed {
                plugin_id: self.meta.id.clone(),
                message: "boom".into(),
            });
        }
        self.ctx.set_global(&format!("{}_loaded", self.meta.id), &true)?;
        Ok(())
    }

    fn on_unload(&mut self) -> Result<(), PluginHostError> {
        self.log.borrow_mut().push(format!("unload:{}", self.meta.id));
        Ok(())
    }

    fn on_tab_selected(&mut self) {
        self.log.borrow_mut().push(format!("select:{}", self.meta.id));
    }
}

fn recorder(id: &str, name: &str, log: &HookLog, fail_load: bool) -> PluginFactory {
    let meta = PluginMetadata::new(id, name)
        .version("1.2.0")
        .author("tester")
        .description(format!("{name} plugin"));
    let log = Rc::clone(log);
    let factory_meta = meta.clone();
    PluginFactory::new(meta, move |ctx| {
        Ok(Box::new(Recorder {
            meta: factory_meta.clone(),
            ctx,
            log: Rc::clone(&log),
            fail_load,
        }) as Box<dyn Plugin>)
    })
}

fn setup(factories: Vec<PluginFactory>) -> (Rc<Store>, PluginManager, StaticLoader) {
    let store = Rc::new(Store::open_in_memory().unwrap());
    let manager = PluginManager::new(Rc::clone(&store));
    let mut loader = StaticLoader::new();
    for f in factories {
        loader.register(f);
    }
    (store, manager, loader)
}

// ================================================================
// Discovery and loading
// ================================================================

#[test]
fn discover_lists_ids_in_registration_order() {
    let log = HookLog::default();
    let (_store, mut manager, mut loader) = setup(vec![
        recorder("b.plugin", "Bravo", &log, false),
        recorder("a.plugin", "Alpha", &log, false),
    ]);
    assert_eq!(manager.discover(&mut loader), vec!["b.plugin", "a.plugin"]);
    assert!(manager.loaded_ids().is_empty());
}

#[test]
fn load_registers_and_runs_on_load() {
    let log = HookLog::default();
    let (store, mut manager, mut loader) = setup(vec![recorder("p1", "One", &log, false)]);
    manager.discover(&mut loader);
    manager.load_plugin("p1").unwrap();

    assert!(manager.is_loaded("p1"));
    assert_eq!(*log.borrow(), vec!["load:p1"]);

    let record = store.plugins().get("p1").unwrap().unwrap();
    assert_eq!(record.name, "One");
    assert_eq!(record.version, "1.2.0");
    assert_eq!(record.author, "tester");

    let flag = store.global().get("p1_loaded", json!(false), Default::default()).unwrap();
    assert_eq!(flag, Decoded::Structured(json!(true)));
}

#[test]
fn loading_twice_is_noop() {
    let log = HookLog::default();
    let (_store, mut manager, mut loader) = setup(vec![recorder("p1", "One", &log, false)]);
    manager.discover(&mut loader);
    manager.load_plugin("p1").unwrap();
    manager.load_plugin("p1").unwrap();
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn load_unknown_plugin_fails() {
    let (_store, mut manager, _loader) = setup(vec![]);
    let err = manager.load_plugin("ghost").unwrap_err();
    assert!(matches!(err, PluginHostError::PluginNotFound(id) if id == "ghost"));
}

#[test]
fn failing_on_load_is_reported_and_skipped() {
    let log = HookLog::default();
    let (_store, mut manager, mut loader) = setup(vec![
        recorder("bad", "Bad", &log, true),
        recorder("good", "Good", &log, false),
    ]);
    manager.discover(&mut loader);

    let err = manager.load_plugin("bad").unwrap_err();
    assert!(matches!(err, PluginHostError::HookFailed { hook: "on_load", .. }));

    assert_eq!(manager.load_all(), vec!["good"]);
    assert_eq!(manager.loaded_ids(), vec!["good"]);
}

#[test]
fn mismatched_instance_id_is_rejected() {
    let liar = PluginFactory::new(PluginMetadata::new("claimed", "Claimed"), |ctx| {
        Ok(Box::new(Recorder {
            meta: PluginMetadata::new("real", "Real"),
            ctx,
            log: HookLog::default(),
            fail_load: false,
        }) as Box<dyn Plugin>)
    });
    let (_store, mut manager, mut loader) = setup(vec![liar]);
    manager.discover(&mut loader);
    let err = manager.load_plugin("claimed").unwrap_err();
    assert!(matches!(err, PluginHostError::InitializationFailed { .. }));
}

#[test]
fn disabled_plugins_are_not_discovered() {
    let log = HookLog::default();
    let store = Rc::new(Store::open_in_memory().unwrap());
    let mut manager = PluginManager::new(store).with_disabled(["p2"]);
    let mut loader = StaticLoader::new();
    loader
        .register(recorder("p1", "One", &log, false))
        .register(recorder("p2", "Two", &log, false));
    assert_eq!(manager.discover(&mut loader), vec!["p1"]);
    assert!(manager.load_plugin("p2").is_err());
}

// ================================================================
// Unload / reload
// ================================================================

#[test]
fn unload_runs_hook_and_drops_instance() {
    let log = HookLog::default();
    let (_store, mut manager, mut loader) = setup(vec![recorder("p1", "One", &log, false)]);
    manager.discover(&mut loader);
    manager.load_plugin("p1").unwrap();
    assert_eq!(manager.get_plugin("p1").map(|p| p.metadata().name.as_str()), Some("One"));
    manager.unload_plugin("p1").unwrap();

    assert!(!manager.is_loaded("p1"));
    assert!(manager.get_plugin("p1").is_none());
    assert_eq!(*log.borrow(), vec!["load:p1", "unload:p1"]);
    assert!(matches!(
        manager.unload_plugin("p1"),
        Err(PluginHostError::PluginNotFound(_))
    ));
}

#[test]
fn reload_unloads_then_loads() {
    let log = HookLog::default();
    let (_store, mut manager, mut loader) = setup(vec![recorder("p1", "One", &log, false)]);
    manager.discover(&mut loader);
    manager.load_plugin("p1").unwrap();
    manager.reload_plugin("p1").unwrap();
    assert_eq!(*log.borrow(), vec!["load:p1", "unload:p1", "load:p1"]);

    // reloading something not yet loaded just loads it
    manager.unload_plugin("p1").unwrap();
    manager.reload_plugin("p1").unwrap();
    assert!(manager.is_loaded("p1"));
}

#[test]
fn unload_all_goes_in_reverse_order() {
    let log = HookLog::default();
    let (_store, mut manager, mut loader) = setup(vec![
        recorder("p1", "One", &log, false),
        recorder("p2", "Two", &log, false),
    ]);
    manager.discover(&mut loader);
    manager.load_all();
    log.borrow_mut().clear();

    manager.unload_all();
    assert_eq!(*log.borrow(), vec!["unload:p2", "unload:p1"]);
    assert!(manager.loaded_plugins().is_empty());
}

// ================================================================
// Tabs
// ================================================================

#[test]
fn tabs_follow_discovery_order() {
    let log = HookLog::default();
    let (_store, mut manager, mut loader) = setup(vec![
        recorder("p1", "Rates", &log, false),
        recorder("p2", "Notes", &log, false),
    ]);
    manager.discover(&mut loader);
    manager.load_all();

    let tabs = manager.tabs();
    let names: Vec<&str> = tabs.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Rates", "Notes"]);
    assert_eq!(tabs[0].description, "Rates plugin");
    assert_eq!(tabs[0].surface.heading, "Rates");
    assert_eq!(tabs[0].surface.lines, vec!["id=p1"]);
}

#[test]
fn select_tab_runs_hook_and_touches_registry() {
    let log = HookLog::default();
    let (store, mut manager, mut loader) = setup(vec![
        recorder("p1", "One", &log, false),
        recorder("p2", "Two", &log, false),
    ]);
    manager.discover(&mut loader);
    manager.load_all();
    std::thread::sleep(std::time::Duration::from_millis(2));

    let surface = manager.select_tab("p1").unwrap();
    assert_eq!(surface.heading, "One");
    assert!(log.borrow().contains(&"select:p1".to_string()));
    assert_eq!(store.plugins().list_all().unwrap()[0].id, "p1");

    assert!(manager.select_tab("nope").is_err());
}

#[test]
fn search_tabs_is_case_insensitive() {
    let log = HookLog::default();
    let (_store, mut manager, mut loader) = setup(vec![
        recorder("rates", "Rate History", &log, false),
        recorder("notes", "Notes", &log, false),
    ]);
    manager.discover(&mut loader);
    manager.load_all();

    assert_eq!(manager.search_tabs("HISTORY"), Some("rates".to_string()));
    assert_eq!(manager.search_tabs("note"), Some("notes".to_string()));
    assert_eq!(manager.search_tabs("calendar"), None);
    assert_eq!(manager.search_tabs(""), None);
}

#[test]
fn commands_reach_only_loaded_plugins() {
    let log = HookLog::default();
    let (_store, mut manager, mut loader) =
        setup(vec![recorder("rates", "Rate History", &log, false)]);
    manager.discover(&mut loader);

    let err = manager.send_command("rates", "refresh", &[]).unwrap_err();
    assert!(matches!(err, PluginHostError::PluginNotFound(_)));

    manager.load_plugin("rates").unwrap();
    let err = manager.send_command("rates", "refresh", &[]).unwrap_err();
    assert!(matches!(
        err,
        PluginHostError::CommandNotSupported { ref command, .. } if command == "refresh"
    ));
}

// ================================================================
// Context
// ================================================================

#[test]
fn settings_default_to_empty_object_and_persist() {
    let store = Rc::new(Store::open_in_memory().unwrap());
    let ctx = PluginContext::new(Rc::clone(&store), "rate_history");
    assert_eq!(ctx.settings_key(), "plugin_rate_history_settings");
    assert_eq!(ctx.settings().unwrap(), json!({}));

    ctx.save_settings(&json!({"period": 15})).unwrap();
    assert_eq!(ctx.settings().unwrap(), json!({"period": 15}));

    let other = PluginContext::new(store, "other");
    assert_eq!(other.settings().unwrap(), json!({}));
}
