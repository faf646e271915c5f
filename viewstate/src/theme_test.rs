use super::*;

use std::cell::RefCell;

use serde_json::json;

use crate::host::{FixedPreference, MemoryRoot, MemoryStore};

struct Tab {
    store: MemoryStore,
    root: MemoryRoot,
    hub: ThemeHub,
}

fn tab_with(store: MemoryStore, prefers_dark: bool) -> Tab {
    let root = MemoryRoot::new();
    let hub = ThemeHub::new(
        ThemeConfig::default(),
        Rc::new(store.clone()),
        Rc::new(FixedPreference(prefers_dark)),
        Rc::new(root.clone()),
    );
    Tab { store, root, hub }
}

fn tab(prefers_dark: bool) -> Tab {
    tab_with(MemoryStore::new(), prefers_dark)
}

fn stored(tab: &Tab) -> serde_json::Value {
    let raw = tab.store.peek(SESSION_KEY).unwrap();
    serde_json::from_str(&raw).unwrap()
}

// =============================================================
// Theme value
// =============================================================

#[test]
fn theme_toggles_between_light_and_dark() {
    assert_eq!(Theme::Light.toggled(), Theme::Dark);
    assert_eq!(Theme::Dark.toggled(), Theme::Light);
}

#[test]
fn theme_parses_exact_names() {
    assert_eq!("dark".parse::<Theme>(), Ok(Theme::Dark));
    assert_eq!("light".parse::<Theme>(), Ok(Theme::Light));
    assert_eq!("Dark".parse::<Theme>(), Err(ThemeParseError("Dark".to_owned())));
}

#[test]
fn theme_serializes_lowercase() {
    assert_eq!(serde_json::to_value(Theme::Dark).unwrap(), json!("dark"));
    assert_eq!(Theme::Light.to_string(), "light");
}

#[test]
fn default_config_uses_shared_record_key() {
    let config = ThemeConfig::default();
    assert_eq!(config.storage_key, "userSessionInfo");
    assert_eq!(config.attribute, "data-theme");
    assert_eq!(config.event_name, "themechange");
}

// =============================================================
// getCurrent
// =============================================================

#[test]
fn current_prefers_stored_theme() {
    let t = tab(true);
    t.store.set_item(SESSION_KEY, r#"{"prefersColorScheme":"light"}"#).unwrap();
    assert_eq!(t.hub.current(), Theme::Light);
}

#[test]
fn current_falls_back_to_system_preference() {
    assert_eq!(tab(true).hub.current(), Theme::Dark);
    assert_eq!(tab(false).hub.current(), Theme::Light);
}

#[test]
fn current_ignores_malformed_record() {
    let t = tab(true);
    t.store.set_item(SESSION_KEY, "{broken").unwrap();
    assert_eq!(t.hub.current(), Theme::Dark);
}

#[test]
fn current_does_not_write() {
    let t = tab(true);
    let _ = t.hub.current();
    assert!(t.store.peek(SESSION_KEY).is_none());
    assert_eq!(t.root.writes(), 0);
}

#[test]
fn current_survives_unavailable_storage() {
    let t = tab(true);
    t.store.set_unavailable(true);
    assert_eq!(t.hub.current(), Theme::Dark);
}

// =============================================================
// toggle
// =============================================================

#[test]
fn mount_applies_starting_theme_without_persisting() {
    let t = tab(true);
    let sync = t.hub.mount();
    assert_eq!(sync.current(), Theme::Dark);
    assert_eq!(t.root.attribute("data-theme").as_deref(), Some("dark"));
    assert!(t.store.peek(SESSION_KEY).is_none());
}

#[test]
fn toggle_from_light_persists_and_applies_dark() {
    let t = tab(false);
    t.store.set_item(SESSION_KEY, r#"{"lang":"en"}"#).unwrap();
    let sync = t.hub.mount();
    assert_eq!(sync.current(), Theme::Light);

    assert_eq!(sync.toggle(), Theme::Dark);
    assert_eq!(sync.current(), Theme::Dark);
    assert_eq!(t.root.attribute("data-theme").as_deref(), Some("dark"));
    assert_eq!(stored(&t), json!({ "lang": "en", "prefersColorScheme": "dark" }));
}

#[test]
fn toggle_merges_into_record_without_theme_field() {
    let t = tab(true);
    t.store.set_item(SESSION_KEY, r#"{"foo":"bar"}"#).unwrap();
    assert_eq!(t.hub.current(), Theme::Dark);

    let sync = t.hub.mount();
    sync.toggle();
    assert_eq!(stored(&t), json!({ "foo": "bar", "prefersColorScheme": "light" }));
}

#[test]
fn toggle_replaces_malformed_record_with_fresh_one() {
    let t = tab(false);
    t.store.set_item(SESSION_KEY, "not json at all").unwrap();
    let sync = t.hub.mount();
    sync.toggle();
    assert_eq!(stored(&t), json!({ "prefersColorScheme": "dark" }));
}

#[test]
fn toggle_rereads_record_before_writing() {
    let t = tab(false);
    let sync = t.hub.mount();
    t.store.set_item(SESSION_KEY, r#"{"written":"elsewhere"}"#).unwrap();
    sync.toggle();
    assert_eq!(stored(&t), json!({ "written": "elsewhere", "prefersColorScheme": "dark" }));
}

#[test]
fn toggle_with_unavailable_storage_still_switches() {
    let t = tab(false);
    let sync = t.hub.mount();
    t.store.set_unavailable(true);
    assert_eq!(sync.toggle(), Theme::Dark);
    assert_eq!(sync.current(), Theme::Dark);
    assert_eq!(t.root.attribute("data-theme").as_deref(), Some("dark"));
    t.store.set_unavailable(false);
    assert!(t.store.peek(SESSION_KEY).is_none());
}

#[test]
fn set_is_noop_when_equal() {
    let t = tab(false);
    let sync = t.hub.mount();
    let writes = t.root.writes();
    sync.set(Theme::Light);
    assert_eq!(t.root.writes(), writes);
    assert!(t.store.peek(SESSION_KEY).is_none());

    sync.set(Theme::Dark);
    assert_eq!(sync.current(), Theme::Dark);
    assert_eq!(stored(&t), json!({ "prefersColorScheme": "dark" }));
}

// =============================================================
// Session value
// =============================================================

#[test]
fn later_mount_follows_session_when_storage_fails() {
    let t = tab(false);
    let a = t.hub.mount();
    t.store.set_unavailable(true);
    a.toggle();

    let b = t.hub.mount();
    assert_eq!(b.current(), Theme::Dark);
    assert_eq!(a.current(), Theme::Dark);
    assert_eq!(t.root.attribute("data-theme").as_deref(), Some("dark"));
    assert_eq!(t.hub.session_theme(), Some(Theme::Dark));

    // Storage itself never saw the change.
    assert_eq!(t.hub.current(), Theme::Light);
}

#[test]
fn later_mount_follows_session_when_writes_are_lost() {
    let t = tab(false);
    let a = t.hub.mount();
    a.toggle();
    // Another writer drops the theme field behind this tab's back.
    t.store.set_item(SESSION_KEY, r#"{"lang":"en"}"#).unwrap();

    let b = t.hub.mount();
    assert_eq!(b.current(), Theme::Dark);
    assert_eq!(t.root.attribute("data-theme").as_deref(), Some("dark"));
}

#[test]
fn session_is_unset_until_first_mount() {
    let t = tab(true);
    assert_eq!(t.hub.session_theme(), None);
    let _a = t.hub.mount();
    assert_eq!(t.hub.session_theme(), Some(Theme::Dark));
}

#[test]
fn applied_tap_fires_once_per_local_change() {
    let t = tab(false);
    let a = t.hub.mount();
    let _b = t.hub.mount();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let seen_c = Rc::clone(&seen);
    let _tap = t.hub.on_applied(move |theme| seen_c.borrow_mut().push(*theme));

    a.toggle();
    a.set(Theme::Dark);
    assert_eq!(*seen.borrow(), vec![Theme::Dark]);
}

#[test]
fn applied_tap_fires_once_for_change_from_other_tab() {
    let shared = MemoryStore::new();
    let tab_a = tab_with(shared.clone(), false);
    let tab_b = tab_with(shared, false);
    let a = tab_a.hub.mount();
    let _b1 = tab_b.hub.mount();
    let _b2 = tab_b.hub.mount();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let seen_c = Rc::clone(&seen);
    let _tap = tab_b.hub.on_applied(move |theme| seen_c.borrow_mut().push(*theme));

    a.toggle();
    let change = StorageChange { key: SESSION_KEY.to_owned(), new_value: tab_a.store.peek(SESSION_KEY) };
    tab_b.hub.deliver_storage_change(&change);
    tab_b.hub.deliver_storage_change(&change);
    assert_eq!(*seen.borrow(), vec![Theme::Dark]);
}

#[test]
fn applied_tap_is_silent_on_mount() {
    let t = tab(true);
    let hits = Rc::new(Cell::new(0));
    let hits_c = Rc::clone(&hits);
    let _tap = t.hub.on_applied(move |_| hits_c.set(hits_c.get() + 1));
    let _a = t.hub.mount();
    let _b = t.hub.mount();
    assert_eq!(hits.get(), 0);
}

// =============================================================
// In-tab broadcast
// =============================================================

#[test]
fn toggle_reaches_other_instances_in_same_turn() {
    let t = tab(false);
    let a = t.hub.mount();
    let b = t.hub.mount();

    let seen_by_b = Rc::new(RefCell::new(Vec::new()));
    let seen = Rc::clone(&seen_by_b);
    let _watch = b.watch(move |theme| seen.borrow_mut().push(*theme));

    a.toggle();
    assert_eq!(b.current(), Theme::Dark);
    assert_eq!(*seen_by_b.borrow(), vec![Theme::Dark]);
}

#[test]
fn second_toggle_from_other_instance_converges() {
    let t = tab(false);
    let a = t.hub.mount();
    let b = t.hub.mount();

    a.toggle();
    b.toggle();
    assert_eq!(a.current(), Theme::Light);
    assert_eq!(b.current(), Theme::Light);
    assert_eq!(stored(&t), json!({ "prefersColorScheme": "light" }));
}

#[test]
fn broadcast_skips_the_originating_instance() {
    let t = tab(false);
    let a = t.hub.mount();
    let _b = t.hub.mount();

    let hits = Rc::new(Cell::new(0));
    let hits_c = Rc::clone(&hits);
    let _watch = a.watch(move |_| hits_c.set(hits_c.get() + 1));
    a.toggle();
    assert_eq!(hits.get(), 1);
}

#[test]
fn external_change_with_current_value_is_idempotent() {
    let t = tab(false);
    let a = t.hub.mount();
    let writes = t.root.writes();

    let broadcasts = Rc::new(Cell::new(0));
    let broadcasts_c = Rc::clone(&broadcasts);
    let _tap = t.hub.on_change(move |_| broadcasts_c.set(broadcasts_c.get() + 1));

    assert!(!a.on_external_change(Theme::Light));
    assert_eq!(t.root.writes(), writes);
    assert_eq!(broadcasts.get(), 0);
}

#[test]
fn external_change_applies_without_persisting_or_rebroadcasting() {
    let t = tab(false);
    let a = t.hub.mount();

    let broadcasts = Rc::new(Cell::new(0));
    let broadcasts_c = Rc::clone(&broadcasts);
    let _tap = t.hub.on_change(move |_| broadcasts_c.set(broadcasts_c.get() + 1));

    assert!(a.on_external_change(Theme::Dark));
    assert_eq!(a.current(), Theme::Dark);
    assert_eq!(t.root.attribute("data-theme").as_deref(), Some("dark"));
    assert!(t.store.peek(SESSION_KEY).is_none());
    assert_eq!(broadcasts.get(), 0);
}

#[test]
fn dropped_instance_stops_receiving() {
    let t = tab(false);
    let a = t.hub.mount();
    let b = t.hub.mount();
    assert_eq!(t.hub.instance_count(), 2);

    drop(b);
    assert_eq!(t.hub.instance_count(), 1);
    a.toggle();
    assert_eq!(a.current(), Theme::Dark);
}

#[test]
fn hub_tap_sees_origin_of_change() {
    let t = tab(false);
    let a = t.hub.mount();
    let seen = Rc::new(RefCell::new(None));
    let seen_c = Rc::clone(&seen);
    let _tap = t.hub.on_change(move |change| *seen_c.borrow_mut() = Some(*change));
    a.toggle();
    assert_eq!(*seen.borrow(), Some(ThemeChange { origin: a.id(), theme: Theme::Dark }));
}

// =============================================================
// Cross-tab storage notifications
// =============================================================

#[test]
fn storage_change_from_other_tab_updates_instances() {
    let shared = MemoryStore::new();
    let tab_a = tab_with(shared.clone(), false);
    let tab_b = tab_with(shared, false);
    let a = tab_a.hub.mount();
    let b = tab_b.hub.mount();

    a.toggle();
    assert_eq!(b.current(), Theme::Light);

    // The host fires `storage` only in the other tab.
    tab_b.hub.deliver_storage_change(&StorageChange {
        key: SESSION_KEY.to_owned(),
        new_value: tab_a.store.peek(SESSION_KEY),
    });
    assert_eq!(b.current(), Theme::Dark);
    assert_eq!(tab_b.root.attribute("data-theme").as_deref(), Some("dark"));
}

#[test]
fn storage_change_for_other_keys_is_ignored() {
    let t = tab(false);
    let a = t.hub.mount();
    t.hub.deliver_storage_change(&StorageChange {
        key: "reduceAnimations".to_owned(),
        new_value: Some(r#"{"prefersColorScheme":"dark"}"#.to_owned()),
    });
    assert_eq!(a.current(), Theme::Light);
}

#[test]
fn storage_change_without_theme_or_value_is_ignored() {
    let t = tab(false);
    let a = t.hub.mount();
    for new_value in [None, Some("{garbage".to_owned()), Some(r#"{"foo":1}"#.to_owned())] {
        t.hub.deliver_storage_change(&StorageChange { key: SESSION_KEY.to_owned(), new_value });
    }
    assert_eq!(a.current(), Theme::Light);
}

#[test]
fn storage_change_with_same_value_does_not_reapply() {
    let t = tab(true);
    let a = t.hub.mount();
    let writes = t.root.writes();
    t.hub.deliver_storage_change(&StorageChange {
        key: SESSION_KEY.to_owned(),
        new_value: Some(r#"{"prefersColorScheme":"dark"}"#.to_owned()),
    });
    assert_eq!(a.current(), Theme::Dark);
    assert_eq!(t.root.writes(), writes);
}

#[test]
fn custom_storage_key_is_respected() {
    let store = MemoryStore::new();
    let root = MemoryRoot::new();
    let config = ThemeConfig { storage_key: "portfolio.prefs".to_owned(), ..ThemeConfig::default() };
    let hub = ThemeHub::new(config, Rc::new(store.clone()), Rc::new(FixedPreference(false)), Rc::new(root));
    let sync = hub.mount();
    sync.toggle();
    assert!(store.peek(SESSION_KEY).is_none());
    assert_eq!(store.peek("portfolio.prefs").as_deref(), Some(r#"{"prefersColorScheme":"dark"}"#));
}
