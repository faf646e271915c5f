//! Browser adapters for the `viewstate` host traits.
//!
//! SYSTEM CONTEXT
//! ==============
//! `viewstate` talks to storage, the `<html>` element, the color-scheme media
//! query and `IntersectionObserver` only through small traits. This module is
//! the single place those traits meet `web-sys`, plus the two window event
//! bridges the theme hub needs (`storage` in, `themechange` out).
//!
//! ERROR HANDLING
//! ==============
//! Storage calls map JS exceptions into [`StorageError`] for the caller to
//! log. Attribute writes and event plumbing are best effort and log a warning
//! on failure.
//!
//! TRADE-OFFS
//! ==========
//! Without the `csr` feature the factories return in-memory stand-ins and the
//! event bridges return inert subscriptions, so native builds stay
//! deterministic.

#[cfg(test)]
#[path = "browser_test.rs"]
mod browser_test;

use std::rc::Rc;

use viewstate::bus::Subscription;
use viewstate::hash_route::PageLocation;
use viewstate::host::{DocumentRoot, KeyValueStore, SystemPreference};
use viewstate::media::{IntersectionWatcher, ObserverConfig};
use viewstate::theme::ThemeHub;

#[cfg(feature = "csr")]
use viewstate::host::{StorageChange, StorageError};
#[cfg(feature = "csr")]
use wasm_bindgen::{JsCast, JsValue, closure::Closure};

#[cfg(not(feature = "csr"))]
use viewstate::host::{FixedPreference, MemoryRoot, MemoryStore};

#[cfg(feature = "csr")]
const DARK_SCHEME_QUERY: &str = "(prefers-color-scheme: dark)";

// =============================================================================
// FACTORIES
// =============================================================================

/// Persistent store for preferences: `localStorage` in the browser.
pub fn local_store() -> Rc<dyn KeyValueStore> {
    #[cfg(feature = "csr")]
    {
        Rc::new(LocalStorage)
    }
    #[cfg(not(feature = "csr"))]
    {
        Rc::new(MemoryStore::new())
    }
}

/// The document root element that carries theme and motion attributes.
pub fn document_root() -> Rc<dyn DocumentRoot> {
    #[cfg(feature = "csr")]
    {
        Rc::new(HtmlRoot)
    }
    #[cfg(not(feature = "csr"))]
    {
        Rc::new(MemoryRoot::new())
    }
}

/// The operating system's color-scheme preference.
pub fn system_preference() -> Rc<dyn SystemPreference> {
    #[cfg(feature = "csr")]
    {
        Rc::new(MediaQueryPreference)
    }
    #[cfg(not(feature = "csr"))]
    {
        Rc::new(FixedPreference(false))
    }
}

/// Element type lazy media attaches to.
pub type MediaTarget = leptos::web_sys::Element;

#[cfg(feature = "csr")]
pub type Viewport = BrowserIntersection;
#[cfg(not(feature = "csr"))]
pub type Viewport = DetachedViewport;

/// Intersection source for lazy media.
pub fn viewport() -> Viewport {
    #[cfg(feature = "csr")]
    {
        BrowserIntersection
    }
    #[cfg(not(feature = "csr"))]
    {
        DetachedViewport
    }
}

// =============================================================================
// STORAGE / ROOT / PREFERENCE
// =============================================================================

/// `window.localStorage`.
#[cfg(feature = "csr")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

#[cfg(feature = "csr")]
fn storage() -> Result<web_sys::Storage, StorageError> {
    let window = web_sys::window().ok_or(StorageError::Unavailable)?;
    match window.local_storage() {
        Ok(Some(storage)) => Ok(storage),
        Ok(None) | Err(_) => Err(StorageError::Unavailable),
    }
}

#[cfg(feature = "csr")]
fn js_reason(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

#[cfg(feature = "csr")]
impl KeyValueStore for LocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        storage()?
            .get_item(key)
            .map_err(|e| StorageError::ReadFailed { key: key.to_owned(), reason: js_reason(&e) })
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        storage()?
            .set_item(key, value)
            .map_err(|e| StorageError::WriteRejected { key: key.to_owned(), reason: js_reason(&e) })
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        storage()?
            .remove_item(key)
            .map_err(|e| StorageError::WriteRejected { key: key.to_owned(), reason: js_reason(&e) })
    }
}

/// `document.documentElement`.
#[cfg(feature = "csr")]
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRoot;

#[cfg(feature = "csr")]
fn root_element() -> Option<web_sys::Element> {
    web_sys::window().and_then(|w| w.document()).and_then(|d| d.document_element())
}

#[cfg(feature = "csr")]
impl DocumentRoot for HtmlRoot {
    fn set_attribute(&self, name: &str, value: &str) {
        if let Some(el) = root_element() {
            if let Err(e) = el.set_attribute(name, value) {
                log::warn!("could not set `{name}` on <html>: {}", js_reason(&e));
            }
        }
    }

    fn remove_attribute(&self, name: &str) {
        if let Some(el) = root_element() {
            if let Err(e) = el.remove_attribute(name) {
                log::warn!("could not remove `{name}` from <html>: {}", js_reason(&e));
            }
        }
    }
}

/// `matchMedia("(prefers-color-scheme: dark)")`, sampled on each call.
#[cfg(feature = "csr")]
#[derive(Debug, Clone, Copy, Default)]
pub struct MediaQueryPreference;

#[cfg(feature = "csr")]
impl SystemPreference for MediaQueryPreference {
    fn prefers_dark(&self) -> bool {
        let Some(window) = web_sys::window() else {
            return false;
        };
        match window.match_media(DARK_SCHEME_QUERY) {
            Ok(Some(mq)) => mq.matches(),
            Ok(None) | Err(_) => false,
        }
    }
}

// =============================================================================
// INTERSECTION
// =============================================================================

/// One `IntersectionObserver` per watched element.
#[cfg(feature = "csr")]
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserIntersection;

#[cfg(feature = "csr")]
impl IntersectionWatcher for BrowserIntersection {
    type Target = MediaTarget;

    fn watch(
        &self,
        target: &MediaTarget,
        config: &ObserverConfig,
        mut on_entry: Box<dyn FnMut(bool)>,
    ) -> Subscription {
        let callback = Closure::<dyn FnMut(js_sys::Array, web_sys::IntersectionObserver)>::new(
            move |entries: js_sys::Array, _observer: web_sys::IntersectionObserver| {
                for entry in entries.iter() {
                    let entry: web_sys::IntersectionObserverEntry = entry.unchecked_into();
                    on_entry(entry.is_intersecting());
                }
            },
        );

        let init = web_sys::IntersectionObserverInit::new();
        init.set_threshold(&JsValue::from_f64(config.threshold));
        init.set_root_margin(&config.root_margin.to_string());

        let observer = match web_sys::IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init) {
            Ok(observer) => observer,
            Err(e) => {
                log::warn!("IntersectionObserver unavailable: {}", js_reason(&e));
                return Subscription::noop();
            }
        };
        observer.observe(target);

        Subscription::new(move || {
            observer.disconnect();
            drop(callback);
        })
    }
}

/// Viewport used off the browser: never reports an entry.
#[cfg(not(feature = "csr"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedViewport;

#[cfg(not(feature = "csr"))]
impl IntersectionWatcher for DetachedViewport {
    type Target = MediaTarget;

    fn watch(&self, _target: &MediaTarget, _config: &ObserverConfig, _on_entry: Box<dyn FnMut(bool)>) -> Subscription {
        Subscription::noop()
    }
}

// =============================================================================
// WINDOW EVENT BRIDGES
// =============================================================================

/// Feed other tabs' `storage` events into `hub` until the subscription drops.
///
/// A `storage` event with no key (a whole-store `clear()`) carries nothing
/// the hub can act on and is skipped.
pub fn listen_storage_events(hub: &ThemeHub) -> Subscription {
    #[cfg(feature = "csr")]
    {
        let Some(window) = web_sys::window() else {
            return Subscription::noop();
        };
        let hub = hub.clone();
        let handler = Closure::<dyn FnMut(web_sys::StorageEvent)>::new(move |event: web_sys::StorageEvent| {
            let Some(key) = event.key() else {
                return;
            };
            hub.deliver_storage_change(&StorageChange { key, new_value: event.new_value() });
        });
        if let Err(e) = window.add_event_listener_with_callback("storage", handler.as_ref().unchecked_ref()) {
            log::warn!("could not listen for storage events: {}", js_reason(&e));
            return Subscription::noop();
        }
        Subscription::new(move || {
            if let Err(e) = window.remove_event_listener_with_callback("storage", handler.as_ref().unchecked_ref()) {
                log::warn!("could not remove storage listener: {}", js_reason(&e));
            }
            drop(handler);
        })
    }
    #[cfg(not(feature = "csr"))]
    {
        let _ = hub;
        Subscription::noop()
    }
}

/// Dispatch a window `CustomEvent` whose `detail` is the theme name each time
/// this tab's theme changes, whether toggled here or adopted from another
/// tab, for scripts outside the app.
pub fn relay_theme_events(hub: &ThemeHub) -> Subscription {
    #[cfg(feature = "csr")]
    {
        let event_name = hub.config().event_name.clone();
        hub.on_applied(move |theme| {
            let Some(window) = web_sys::window() else {
                return;
            };
            let init = web_sys::CustomEventInit::new();
            init.set_detail(&JsValue::from_str(theme.as_str()));
            match web_sys::CustomEvent::new_with_event_init_dict(&event_name, &init) {
                Ok(event) => {
                    if let Err(e) = window.dispatch_event(&event) {
                        log::warn!("`{event_name}` dispatch failed: {}", js_reason(&e));
                    }
                }
                Err(e) => log::warn!("could not build `{event_name}` event: {}", js_reason(&e)),
            }
        })
    }
    #[cfg(not(feature = "csr"))]
    {
        let _ = hub;
        Subscription::noop()
    }
}

// =============================================================================
// LOCATION
// =============================================================================

/// Snapshot of `window.location`.
pub fn current_location() -> Option<PageLocation> {
    #[cfg(feature = "csr")]
    {
        let location = web_sys::window()?.location();
        Some(PageLocation {
            origin: location.origin().unwrap_or_default(),
            pathname: location.pathname().unwrap_or_default(),
            search: location.search().unwrap_or_default(),
            hash: location.hash().unwrap_or_default(),
            href: location.href().unwrap_or_default(),
        })
    }
    #[cfg(not(feature = "csr"))]
    {
        None
    }
}

/// `location.replace(url)`: navigate without a history entry.
pub fn replace_location(url: &str) {
    #[cfg(feature = "csr")]
    {
        if let Some(window) = web_sys::window() {
            if let Err(e) = window.location().replace(url) {
                log::warn!("could not redirect to {url}: {}", js_reason(&e));
            }
        }
    }
    #[cfg(not(feature = "csr"))]
    {
        let _ = url;
    }
}
