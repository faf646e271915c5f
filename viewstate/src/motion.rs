//! Reduce-animations preference.
//!
//! Stored independently of the theme record, as the raw string `"true"` or
//! `"false"` under its own key. When enabled the root carries
//! `data-no-animations="true"`, which the stylesheets use to drop transitions.

#[cfg(test)]
#[path = "motion_test.rs"]
mod motion_test;

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::bus::{Broadcast, Subscription};
use crate::host::{DocumentRoot, KeyValueStore};

pub const REDUCE_ANIMATIONS_KEY: &str = "reduceAnimations";
pub const NO_ANIMATIONS_ATTRIBUTE: &str = "data-no-animations";

pub struct ReduceAnimations {
    enabled: Cell<bool>,
    store: Rc<dyn KeyValueStore>,
    root: Rc<dyn DocumentRoot>,
    watchers: Broadcast<bool>,
}

impl fmt::Debug for ReduceAnimations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReduceAnimations").field("enabled", &self.enabled.get()).finish_non_exhaustive()
    }
}

impl ReduceAnimations {
    /// Read the stored flag and apply it to the root.
    pub fn load(store: Rc<dyn KeyValueStore>, root: Rc<dyn DocumentRoot>) -> Self {
        let enabled = match store.get_item(REDUCE_ANIMATIONS_KEY) {
            Ok(raw) => raw.as_deref() == Some("true"),
            Err(e) => {
                log::warn!("motion: reading `{REDUCE_ANIMATIONS_KEY}` failed: {e}");
                false
            }
        };
        let pref = Self { enabled: Cell::new(enabled), store, root, watchers: Broadcast::new() };
        pref.apply();
        pref
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.enabled.get()
    }

    pub fn set(&self, enabled: bool) {
        if self.enabled.get() == enabled {
            return;
        }
        self.enabled.set(enabled);
        self.apply();
        let raw = if enabled { "true" } else { "false" };
        if let Err(e) = self.store.set_item(REDUCE_ANIMATIONS_KEY, raw) {
            log::warn!("motion: persisting `{raw}` failed: {e}");
        }
        self.watchers.publish(&enabled);
    }

    pub fn toggle(&self) -> bool {
        let next = !self.enabled.get();
        self.set(next);
        next
    }

    pub fn watch(&self, listener: impl Fn(&bool) + 'static) -> Subscription {
        self.watchers.subscribe(listener)
    }

    fn apply(&self) {
        if self.enabled.get() {
            self.root.set_attribute(NO_ANIMATIONS_ATTRIBUTE, "true");
        } else {
            self.root.remove_attribute(NO_ANIMATIONS_ATTRIBUTE);
        }
    }
}
