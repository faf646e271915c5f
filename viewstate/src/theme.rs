//! Light/dark theme shared by every consumer in a tab and replicated across tabs.
//!
//! ARCHITECTURE
//! ============
//! A [`ThemeHub`] exists once per tab. It owns the capabilities (storage,
//! document root, system preference) and the in-tab broadcast. Each consumer
//! mounts its own [`ThemeSync`], which holds the value it was last told about.
//!
//! A local change applies the root attribute, read-modify-writes the stored
//! record and broadcasts to the other instances, all in one synchronous turn.
//! Other tabs learn about it from the host's storage notification, which the
//! browser binding feeds into [`ThemeHub::deliver_storage_change`].
//!
//! ERROR HANDLING
//! ==============
//! Storage failures are logged and dropped. The hub's session value stays
//! authoritative for the tab, so instances mounted after a failed write still
//! agree with the ones already mounted.

#[cfg(test)]
#[path = "theme_test.rs"]
mod theme_test;

use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::bus::{Broadcast, Subscription};
use crate::host::{DocumentRoot, KeyValueStore, StorageChange, SystemPreference};
use crate::record::{SESSION_KEY, SessionRecord};

/// Root attribute styling keys off.
pub const THEME_ATTRIBUTE: &str = "data-theme";
/// Name of the window event the browser binding re-dispatches in-tab changes under.
pub const THEME_EVENT: &str = "themechange";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// Exact-name lookup; anything else is unknown.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    #[must_use]
    pub fn from_dark(is_dark: bool) -> Self {
        if is_dark { Self::Dark } else { Self::Light }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown theme `{0}` (expected `light` or `dark`)")]
pub struct ThemeParseError(pub String);

impl FromStr for Theme {
    type Err = ThemeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| ThemeParseError(s.to_owned()))
    }
}

/// Where the theme lives and how it is announced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeConfig {
    pub storage_key: String,
    pub attribute: String,
    pub event_name: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            storage_key: SESSION_KEY.to_owned(),
            attribute: THEME_ATTRIBUTE.to_owned(),
            event_name: THEME_EVENT.to_owned(),
        }
    }
}

/// Identifies one mounted [`ThemeSync`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(u64);

/// Payload of the in-tab broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeChange {
    pub origin: InstanceId,
    pub theme: Theme,
}

struct HubInner {
    config: ThemeConfig,
    store: Rc<dyn KeyValueStore>,
    system: Rc<dyn SystemPreference>,
    root: Rc<dyn DocumentRoot>,
    changes: Broadcast<ThemeChange>,
    storage_changes: Broadcast<StorageChange>,
    applied: Broadcast<Theme>,
    /// This tab's value once any instance has mounted; outlives storage failures.
    session: Cell<Option<Theme>>,
    next_instance: Cell<u64>,
}

impl HubInner {
    fn apply(&self, theme: Theme) {
        self.root.set_attribute(&self.config.attribute, theme.as_str());
    }

    fn read_record(&self) -> SessionRecord {
        match self.store.get_item(&self.config.storage_key) {
            Ok(raw) => SessionRecord::parse_lenient(raw.as_deref()),
            Err(e) => {
                log::warn!("theme: reading `{}` failed: {e}", self.config.storage_key);
                SessionRecord::default()
            }
        }
    }

    fn current(&self) -> Theme {
        self.read_record()
            .theme()
            .unwrap_or_else(|| Theme::from_dark(self.system.prefers_dark()))
    }

    /// Value a new instance starts from: the session value, else storage.
    fn starting_theme(&self) -> Theme {
        match self.session.get() {
            Some(theme) => theme,
            None => {
                let theme = self.current();
                self.session.set(Some(theme));
                theme
            }
        }
    }

    /// Record `theme` as the tab's value and tell the tap if it moved.
    fn adopt(&self, theme: Theme) {
        if self.session.replace(Some(theme)) != Some(theme) {
            self.applied.publish(&theme);
        }
    }

    fn persist(&self, theme: Theme) {
        let record = self.read_record().with_theme(theme);
        if let Err(e) = self.store.set_item(&self.config.storage_key, &record.to_json()) {
            log::warn!("theme: persisting `{theme}` failed: {e}");
        }
    }
}

/// Per-tab owner of the theme capabilities and the in-tab broadcast.
#[derive(Clone)]
pub struct ThemeHub {
    inner: Rc<HubInner>,
}

impl fmt::Debug for ThemeHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThemeHub")
            .field("config", &self.inner.config)
            .field("instances", &self.instance_count())
            .finish_non_exhaustive()
    }
}

impl ThemeHub {
    pub fn new(
        config: ThemeConfig,
        store: Rc<dyn KeyValueStore>,
        system: Rc<dyn SystemPreference>,
        root: Rc<dyn DocumentRoot>,
    ) -> Self {
        Self {
            inner: Rc::new(HubInner {
                config,
                store,
                system,
                root,
                changes: Broadcast::new(),
                storage_changes: Broadcast::new(),
                applied: Broadcast::new(),
                session: Cell::new(None),
                next_instance: Cell::new(1),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ThemeConfig {
        &self.inner.config
    }

    /// The stored theme, else the system preference. Reads only, and ignores
    /// the session value; see [`ThemeHub::session_theme`].
    #[must_use]
    pub fn current(&self) -> Theme {
        self.inner.current()
    }

    /// The theme this tab has settled on, once an instance has mounted.
    ///
    /// Stays authoritative when storage is unreadable or rejects writes, and
    /// is what later mounts start from.
    #[must_use]
    pub fn session_theme(&self) -> Option<Theme> {
        self.inner.session.get()
    }

    /// The stored record as it is now, empty if missing or unreadable.
    #[must_use]
    pub fn read_record(&self) -> SessionRecord {
        self.inner.read_record()
    }

    /// Feed one cross-tab storage notification to every mounted instance.
    pub fn deliver_storage_change(&self, change: &StorageChange) {
        if change.key != self.inner.config.storage_key {
            return;
        }
        self.inner.storage_changes.publish(change);
    }

    /// Observe every in-tab change, whichever instance made it.
    pub fn on_change(&self, listener: impl Fn(&ThemeChange) + 'static) -> Subscription {
        self.inner.changes.subscribe(listener)
    }

    /// Observe every change of this tab's theme, whether toggled here or
    /// adopted from another tab. Fires once per change, not per instance.
    pub fn on_applied(&self, listener: impl Fn(&Theme) + 'static) -> Subscription {
        self.inner.applied.subscribe(listener)
    }

    /// Number of mounted instances.
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.inner.storage_changes.listener_count()
    }

    /// Mount a new synchronizer instance and apply its starting theme.
    ///
    /// The first mount in a tab starts from [`ThemeHub::current`]; later
    /// mounts start from the session value.
    #[must_use]
    pub fn mount(&self) -> ThemeSync {
        let id = InstanceId(self.inner.next_instance.get());
        self.inner.next_instance.set(id.0 + 1);

        let theme = self.inner.starting_theme();
        self.inner.apply(theme);

        let shared = Rc::new(SyncShared {
            id,
            value: Cell::new(theme),
            hub: Rc::clone(&self.inner),
            watchers: Broadcast::new(),
        });

        let weak = Rc::downgrade(&shared);
        let from_tab = self.inner.changes.subscribe(move |change: &ThemeChange| {
            if let Some(shared) = Weak::upgrade(&weak) {
                if change.origin != shared.id {
                    shared.receive(change.theme);
                }
            }
        });

        let weak = Rc::downgrade(&shared);
        let from_storage = self.inner.storage_changes.subscribe(move |change: &StorageChange| {
            let Some(shared) = Weak::upgrade(&weak) else {
                return;
            };
            let Some(raw) = change.new_value.as_deref() else {
                return;
            };
            if let Some(theme) = SessionRecord::parse_lenient(Some(raw)).theme() {
                shared.receive(theme);
            }
        });

        log::debug!("theme: mounted instance {} with `{theme}`", id.0);
        ThemeSync { shared, _from_tab: from_tab, _from_storage: from_storage }
    }
}

struct SyncShared {
    id: InstanceId,
    value: Cell<Theme>,
    hub: Rc<HubInner>,
    watchers: Broadcast<Theme>,
}

impl SyncShared {
    fn receive(&self, theme: Theme) -> bool {
        if self.value.get() == theme {
            return false;
        }
        self.value.set(theme);
        self.hub.apply(theme);
        self.hub.adopt(theme);
        self.watchers.publish(&theme);
        true
    }

    fn commit(&self, theme: Theme) {
        self.value.set(theme);
        self.hub.apply(theme);
        self.hub.adopt(theme);
        self.hub.persist(theme);
        self.watchers.publish(&theme);
        let reached = self.hub.changes.publish(&ThemeChange { origin: self.id, theme });
        log::debug!("theme: instance {} switched to `{theme}`, broadcast to {reached}", self.id.0);
    }
}

/// One consumer's view of the theme.
///
/// Dropping it deregisters it from the in-tab broadcast and from storage
/// notifications.
pub struct ThemeSync {
    shared: Rc<SyncShared>,
    _from_tab: Subscription,
    _from_storage: Subscription,
}

impl fmt::Debug for ThemeSync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThemeSync")
            .field("id", &self.shared.id)
            .field("theme", &self.current())
            .finish_non_exhaustive()
    }
}

impl ThemeSync {
    #[must_use]
    pub fn id(&self) -> InstanceId {
        self.shared.id
    }

    #[must_use]
    pub fn current(&self) -> Theme {
        self.shared.value.get()
    }

    /// Flip the theme, apply it, persist it and tell the other instances.
    pub fn toggle(&self) -> Theme {
        let next = self.current().toggled();
        self.shared.commit(next);
        next
    }

    /// Switch to `theme`. Does nothing when it is already current.
    pub fn set(&self, theme: Theme) {
        if self.current() != theme {
            self.shared.commit(theme);
        }
    }

    /// Adopt a value learned from elsewhere. Returns whether anything changed.
    pub fn on_external_change(&self, theme: Theme) -> bool {
        self.shared.receive(theme)
    }

    /// Observe this instance's value changes, local or external.
    pub fn watch(&self, listener: impl Fn(&Theme) + 'static) -> Subscription {
        self.shared.watchers.subscribe(listener)
    }
}
