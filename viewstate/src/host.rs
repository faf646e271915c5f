//! Host capabilities the view-state mechanisms are written against.
//!
//! SYSTEM CONTEXT
//! ==============
//! In the browser these are `localStorage`, the `<html>` element and the
//! `prefers-color-scheme` media query. The in-memory implementations here back
//! native tests and any build without a browser.

#[cfg(test)]
#[path = "host_test.rs"]
mod host_test;

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

/// Error returned by a [`KeyValueStore`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// Storage is disabled or absent (private mode, sandboxed frame, no window).
    #[error("storage is unavailable")]
    Unavailable,
    /// The backend threw while reading.
    #[error("storage read failed for key `{key}`: {reason}")]
    ReadFailed { key: String, reason: String },
    /// The backend refused a write, typically quota exhaustion.
    #[error("storage write rejected for key `{key}`: {reason}")]
    WriteRejected { key: String, reason: String },
}

/// Durable string key-value storage.
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// The document's root element, reduced to the attribute writes styling reacts to.
pub trait DocumentRoot {
    fn set_attribute(&self, name: &str, value: &str);
    fn remove_attribute(&self, name: &str);
}

/// The host's light/dark signal.
pub trait SystemPreference {
    fn prefers_dark(&self) -> bool;
}

/// Cross-tab notification that a storage key changed in another context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    pub key: String,
    /// `None` when the key was removed.
    pub new_value: Option<String>,
}

/// In-memory store. Clones share the same map, like two handles on one
/// `localStorage`.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: Rc<RefCell<HashMap<String, String>>>,
    unavailable: Rc<Cell<bool>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with [`StorageError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.set(unavailable);
    }

    /// Raw value bypassing the availability switch.
    #[must_use]
    pub fn peek(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.unavailable.get() {
            return Err(StorageError::Unavailable);
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check()?;
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check()?;
        self.items.borrow_mut().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.check()?;
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

/// Root element stand-in that records attributes and counts writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryRoot {
    attributes: Rc<RefCell<BTreeMap<String, String>>>,
    writes: Rc<Cell<usize>>,
}

impl MemoryRoot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.borrow().get(name).cloned()
    }

    /// Total set/remove calls received.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes.get()
    }
}

impl DocumentRoot for MemoryRoot {
    fn set_attribute(&self, name: &str, value: &str) {
        self.writes.set(self.writes.get() + 1);
        self.attributes.borrow_mut().insert(name.to_owned(), value.to_owned());
    }

    fn remove_attribute(&self, name: &str) {
        self.writes.set(self.writes.get() + 1);
        self.attributes.borrow_mut().remove(name);
    }
}

/// A system preference that never changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedPreference(pub bool);

impl SystemPreference for FixedPreference {
    fn prefers_dark(&self) -> bool {
        self.0
    }
}
