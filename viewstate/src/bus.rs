//! Synchronous, single-threaded broadcast with RAII subscriptions.
//!
//! DESIGN
//! ======
//! Every callback-shaped browser facility (intersection callbacks, storage
//! events, the in-tab theme event) is modelled as "subscribe, get a handle,
//! drop the handle to stop". Fan-out walks a snapshot of the listener list so
//! listeners may publish, subscribe or unsubscribe from inside a callback.

#[cfg(test)]
#[path = "bus_test.rs"]
mod bus_test;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// Identifier for a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Handle that deregisters a callback when dropped or cancelled.
#[must_use = "dropping a Subscription immediately cancels it"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Wrap a cancellation action. It runs at most once.
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self { cancel: Some(Box::new(cancel)) }
    }

    /// A subscription with nothing to cancel.
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    /// Cancel now instead of at drop.
    pub fn cancel(mut self) {
        self.run_cancel();
    }

    /// Whether the cancellation action is still pending.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("active", &self.is_active()).finish()
    }
}

type Listener<T> = Rc<dyn Fn(&T)>;

struct BusInner<T> {
    next_id: Cell<u64>,
    listeners: RefCell<Vec<(ListenerId, Listener<T>)>>,
}

/// Synchronous fan-out channel. Clones share the same listener list.
pub struct Broadcast<T> {
    inner: Rc<BusInner<T>>,
}

impl<T> Clone for Broadcast<T> {
    fn clone(&self) -> Self {
        Self { inner: Rc::clone(&self.inner) }
    }
}

impl<T> Default for Broadcast<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Broadcast<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Broadcast").field("listeners", &self.listener_count()).finish()
    }
}

impl<T> Broadcast<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(BusInner { next_id: Cell::new(1), listeners: RefCell::new(Vec::new()) }),
        }
    }

    /// Number of live listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }
}

impl<T: 'static> Broadcast<T> {
    /// Register `listener`; it stays registered until the returned handle goes away.
    pub fn subscribe(&self, listener: impl Fn(&T) + 'static) -> Subscription {
        let id = ListenerId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);
        let listener: Listener<T> = Rc::new(listener);
        self.inner.listeners.borrow_mut().push((id, listener));

        let weak: Weak<BusInner<T>> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.listeners.borrow_mut().retain(|(lid, _)| *lid != id);
            }
        })
    }

    /// Deliver `value` to every listener registered at call time.
    ///
    /// Returns how many listeners were invoked.
    pub fn publish(&self, value: &T) -> usize {
        let snapshot: Vec<(ListenerId, Listener<T>)> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(id, listener)| (*id, Rc::clone(listener)))
            .collect();

        let mut delivered = 0;
        for (id, listener) in snapshot {
            // Skip listeners removed by an earlier callback in this round.
            if !self.is_registered(id) {
                continue;
            }
            listener(value);
            delivered += 1;
        }
        delivered
    }

    fn is_registered(&self, id: ListenerId) -> bool {
        self.inner.listeners.borrow().iter().any(|(lid, _)| *lid == id)
    }
}
