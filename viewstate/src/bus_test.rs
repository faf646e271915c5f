use super::*;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

// =============================================================
// Subscription
// =============================================================

#[test]
fn subscription_runs_cancel_once_on_drop() {
    let hits = Rc::new(Cell::new(0));
    let hits_c = Rc::clone(&hits);
    let sub = Subscription::new(move || hits_c.set(hits_c.get() + 1));
    assert!(sub.is_active());
    drop(sub);
    assert_eq!(hits.get(), 1);
}

#[test]
fn subscription_cancel_runs_before_drop_and_not_again() {
    let hits = Rc::new(Cell::new(0));
    let hits_c = Rc::clone(&hits);
    let sub = Subscription::new(move || hits_c.set(hits_c.get() + 1));
    sub.cancel();
    assert_eq!(hits.get(), 1);
}

#[test]
fn noop_subscription_is_inactive() {
    let sub = Subscription::noop();
    assert!(!sub.is_active());
}

// =============================================================
// Broadcast
// =============================================================

#[test]
fn publish_reaches_every_listener() {
    let bus = Broadcast::<u32>::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let a = Rc::clone(&seen);
    let b = Rc::clone(&seen);
    let _sa = bus.subscribe(move |v| a.borrow_mut().push(("a", *v)));
    let _sb = bus.subscribe(move |v| b.borrow_mut().push(("b", *v)));

    assert_eq!(bus.publish(&7), 2);
    assert_eq!(*seen.borrow(), vec![("a", 7), ("b", 7)]);
}

#[test]
fn dropped_subscription_stops_delivery() {
    let bus = Broadcast::<u32>::new();
    let hits = Rc::new(Cell::new(0));
    let hits_c = Rc::clone(&hits);
    let sub = bus.subscribe(move |_| hits_c.set(hits_c.get() + 1));
    bus.publish(&1);
    drop(sub);
    bus.publish(&2);
    assert_eq!(hits.get(), 1);
    assert_eq!(bus.listener_count(), 0);
}

#[test]
fn clones_share_listener_list() {
    let bus = Broadcast::<u32>::new();
    let other = bus.clone();
    let hits = Rc::new(Cell::new(0));
    let hits_c = Rc::clone(&hits);
    let _sub = bus.subscribe(move |_| hits_c.set(hits_c.get() + 1));
    assert_eq!(other.publish(&1), 1);
    assert_eq!(hits.get(), 1);
}

#[test]
fn listener_may_publish_reentrantly() {
    let bus = Broadcast::<u32>::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let seen_c = Rc::clone(&seen);
    let bus_c = bus.clone();
    let _sub = bus.subscribe(move |v| {
        seen_c.borrow_mut().push(*v);
        if *v > 0 {
            bus_c.publish(&(v - 1));
        }
    });
    bus.publish(&2);
    assert_eq!(*seen.borrow(), vec![2, 1, 0]);
}

#[test]
fn listener_removed_mid_round_is_skipped() {
    let bus = Broadcast::<u32>::new();
    let victim: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
    let hits = Rc::new(Cell::new(0));

    let victim_c = Rc::clone(&victim);
    let _first = bus.subscribe(move |_| {
        victim_c.borrow_mut().take();
    });
    let hits_c = Rc::clone(&hits);
    *victim.borrow_mut() = Some(bus.subscribe(move |_| hits_c.set(hits_c.get() + 1)));

    assert_eq!(bus.publish(&1), 1);
    assert_eq!(hits.get(), 0);
}

#[test]
fn subscription_outliving_bus_is_harmless() {
    let bus = Broadcast::<u32>::new();
    let sub = bus.subscribe(|_| {});
    drop(bus);
    drop(sub);
}
