//! Reduce-animations context.
//!
//! A single [`ReduceAnimations`] controller per app, mirrored into a signal.
//! The flag is only read from this tab, so there is no per-consumer state.

#[cfg(test)]
#[path = "motion_test.rs"]
mod motion_test;

use leptos::prelude::*;
use viewstate::bus::Subscription;
use viewstate::motion::ReduceAnimations;

use crate::util::browser;

struct MotionRuntime {
    pref: ReduceAnimations,
    _watch: Subscription,
}

#[derive(Clone, Copy)]
pub struct MotionContext {
    enabled: RwSignal<bool>,
    runtime: StoredValue<MotionRuntime, LocalStorage>,
}

impl MotionContext {
    /// Whether animations are reduced, tracked.
    pub fn enabled(&self) -> bool {
        self.enabled.get()
    }

    pub fn enabled_untracked(&self) -> bool {
        self.enabled.get_untracked()
    }

    pub fn set(&self, enabled: bool) {
        self.runtime.with_value(|rt| rt.pref.set(enabled));
    }

    pub fn toggle(&self) -> bool {
        self.runtime.with_value(|rt| rt.pref.toggle())
    }
}

/// Load the stored flag, apply it to `<html>` and provide it to descendants.
pub fn provide_reduce_animations() -> MotionContext {
    let pref = ReduceAnimations::load(browser::local_store(), browser::document_root());
    let enabled = RwSignal::new(pref.enabled());
    let watch = pref.watch(move |next| enabled.set(*next));
    let ctx = MotionContext { enabled, runtime: StoredValue::new_local(MotionRuntime { pref, _watch: watch }) };
    provide_context(ctx);
    ctx
}

pub fn use_reduce_animations() -> MotionContext {
    expect_context::<MotionContext>()
}
