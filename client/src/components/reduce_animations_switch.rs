//! Paintbrush switch for the reduce-animations preference.
//!
//! Stylesheets key off `data-no-animations` on `<html>`, which
//! [`viewstate::motion::ReduceAnimations`] keeps in step with the switch.

#[cfg(test)]
#[path = "reduce_animations_switch_test.rs"]
mod reduce_animations_switch_test;

use leptos::prelude::*;

use crate::state::motion::use_reduce_animations;

#[component]
pub fn ReduceAnimationsSwitch(#[prop(default = 16)] size: u32) -> impl IntoView {
    let motion = use_reduce_animations();

    view! {
        <button
            type="button"
            class="artist-switch"
            class:artist-switch--active=move || motion.enabled()
            role="switch"
            aria-checked=move || aria_checked(motion.enabled())
            aria-label="Reduce Animations"
            on:click=move |_| {
                motion.toggle();
            }
        >
            <div class="artist-switch__canvas">
                <div class="artist-switch__trail"></div>
                <div
                    class="artist-switch__thumb"
                    class:artist-switch__thumb--upright=move || motion.enabled()
                    style=format!("font-size: {size}px")
                    aria-hidden="true"
                >
                    "🖌"
                </div>
                <div class="artist-switch__splatter">
                    <span class="artist-switch__dot"></span>
                    <span class="artist-switch__dot"></span>
                    <span class="artist-switch__dot"></span>
                </div>
            </div>
        </button>
    }
}

fn aria_checked(enabled: bool) -> &'static str {
    if enabled { "true" } else { "false" }
}
