//! Sun/moon button that toggles the site theme.

#[cfg(test)]
#[path = "theme_switch_test.rs"]
mod theme_switch_test;

use leptos::prelude::*;
use viewstate::theme::Theme;

use crate::state::theme::use_theme;

/// Theme toggle. Shows the sun while dark (the theme it switches to) and the
/// moon while light.
#[component]
pub fn ThemeSwitch(#[prop(default = 25)] size: u32) -> impl IntoView {
    let theme = use_theme();
    let pressed = RwSignal::new(false);

    let on_keydown = move |ev: leptos::ev::KeyboardEvent| {
        if is_activation_key(&ev.key()) {
            ev.prevent_default();
            theme.toggle();
        }
    };

    view! {
        <span
            class="theme-switch"
            class:theme-switch--pressed=move || pressed.get()
            role="button"
            tabindex="0"
            aria-label="Toggle Theme"
            on:click=move |_| {
                theme.toggle();
            }
            on:keydown=on_keydown
            on:pointerdown=move |_| pressed.set(true)
            on:pointerup=move |_| pressed.set(false)
            on:pointerleave=move |_| pressed.set(false)
        >
            <span class="theme-switch__icon" style=format!("font-size: {size}px") aria-hidden="true">
                {move || theme_icon(theme.get())}
            </span>
        </span>
    }
}

fn theme_icon(theme: Theme) -> &'static str {
    match theme {
        Theme::Dark => "☀",
        Theme::Light => "☾",
    }
}

fn is_activation_key(key: &str) -> bool {
    matches!(key, "Enter" | " ")
}
