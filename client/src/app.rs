//! Root application component and the page chrome around every route.

use leptos::prelude::*;
use leptos_meta::{Title, provide_meta_context};

use crate::components::media_grid::MediaGrid;
use crate::components::reduce_animations_switch::ReduceAnimationsSwitch;
use crate::components::theme_switch::ThemeSwitch;
use crate::config::SiteConfig;
use crate::state::motion::provide_reduce_animations;
use crate::state::theme::{provide_theme_hub, use_theme};

/// Root application component.
///
/// Provides the preference contexts and keeps one theme consumer mounted for
/// the app's lifetime so `data-theme` is applied before any switch renders.
#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();
    provide_theme_hub();
    provide_reduce_animations();
    let _root_theme = use_theme();
    let config = SiteConfig::from_build_env();

    view! {
        <Title text="Sunika Online Portfolio"/>
        <AppShell>
            <main class="page-content" id="page-content">
                <MediaGrid items=config.gallery_images/>
            </main>
        </AppShell>
    }
}

/// Page frame with the preference controls.
#[component]
pub fn AppShell(children: Children) -> impl IntoView {
    view! {
        <div class="app">
            <div class="app__settings">
                <ThemeSwitch size=25/>
                <ReduceAnimationsSwitch/>
            </div>
            {children()}
        </div>
    }
}
