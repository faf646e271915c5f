//! Theme context: one hub per app, one synchronizer per consumer.
//!
//! DESIGN
//! ======
//! `provide_theme_hub` builds the [`ThemeHub`] over the browser adapters and
//! attaches the `storage` and `themechange` window bridges for as long as the
//! providing owner lives. Each `use_theme` call mounts its own [`ThemeSync`]
//! and mirrors it into an `RwSignal<Theme>`; both are dropped with the calling
//! component, which deregisters the instance from the hub.

#[cfg(test)]
#[path = "theme_test.rs"]
mod theme_test;

use leptos::prelude::*;
use viewstate::bus::Subscription;
use viewstate::theme::{Theme, ThemeConfig, ThemeHub, ThemeSync};

use crate::util::browser;

struct HubRuntime {
    hub: ThemeHub,
    _bridges: [Subscription; 2],
}

/// Context handle for the app-wide [`ThemeHub`].
#[derive(Clone, Copy)]
pub struct ThemeContext(StoredValue<HubRuntime, LocalStorage>);

impl ThemeContext {
    /// Theme as currently stored, or the system preference.
    pub fn current(&self) -> Theme {
        self.0.with_value(|rt| rt.hub.current())
    }

    /// Number of mounted consumers.
    pub fn instance_count(&self) -> usize {
        self.0.with_value(|rt| rt.hub.instance_count())
    }

    fn mount(&self) -> ThemeSync {
        self.0.with_value(|rt| rt.hub.mount())
    }
}

/// Create the theme hub and provide it to descendants.
pub fn provide_theme_hub() -> ThemeContext {
    let hub = ThemeHub::new(
        ThemeConfig::default(),
        browser::local_store(),
        browser::system_preference(),
        browser::document_root(),
    );
    let bridges = [browser::listen_storage_events(&hub), browser::relay_theme_events(&hub)];
    let ctx = ThemeContext(StoredValue::new_local(HubRuntime { hub, _bridges: bridges }));
    provide_context(ctx);
    ctx
}

struct MountedSync {
    sync: ThemeSync,
    _watch: Subscription,
}

/// One component's view of the shared theme.
#[derive(Clone, Copy)]
pub struct ThemeHandle {
    theme: RwSignal<Theme>,
    sync: StoredValue<MountedSync, LocalStorage>,
}

impl ThemeHandle {
    /// Current theme, tracked.
    pub fn get(&self) -> Theme {
        self.theme.get()
    }

    pub fn get_untracked(&self) -> Theme {
        self.theme.get_untracked()
    }

    /// Flip the theme, persist it and tell every other consumer.
    pub fn toggle(&self) -> Theme {
        self.sync.with_value(|m| m.sync.toggle())
    }

    pub fn set(&self, theme: Theme) {
        self.sync.with_value(|m| m.sync.set(theme));
    }
}

/// Mount a theme consumer for the calling component.
///
/// Requires [`provide_theme_hub`] on an ancestor.
pub fn use_theme() -> ThemeHandle {
    let ctx = expect_context::<ThemeContext>();
    let sync = ctx.mount();
    let theme = RwSignal::new(sync.current());
    let watch = sync.watch(move |next| theme.set(*next));
    ThemeHandle { theme, sync: StoredValue::new_local(MountedSync { sync, _watch: watch }) }
}
