//! Image that loads its source only near the viewport.
//!
//! SYSTEM CONTEXT
//! ==============
//! Gallery pages render many large images. Each `LazyImage` shows a light
//! placeholder until its element comes within the observer margin, swaps in
//! the real source, fades in on load, and with unloading enabled swaps back
//! to the placeholder once it leaves the margin again.
//!
//! DESIGN
//! ======
//! The state machine and observer lifecycle live in
//! [`viewstate::media::LazyMedia`]. This component only feeds it the `<img>`
//! element and the load event, and mirrors its [`MediaView`] into a signal.

#[cfg(test)]
#[path = "lazy_image_test.rs"]
mod lazy_image_test;

use leptos::prelude::*;
use viewstate::bus::Subscription;
use viewstate::media::{LazyMedia, LazyMediaOptions, MediaCallbacks, MediaView};

use crate::util::browser::{self, MediaTarget, Viewport};

struct MountedMedia {
    media: LazyMedia<Viewport>,
    _views: Subscription,
}

/// Lazily loaded `<img>`.
///
/// `style` is prepended to the fade style. `on_load` fires once per real
/// asset load; `on_unload` fires each time a loaded or visible image is
/// swapped back to the placeholder.
#[component]
pub fn LazyImage(
    #[prop(into)] src: String,
    #[prop(into, optional)] alt: String,
    #[prop(into, optional)] class: String,
    #[prop(into, optional)] style: String,
    #[prop(optional)] options: Option<LazyMediaOptions>,
    #[prop(optional)] on_load: Option<Callback<()>>,
    #[prop(optional)] on_unload: Option<Callback<()>>,
) -> impl IntoView {
    let options = options.unwrap_or_default();
    let img_ref = NodeRef::<leptos::html::Img>::new();

    let callbacks = MediaCallbacks::default()
        .on_loaded(move || {
            if let Some(cb) = on_load.as_ref() {
                cb.run(());
            }
        })
        .on_unloaded(move || {
            if let Some(cb) = on_unload.as_ref() {
                cb.run(());
            }
        });

    let media = match LazyMedia::new(browser::viewport(), &src, &options, callbacks) {
        Ok(media) => media,
        Err(e) => {
            leptos::logging::warn!("lazy image `{src}` falls back to eager loading: {e}");
            let eager = fallback_source(&src, &options.placeholder).to_owned();
            return view! { <img class=class alt=alt style=style src=eager/> }.into_any();
        }
    };

    let view_state = RwSignal::new(media.view());
    let views = media.subscribe(move |view| view_state.set(view.clone()));
    let mounted = StoredValue::new_local(MountedMedia { media, _views: views });

    Effect::new(move || {
        let Some(img) = img_ref.get() else {
            return;
        };
        let target: &MediaTarget = img.as_ref();
        mounted.with_value(|m| {
            m.media.attach(Some(target));
        });
    });

    view! {
        <img
            node_ref=img_ref
            class=class
            alt=alt
            src=move || view_state.with(|v| v.source.clone())
            style=move || merge_style(&style, &view_state.with(MediaView::style))
            on:load=move |_| mounted.with_value(|m| m.media.handle_asset_loaded())
        />
    }
    .into_any()
}

/// Source to render when lazy loading cannot be set up.
fn fallback_source<'a>(src: &'a str, placeholder: &'a str) -> &'a str {
    if src.trim().is_empty() { placeholder } else { src }
}

fn merge_style(base: &str, fade: &str) -> String {
    let base = base.trim();
    if base.is_empty() {
        return fade.to_owned();
    }
    if base.ends_with(';') { format!("{base} {fade}") } else { format!("{base}; {fade}") }
}
