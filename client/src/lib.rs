//! # client
//!
//! Leptos CSR front end for the portfolio site. It hosts the lazily loaded
//! gallery images and the theme and motion preference controls.
//!
//! The behavior lives in the framework-agnostic `viewstate` crate; this crate
//! binds it to the browser (`util::browser`), exposes it to components through
//! Leptos context (`state`), and renders the controls (`components`).
//!
//! Browser bindings compile only with the `csr` feature. Without it every
//! adapter falls back to an in-memory stand-in so the crate builds and tests
//! natively.

pub mod app;
pub mod components;
pub mod config;
pub mod state;
pub mod util;

/// WASM entry point: logging, path-to-hash redirect, then mount.
#[cfg(feature = "csr")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();

    let config = config::SiteConfig::from_build_env();
    if let Err(e) = console_log::init_with_level(config.log_level) {
        leptos::logging::warn!("console logger already installed: {e}");
    }

    if let Some(location) = util::browser::current_location() {
        if let Some(target) = viewstate::hash_route::hash_redirect(&location, &config.bases()) {
            log::info!("redirecting deep link to {target}");
            util::browser::replace_location(&target);
            return;
        }
    }

    leptos::mount::mount_to_body(app::App);
}
