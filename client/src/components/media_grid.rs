//! Grid of lazily loaded project images.
//!
//! Each tile is a [`LazyImage`] observed with a 150px margin, so the next row
//! starts loading just before it scrolls in.

#[cfg(test)]
#[path = "media_grid_test.rs"]
mod media_grid_test;

use leptos::prelude::*;
use viewstate::media::LazyMediaOptions;

use crate::components::lazy_image::LazyImage;

const GRID_ROOT_MARGIN: &str = "150px";

#[component]
pub fn MediaGrid(items: Vec<String>) -> impl IntoView {
    if items.is_empty() {
        return view! {
            <div class="media-grid media-grid--empty">
                <p>"No media files in this project yet"</p>
            </div>
        }
        .into_any();
    }

    view! {
        <div class="media-grid">
            {items
                .into_iter()
                .map(|src| {
                    let alt = alt_text(&src);
                    view! {
                        <div class="media-grid__item">
                            <LazyImage src=src alt=alt options=grid_options()/>
                        </div>
                    }
                })
                .collect_view()}
        </div>
    }
    .into_any()
}

fn grid_options() -> LazyMediaOptions {
    LazyMediaOptions { root_margin: GRID_ROOT_MARGIN.to_owned(), ..LazyMediaOptions::default() }
}

/// Readable alt text from an image URL's file name.
fn alt_text(src: &str) -> String {
    let path = src.split(['?', '#']).next().unwrap_or_default();
    let file = path.rsplit('/').next().unwrap_or_default();
    let stem = file.rsplit_once('.').map_or(file, |(stem, _)| stem);
    stem.replace(['-', '_'], " ").trim().to_owned()
}
