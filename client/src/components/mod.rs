//! Reusable UI components.
//!
//! SYSTEM CONTEXT
//! ==============
//! Components read shared preferences from context (`crate::state`) and keep
//! their own per-instance controllers in local arena storage, so unmounting a
//! component tears down its observers and subscriptions.

pub mod lazy_image;
pub mod media_grid;
pub mod reduce_animations_switch;
pub mod theme_switch;
