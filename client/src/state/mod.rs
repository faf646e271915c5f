//! Application state shared through Leptos context.
//!
//! SYSTEM CONTEXT
//! ==============
//! The preference controllers live in `viewstate` and are plain `Rc` graphs.
//! These modules park them in local arena storage owned by the component tree
//! and mirror their values into signals so views can react to them.

pub mod motion;
pub mod theme;
