//! View-state mechanisms shared by the portfolio client.
//!
//! This crate is UI-framework agnostic: every browser capability it needs
//! (storage, the `<html>` element, the system colour-scheme query, viewport
//! intersection) is reached through a trait in [`host`] or [`media`], so the
//! state machines run and test natively. The `client` crate supplies the
//! `web-sys` implementations.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`bus`] | Synchronous in-tab broadcast and RAII subscriptions |
//! | [`host`] | Storage, document-root and system-preference capabilities |
//! | [`record`] | The JSON preference record persisted under one key |
//! | [`theme`] | Theme value, configuration, per-tab hub and synchronizer instances |
//! | [`motion`] | Reduce-animations preference |
//! | [`media`] | Viewport-driven lazy media loader |
//! | [`hash_route`] | Path-to-hash redirect for static hosting |

pub mod bus;
pub mod hash_route;
pub mod host;
pub mod media;
pub mod motion;
pub mod record;
pub mod theme;
