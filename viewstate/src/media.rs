//! Viewport-driven lazy media loading.
//!
//! [`MediaVisibility`] is the pure state machine for one media element:
//!
//! ```text
//! Unloaded --enters margin--> Intersecting --asset load--> Loaded
//!     ^                            |                          |
//!     +------ leaves margin -------+--------------------------+   (unload enabled)
//! ```
//!
//! With unloading disabled the first `Loaded` is final and observation stops.
//! [`LazyMedia`] binds one state machine to an [`IntersectionWatcher`], owns
//! the watch subscription, and fires the load/unload hooks.

#[cfg(test)]
#[path = "media_test.rs"]
mod media_test;

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::bus::{Broadcast, Subscription};

/// Light-grey 400x300 SVG shown while the real asset is not loaded.
pub const DEFAULT_PLACEHOLDER: &str = "data:image/svg+xml,%3Csvg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 400 300\"%3E%3Crect fill=\"%23f0f0f0\" width=\"400\" height=\"300\"/%3E%3C/svg%3E";
pub const DEFAULT_THRESHOLD: f64 = 0.1;
pub const DEFAULT_ROOT_MARGIN: &str = "50px";
pub const DEFAULT_UNLOAD_MARGIN: &str = "400px";
/// CSS transition applied to the opacity fade.
pub const FADE_TRANSITION: &str = "opacity 0.3s ease-in-out";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MediaError {
    #[error("media source URL is empty")]
    EmptySource,
    #[error("intersection threshold {0} is outside 0..=1")]
    InvalidThreshold(f64),
    #[error("invalid margin `{input}`: {reason}")]
    InvalidMargin { input: String, reason: String },
}

// =============================================================================
// MARGINS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarginValue {
    Px(f64),
    Percent(f64),
}

impl fmt::Display for MarginValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Px(v) => write!(f, "{v}px"),
            Self::Percent(v) => write!(f, "{v}%"),
        }
    }
}

/// CSS-style margin shorthand expanding the viewport rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootMargin {
    pub top: MarginValue,
    pub right: MarginValue,
    pub bottom: MarginValue,
    pub left: MarginValue,
}

impl RootMargin {
    /// Parse one to four space-separated `px`/`%` lengths, CSS shorthand order.
    pub fn parse(input: &str) -> Result<Self, MediaError> {
        let invalid = |reason: &str| MediaError::InvalidMargin { input: input.to_owned(), reason: reason.to_owned() };

        let values = input
            .split_whitespace()
            .map(|token| parse_margin_value(token).ok_or_else(|| invalid(&format!("bad length `{token}`"))))
            .collect::<Result<Vec<_>, _>>()?;

        match values.as_slice() {
            [all] => Ok(Self { top: *all, right: *all, bottom: *all, left: *all }),
            [v, h] => Ok(Self { top: *v, right: *h, bottom: *v, left: *h }),
            [t, h, b] => Ok(Self { top: *t, right: *h, bottom: *b, left: *h }),
            [t, r, b, l] => Ok(Self { top: *t, right: *r, bottom: *b, left: *l }),
            [] => Err(invalid("no lengths")),
            _ => Err(invalid("more than four lengths")),
        }
    }
}

impl fmt::Display for RootMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { top, right, bottom, left } = self;
        if top == right && right == bottom && bottom == left {
            write!(f, "{top}")
        } else {
            write!(f, "{top} {right} {bottom} {left}")
        }
    }
}

fn parse_margin_value(token: &str) -> Option<MarginValue> {
    if token == "0" {
        return Some(MarginValue::Px(0.0));
    }
    let (number, make): (&str, fn(f64) -> MarginValue) = if let Some(n) = token.strip_suffix("px") {
        (n, MarginValue::Px)
    } else if let Some(n) = token.strip_suffix('%') {
        (n, MarginValue::Percent)
    } else {
        return None;
    };
    match number.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(make(v)),
        _ => None,
    }
}

// =============================================================================
// OPTIONS
// =============================================================================

/// Per-element loader configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LazyMediaOptions {
    /// Fraction of the element that must be visible to count as intersecting.
    pub threshold: f64,
    /// Margin used when unloading is disabled.
    pub root_margin: String,
    /// Wider margin used when unloading is enabled.
    pub unload_margin: String,
    pub unload_enabled: bool,
    pub placeholder: String,
}

impl Default for LazyMediaOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            root_margin: DEFAULT_ROOT_MARGIN.to_owned(),
            unload_margin: DEFAULT_UNLOAD_MARGIN.to_owned(),
            unload_enabled: true,
            placeholder: DEFAULT_PLACEHOLDER.to_owned(),
        }
    }
}

/// What the host observer is configured with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserverConfig {
    pub threshold: f64,
    pub root_margin: RootMargin,
}

impl LazyMediaOptions {
    /// Check the options without building anything.
    pub fn validate(&self) -> Result<(), MediaError> {
        self.observer_config().map(|_| ())
    }

    /// Validate and resolve the observer configuration.
    pub fn observer_config(&self) -> Result<ObserverConfig, MediaError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(MediaError::InvalidThreshold(self.threshold));
        }
        // Both margins are validated even though only one is in effect.
        let root = RootMargin::parse(&self.root_margin)?;
        let unload = RootMargin::parse(&self.unload_margin)?;
        Ok(ObserverConfig {
            threshold: self.threshold,
            root_margin: if self.unload_enabled { unload } else { root },
        })
    }
}

// =============================================================================
// STATE MACHINE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaPhase {
    Unloaded,
    Intersecting,
    Loaded,
}

/// Result of feeding one event to [`MediaVisibility`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    /// Source swapped to the real asset.
    Entered,
    Loaded,
    /// Source reverted to the placeholder.
    Unloaded,
}

/// Render-facing snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaView {
    pub source: String,
    pub loaded: bool,
    pub phase: MediaPhase,
}

impl MediaView {
    /// Inline style for the fade, same as [`MediaVisibility::style`].
    #[must_use]
    pub fn style(&self) -> String {
        fade_style(self.loaded)
    }
}

fn fade_style(loaded: bool) -> String {
    let opacity = if loaded { 1 } else { 0 };
    format!("opacity: {opacity}; transition: {FADE_TRANSITION};")
}

#[derive(Debug, Clone)]
pub struct MediaVisibility {
    source_url: String,
    placeholder: String,
    unload_enabled: bool,
    intersecting: bool,
    loaded: bool,
    detached: bool,
}

impl MediaVisibility {
    pub fn new(source_url: &str, options: &LazyMediaOptions) -> Result<Self, MediaError> {
        if source_url.trim().is_empty() {
            return Err(MediaError::EmptySource);
        }
        options.validate()?;
        Ok(Self {
            source_url: source_url.to_owned(),
            placeholder: options.placeholder.clone(),
            unload_enabled: options.unload_enabled,
            intersecting: false,
            loaded: false,
            detached: false,
        })
    }

    /// Apply one observer report.
    pub fn observe(&mut self, is_intersecting: bool) -> Transition {
        if self.detached {
            return Transition::Unchanged;
        }
        if is_intersecting {
            if self.intersecting {
                return Transition::Unchanged;
            }
            self.intersecting = true;
            return Transition::Entered;
        }
        if !self.unload_enabled || !self.intersecting {
            return Transition::Unchanged;
        }
        self.intersecting = false;
        self.loaded = false;
        Transition::Unloaded
    }

    /// Apply the asset's load-completion event.
    ///
    /// Loads of the placeholder (not intersecting) and repeated events are
    /// ignored.
    pub fn asset_loaded(&mut self) -> Transition {
        if self.detached || !self.intersecting || self.loaded {
            return Transition::Unchanged;
        }
        self.loaded = true;
        Transition::Loaded
    }

    /// Stop reacting to anything.
    pub fn detach(&mut self) {
        self.detached = true;
    }

    /// Whether observer reports can still change anything.
    #[must_use]
    pub fn is_observing(&self) -> bool {
        !self.detached && !(self.loaded && !self.unload_enabled)
    }

    #[must_use]
    pub fn phase(&self) -> MediaPhase {
        if self.loaded {
            MediaPhase::Loaded
        } else if self.intersecting {
            MediaPhase::Intersecting
        } else {
            MediaPhase::Unloaded
        }
    }

    #[must_use]
    pub fn is_intersecting(&self) -> bool {
        self.intersecting
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    #[must_use]
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    #[must_use]
    pub fn rendered_source(&self) -> &str {
        if self.intersecting { &self.source_url } else { &self.placeholder }
    }

    #[must_use]
    pub fn opacity(&self) -> f64 {
        if self.loaded { 1.0 } else { 0.0 }
    }

    /// Inline style for the fade.
    #[must_use]
    pub fn style(&self) -> String {
        fade_style(self.loaded)
    }

    #[must_use]
    pub fn view(&self) -> MediaView {
        MediaView { source: self.rendered_source().to_owned(), loaded: self.loaded, phase: self.phase() }
    }
}

// =============================================================================
// WATCHER BINDING
// =============================================================================

/// A host facility reporting whether a target overlaps the (expanded) viewport.
pub trait IntersectionWatcher {
    type Target;

    /// Start reporting for `target`. Reports stop when the subscription goes away.
    fn watch(
        &self,
        target: &Self::Target,
        config: &ObserverConfig,
        on_entry: Box<dyn FnMut(bool)>,
    ) -> Subscription;
}

/// Fire-and-forget hooks.
#[derive(Clone, Default)]
pub struct MediaCallbacks {
    on_loaded: Option<Rc<dyn Fn()>>,
    on_unloaded: Option<Rc<dyn Fn()>>,
}

impl fmt::Debug for MediaCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaCallbacks")
            .field("on_loaded", &self.on_loaded.is_some())
            .field("on_unloaded", &self.on_unloaded.is_some())
            .finish()
    }
}

impl MediaCallbacks {
    #[must_use]
    pub fn on_loaded(mut self, f: impl Fn() + 'static) -> Self {
        self.on_loaded = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn on_unloaded(mut self, f: impl Fn() + 'static) -> Self {
        self.on_unloaded = Some(Rc::new(f));
        self
    }
}

struct MediaShared {
    state: RefCell<MediaVisibility>,
    watch: RefCell<Option<Subscription>>,
    callbacks: MediaCallbacks,
    views: Broadcast<MediaView>,
}

impl MediaShared {
    /// Publish the outcome of a transition once every borrow is released.
    fn settle(&self, transition: Transition) {
        if transition == Transition::Unchanged {
            return;
        }
        let (view, observing) = {
            let state = self.state.borrow();
            (state.view(), state.is_observing())
        };
        log::debug!("media: {transition:?} -> {:?} ({})", view.phase, view.source);

        if !observing {
            let finished = self.watch.borrow_mut().take();
            if let Some(sub) = finished {
                sub.cancel();
            }
        }

        self.views.publish(&view);
        let hook = match transition {
            Transition::Loaded => self.callbacks.on_loaded.clone(),
            Transition::Unloaded => self.callbacks.on_unloaded.clone(),
            Transition::Entered | Transition::Unchanged => None,
        };
        if let Some(hook) = hook {
            hook();
        }
    }

    fn entry(&self, is_intersecting: bool) {
        let transition = self.state.borrow_mut().observe(is_intersecting);
        self.settle(transition);
    }
}

/// One mounted media element: state machine plus its watch.
pub struct LazyMedia<W: IntersectionWatcher> {
    watcher: W,
    config: ObserverConfig,
    shared: Rc<MediaShared>,
}

impl<W: IntersectionWatcher> fmt::Debug for LazyMedia<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyMedia")
            .field("config", &self.config)
            .field("state", &self.shared.state.borrow())
            .field("watching", &self.is_watching())
            .finish_non_exhaustive()
    }
}

impl<W: IntersectionWatcher> LazyMedia<W> {
    pub fn new(
        watcher: W,
        source_url: &str,
        options: &LazyMediaOptions,
        callbacks: MediaCallbacks,
    ) -> Result<Self, MediaError> {
        let state = MediaVisibility::new(source_url, options)?;
        let config = options.observer_config()?;
        Ok(Self {
            watcher,
            config,
            shared: Rc::new(MediaShared {
                state: RefCell::new(state),
                watch: RefCell::new(None),
                callbacks,
                views: Broadcast::new(),
            }),
        })
    }

    /// Start watching `target`.
    ///
    /// Returns `false` without doing anything when the target is not
    /// available yet, a watch is already running, or observation has ended.
    pub fn attach(&self, target: Option<&W::Target>) -> bool {
        let Some(target) = target else {
            return false;
        };
        if self.is_watching() || !self.shared.state.borrow().is_observing() {
            return false;
        }

        let weak: Weak<MediaShared> = Rc::downgrade(&self.shared);
        let on_entry = Box::new(move |is_intersecting: bool| {
            if let Some(shared) = weak.upgrade() {
                shared.entry(is_intersecting);
            }
        });
        let sub = self.watcher.watch(target, &self.config, on_entry);
        *self.shared.watch.borrow_mut() = Some(sub);
        true
    }

    /// Feed an observer report directly.
    pub fn handle_entry(&self, is_intersecting: bool) {
        self.shared.entry(is_intersecting);
    }

    /// Feed the asset's load event.
    pub fn handle_asset_loaded(&self) {
        let transition = self.shared.state.borrow_mut().asset_loaded();
        self.shared.settle(transition);
    }

    /// Tear down: cancel the watch; nothing fires afterwards.
    pub fn detach(&self) {
        self.shared.state.borrow_mut().detach();
        let watch = self.shared.watch.borrow_mut().take();
        if let Some(sub) = watch {
            sub.cancel();
        }
    }

    #[must_use]
    pub fn is_watching(&self) -> bool {
        self.shared.watch.borrow().is_some()
    }

    #[must_use]
    pub fn config(&self) -> &ObserverConfig {
        &self.config
    }

    #[must_use]
    pub fn view(&self) -> MediaView {
        self.shared.state.borrow().view()
    }

    #[must_use]
    pub fn style(&self) -> String {
        self.shared.state.borrow().style()
    }

    /// Observe every render-relevant change.
    pub fn subscribe(&self, listener: impl Fn(&MediaView) + 'static) -> Subscription {
        self.shared.views.subscribe(listener)
    }
}

impl<W: IntersectionWatcher> Drop for LazyMedia<W> {
    fn drop(&mut self) {
        self.detach();
    }
}
