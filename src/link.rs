//! Link interaction layer.
//!
//! Decides which anchor activations the engine owns and wires link intent
//! (hover/focus) to the prefetcher. The decision logic is browser-free —
//! the wasm layer merely fills an [`AnchorActivation`] from the real event
//! and anchor element — so every eligibility rule is unit-testable.
//!
//! An in-app activation becomes a [`NavigateIntent`]; everything else
//! (external origins, `target="_blank"`, downloads, modified or non-primary
//! clicks) is left to the browser's default handling. `popstate` always
//! re-navigates `location.href` without touching history — the browser
//! already updated it.

#[cfg(feature = "cache")]
use crate::controller::{LoadIndicator, NavigationController};
#[cfg(feature = "cache")]
use crate::fetch::Spawner;
#[cfg(feature = "cache")]
use crate::prefetch::Prefetcher;
#[cfg(feature = "cache")]
use std::rc::Rc;

// ============================================================================
// Activation eligibility
// ============================================================================

/// Snapshot of an anchor click, as seen at the document level.
#[derive(Debug, Clone, Default)]
pub struct AnchorActivation {
    /// The anchor's resolved href.
    pub href: String,
    /// Whether the anchor points at the current document's origin.
    pub same_origin: bool,
    /// The anchor's `target` attribute, if any.
    pub target: Option<String>,
    /// Whether the anchor carries a `download` attribute.
    pub download: bool,
    /// Whether ctrl/meta/shift/alt was held ("open in new tab" intent).
    pub modifier_held: bool,
    /// Whether the primary button produced the event.
    pub primary_button: bool,
}

impl AnchorActivation {
    /// Whether the engine should intercept this activation.
    pub fn should_intercept(&self) -> bool {
        if self.href.is_empty() || !self.same_origin {
            return false;
        }
        if self.download || self.modifier_held || !self.primary_button {
            return false;
        }
        match self.target.as_deref() {
            None | Some("" | "_self") => true,
            Some(_) => false,
        }
    }

    /// The navigation this activation asks for, if the engine owns it.
    pub fn intent(&self) -> Option<NavigateIntent> {
        self.should_intercept().then(|| NavigateIntent {
            href: self.href.clone(),
            update_history: true,
        })
    }
}

/// A navigation the interaction layer wants the controller to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigateIntent {
    /// Target location.
    pub href: String,
    /// Whether the controller should push/replace history. `false` for
    /// popstate re-navigations.
    pub update_history: bool,
}

/// The re-navigation a `popstate` event asks for: the browser has already
/// moved `location`, so history must not be touched again.
pub fn popstate_intent(current_href: impl Into<String>) -> NavigateIntent {
    NavigateIntent {
        href: current_href.into(),
        update_history: false,
    }
}

// ============================================================================
// Prefetch handler bundle
// ============================================================================

/// Per-link handler bundle for intent-based prefetching.
///
/// The host wires these to pointer-enter/focus (`on_intent`),
/// pointer-leave/blur (`on_intent_lost`), and click (`on_activate`). On
/// click-through, a ready prefetch result is promoted into the navigation;
/// otherwise the controller fetches as usual. A promotion is irrevocable:
/// later `on_intent_lost` calls affect only the (now empty) prefetch entry,
/// never the running navigation.
#[cfg(feature = "cache")]
pub struct PrefetchHandlers {
    controller: Rc<NavigationController>,
    prefetcher: Rc<Prefetcher>,
    spawner: Rc<dyn Spawner>,
    href: String,
    indicator: LoadIndicator,
    /// Touch devices report pointer-leave on tap; suppress the stop there so
    /// the tap can still consume the prefetch.
    suppress_intent_lost: bool,
}

#[cfg(feature = "cache")]
impl PrefetchHandlers {
    /// Build the handler bundle for one link.
    pub fn new(
        controller: Rc<NavigationController>,
        prefetcher: Rc<Prefetcher>,
        spawner: Rc<dyn Spawner>,
        href: impl Into<String>,
        indicator: LoadIndicator,
    ) -> Self {
        Self {
            controller,
            prefetcher,
            spawner,
            href: href.into(),
            indicator,
            suppress_intent_lost: false,
        }
    }

    /// Keep prefetches alive across pointer-leave (touch devices).
    pub fn suppress_intent_lost(mut self, suppress: bool) -> Self {
        self.suppress_intent_lost = suppress;
        self
    }

    /// Pointer entered or focus landed on the link.
    pub fn on_intent(&self) {
        self.prefetcher.start(&self.href);
    }

    /// Pointer left or focus moved away.
    pub fn on_intent_lost(&self) {
        if !self.suppress_intent_lost {
            self.prefetcher.stop(&self.href);
        }
    }

    /// The link was activated.
    pub fn on_activate(&self) {
        let controller = Rc::clone(&self.controller);
        let href = self.href.clone();
        let indicator = self.indicator.clone();
        let prefetched = self.prefetcher.take_ready(&self.href);
        self.spawner.spawn(Box::pin(async move {
            let outcome = match prefetched {
                Some(response) => {
                    controller
                        .navigate_with_prefetched(&href, true, &indicator, response)
                        .await
                }
                None => controller.navigate(&href, true, &indicator).await,
            };
            crate::trace_log!("link navigation to '{}' resolved: {:?}", href, outcome);
        }));
    }
}

// ============================================================================
// Tests
// ============================================================================
