//! The navigation controller.
//!
//! Top-level state machine composing the fetch orchestrator, chain differ,
//! module loader, store, head patcher, and history boundary. A navigation
//! cycle runs `Idle → Fetching → Diffing+Loading → Committing → Idle`;
//! a submission takes the reduced `Idle → Fetching → Committing → Idle`
//! path that only ever touches the action payload.
//!
//! At most one cycle is pending per tab. Starting a new `navigate`/`submit`
//! cancels the previous cycle's token and bumps a generation counter; the
//! superseded cycle notices at its next suspension point and resolves to a
//! silent [`NavigationOutcome::Aborted`] with zero store, history, head, or
//! title mutations and no further callbacks. Commit effects for a cycle
//! happen strictly after its fetch and all its loads resolve, and strictly
//! before its `on_end` callback fires.

use crate::chain::{diff_chains, SegmentClassification, SegmentDiff};
use crate::error::{NavigationError, NavigationOutcome};
use crate::fetch::{CancellationToken, FetchOrchestrator, Fetcher};
use crate::head::{HeadMorph, HeadPatcher};
use crate::history::HistoryApi;
use crate::loader::{load_replaced, Component, LoadedModule, ModuleLoader};
use crate::response::NavigationResponse;
use crate::store::{Commit, NavigationStore};
use crate::{debug_log, error_log, info_log, warn_log};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

// ============================================================================
// Load indicator
// ============================================================================

/// Paired start/done callbacks for a load indicator (e.g. a progress bar).
///
/// `begin` fires when a cycle starts fetching; `finish` fires after commit
/// (or after a logged failure, so the UI never hangs in a loading state).
/// Superseded cycles fire nothing further — the superseding cycle owns the
/// indicator from then on, so `finish` never double-fires for one `begin`
/// pair observed by the user.
#[derive(Clone, Default)]
pub struct LoadIndicator {
    start: Option<Rc<dyn Fn()>>,
    end: Option<Rc<dyn Fn()>>,
}

impl LoadIndicator {
    /// An indicator that does nothing.
    pub fn none() -> Self {
        Self::default()
    }

    /// Pair of start/done callbacks.
    pub fn new(start: impl Fn() + 'static, end: impl Fn() + 'static) -> Self {
        Self {
            start: Some(Rc::new(start)),
            end: Some(Rc::new(end)),
        }
    }

    fn begin(&self) {
        if let Some(start) = &self.start {
            start();
        }
    }

    fn finish(&self) {
        if let Some(end) = &self.end {
            end();
        }
    }
}

// ============================================================================
// Pending cycle
// ============================================================================

#[derive(Clone)]
struct PendingNavigation {
    id: u64,
    token: CancellationToken,
}

// ============================================================================
// NavigationController
// ============================================================================

type BuildMismatchListener = Box<dyn Fn(&str, &str)>;

/// Orchestrates full navigation cycles over the shared [`NavigationStore`].
///
/// Only this type's commit step ever writes to the store; everything else in
/// the engine (and the mounted view tree) reads.
pub struct NavigationController {
    store: Rc<NavigationStore>,
    orchestrator: FetchOrchestrator,
    loader: Rc<dyn ModuleLoader>,
    history: Rc<dyn HistoryApi>,
    head: HeadPatcher,
    pending: RefCell<Option<PendingNavigation>>,
    next_cycle_id: Cell<u64>,
    build_mismatch_listener: RefCell<Option<BuildMismatchListener>>,
}

impl NavigationController {
    /// Compose a controller from the store and the four boundary
    /// implementations.
    pub fn new(
        store: Rc<NavigationStore>,
        fetcher: Rc<dyn Fetcher>,
        loader: Rc<dyn ModuleLoader>,
        history: Rc<dyn HistoryApi>,
        morph: Rc<dyn HeadMorph>,
    ) -> Rc<Self> {
        Rc::new(Self {
            store,
            orchestrator: FetchOrchestrator::new(fetcher),
            loader,
            history,
            head: HeadPatcher::new(morph),
            pending: RefCell::new(None),
            next_cycle_id: Cell::new(0),
            build_mismatch_listener: RefCell::new(None),
        })
    }

    /// The shared store this controller commits into.
    pub fn store(&self) -> &Rc<NavigationStore> {
        &self.store
    }

    /// The orchestrator, shared with the prefetch layer so prefetches issue
    /// byte-identical requests.
    pub fn orchestrator(&self) -> &FetchOrchestrator {
        &self.orchestrator
    }

    /// Register a listener fired on build-ID divergence, just before the
    /// hard document load. Hosts use this to flush state or show a notice.
    pub fn on_build_mismatch(&self, listener: impl Fn(&str, &str) + 'static) {
        *self.build_mismatch_listener.borrow_mut() = Some(Box::new(listener));
    }

    // ========================================================================
    // Boot
    // ========================================================================

    /// Load the component modules for the bootstrap chain and publish them.
    ///
    /// The store starts with empty component lists; the server-rendered HTML
    /// keeps the page presentable until this resolves.
    pub async fn hydrate(&self) -> Result<(), NavigationError> {
        let chain = self.store.active_chain().get();
        debug_log!("hydrating {} bootstrap layers", chain.len());
        let all_replaced: Vec<SegmentDiff> = chain
            .segments()
            .iter()
            .map(|segment| SegmentDiff {
                import_key: segment.import_key.clone(),
                classification: SegmentClassification::Replaced,
            })
            .collect();
        let loaded = load_replaced(&self.loader, &all_replaced).await?;
        let modules: Vec<LoadedModule> = loaded.into_iter().flatten().collect();
        self.store.hydrate_components(modules);
        info_log!("hydration complete");
        Ok(())
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Run one full navigation cycle for `href`.
    ///
    /// `update_history` is `false` for popstate re-navigations, where the
    /// browser already moved the location.
    pub async fn navigate(
        &self,
        href: &str,
        update_history: bool,
        indicator: &LoadIndicator,
    ) -> NavigationOutcome {
        self.navigate_inner(href, update_history, indicator, None)
            .await
    }

    /// Run a navigation cycle seeded with an already-fetched response (a
    /// promoted prefetch). Skips the fetch step; everything downstream —
    /// staleness checks included — is identical to [`navigate`](Self::navigate).
    pub async fn navigate_with_prefetched(
        &self,
        href: &str,
        update_history: bool,
        indicator: &LoadIndicator,
        response: NavigationResponse,
    ) -> NavigationOutcome {
        self.navigate_inner(href, update_history, indicator, Some(response))
            .await
    }

    async fn navigate_inner(
        &self,
        href: &str,
        update_history: bool,
        indicator: &LoadIndicator,
        prefetched: Option<NavigationResponse>,
    ) -> NavigationOutcome {
        indicator.begin();
        let cycle = self.begin_cycle();
        info_log!("navigation {} -> '{}'", cycle.id, href);

        // Fetching
        let response = match prefetched {
            Some(response) => {
                debug_log!("navigation {} uses a prefetched response", cycle.id);
                response
            }
            None => match self.orchestrator.run(href, &cycle.token).await {
                Ok(response) => response,
                Err(err) if err.is_aborted() => return NavigationOutcome::Aborted,
                Err(err) => return self.fail_cycle(&cycle, indicator, err),
            },
        };
        if !self.is_current(&cycle) {
            return NavigationOutcome::Aborted;
        }

        // A response from a different bundle cannot be hot-swapped in.
        let running_build = self.store.build_id().get();
        if !response.build_id.is_empty()
            && !running_build.is_empty()
            && response.build_id != running_build
        {
            return self.escalate_to_hard_load(&cycle, indicator, href, &response.build_id);
        }

        // Diffing + Loading
        let new_chain = match response.chain() {
            Ok(chain) => chain,
            Err(err) => return self.fail_cycle(&cycle, indicator, err),
        };
        let old_components = self.store.active_components().get();
        let old_boundaries = self.store.active_error_boundaries().get();
        // A layer without a mounted component (hydration still pending)
        // cannot be reused, so diff against the mounted prefix only.
        let mounted = self
            .store
            .active_chain()
            .get()
            .truncated(old_components.len());
        let diff = diff_chains(&mounted, &new_chain);
        let loaded = match load_replaced(&self.loader, &diff).await {
            Ok(loaded) => loaded,
            Err(err) => {
                if !self.is_current(&cycle) || err.is_aborted() {
                    return NavigationOutcome::Aborted;
                }
                return self.fail_cycle(&cycle, indicator, err);
            }
        };
        if !self.is_current(&cycle) {
            // A load that resolved for a superseded cycle is discarded, not
            // written into the store.
            return NavigationOutcome::Aborted;
        }

        // Committing: stage everything locally, publish in one step.
        let mut components: Vec<Component> = Vec::with_capacity(diff.len());
        let mut boundaries: Vec<Option<Component>> = Vec::with_capacity(diff.len());
        for (index, slot) in loaded.iter().enumerate() {
            match slot {
                Some(module) => {
                    components.push(module.component.clone());
                    boundaries.push(module.error_boundary.clone());
                }
                None => {
                    components.push(old_components[index].clone());
                    boundaries.push(old_boundaries.get(index).cloned().flatten());
                }
            }
        }
        self.store.apply(Commit {
            chain: new_chain,
            components,
            error_boundaries: boundaries,
            outermost_error_idx: response.outermost_error_boundary_index,
            error_payload: response.error_to_render,
            splat_segments: response.splat_segments,
            params: response.params,
            action_payload: response.action_data,
            title: response.new_title.clone(),
        });
        self.head.apply(&response.new_title, &response.head);

        if update_history {
            let current = self.history.current_href();
            if href == current {
                self.history.replace(href);
            } else {
                self.history.push(href);
            }
        }

        self.finish_cycle(&cycle);
        indicator.finish();
        info_log!("navigation {} committed '{}'", cycle.id, href);
        NavigationOutcome::Completed {
            href: href.to_string(),
        }
    }

    // ========================================================================
    // Submission
    // ========================================================================

    /// Run a submission cycle for `href`.
    ///
    /// Commits only the action payload; the chain, mounted components, head,
    /// and history are untouched.
    pub async fn submit(&self, href: &str, indicator: &LoadIndicator) -> NavigationOutcome {
        indicator.begin();
        let cycle = self.begin_cycle();
        info_log!("submission {} -> '{}'", cycle.id, href);

        let response = match self.orchestrator.run_submit(href, &cycle.token).await {
            Ok(response) => response,
            Err(err) if err.is_aborted() => return NavigationOutcome::Aborted,
            Err(err) => return self.fail_cycle(&cycle, indicator, err),
        };
        if !self.is_current(&cycle) {
            return NavigationOutcome::Aborted;
        }

        self.store.apply_action(response.action_data);
        self.finish_cycle(&cycle);
        indicator.finish();
        NavigationOutcome::Completed {
            href: href.to_string(),
        }
    }

    // ========================================================================
    // Cycle bookkeeping
    // ========================================================================

    /// Cancel any pending cycle and register a fresh one.
    fn begin_cycle(&self) -> PendingNavigation {
        if let Some(previous) = self.pending.borrow_mut().take() {
            debug_log!("navigation {} superseded", previous.id);
            previous.token.cancel();
        }
        let id = self.next_cycle_id.get() + 1;
        self.next_cycle_id.set(id);
        let cycle = PendingNavigation {
            id,
            token: CancellationToken::new(),
        };
        *self.pending.borrow_mut() = Some(cycle.clone());
        cycle
    }

    /// Whether `cycle` is still the pending one (not superseded).
    fn is_current(&self, cycle: &PendingNavigation) -> bool {
        !cycle.token.is_cancelled()
            && self
                .pending
                .borrow()
                .as_ref()
                .is_some_and(|p| p.id == cycle.id)
    }

    fn finish_cycle(&self, cycle: &PendingNavigation) {
        let mut pending = self.pending.borrow_mut();
        if pending.as_ref().is_some_and(|p| p.id == cycle.id) {
            *pending = None;
        }
    }

    /// Log a real (non-abort) failure, end the indicator, leave state as-is.
    fn fail_cycle(
        &self,
        cycle: &PendingNavigation,
        indicator: &LoadIndicator,
        err: NavigationError,
    ) -> NavigationOutcome {
        error_log!("navigation {} failed: {}", cycle.id, err);
        self.finish_cycle(cycle);
        indicator.finish();
        NavigationOutcome::Failed(err)
    }

    /// Stale bundle: bypass the SPA path with a full document load.
    fn escalate_to_hard_load(
        &self,
        cycle: &PendingNavigation,
        indicator: &LoadIndicator,
        href: &str,
        received_build: &str,
    ) -> NavigationOutcome {
        let running_build = self.store.build_id().get();
        warn_log!(
            "build mismatch (running '{}', received '{}'), hard-loading '{}'",
            running_build,
            received_build,
            href
        );
        if let Some(listener) = self.build_mismatch_listener.borrow().as_ref() {
            listener(&running_build, received_build);
        }
        self.finish_cycle(cycle);
        indicator.finish();
        self.history.hard_load(href);
        NavigationOutcome::HardReload {
            href: href.to_string(),
        }
    }
}
