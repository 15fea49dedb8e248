//! The reactive navigation store.
//!
//! One [`NavigationStore`] exists per browser tab. Every field of the
//! committed navigation state lives in its own [`ReactiveCell`], so view
//! code subscribes to exactly the fields it renders and nothing more.
//!
//! Ownership is explicit: the store is constructed once at client boot from
//! the server-embedded bootstrap payload and handed to whoever mounts the
//! view tree — there is no implicit global. Mutation goes exclusively
//! through [`apply`](NavigationStore::apply) /
//! [`apply_action`](NavigationStore::apply_action), called by the navigation
//! controller's commit step. A commit writes every cell before notifying any
//! of them, with no suspension point inside, so an observer never sees a mix
//! of old and new fields across one navigation.

use crate::chain::RouteChain;
use crate::loader::{Component, LoadedModule};
use crate::response::NavigationResponse;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

// ============================================================================
// ReactiveCell
// ============================================================================

type Subscriber<T> = Rc<dyn Fn(&T)>;

struct CellState<T> {
    value: T,
    subscribers: Vec<(u64, Subscriber<T>)>,
    next_subscriber_id: u64,
}

/// A single named reactive cell: current value plus change subscribers.
///
/// This is the minimal mutable-cell abstraction the engine needs from a
/// reactive-signal library; a host framework can mirror cell updates into
/// its own signals by subscribing. Notification is synchronous — a `set` is
/// visible to every observer before control returns to the caller.
pub struct ReactiveCell<T> {
    state: Rc<RefCell<CellState<T>>>,
}

impl<T> Clone for ReactiveCell<T> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<T: Clone> ReactiveCell<T> {
    /// Wrap `value` into a fresh cell.
    pub fn new(value: T) -> Self {
        Self {
            state: Rc::new(RefCell::new(CellState {
                value,
                subscribers: Vec::new(),
                next_subscriber_id: 0,
            })),
        }
    }

    /// Clone the current value out.
    pub fn get(&self) -> T {
        self.state.borrow().value.clone()
    }

    /// Read the current value without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.state.borrow().value)
    }

    /// Replace the value and notify all subscribers synchronously.
    ///
    /// Subscribers run outside the internal borrow, so they may freely read
    /// the cell (or any other cell) while handling the change.
    pub fn set(&self, value: T) {
        self.write(value);
        self.notify();
    }

    /// Register a change subscriber; returns an id for
    /// [`unsubscribe`](Self::unsubscribe).
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> u64 {
        let mut state = self.state.borrow_mut();
        let id = state.next_subscriber_id;
        state.next_subscriber_id += 1;
        state.subscribers.push((id, Rc::new(f)));
        id
    }

    /// Remove a subscriber registered with [`subscribe`](Self::subscribe).
    pub fn unsubscribe(&self, id: u64) {
        self.state
            .borrow_mut()
            .subscribers
            .retain(|(sid, _)| *sid != id);
    }

    /// Replace the value without notifying. First half of a staged commit.
    fn write(&self, value: T) {
        self.state.borrow_mut().value = value;
    }

    /// Notify subscribers of the current value. Second half of a staged
    /// commit, after every cell in the group has been written.
    fn notify(&self) {
        let subscribers: Vec<Subscriber<T>> = self
            .state
            .borrow()
            .subscribers
            .iter()
            .map(|(_, s)| Rc::clone(s))
            .collect();
        if subscribers.is_empty() {
            return;
        }
        let current = self.state.borrow().value.clone();
        for subscriber in subscribers {
            subscriber(&current);
        }
    }
}

// ============================================================================
// NavigationStore
// ============================================================================

/// The committed view state, one reactive cell per field.
pub struct NavigationStore {
    active_chain: ReactiveCell<RouteChain>,
    active_components: ReactiveCell<Vec<Component>>,
    active_error_boundaries: ReactiveCell<Vec<Option<Component>>>,
    outermost_error_idx: ReactiveCell<Option<usize>>,
    error_payload: ReactiveCell<Option<Value>>,
    splat_segments: ReactiveCell<Vec<String>>,
    params: ReactiveCell<BTreeMap<String, String>>,
    action_payload: ReactiveCell<Option<Value>>,
    title: ReactiveCell<String>,
    build_id: ReactiveCell<String>,
}

/// Fully staged result of a navigation cycle, published in one step.
///
/// Built in a local scope by the controller (chain, index-aligned component
/// lists, metadata) and only then written through
/// [`NavigationStore::apply`]. Nothing here touches the store while the
/// cycle is still fetching or loading.
pub(crate) struct Commit {
    pub chain: RouteChain,
    pub components: Vec<Component>,
    pub error_boundaries: Vec<Option<Component>>,
    pub outermost_error_idx: Option<usize>,
    pub error_payload: Option<Value>,
    pub splat_segments: Vec<String>,
    pub params: BTreeMap<String, String>,
    pub action_payload: Option<Value>,
    pub title: String,
}

impl NavigationStore {
    /// Build the store from the server-embedded bootstrap payload, wrapping
    /// every field into a fresh cell.
    ///
    /// Nothing in the bootstrap object is assumed to be reactive already —
    /// this wrapping is the engine's first act on boot. Component cells
    /// start empty; initial hydration fills them once the bootstrap chain's
    /// modules have loaded.
    pub fn from_bootstrap(boot: &NavigationResponse) -> Result<Rc<Self>, crate::NavigationError> {
        let chain = boot.chain()?;
        crate::info_log!(
            "booting store: {} chain layers, build '{}'",
            chain.len(),
            boot.build_id
        );
        Ok(Rc::new(Self {
            active_chain: ReactiveCell::new(chain),
            active_components: ReactiveCell::new(Vec::new()),
            active_error_boundaries: ReactiveCell::new(Vec::new()),
            outermost_error_idx: ReactiveCell::new(boot.outermost_error_boundary_index),
            error_payload: ReactiveCell::new(boot.error_to_render.clone()),
            splat_segments: ReactiveCell::new(boot.splat_segments.clone()),
            params: ReactiveCell::new(boot.params.clone()),
            action_payload: ReactiveCell::new(boot.action_data.clone()),
            title: ReactiveCell::new(boot.new_title.clone()),
            build_id: ReactiveCell::new(boot.build_id.clone()),
        }))
    }

    /// The active route chain.
    pub fn active_chain(&self) -> &ReactiveCell<RouteChain> {
        &self.active_chain
    }

    /// Mounted components, index-aligned with the active chain.
    pub fn active_components(&self) -> &ReactiveCell<Vec<Component>> {
        &self.active_components
    }

    /// Error-boundary fallbacks, index-aligned with the active chain.
    pub fn active_error_boundaries(&self) -> &ReactiveCell<Vec<Option<Component>>> {
        &self.active_error_boundaries
    }

    /// Lowest index whose boundary must catch a render error.
    pub fn outermost_error_idx(&self) -> &ReactiveCell<Option<usize>> {
        &self.outermost_error_idx
    }

    /// Error payload transported for the boundary to render.
    pub fn error_payload(&self) -> &ReactiveCell<Option<Value>> {
        &self.error_payload
    }

    /// Catch-all segments of the current match.
    pub fn splat_segments(&self) -> &ReactiveCell<Vec<String>> {
        &self.splat_segments
    }

    /// Dynamic path parameters of the current match.
    pub fn params(&self) -> &ReactiveCell<BTreeMap<String, String>> {
        &self.params
    }

    /// Result of the most recent submission.
    pub fn action_payload(&self) -> &ReactiveCell<Option<Value>> {
        &self.action_payload
    }

    /// Document title of the committed view.
    pub fn title(&self) -> &ReactiveCell<String> {
        &self.title
    }

    /// Identifier of the client bundle this tab is running.
    pub fn build_id(&self) -> &ReactiveCell<String> {
        &self.build_id
    }

    /// Publish initial components after the bootstrap chain's modules loaded.
    pub(crate) fn hydrate_components(&self, modules: Vec<LoadedModule>) {
        let components = modules.iter().map(|m| m.component.clone()).collect();
        let boundaries = modules.into_iter().map(|m| m.error_boundary).collect();
        self.active_components.set(components);
        self.active_error_boundaries.set(boundaries);
    }

    /// Publish a fully staged navigation commit.
    ///
    /// Two phases, both synchronous within one turn of the event loop: every
    /// cell is written first, then every cell notifies. A subscriber firing
    /// for any one field therefore observes all other fields already at
    /// their new values — never a mix of old components with new data.
    pub(crate) fn apply(&self, commit: Commit) {
        debug_assert_eq!(commit.chain.len(), commit.components.len());
        debug_assert_eq!(commit.chain.len(), commit.error_boundaries.len());
        self.active_components.write(commit.components);
        self.active_error_boundaries.write(commit.error_boundaries);
        self.active_chain.write(commit.chain);
        self.outermost_error_idx.write(commit.outermost_error_idx);
        self.error_payload.write(commit.error_payload);
        self.splat_segments.write(commit.splat_segments);
        self.params.write(commit.params);
        self.action_payload.write(commit.action_payload);
        self.title.write(commit.title);

        self.active_components.notify();
        self.active_error_boundaries.notify();
        self.active_chain.notify();
        self.outermost_error_idx.notify();
        self.error_payload.notify();
        self.splat_segments.notify();
        self.params.notify();
        self.action_payload.notify();
        self.title.notify();
    }

    /// Publish a submission result. Touches nothing but the action payload.
    pub(crate) fn apply_action(&self, payload: Option<Value>) {
        self.action_payload.set(payload);
    }
}

// ============================================================================
// Tests
// ============================================================================
