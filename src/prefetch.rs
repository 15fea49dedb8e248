//! Intent-based link prefetching.
//!
//! Hovering or focusing an opted-in link arms a short timer; if the pointer
//! is still there when it elapses, the engine issues the same JSON fetch a
//! real navigation would and caches the result keyed by href. A click that
//! arrives while a result is ready consumes it instead of re-fetching.
//!
//! Entries for different hrefs are fully independent — each owns its own
//! timer and cancellation token, and none of them ever touches the
//! navigation controller's pending state. Entries live in an LRU cache
//! (gated behind the `cache` feature, [`lru`] crate) so an eager pointer
//! cannot grow the cache without bound. [`PrefetchStats`] tracks arms,
//! fires, cancels, and consumption hits/misses.
//!
//! Policy notes (documented, best-effort):
//! - A click arriving while this href's prefetch is still *in flight* does
//!   not adopt the in-flight future; the navigation issues its own fetch.
//!   Promotion never depends on a future a later `stop()` could cancel.
//! - `stop()` (pointer-leave/blur) cancels a pending timer or in-flight
//!   fetch but *keeps* an already-completed result, so a brief leave-then-
//!   click still hits the cache.
//! - A completed result is only good for a bounded freshness window: each
//!   `Ready` entry arms an expiry timer, and an unconsumed result is dropped
//!   when it elapses so a click minutes later never commits stale loader
//!   data.

use crate::error::NavigationError;
use crate::fetch::{CancellationToken, FetchOrchestrator, Spawner};
use crate::response::NavigationResponse;
use lru::LruCache;
use std::cell::{Cell, RefCell};
use std::num::NonZeroUsize;
use std::rc::Rc;

/// Default arm-to-fire window in milliseconds.
pub const DEFAULT_PREFETCH_TIMEOUT_MS: u32 = 100;

/// Default freshness window of a completed result, in milliseconds.
pub const DEFAULT_PREFETCH_MAX_AGE_MS: u32 = 10_000;

const DEFAULT_CAPACITY: usize = 32;

// ============================================================================
// Scheduler boundary
// ============================================================================

/// One-shot timer boundary. On wasm this wraps `setTimeout` (gloo-timers);
/// tests fire timers by hand.
pub trait Scheduler {
    /// Schedule `callback` to run once after `delay_ms`. Returns a handle
    /// usable with [`clear_timeout`](Self::clear_timeout).
    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> u64;

    /// Cancel a scheduled callback. Clearing an already-fired timer is a
    /// no-op.
    fn clear_timeout(&self, id: u64);
}

// ============================================================================
// Entries & stats
// ============================================================================

enum PrefetchStatus {
    /// Timer armed, nothing fetched yet.
    Armed { timer: u64 },
    /// Timer elapsed, fetch in flight.
    Fetching { token: CancellationToken },
    /// Fetch completed; result waiting to be consumed by a click-through
    /// until its expiry timer fires.
    Ready {
        response: Box<NavigationResponse>,
        expiry_timer: u64,
    },
}

struct PrefetchEntry {
    status: PrefetchStatus,
}

/// Counters for prefetch effectiveness.
#[derive(Debug, Clone, Default)]
pub struct PrefetchStats {
    /// Timers armed on hover/focus intent.
    pub armed: usize,
    /// Timers that elapsed and issued a fetch.
    pub fired: usize,
    /// Entries cancelled before their fetch completed.
    pub cancelled: usize,
    /// Completed results dropped unconsumed at the end of their freshness
    /// window.
    pub expired: usize,
    /// Click-throughs that consumed a ready result.
    pub hits: usize,
    /// Click-throughs that found an entry still armed or in flight. Hrefs
    /// with no entry at all (never armed, already consumed or expired) are
    /// not counted.
    pub misses: usize,
}

impl PrefetchStats {
    /// Fraction of click-throughs served from the cache, in `0.0..=1.0`.
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// ============================================================================
// Prefetcher
// ============================================================================

/// Drives intent-based prefetching for all opted-in links in a tab.
pub struct Prefetcher {
    orchestrator: FetchOrchestrator,
    scheduler: Rc<dyn Scheduler>,
    spawner: Rc<dyn Spawner>,
    entries: RefCell<LruCache<String, PrefetchEntry>>,
    stats: RefCell<PrefetchStats>,
    timeout_ms: u32,
    max_age_ms: u32,
}

impl Prefetcher {
    /// Create a prefetcher with the default timeout, freshness window, and
    /// capacity.
    pub fn new(
        orchestrator: FetchOrchestrator,
        scheduler: Rc<dyn Scheduler>,
        spawner: Rc<dyn Spawner>,
    ) -> Rc<Self> {
        Self::with_config(
            orchestrator,
            scheduler,
            spawner,
            DEFAULT_PREFETCH_TIMEOUT_MS,
            DEFAULT_PREFETCH_MAX_AGE_MS,
        )
    }

    /// Create a prefetcher with a custom arm-to-fire window.
    pub fn with_timeout(
        orchestrator: FetchOrchestrator,
        scheduler: Rc<dyn Scheduler>,
        spawner: Rc<dyn Spawner>,
        timeout_ms: u32,
    ) -> Rc<Self> {
        Self::with_config(
            orchestrator,
            scheduler,
            spawner,
            timeout_ms,
            DEFAULT_PREFETCH_MAX_AGE_MS,
        )
    }

    /// Create a prefetcher with custom arm-to-fire and freshness windows.
    pub fn with_config(
        orchestrator: FetchOrchestrator,
        scheduler: Rc<dyn Scheduler>,
        spawner: Rc<dyn Spawner>,
        timeout_ms: u32,
        max_age_ms: u32,
    ) -> Rc<Self> {
        Rc::new(Self {
            orchestrator,
            scheduler,
            spawner,
            entries: RefCell::new(LruCache::new(
                NonZeroUsize::new(DEFAULT_CAPACITY).expect("capacity is non-zero"),
            )),
            stats: RefCell::new(PrefetchStats::default()),
            timeout_ms,
            max_age_ms,
        })
    }

    /// Arm the prefetch timer for `href` (pointer-enter / focus intent).
    ///
    /// No-op if an entry for this href is already armed, in flight, or
    /// ready.
    pub fn start(self: &Rc<Self>, href: &str) {
        if self.entries.borrow_mut().get(href).is_some() {
            return;
        }
        let this = Rc::clone(self);
        let key = href.to_string();
        let timer = self.scheduler.set_timeout(
            self.timeout_ms,
            Box::new(move || this.fire(&key)),
        );
        crate::trace_log!("prefetch armed for '{}'", href);
        self.stats.borrow_mut().armed += 1;
        // An eviction here can orphan an armed timer; its eventual fire()
        // finds no entry and does nothing.
        self.entries.borrow_mut().push(
            href.to_string(),
            PrefetchEntry {
                status: PrefetchStatus::Armed { timer },
            },
        );
    }

    /// Drop the intent for `href` (pointer-leave / blur).
    ///
    /// Cancels a pending timer or in-flight fetch. A completed result is
    /// kept for a late click-through (its expiry timer still applies).
    /// Never affects a navigation that was already promoted from this
    /// entry.
    pub fn stop(&self, href: &str) {
        let mut entries = self.entries.borrow_mut();
        let Some(entry) = entries.get(href) else {
            return;
        };
        match &entry.status {
            PrefetchStatus::Armed { timer } => {
                let timer = *timer;
                entries.pop(href);
                drop(entries);
                self.scheduler.clear_timeout(timer);
                self.stats.borrow_mut().cancelled += 1;
                crate::trace_log!("prefetch timer cleared for '{}'", href);
            }
            PrefetchStatus::Fetching { token } => {
                token.cancel();
                entries.pop(href);
                drop(entries);
                self.stats.borrow_mut().cancelled += 1;
                crate::trace_log!("in-flight prefetch cancelled for '{}'", href);
            }
            PrefetchStatus::Ready { .. } => {}
        }
    }

    /// Consume a ready result for `href`, if one is cached and still fresh.
    ///
    /// The entry is removed on consumption; a result is used at most once.
    /// An href with no entry at all is not a miss — only an entry caught
    /// still armed or in flight counts as one.
    pub fn take_ready(&self, href: &str) -> Option<NavigationResponse> {
        let mut entries = self.entries.borrow_mut();
        let is_ready = match entries.get(href).map(|e| &e.status) {
            None => return None,
            Some(PrefetchStatus::Ready { .. }) => true,
            Some(_) => false,
        };
        if !is_ready {
            drop(entries);
            self.stats.borrow_mut().misses += 1;
            return None;
        }
        let entry = entries.pop(href)?;
        drop(entries);
        self.stats.borrow_mut().hits += 1;
        crate::debug_log!("navigation promoted from prefetch for '{}'", href);
        match entry.status {
            PrefetchStatus::Ready {
                response,
                expiry_timer,
            } => {
                self.scheduler.clear_timeout(expiry_timer);
                Some(*response)
            }
            _ => unreachable!("checked above"),
        }
    }

    /// Snapshot of the effectiveness counters.
    pub fn stats(&self) -> PrefetchStats {
        self.stats.borrow().clone()
    }

    /// Timer elapsed: issue the fetch for `href`.
    fn fire(self: Rc<Self>, href: &str) {
        {
            let mut entries = self.entries.borrow_mut();
            match entries.get_mut(href) {
                Some(entry) if matches!(entry.status, PrefetchStatus::Armed { .. }) => {}
                // Stopped or evicted since arming.
                _ => return,
            }
        }
        let token = CancellationToken::new();
        self.entries.borrow_mut().push(
            href.to_string(),
            PrefetchEntry {
                status: PrefetchStatus::Fetching {
                    token: token.clone(),
                },
            },
        );
        self.stats.borrow_mut().fired += 1;
        crate::debug_log!("prefetching '{}'", href);

        let this = Rc::clone(&self);
        let key = href.to_string();
        let orchestrator = self.orchestrator.clone();
        self.spawner.spawn(Box::pin(async move {
            let result = orchestrator.run(&key, &token).await;
            this.complete(&key, &token, result);
        }));
    }

    /// Fetch resolved: record the result or discard a stale one.
    fn complete(
        self: &Rc<Self>,
        href: &str,
        token: &CancellationToken,
        result: Result<NavigationResponse, NavigationError>,
    ) {
        if token.is_cancelled() {
            return;
        }
        {
            let mut entries = self.entries.borrow_mut();
            match entries.get(href).map(|e| &e.status) {
                Some(PrefetchStatus::Fetching { token: current }) if !current.is_cancelled() => {}
                // The entry moved on without us.
                _ => return,
            }
        }
        match result {
            Ok(response) => {
                let expiry_timer = self.arm_expiry(href);
                self.entries.borrow_mut().push(
                    href.to_string(),
                    PrefetchEntry {
                        status: PrefetchStatus::Ready {
                            response: Box::new(response),
                            expiry_timer,
                        },
                    },
                );
                crate::trace_log!("prefetch ready for '{}'", href);
            }
            Err(err) => {
                self.entries.borrow_mut().pop(href);
                crate::warn_log!("prefetch for '{}' failed: {}", href, err);
            }
        }
    }

    /// Schedule the end of a result's freshness window. The timer id goes
    /// through a shared slot because the callback is built before the
    /// scheduler hands the id back.
    fn arm_expiry(self: &Rc<Self>, href: &str) -> u64 {
        let slot = Rc::new(Cell::new(0_u64));
        let this = Rc::clone(self);
        let key = href.to_string();
        let slot_in = Rc::clone(&slot);
        let timer = self.scheduler.set_timeout(
            self.max_age_ms,
            Box::new(move || this.expire(&key, slot_in.get())),
        );
        slot.set(timer);
        timer
    }

    /// Freshness window elapsed: drop the result if it is still the one the
    /// timer was armed for.
    fn expire(self: Rc<Self>, href: &str, timer: u64) {
        let mut entries = self.entries.borrow_mut();
        match entries.get(href).map(|e| &e.status) {
            Some(PrefetchStatus::Ready { expiry_timer, .. }) if *expiry_timer == timer => {}
            // Consumed, replaced, or evicted since arming.
            _ => return,
        }
        entries.pop(href);
        drop(entries);
        self.stats.borrow_mut().expired += 1;
        crate::trace_log!("prefetch for '{}' expired unconsumed", href);
    }
}

// ============================================================================
// Tests
// ============================================================================
