//! Fetch orchestration and cancellation.
//!
//! Exactly one navigation request may be in flight per tab; starting a new
//! one cancels the previous via its [`CancellationToken`]. The token is an
//! explicit value threaded through every suspend point — never ambient
//! state — and cancelling it both aborts the underlying transport request
//! (implementations register an abort hook) and marks any already-resolved
//! result as stale so it is discarded instead of committed.
//!
//! The [`Fetcher`] trait is the transport boundary: on wasm it wraps the
//! browser fetch API with an `AbortController`; tests plug in mocks. The
//! [`FetchOrchestrator`] owns marker appending and payload decoding on top.

use crate::error::NavigationError;
use crate::response::{with_json_marker, NavigationResponse, SubmitResponse};
use futures::future::LocalBoxFuture;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

// ============================================================================
// CancellationToken
// ============================================================================

struct TokenState {
    cancelled: Cell<bool>,
    hooks: RefCell<Vec<Box<dyn FnOnce()>>>,
}

/// Owned cancellation token for one navigation cycle or prefetch entry.
///
/// Clones share state. Cancellation is sticky and idempotent; hooks
/// registered with [`on_cancel`](Self::on_cancel) fire exactly once, either
/// on the cancelling call or immediately if the token is already cancelled.
#[derive(Clone)]
pub struct CancellationToken {
    state: Rc<TokenState>,
}

impl CancellationToken {
    /// Create a live token.
    pub fn new() -> Self {
        Self {
            state: Rc::new(TokenState {
                cancelled: Cell::new(false),
                hooks: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Cancel the token and fire all registered hooks.
    pub fn cancel(&self) {
        if self.state.cancelled.replace(true) {
            return;
        }
        let hooks = std::mem::take(&mut *self.state.hooks.borrow_mut());
        for hook in hooks {
            hook();
        }
    }

    /// Whether the token has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.get()
    }

    /// Register a hook to run on cancellation. Runs immediately if the token
    /// is already cancelled.
    pub fn on_cancel(&self, hook: impl FnOnce() + 'static) {
        if self.is_cancelled() {
            hook();
        } else {
            self.state.hooks.borrow_mut().push(Box::new(hook));
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Transport boundary
// ============================================================================

/// HTTP method of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Route navigation.
    Get,
    /// Form-like submission.
    Post,
}

impl Method {
    /// Wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// Transport boundary: issue one HTTP request, honoring the token.
///
/// Implementations must resolve to [`NavigationError::Aborted`] when the
/// token fires mid-flight, and to [`NavigationError::Network`] for transport
/// failures or non-success statuses. The response body is returned verbatim;
/// decoding belongs to the orchestrator.
pub trait Fetcher {
    /// Fetch `url` with `method`.
    fn fetch(
        &self,
        url: String,
        method: Method,
        token: CancellationToken,
    ) -> LocalBoxFuture<'static, Result<String, NavigationError>>;
}

/// Spawns a future onto the single-threaded event loop.
///
/// On wasm this is `wasm_bindgen_futures::spawn_local`; tests use a
/// `futures` local pool.
pub trait Spawner {
    /// Run `future` to completion in the background.
    fn spawn(&self, future: LocalBoxFuture<'static, ()>);
}

// ============================================================================
// FetchOrchestrator
// ============================================================================

/// Issues navigation requests and decodes their structured payloads.
#[derive(Clone)]
pub struct FetchOrchestrator {
    fetcher: Rc<dyn Fetcher>,
}

impl FetchOrchestrator {
    /// Create an orchestrator over the given transport.
    pub fn new(fetcher: Rc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    /// `GET` the route-level payload for `href`.
    ///
    /// Appends the reserved JSON query marker, awaits the transport, and
    /// decodes the full [`NavigationResponse`]. Resolution after the token
    /// fired is reported as [`NavigationError::Aborted`] even if the
    /// transport already had a body — a stale response must never decode
    /// into a committable value.
    pub async fn run(
        &self,
        href: &str,
        token: &CancellationToken,
    ) -> Result<NavigationResponse, NavigationError> {
        let body = self.fetch_marked(href, Method::Get, token).await?;
        serde_json::from_str(&body).map_err(|e| NavigationError::Deserialize {
            message: e.to_string(),
        })
    }

    /// `POST` a submission to `href`; only the action payload comes back.
    pub async fn run_submit(
        &self,
        href: &str,
        token: &CancellationToken,
    ) -> Result<SubmitResponse, NavigationError> {
        let body = self.fetch_marked(href, Method::Post, token).await?;
        serde_json::from_str(&body).map_err(|e| NavigationError::Deserialize {
            message: e.to_string(),
        })
    }

    async fn fetch_marked(
        &self,
        href: &str,
        method: Method,
        token: &CancellationToken,
    ) -> Result<String, NavigationError> {
        let url = with_json_marker(href);
        crate::trace_log!("{} {}", method.as_str(), url);
        let body = self.fetcher.fetch(url, method, token.clone()).await?;
        if token.is_cancelled() {
            return Err(NavigationError::Aborted);
        }
        Ok(body)
    }
}

// ============================================================================
// Tests
// ============================================================================
