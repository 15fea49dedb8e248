//! # spa-navigator
//!
//! Client-side navigation and view reconciliation for server-rendered,
//! island-hydrated web applications.
//!
//! The server renders full HTML once. From then on this engine intercepts
//! in-app link clicks and form-like submissions, fetches only the
//! route-level JSON payload for the target location, diffs the active route
//! chain to find the positions that actually changed, lazily loads just
//! those component modules, commits the result atomically into a set of
//! reactive cells, morphs the document `<head>`, and keeps browser history
//! honest — no full page reload.
//!
//! ## Components
//!
//! - [`store::NavigationStore`] — per-tab reactive cells holding the
//!   committed view state; single source of truth for the mounted tree.
//! - [`chain::diff_chains`] — positional route-chain differ (reused vs.
//!   replaced, judged per index).
//! - [`fetch::FetchOrchestrator`] — cancellable JSON navigation requests.
//! - [`loader::ModuleLoader`] — lazy, concurrent component-module loading.
//! - [`controller::NavigationController`] — the state machine tying it all
//!   together (`navigate`, `submit`, hydration, build-staleness handling).
//! - [`head::HeadPatcher`] — declarative head patching over an external
//!   DOM-morphing primitive.
//! - [`link`] / [`prefetch`] — anchor interception, popstate handling, and
//!   intent-based prefetching.
//!
//! The browser itself sits behind traits ([`fetch::Fetcher`],
//! [`history::HistoryApi`], [`head::HeadMorph`], [`prefetch::Scheduler`],
//! [`fetch::Spawner`]), so the whole engine runs natively under test;
//! `web-sys` implementations live in [`web`] and compile on
//! `wasm32-unknown-unknown` only.
//!
//! ## Boot
//!
//! ```ignore
//! // wasm32 entry point, typically from the app's #[wasm_bindgen(start)]:
//! let client = spa_navigator::web::init_client(ClientOptions::default()).await?;
//! mount_view_tree(client.store());
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod chain;
pub mod controller;
pub mod error;
pub mod fetch;
pub mod head;
pub mod history;
pub mod link;
pub mod loader;
pub mod logging;
#[cfg(feature = "cache")]
pub mod prefetch;
pub mod response;
pub mod store;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use chain::{diff_chains, RouteChain, Segment, SegmentClassification, SegmentDiff};
pub use controller::{LoadIndicator, NavigationController};
pub use error::{NavigationError, NavigationOutcome};
pub use fetch::{CancellationToken, FetchOrchestrator, Fetcher, Method, Spawner};
pub use head::{HeadElement, HeadMorph, HeadPatcher};
pub use history::HistoryApi;
pub use link::{popstate_intent, AnchorActivation, NavigateIntent};
#[cfg(feature = "cache")]
pub use link::PrefetchHandlers;
pub use loader::{Component, LoadedModule, ModuleLoader};
#[cfg(feature = "cache")]
pub use prefetch::{
    PrefetchStats, Prefetcher, Scheduler, DEFAULT_PREFETCH_MAX_AGE_MS,
    DEFAULT_PREFETCH_TIMEOUT_MS,
};
pub use response::{with_json_marker, NavigationResponse, SubmitResponse, JSON_QUERY_MARKER};
pub use store::{NavigationStore, ReactiveCell};
