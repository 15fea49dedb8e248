//! Wire format of the navigation JSON endpoint.
//!
//! Any route URL doubles as a JSON endpoint: appending the reserved query
//! marker (`?route_json=1`) tells the server to answer with the structured
//! route-level payload instead of full HTML. A `GET` returns the complete
//! [`NavigationResponse`]; a `POST` (form-like submission) returns only the
//! reduced [`SubmitResponse`].
//!
//! The same shape is embedded by the server into the initial HTML as the
//! bootstrap payload, which is why [`NavigationResponse`] also serializes.

use crate::chain::RouteChain;
use crate::error::NavigationError;
use crate::head::HeadElement;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Reserved query parameter signaling a JSON navigation request.
pub const JSON_QUERY_MARKER: &str = "route_json";

/// Append the reserved JSON marker to `href`.
pub fn with_json_marker(href: &str) -> String {
    let sep = if href.contains('?') { '&' } else { '?' };
    format!("{href}{sep}{JSON_QUERY_MARKER}=1")
}

// ============================================================================
// GET payload
// ============================================================================

/// Structured payload for a `GET` navigation (and for the server-embedded
/// bootstrap object).
///
/// `active_paths` and `active_data` are index-aligned parallel lists; use
/// [`chain`](Self::chain) to zip them into a [`RouteChain`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NavigationResponse {
    /// Import keys of the matched route layers, root first.
    pub active_paths: Vec<String>,

    /// Loader payloads, index-aligned with `active_paths`.
    pub active_data: Vec<Value>,

    /// Lowest index whose error boundary must catch a render error, if any.
    pub outermost_error_boundary_index: Option<usize>,

    /// Error payload for the boundary to render, if any.
    pub error_to_render: Option<Value>,

    /// Catch-all path segments matched by a splat route.
    pub splat_segments: Vec<String>,

    /// Dynamic path parameters.
    pub params: BTreeMap<String, String>,

    /// Result of the most recent submission, if any.
    pub action_data: Option<Value>,

    /// Document title for the target location.
    pub new_title: String,

    /// Desired head elements for the target location.
    pub head: Vec<HeadElement>,

    /// Identifier of the client bundle the server is serving.
    pub build_id: String,
}

impl NavigationResponse {
    /// Zip `active_paths` and `active_data` into a route chain.
    pub fn chain(&self) -> Result<RouteChain, NavigationError> {
        RouteChain::from_parts(self.active_paths.clone(), self.active_data.clone())
    }
}

// ============================================================================
// POST payload
// ============================================================================

/// Reduced payload for a `POST` submission. Submissions never change the
/// chain, head, or history — only the action result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubmitResponse {
    /// Result of the submitted action.
    pub action_data: Option<Value>,
}

// ============================================================================
// Tests
// ============================================================================
