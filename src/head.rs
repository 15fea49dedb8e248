//! Document head patching.
//!
//! A navigation response carries the desired `<head>` contents as a list of
//! declarative [`HeadElement`] descriptors. The [`HeadPatcher`] sanitizes
//! that list (permitted tags only, duplicates dropped) and hands it to an
//! external DOM-morphing primitive through the [`HeadMorph`] trait.
//!
//! The morphing primitive is *supplied*, not implemented here. Its contract:
//! given the live head node and the desired end state, converge the former
//! to the latter with minimal mutation — unchanged nodes must be preserved
//! as-is (re-inserting an identical `<script>` or `<style>` would re-execute
//! it), stale nodes removed, new nodes inserted. Applying the same
//! descriptor set twice must produce no further mutation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::rc::Rc;

/// Tags a head descriptor may carry; anything else is discarded before
/// morphing.
pub const PERMITTED_TAGS: [&str; 6] = ["meta", "base", "link", "style", "script", "noscript"];

// ============================================================================
// Descriptors
// ============================================================================

/// Declarative description of one head element.
///
/// Mirrors the server's head-block shape: a tag name plus an attribute map.
/// Text-bearing blocks (the document title) travel separately in the
/// navigation response and never reach the morpher.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadElement {
    /// Element tag name (`meta`, `link`, …).
    #[serde(default)]
    pub tag: String,

    /// Attribute name/value pairs. Ordered map so equality and the morph
    /// target are deterministic regardless of server-side serialization
    /// order.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,

    /// Inline text content, if any (title-style blocks).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl HeadElement {
    /// Create a descriptor for `tag` with no attributes.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            title: None,
        }
    }

    /// Add an attribute.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Whether this element's tag is permitted in a morph target.
    pub fn is_permitted(&self) -> bool {
        PERMITTED_TAGS.contains(&self.tag.as_str())
    }
}

/// Drop descriptors with unpermitted tags and collapse duplicates.
///
/// First occurrence wins, matching the server-side dedupe rule; running it
/// again client-side keeps the morph target canonical even across server
/// version skew.
pub fn sanitize_head(elements: &[HeadElement]) -> Vec<HeadElement> {
    let mut seen: Vec<&HeadElement> = Vec::new();
    let mut out = Vec::with_capacity(elements.len());
    for element in elements {
        if !element.is_permitted() {
            crate::warn_log!("dropping head element with unpermitted tag '{}'", element.tag);
            continue;
        }
        if seen.contains(&element) {
            continue;
        }
        seen.push(element);
        out.push(element.clone());
    }
    out
}

// ============================================================================
// Patcher
// ============================================================================

/// Contract with the external DOM-morphing primitive.
///
/// Implementations receive the desired end state and must converge the live
/// document metadata to match it. See the module docs for the full contract
/// (minimal mutation, idempotence, side-effect preservation for identical
/// nodes).
pub trait HeadMorph {
    /// Set the document title.
    fn set_title(&self, title: &str);

    /// Converge the live `<head>` children to `desired`.
    fn morph_head(&self, desired: &[HeadElement]);
}

/// Applies navigation-response metadata to the live document head.
#[derive(Clone)]
pub struct HeadPatcher {
    morph: Rc<dyn HeadMorph>,
}

impl HeadPatcher {
    /// Create a patcher backed by the given morphing primitive.
    pub fn new(morph: Rc<dyn HeadMorph>) -> Self {
        Self { morph }
    }

    /// Update the title and morph the head to the sanitized descriptor list.
    pub fn apply(&self, title: &str, elements: &[HeadElement]) {
        self.morph.set_title(title);
        let desired = sanitize_head(elements);
        crate::trace_log!(
            "morphing head: {} descriptors ({} after sanitize)",
            elements.len(),
            desired.len()
        );
        self.morph.morph_head(&desired);
    }
}

// ============================================================================
// Tests
// ============================================================================
