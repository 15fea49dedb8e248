//! Route chains and the positional differ.
//!
//! A [`RouteChain`] is the ordered list of nested route layers matched by a
//! location, root layout first. Each [`Segment`] owns the opaque *import
//! key* that resolves to its component module and the loader payload the
//! server produced for that layer.
//!
//! [`diff_chains`] compares the chain that is currently mounted against the
//! chain a navigation response describes, and classifies every position of
//! the *new* chain as either reused or replaced. The comparison is purely
//! positional and judges each index independently:
//!
//! ```text
//! old: [root, posts, post_detail]
//! new: [root, docs,  post_detail]
//!       ^0 reused  ^1 replaced  ^2 reused
//! ```
//!
//! Position 2 is reused even though position 1 changed — non-contiguous
//! reuse is legal. Loader payloads never influence classification; a data
//! change at an identical import key is a data update, not a module reload.

use crate::error::NavigationError;
use serde_json::Value;

// ============================================================================
// Segments
// ============================================================================

/// One layer of a route chain: a loadable component module plus the loader
/// payload the server rendered for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Opaque key resolving to a loadable component module.
    pub import_key: String,
    /// Arbitrary JSON produced by this layer's server loader.
    pub data: Value,
}

impl Segment {
    /// Create a segment with a `null` loader payload.
    pub fn new(import_key: impl Into<String>) -> Self {
        Self {
            import_key: import_key.into(),
            data: Value::Null,
        }
    }

    /// Attach a loader payload.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }
}

/// Ordered sequence of segments, root layout first.
///
/// Positions are contiguous from 0; index 0 is always the root layout. The
/// length may differ between navigations as routes nest deeper or shallower.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteChain {
    segments: Vec<Segment>,
}

impl RouteChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Build a chain by zipping parallel import-key and loader-payload lists
    /// as they arrive on the wire.
    ///
    /// The two lists must be the same length; a mismatch means the payload
    /// is malformed.
    pub fn from_parts(
        import_keys: Vec<String>,
        data: Vec<Value>,
    ) -> Result<Self, NavigationError> {
        if import_keys.len() != data.len() {
            return Err(NavigationError::Deserialize {
                message: format!(
                    "chain has {} import keys but {} loader payloads",
                    import_keys.len(),
                    data.len()
                ),
            });
        }
        Ok(Self {
            segments: import_keys
                .into_iter()
                .zip(data)
                .map(|(import_key, data)| Segment { import_key, data })
                .collect(),
        })
    }

    /// Number of layers in the chain.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if no layers are mounted.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segment at `index`, if within bounds.
    pub fn get(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    /// All segments, root first.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Import keys in positional order.
    pub fn import_keys(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(|s| s.import_key.as_str())
    }

    /// Copy of the chain limited to its first `len` layers.
    pub fn truncated(&self, len: usize) -> RouteChain {
        self.segments.iter().take(len).cloned().collect()
    }
}

impl FromIterator<Segment> for RouteChain {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

// ============================================================================
// Differ
// ============================================================================

/// How one position of the incoming chain relates to the mounted chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentClassification {
    /// Same import key at the same index — the mounted component module is
    /// kept; only its loader data updates.
    Reused,
    /// Different import key, or the index is new — the component module at
    /// this position must be loaded.
    Replaced,
}

/// Classification of a single position of the incoming chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentDiff {
    /// Import key at this position in the *new* chain.
    pub import_key: String,
    /// Whether the mounted module at this index survives.
    pub classification: SegmentClassification,
}

impl SegmentDiff {
    /// Check if this position keeps its mounted module.
    pub fn is_reused(&self) -> bool {
        self.classification == SegmentClassification::Reused
    }

    /// Check if this position needs a module load.
    pub fn is_replaced(&self) -> bool {
        self.classification == SegmentClassification::Replaced
    }
}

/// Classify every position of `new` against `old`.
///
/// Position `i` is [`Reused`](SegmentClassification::Reused) iff both chains
/// have an entry at `i` with equal import keys. Positions past the end of
/// `new` are dropped entirely (the chain shrank), so the result always has
/// exactly `new.len()` entries, index-aligned with `new`.
pub fn diff_chains(old: &RouteChain, new: &RouteChain) -> Vec<SegmentDiff> {
    let mut diff = Vec::with_capacity(new.len());
    for (i, segment) in new.segments().iter().enumerate() {
        let reused = old
            .get(i)
            .is_some_and(|prev| prev.import_key == segment.import_key);
        diff.push(SegmentDiff {
            import_key: segment.import_key.clone(),
            classification: if reused {
                SegmentClassification::Reused
            } else {
                SegmentClassification::Replaced
            },
        });
    }
    trace_log_diff(old, new, &diff);
    diff
}

fn trace_log_diff(old: &RouteChain, new: &RouteChain, diff: &[SegmentDiff]) {
    let reused = diff.iter().filter(|d| d.is_reused()).count();
    crate::debug_log!(
        "chain diff: {} -> {} layers, {} reused, {} replaced",
        old.len(),
        new.len(),
        reused,
        diff.len() - reused
    );
}

// ============================================================================
// Tests
// ============================================================================
