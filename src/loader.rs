//! Lazy component-module loading.
//!
//! The engine is agnostic to the rendering library mounted underneath it, so
//! a loaded component is an erased [`Component`] handle; on wasm targets the
//! handle wraps the module's JS export, in tests it wraps whatever the mock
//! loader produces.
//!
//! [`load_replaced`] drives the [`ModuleLoader`] for exactly the positions a
//! chain diff marked replaced. Loads are issued concurrently so one slow
//! module does not serialize the others, but the caller awaits the full set
//! before committing — no partial component list is ever published.

use crate::chain::SegmentDiff;
use crate::error::NavigationError;
use futures::future::{join_all, LocalBoxFuture};
use std::any::Any;
use std::fmt;
use std::rc::Rc;

// ============================================================================
// Component handle
// ============================================================================

/// Erased handle to a mounted component module export.
///
/// Cloning is cheap (reference-counted) and clones share identity:
/// [`same_instance`](Self::same_instance) is true for clones of one handle,
/// which is how tests assert that a reused position kept its instance.
#[derive(Clone)]
pub struct Component {
    inner: Rc<dyn Any>,
}

impl Component {
    /// Wrap an arbitrary value as a component handle.
    pub fn new<T: 'static>(value: T) -> Self {
        Self {
            inner: Rc::new(value),
        }
    }

    /// Borrow the underlying value if it is a `T`.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Whether two handles point at the same underlying instance.
    pub fn same_instance(&self, other: &Component) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component").finish_non_exhaustive()
    }
}

/// The exports the engine cares about in one loaded module: the default
/// component and its optional error-boundary fallback.
#[derive(Debug, Clone)]
pub struct LoadedModule {
    /// The module's default component export.
    pub component: Component,
    /// The module's error-boundary export, if it has one.
    pub error_boundary: Option<Component>,
}

// ============================================================================
// Loader
// ============================================================================

/// Resolves an import key to a loaded component module.
///
/// On wasm this is a dynamic `import()` through the build system's
/// hashed-asset map; in tests it is a mock.
pub trait ModuleLoader {
    /// Load the module behind `import_key`.
    fn load(&self, import_key: String)
        -> LocalBoxFuture<'static, Result<LoadedModule, NavigationError>>;
}

/// Load the modules for every replaced position of `diff`, concurrently.
///
/// Returns one entry per diff position: `Some` for replaced positions,
/// `None` for reused ones (which must be left untouched in the store). Any
/// single failure fails the whole load — the navigation cycle aborts and the
/// previously active view stays mounted.
pub async fn load_replaced(
    loader: &Rc<dyn ModuleLoader>,
    diff: &[SegmentDiff],
) -> Result<Vec<Option<LoadedModule>>, NavigationError> {
    let mut pending = Vec::new();
    for (index, entry) in diff.iter().enumerate() {
        if entry.is_replaced() {
            crate::trace_log!("loading module '{}' for position {}", entry.import_key, index);
            pending.push((index, loader.load(entry.import_key.clone())));
        }
    }

    let mut loaded: Vec<Option<LoadedModule>> = vec![None; diff.len()];
    let indices: Vec<usize> = pending.iter().map(|(i, _)| *i).collect();
    let results = join_all(pending.into_iter().map(|(_, fut)| fut)).await;
    for (index, result) in indices.into_iter().zip(results) {
        loaded[index] = Some(result?);
    }
    Ok(loaded)
}

// ============================================================================
// Tests
// ============================================================================
