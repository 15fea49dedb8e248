//! Browser history boundary.
//!
//! The controller decides *what* to do with history (push a new entry,
//! replace the current one, or bypass the SPA path entirely); this trait is
//! *how*. On wasm it wraps `window.history` / `window.location`; tests plug
//! in a recording mock.

/// Browser history and location, at the interface boundary.
pub trait HistoryApi {
    /// The location the browser currently shows.
    fn current_href(&self) -> String;

    /// Push a new history entry for `href`.
    fn push(&self, href: &str);

    /// Replace the current history entry with `href`.
    fn replace(&self, href: &str);

    /// Perform a full (non-SPA) document load of `href`. Used when the
    /// running client bundle is stale and modules cannot be hot-swapped.
    fn hard_load(&self, href: &str);
}
