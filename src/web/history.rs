//! `window.history` / `window.location` backed [`HistoryApi`].

use crate::history::HistoryApi;
use wasm_bindgen::JsValue;

/// Session-history boundary over the real browser APIs.
///
/// History writes are best-effort: a browser refusing `pushState` (rate
/// limits, sandboxed frames) must not fail a navigation whose state is
/// already committed, so refusals are logged and swallowed.
pub struct WebHistory;

impl HistoryApi for WebHistory {
    fn current_href(&self) -> String {
        web_sys::window()
            .and_then(|w| w.location().href().ok())
            .unwrap_or_default()
    }

    fn push(&self, href: &str) {
        let Some(history) = web_sys::window().and_then(|w| w.history().ok()) else {
            return;
        };
        if history
            .push_state_with_url(&JsValue::NULL, "", Some(href))
            .is_err()
        {
            crate::warn_log!("history.pushState refused for '{}'", href);
        }
    }

    fn replace(&self, href: &str) {
        let Some(history) = web_sys::window().and_then(|w| w.history().ok()) else {
            return;
        };
        if history
            .replace_state_with_url(&JsValue::NULL, "", Some(href))
            .is_err()
        {
            crate::warn_log!("history.replaceState refused for '{}'", href);
        }
    }

    fn hard_load(&self, href: &str) {
        if let Some(window) = web_sys::window() {
            if window.location().set_href(href).is_err() {
                crate::error_log!("hard load of '{}' refused by the browser", href);
            }
        }
    }
}
