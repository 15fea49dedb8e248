//! Logging abstraction layer.
//!
//! The engine never talks to a logging backend directly. All diagnostics go
//! through the macros below, which dispatch to either the
//! [`log`](https://docs.rs/log) or [`tracing`](https://docs.rs/tracing) crate
//! depending on the enabled feature. The two features are **mutually
//! exclusive** — enable at most one (`log` is on by default).
//!
//! On wasm32 targets the chosen backend is typically bridged to
//! `console.log` by the host application (e.g. via `console_log` or
//! `tracing-wasm`); the engine itself stays backend-agnostic.
//!
//! ```ignore
//! use spa_navigator::{debug_log, error_log};
//!
//! debug_log!("navigating to '{}'", href);
//! error_log!("component load failed: {}", err);
//! ```

/// Emit a **trace**-level diagnostic. `format!`-style arguments.
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::trace!($($arg)*);
        #[cfg(feature = "log")]
        ::log::trace!($($arg)*);
    };
}

/// Emit a **debug**-level diagnostic. `format!`-style arguments.
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::debug!($($arg)*);
        #[cfg(feature = "log")]
        ::log::debug!($($arg)*);
    };
}

/// Emit an **info**-level diagnostic. `format!`-style arguments.
#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::info!($($arg)*);
        #[cfg(feature = "log")]
        ::log::info!($($arg)*);
    };
}

/// Emit a **warn**-level diagnostic. `format!`-style arguments.
#[macro_export]
macro_rules! warn_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::warn!($($arg)*);
        #[cfg(feature = "log")]
        ::log::warn!($($arg)*);
    };
}

/// Emit an **error**-level diagnostic. `format!`-style arguments.
#[macro_export]
macro_rules! error_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::error!($($arg)*);
        #[cfg(feature = "log")]
        ::log::error!($($arg)*);
    };
}
