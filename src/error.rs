//! Error handling for the navigation engine.
//!
//! This module defines what a navigation cycle can report:
//!
//! - [`NavigationError`] — a detailed failure variant (transport failure,
//!   component module load failure, stale client bundle, malformed payload,
//!   or a superseded cycle).
//! - [`NavigationOutcome`] — the top-level result of a `navigate`/`submit`
//!   call. Errors never escape the engine as panics or thrown values; a
//!   failed cycle leaves the committed view untouched and reports here.
//!
//! Aborted cycles are deliberately *not* user-visible failures: starting a
//! new navigation cancels the previous one, and the cancelled cycle's
//! eventual resolution is discarded in silence.
//!
//! # Examples
//!
//! ```
//! use spa_navigator::error::{NavigationError, NavigationOutcome};
//!
//! let outcome = NavigationOutcome::Completed { href: "/docs".into() };
//! assert!(outcome.is_completed());
//!
//! let err = NavigationError::Network { message: "status 502".into() };
//! assert!(!err.is_aborted());
//! ```

use std::fmt;

// ============================================================================
// NavigationError
// ============================================================================

/// Detailed error variants that can occur during a navigation cycle.
///
/// Implements [`std::error::Error`] and [`Display`](std::fmt::Display) for
/// idiomatic error handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    /// The cycle was superseded (its cancellation token fired). Callers must
    /// treat this as a no-op, not a failure.
    Aborted,

    /// Transport failure or non-success HTTP status.
    Network { message: String },

    /// A replaced position's component module failed to load. Fatal to the
    /// cycle; the previously active view stays mounted.
    ComponentLoad { import_key: String, message: String },

    /// The response was produced by a different client bundle than the one
    /// currently running. Stale modules cannot be hot-swapped; the engine
    /// falls back to a full document load.
    BuildMismatch { current: String, received: String },

    /// The navigation payload could not be decoded into the expected shape.
    Deserialize { message: String },
}

impl NavigationError {
    /// Whether this error represents a superseded cycle rather than a real
    /// failure.
    pub fn is_aborted(&self) -> bool {
        matches!(self, NavigationError::Aborted)
    }
}

impl fmt::Display for NavigationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationError::Aborted => {
                write!(f, "navigation superseded")
            }
            NavigationError::Network { message } => {
                write!(f, "navigation fetch failed: {}", message)
            }
            NavigationError::ComponentLoad {
                import_key,
                message,
            } => {
                write!(f, "failed to load module '{}': {}", import_key, message)
            }
            NavigationError::BuildMismatch { current, received } => {
                write!(
                    f,
                    "stale client bundle: running '{}', server responded with '{}'",
                    current, received
                )
            }
            NavigationError::Deserialize { message } => {
                write!(f, "malformed navigation payload: {}", message)
            }
        }
    }
}

impl std::error::Error for NavigationError {}

// ============================================================================
// NavigationOutcome
// ============================================================================

/// Outcome of a `navigate` or `submit` call.
///
/// Every navigation cycle resolves to exactly one of these. `Aborted` and
/// `Failed` both leave the committed view unchanged; the difference is that
/// `Aborted` is silent while `Failed` has been logged to the error channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// The cycle committed and the view now reflects `href`.
    Completed { href: String },

    /// The cycle was superseded by a newer navigation and discarded.
    Aborted,

    /// The cycle failed; the previously active view is untouched.
    Failed(NavigationError),

    /// A build-ID mismatch was detected and a full document load of `href`
    /// was requested instead of an in-place commit.
    HardReload { href: String },
}

impl NavigationOutcome {
    /// Check if the cycle committed.
    pub fn is_completed(&self) -> bool {
        matches!(self, NavigationOutcome::Completed { .. })
    }

    /// Check if the cycle was silently discarded.
    pub fn is_aborted(&self) -> bool {
        matches!(self, NavigationOutcome::Aborted)
    }

    /// Check if the cycle failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, NavigationOutcome::Failed(_))
    }

    /// Check if the cycle escalated to a full document load.
    pub fn is_hard_reload(&self) -> bool {
        matches!(self, NavigationOutcome::HardReload { .. })
    }

    /// The underlying error, if the cycle failed.
    pub fn error(&self) -> Option<&NavigationError> {
        match self {
            NavigationOutcome::Failed(err) => Some(err),
            _ => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
