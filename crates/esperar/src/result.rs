//! Result and error types for Esperar.
//!
//! The error taxonomy follows the waiting protocol:
//!
//! - **Transient** kinds (`NotFound`, `Stale`, `NotInteractable`,
//!   `ConditionMismatch`) surface only as retry triggers inside the wait
//!   loop and are never visible to the caller unless the deadline elapses.
//! - **Terminal** kinds (`Timeout`, `Config`, `Transport`) propagate on
//!   first occurrence.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Result type for Esperar operations
pub type EsperarResult<T> = Result<T, EsperarError>;

// =============================================================================
// ERROR KIND
// =============================================================================

/// Classification of a failure, used by the retry policy.
///
/// The driving transport reports `NotFound`, `Stale`, `NotInteractable`
/// and `Transport`; the core itself produces the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// No node matched the locating strategy at this instant
    NotFound,
    /// A previously valid node handle was invalidated by a DOM re-render
    Stale,
    /// The node exists but cannot currently receive the interaction
    NotInteractable,
    /// A condition predicate observed state that does not meet the criterion
    ConditionMismatch,
    /// A wait deadline elapsed
    Timeout,
    /// Invalid settings or misuse of the library (programmer error)
    Config,
    /// Unexpected fault in the driving transport
    Transport,
}

impl ErrorKind {
    /// Whether this kind is retried by default during waiting.
    ///
    /// Negated conditions also use this classification to decide which
    /// predicate failures count as "criterion not met" (and therefore as
    /// success for the negation).
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::NotFound | Self::Stale | Self::NotInteractable | Self::ConditionMismatch
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::NotFound => "not found",
            Self::Stale => "stale reference",
            Self::NotInteractable => "not interactable",
            Self::ConditionMismatch => "condition mismatch",
            Self::Timeout => "timeout",
            Self::Config => "configuration",
            Self::Transport => "transport",
        };
        write!(f, "{name}")
    }
}

// =============================================================================
// DRIVER ERROR
// =============================================================================

/// Failure reported by the driving transport.
///
/// The `kind` must be distinguishable so the wait loop can tell "not yet"
/// apart from fatal faults.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct DriverError {
    /// Failure classification
    pub kind: ErrorKind,
    /// Human-readable detail
    pub message: String,
}

impl DriverError {
    /// Create a "no node matched" failure
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::NotFound,
            message: message.into(),
        }
    }

    /// Create a stale-reference failure
    #[must_use]
    pub fn stale(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Stale,
            message: message.into(),
        }
    }

    /// Create a not-interactable failure
    #[must_use]
    pub fn not_interactable(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::NotInteractable,
            message: message.into(),
        }
    }

    /// Create an unexpected transport fault (never retried)
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Transport,
            message: message.into(),
        }
    }
}

// =============================================================================
// WAIT FAILURE REPORT
// =============================================================================

/// Self-describing report carried by a timed-out wait.
///
/// The textual rendering is the primary debugging artifact: condition,
/// locator, and last observed state must let a reader diagnose the failure
/// without re-running the test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitFailure {
    /// Description of the condition (or command/query) that was waited for
    pub condition: String,
    /// Description of the locator the wait was bound to
    pub locator: String,
    /// Wall time spent before giving up, in milliseconds
    pub elapsed_ms: u64,
    /// Last observed diagnostic (expected vs. actual, or "not found")
    pub diagnostic: String,
    /// PNG screenshot captured at failure time, base64-encoded
    pub screenshot_base64: Option<String>,
    /// Serialized page markup captured at failure time
    pub page_source: Option<String>,
}

impl WaitFailure {
    /// Serialize the report as pretty JSON, for reporters and hooks.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl std::fmt::Display for WaitFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Timed out after {}ms waiting for {} to {}\n\nReason: {}",
            self.elapsed_ms, self.locator, self.condition, self.diagnostic
        )?;
        if self.screenshot_base64.is_some() {
            write!(f, "\nScreenshot: attached (base64 PNG)")?;
        }
        if self.page_source.is_some() {
            write!(f, "\nPage source: attached")?;
        }
        Ok(())
    }
}

// =============================================================================
// ESPERAR ERROR
// =============================================================================

/// Errors that can occur in Esperar
#[derive(Debug, Error)]
pub enum EsperarError {
    /// A condition observed state that does not meet its criterion.
    ///
    /// Transient: visible to callers only when a wait deadline elapses,
    /// in which case it becomes the timeout's diagnostic.
    #[error("expected {expected}, actual: {actual}")]
    ConditionMismatch {
        /// The criterion that was expected to hold
        expected: String,
        /// The actually observed state
        actual: String,
    },

    /// A wait deadline elapsed
    #[error("{failure}")]
    Timeout {
        /// Full failure report (condition, locator, diagnostic, attachments)
        failure: Box<WaitFailure>,
        /// Last underlying error observed before the deadline, if any
        #[source]
        cause: Option<Box<EsperarError>>,
    },

    /// Invalid settings or misuse (e.g. no driver installed in the config)
    #[error("configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Failure from the driving transport, wrapped with locator context
    #[error("{source} (while handling {locator})")]
    Driver {
        /// Description of the locator being handled
        locator: String,
        /// The underlying transport failure
        #[source]
        source: DriverError,
    },
}

impl EsperarError {
    /// Build a condition-mismatch failure
    #[must_use]
    pub fn mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::ConditionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Build a configuration (programmer) error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Wrap a transport failure with the locator it occurred under
    #[must_use]
    pub fn driver(locator: impl Into<String>, source: DriverError) -> Self {
        Self::Driver {
            locator: locator.into(),
            source,
        }
    }

    /// Classification of this error for the retry policy
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConditionMismatch { .. } => ErrorKind::ConditionMismatch,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Config { .. } => ErrorKind::Config,
            Self::Driver { source, .. } => source.kind,
        }
    }

    /// The timeout report, when this error is a timeout
    #[must_use]
    pub fn wait_failure(&self) -> Option<&WaitFailure> {
        match self {
            Self::Timeout { failure, .. } => Some(failure),
            _ => None,
        }
    }

    pub(crate) fn timeout(failure: WaitFailure, cause: Option<EsperarError>) -> Self {
        Self::Timeout {
            failure: Box::new(failure),
            cause: cause.map(Box::new),
        }
    }
}

/// Helper to render a `Duration` as whole milliseconds for reports
#[must_use]
pub(crate) fn duration_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
