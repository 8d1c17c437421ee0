//! Immutable per-scope configuration.
//!
//! A [`Config`] is created once per session and read by every wait. It is
//! never mutated in place: the `with_*` builders consume a value (clone the
//! original first for a scoped override), so a derived view can shorten the
//! timeout for one call without affecting the shared configuration used
//! elsewhere.
//!
//! The config also carries the session's capabilities: the driver supplier
//! (the core asks for "the current transport" each time instead of holding
//! one, so a session can swap tabs/windows without rebuilding entities) and
//! the optional hooks invoked around waiting.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::driver::Driver;
use crate::result::{ErrorKind, EsperarError, EsperarResult, WaitFailure};

/// Default wait timeout (4 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 4_000;

/// Default polling interval (100ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Supplier of the current driving transport
pub type DriverSupplier = Arc<dyn Fn() -> Arc<dyn Driver> + Send + Sync>;

/// Hook invoked when a wait starts, with (target description, task description)
pub type WaitStartHook = Arc<dyn Fn(&str, &str) + Send + Sync>;

/// Hook invoked when a wait times out, with the full failure report
pub type WaitFailureHook = Arc<dyn Fn(&WaitFailure) + Send + Sync>;

// =============================================================================
// TEXT MATCH POLICY
// =============================================================================

/// How text-based conditions compare observed text against the criterion.
///
/// Case-sensitive with no whitespace normalization by default; both knobs
/// are configurable because real pages disagree on rendering details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextMatchPolicy {
    /// Compare respecting character case
    pub case_sensitive: bool,
    /// Collapse runs of whitespace to single spaces and trim before comparing
    pub normalize_whitespace: bool,
}

impl Default for TextMatchPolicy {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            normalize_whitespace: false,
        }
    }
}

impl TextMatchPolicy {
    /// Apply the policy to a text, producing the comparable form
    #[must_use]
    pub fn canonical(&self, text: &str) -> String {
        let text = if self.normalize_whitespace {
            text.split_whitespace().collect::<Vec<_>>().join(" ")
        } else {
            text.to_string()
        };
        if self.case_sensitive {
            text
        } else {
            text.to_lowercase()
        }
    }
}

// =============================================================================
// CONFIG
// =============================================================================

/// Immutable settings bag for a session or scope
#[derive(Clone)]
pub struct Config {
    timeout: Duration,
    poll_interval: Duration,
    base_url: String,
    ignored: HashSet<ErrorKind>,
    text_match: TextMatchPolicy,
    save_screenshot_on_failure: bool,
    save_page_source_on_failure: bool,
    driver_supplier: Option<DriverSupplier>,
    on_wait_start: Option<WaitStartHook>,
    on_wait_failure: Option<WaitFailureHook>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            base_url: String::new(),
            ignored: HashSet::from([
                ErrorKind::NotFound,
                ErrorKind::Stale,
                ErrorKind::NotInteractable,
                ErrorKind::ConditionMismatch,
            ]),
            text_match: TextMatchPolicy::default(),
            save_screenshot_on_failure: true,
            save_page_source_on_failure: true,
            driver_supplier: None,
            on_wait_start: None,
            on_wait_failure: None,
        }
    }
}

impl Config {
    /// Create a configuration with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Builders (each consumes; clone first for a scoped derivation) --- //

    /// Set the maximum wait duration
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the delay between poll attempts
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Set the base URL that relative `open` urls are joined onto
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Replace the set of error kinds treated as "not yet" during waiting
    #[must_use]
    pub fn with_ignored(mut self, ignored: HashSet<ErrorKind>) -> Self {
        self.ignored = ignored;
        self
    }

    /// Add one error kind to the ignored set
    #[must_use]
    pub fn also_ignoring(mut self, kind: ErrorKind) -> Self {
        self.ignored.insert(kind);
        self
    }

    /// Set the text-match policy used by text conditions
    #[must_use]
    pub fn with_text_match(mut self, policy: TextMatchPolicy) -> Self {
        self.text_match = policy;
        self
    }

    /// Toggle screenshot capture on wait failure
    #[must_use]
    pub fn with_save_screenshot_on_failure(mut self, save: bool) -> Self {
        self.save_screenshot_on_failure = save;
        self
    }

    /// Toggle page-source capture on wait failure
    #[must_use]
    pub fn with_save_page_source_on_failure(mut self, save: bool) -> Self {
        self.save_page_source_on_failure = save;
        self
    }

    /// Install a fixed driving transport
    #[must_use]
    pub fn with_driver(self, driver: Arc<dyn Driver>) -> Self {
        self.with_driver_supplier(Arc::new(move || Arc::clone(&driver)))
    }

    /// Install a supplier that yields the current driving transport.
    ///
    /// The supplier is consulted on every use, so swapping the session's
    /// transport does not require reconstructing lazy entities.
    #[must_use]
    pub fn with_driver_supplier(mut self, supplier: DriverSupplier) -> Self {
        self.driver_supplier = Some(supplier);
        self
    }

    /// Install a hook invoked when a wait starts
    #[must_use]
    pub fn with_on_wait_start(mut self, hook: WaitStartHook) -> Self {
        self.on_wait_start = Some(hook);
        self
    }

    /// Install a hook invoked with the report of a timed-out wait
    #[must_use]
    pub fn with_on_wait_failure(mut self, hook: WaitFailureHook) -> Self {
        self.on_wait_failure = Some(hook);
        self
    }

    // --- Accessors --- //

    /// Maximum wait duration
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Delay between poll attempts
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Base URL for relative navigation
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether `kind` is retried rather than propagated during waiting
    #[must_use]
    pub fn ignores(&self, kind: ErrorKind) -> bool {
        self.ignored.contains(&kind)
    }

    /// Text-match policy for text conditions
    #[must_use]
    pub fn text_match(&self) -> TextMatchPolicy {
        self.text_match
    }

    /// Whether to attach a screenshot to timeout reports
    #[must_use]
    pub fn save_screenshot_on_failure(&self) -> bool {
        self.save_screenshot_on_failure
    }

    /// Whether to attach page markup to timeout reports
    #[must_use]
    pub fn save_page_source_on_failure(&self) -> bool {
        self.save_page_source_on_failure
    }

    /// The current driving transport.
    ///
    /// Resolved through the supplier on every call. Absence of a driver is a
    /// programmer error, raised immediately and never retried.
    pub fn driver(&self) -> EsperarResult<Arc<dyn Driver>> {
        self.driver_supplier
            .as_ref()
            .map(|supplier| supplier())
            .ok_or_else(|| EsperarError::config("no driver installed in this config"))
    }

    pub(crate) fn notify_wait_start(&self, target: &str, task: &str) {
        if let Some(hook) = &self.on_wait_start {
            hook(target, task);
        }
    }

    pub(crate) fn notify_wait_failure(&self, failure: &WaitFailure) {
        if let Some(hook) = &self.on_wait_failure {
            hook(failure);
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("timeout", &self.timeout)
            .field("poll_interval", &self.poll_interval)
            .field("base_url", &self.base_url)
            .field("ignored", &self.ignored)
            .field("text_match", &self.text_match)
            .field("save_screenshot_on_failure", &self.save_screenshot_on_failure)
            .field(
                "save_page_source_on_failure",
                &self.save_page_source_on_failure,
            )
            .field("has_driver", &self.driver_supplier.is_some())
            .finish_non_exhaustive()
    }
}
