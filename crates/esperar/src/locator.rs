//! Lazy locators: deferred descriptions of "how to find node(s) now".
//!
//! A [`Locator`] pairs a human-readable description (used in diagnostics)
//! with a resolution strategy that re-queries the live DOM on every call.
//! Constructing a locator never touches the browser; only [`Locator::resolve`]
//! does. A locator never caches a resolved node between calls, which is what
//! turns "stale element" bugs into one more retried poll tick.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::result::EsperarResult;

// =============================================================================
// SELECTOR
// =============================================================================

/// Locating strategy understood by the driving transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selector {
    /// CSS selector (e.g. "button.primary")
    Css(String),
    /// XPath selector
    XPath(String),
    /// Visible text content selector
    Text(String),
    /// Test ID selector (data-testid attribute)
    TestId(String),
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create an XPath selector
    #[must_use]
    pub fn xpath(selector: impl Into<String>) -> Self {
        Self::XPath(selector.into())
    }

    /// Create a text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create a test ID selector
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId(id.into())
    }
}

impl From<&str> for Selector {
    fn from(selector: &str) -> Self {
        Self::Css(selector.to_string())
    }
}

impl From<String> for Selector {
    fn from(selector: String) -> Self {
        Self::Css(selector)
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css:{s}"),
            Self::XPath(s) => write!(f, "xpath:{s}"),
            Self::Text(s) => write!(f, "text:{s}"),
            Self::TestId(s) => write!(f, "testid:{s}"),
        }
    }
}

// =============================================================================
// LOCATOR
// =============================================================================

/// A deferred description of how to resolve a target of type `T`.
///
/// `T` is a single node handle for elements and a sequence of handles for
/// collections. Derived locators (child-of, nth-of, filtered) capture their
/// parent locator and re-resolve it fresh inside their own strategy, so a
/// DOM re-render invalidates no cached state anywhere in the chain.
pub struct Locator<T> {
    description: String,
    resolve: Arc<dyn Fn() -> EsperarResult<T> + Send + Sync>,
}

impl<T> Locator<T> {
    /// Create a locator from a description and a resolution strategy.
    ///
    /// The strategy must be a pure function of the current browser state:
    /// it is invoked fresh on every [`resolve`](Self::resolve) call and its
    /// result is never stored.
    pub fn new(
        description: impl Into<String>,
        resolve: impl Fn() -> EsperarResult<T> + Send + Sync + 'static,
    ) -> Self {
        Self {
            description: description.into(),
            resolve: Arc::new(resolve),
        }
    }

    /// Re-query the live DOM for the target right now.
    pub fn resolve(&self) -> EsperarResult<T> {
        (self.resolve)()
    }

    /// Human-readable description, used in diagnostics and for entity identity
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl<T> Clone for Locator<T> {
    fn clone(&self) -> Self {
        Self {
            description: self.description.clone(),
            resolve: Arc::clone(&self.resolve),
        }
    }
}

impl<T> std::fmt::Debug for Locator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Locator")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl<T> std::fmt::Display for Locator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description)
    }
}
