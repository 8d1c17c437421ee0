//! Queries: named operations that read state and return a value.
//!
//! Like commands, queries run inside the wait loop and re-resolve their
//! target on every attempt. Reads require existence only (a hidden element
//! can still answer `text()`), which is why queries carry no visibility
//! check.

use std::sync::Arc;

use crate::collection::Collection;
use crate::element::Element;
use crate::result::EsperarResult;
use crate::wait::WaitTask;

/// A named read over a target of type `T`, producing an `R`
pub struct Query<T: ?Sized, R> {
    description: String,
    read: Arc<dyn Fn(&T) -> EsperarResult<R> + Send + Sync>,
}

impl<T: ?Sized, R> Query<T, R> {
    /// Create a query from a description and a read function
    pub fn new(
        description: impl Into<String>,
        read: impl Fn(&T) -> EsperarResult<R> + Send + Sync + 'static,
    ) -> Self {
        Self {
            description: description.into(),
            read: Arc::new(read),
        }
    }

    /// Description used in diagnostics
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Execute the read against the target right now
    pub fn execute(&self, target: &T) -> EsperarResult<R> {
        (self.read)(target)
    }
}

impl<T: ?Sized, R> WaitTask<T> for Query<T, R> {
    type Output = R;

    fn description(&self) -> String {
        self.description.clone()
    }

    fn apply(&self, target: &T) -> EsperarResult<R> {
        self.execute(target)
    }
}

impl<T: ?Sized, R> Clone for Query<T, R> {
    fn clone(&self) -> Self {
        Self {
            description: self.description.clone(),
            read: Arc::clone(&self.read),
        }
    }
}

impl<T: ?Sized, R> std::fmt::Debug for Query<T, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// ELEMENT QUERY CATALOG
// =============================================================================

/// The element's visible text
#[must_use]
pub fn text() -> Query<Element, String> {
    Query::new("text", |element: &Element| {
        let node = element.locate()?;
        element
            .driver()?
            .text(&node)
            .map_err(|e| element.wrap_driver_error(e))
    })
}

/// An attribute value, `None` when the attribute is absent
#[must_use]
pub fn attribute(name: impl Into<String>) -> Query<Element, Option<String>> {
    let name = name.into();
    Query::new(format!("attribute '{name}'"), move |element: &Element| {
        let node = element.locate()?;
        element
            .driver()?
            .attribute(&node, &name)
            .map_err(|e| element.wrap_driver_error(e))
    })
}

/// The `value` attribute
#[must_use]
pub fn value() -> Query<Element, Option<String>> {
    attribute("value")
}

/// Whether the element currently reports itself as displayed
#[must_use]
pub fn is_displayed() -> Query<Element, bool> {
    Query::new("is displayed", |element: &Element| {
        let node = element.locate()?;
        element
            .driver()?
            .is_displayed(&node)
            .map_err(|e| element.wrap_driver_error(e))
    })
}

// =============================================================================
// COLLECTION QUERY CATALOG
// =============================================================================

/// Number of nodes the collection resolves to at this instant
#[must_use]
pub fn size() -> Query<Collection, usize> {
    Query::new("size", |collection: &Collection| {
        Ok(collection.locate()?.len())
    })
}

/// Visible texts of all resolved nodes, in document order
#[must_use]
pub fn texts() -> Query<Collection, Vec<String>> {
    Query::new("texts", |collection: &Collection| {
        let driver = collection.config().driver()?;
        collection
            .locate()?
            .iter()
            .map(|node| {
                driver
                    .text(node)
                    .map_err(|e| collection.wrap_driver_error(e))
            })
            .collect()
    })
}
