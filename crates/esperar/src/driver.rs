//! Abstract browser-driving transport.
//!
//! The core never implements browser control itself; it consumes this trait
//! boundary. A transport must be able to find raw DOM nodes by a locating
//! strategy, execute actions against a node, read state from a node, and
//! report failures with distinguishable kinds ("not found", "stale
//! reference", "not interactable") so the wait loop can tell "not yet"
//! apart from fatal faults.

use serde::{Deserialize, Serialize};

use crate::locator::Selector;
use crate::result::DriverError;

/// Result type for transport calls
pub type DriverResult<T> = Result<T, DriverError>;

/// Opaque handle to a DOM node.
///
/// Handles are only ever used within the poll attempt that resolved them;
/// the core never stores one across attempts, because a DOM re-render can
/// invalidate it at any time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeHandle {
    /// Transport-scoped node identifier
    pub id: String,
}

impl NodeHandle {
    /// Create a new node handle
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Abstract driving transport consumed by the core.
///
/// All operations are synchronous blocking calls; the single suspension
/// point of the library is the wait loop's sleep, never the transport.
pub trait Driver: Send + Sync {
    /// Find all nodes matching `selector`, in document order, relative to
    /// `scope` (or the document root when `scope` is `None`).
    ///
    /// An empty result is a valid answer, not an error; `Err` is reserved
    /// for transport faults and stale scope handles.
    fn find_all(&self, selector: &Selector, scope: Option<&NodeHandle>)
        -> DriverResult<Vec<NodeHandle>>;

    /// Click the node
    fn click(&self, node: &NodeHandle) -> DriverResult<()>;

    /// Append keystrokes to the node's current value
    fn type_text(&self, node: &NodeHandle, text: &str) -> DriverResult<()>;

    /// Clear the node's value, then type `text`
    fn set_value(&self, node: &NodeHandle, text: &str) -> DriverResult<()>;

    /// Clear the node's value
    fn clear(&self, node: &NodeHandle) -> DriverResult<()>;

    /// Read the node's visible text
    fn text(&self, node: &NodeHandle) -> DriverResult<String>;

    /// Read an attribute value (`None` when the attribute is absent)
    fn attribute(&self, node: &NodeHandle, name: &str) -> DriverResult<Option<String>>;

    /// Whether the node reports itself as rendered/displayed
    fn is_displayed(&self, node: &NodeHandle) -> DriverResult<bool>;

    /// Navigate the session to `url`
    fn goto(&self, url: &str) -> DriverResult<()>;

    /// Serialized markup of the current page
    fn page_source(&self) -> DriverResult<String>;

    /// PNG screenshot of the current page
    fn screenshot(&self) -> DriverResult<Vec<u8>>;
}

impl std::fmt::Debug for dyn Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Driver")
    }
}
