//! Lazy ordered-collection entity.
//!
//! A [`Collection`] is the plural counterpart of
//! [`Element`](crate::element::Element): a locator plus a configuration,
//! resolving to zero or more nodes at the instant of use. Derivations
//! (`nth`, `filtered_by`, `element_by`) apply to the sequence *as resolved
//! at that instant*; if the live count shrinks below a requested index, the
//! derivation resolves to nothing for that tick and the wait loop retries.

use crate::condition::Condition;
use crate::config::Config;
use crate::driver::NodeHandle;
use crate::element::Element;
use crate::locator::{Locator, Selector};
use crate::query;
use crate::query::Query;
use crate::result::{DriverError, EsperarError, EsperarResult};
use crate::wait::Waiter;

/// Build a locator that finds every node matching `selector`, in document
/// order, under `parent` (or the document root). An empty match is a valid
/// resolution, not an error.
pub(crate) fn find_every(
    description: String,
    parent: Option<Locator<NodeHandle>>,
    selector: Selector,
    config: &Config,
) -> Locator<Vec<NodeHandle>> {
    let config = config.clone();
    let context = description.clone();
    Locator::new(description, move || {
        let scope = match &parent {
            Some(parent) => Some(parent.resolve()?),
            None => None,
        };
        let driver = config.driver()?;
        driver
            .find_all(&selector, scope.as_ref())
            .map_err(|e| EsperarError::driver(context.clone(), e))
    })
}

/// A lazy proxy for an ordered, possibly-empty sequence of DOM nodes
#[derive(Clone)]
pub struct Collection {
    locator: Locator<Vec<NodeHandle>>,
    config: Config,
}

impl Collection {
    /// Create a collection from a locator and a configuration
    #[must_use]
    pub fn new(locator: Locator<Vec<NodeHandle>>, config: Config) -> Self {
        Self { locator, config }
    }

    /// Locator description, the collection's identity
    #[must_use]
    pub fn description(&self) -> &str {
        self.locator.description()
    }

    /// The configuration this collection reads
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Derive a collection with a per-call timeout override
    #[must_use]
    pub fn with_timeout(&self, timeout: std::time::Duration) -> Self {
        Self {
            locator: self.locator.clone(),
            config: self.config.clone().with_timeout(timeout),
        }
    }

    // --- Derivations (no browser interaction) --- //

    /// The element at `index` of the sequence as resolved at use time.
    ///
    /// If the live sequence is shorter than `index + 1` at some tick,
    /// resolution yields a transient not-found failure for that tick; the
    /// wait loop retries rather than raising an out-of-range error.
    #[must_use]
    pub fn nth(&self, index: usize) -> Element {
        let parent = self.locator.clone();
        let description = format!("{parent}[{index}]");
        let context = description.clone();
        Element::new(
            Locator::new(description, move || {
                let nodes = parent.resolve()?;
                let len = nodes.len();
                nodes.into_iter().nth(index).ok_or_else(|| {
                    EsperarError::driver(
                        context.clone(),
                        DriverError::not_found(format!(
                            "index {index} out of range: only {len} element(s) resolved"
                        )),
                    )
                })
            }),
            self.config.clone(),
        )
    }

    /// The first element of the collection
    #[must_use]
    pub fn first(&self) -> Element {
        self.nth(0)
    }

    /// The sub-collection of elements currently satisfying `condition`.
    ///
    /// The filter is applied to the sequence as resolved at use time;
    /// candidates that fail the condition transiently (absent, stale,
    /// criterion not met) are dropped for that tick, fatal failures
    /// propagate.
    #[must_use]
    pub fn filtered_by(&self, condition: Condition<Element>) -> Collection {
        let parent = self.locator.clone();
        let config = self.config.clone();
        let description = format!("{parent}.filtered_by({condition})");
        let context = description.clone();
        Collection::new(
            Locator::new(description, move || {
                let nodes = parent.resolve()?;
                let mut kept = Vec::new();
                for (index, node) in nodes.into_iter().enumerate() {
                    let probe = Element::resolved(
                        node.clone(),
                        format!("{context}[{index}]"),
                        config.clone(),
                    );
                    match condition.apply(&probe) {
                        Ok(()) => kept.push(node),
                        Err(err) if err.kind().is_transient() => {}
                        Err(err) => return Err(err),
                    }
                }
                Ok(kept)
            }),
            self.config.clone(),
        )
    }

    /// The first element currently satisfying `condition`
    #[must_use]
    pub fn element_by(&self, condition: Condition<Element>) -> Element {
        let parent = self.locator.clone();
        let config = self.config.clone();
        let description = format!("{parent}.element_by({condition})");
        let context = description.clone();
        let wanted = condition.description();
        Element::new(
            Locator::new(description, move || {
                let nodes = parent.resolve()?;
                for (index, node) in nodes.into_iter().enumerate() {
                    let probe = Element::resolved(
                        node.clone(),
                        format!("{context}[{index}]"),
                        config.clone(),
                    );
                    match condition.apply(&probe) {
                        Ok(()) => return Ok(node),
                        Err(err) if err.kind().is_transient() => {}
                        Err(err) => return Err(err),
                    }
                }
                Err(EsperarError::driver(
                    context.clone(),
                    DriverError::not_found(format!("no element matching '{wanted}' found")),
                ))
            }),
            self.config.clone(),
        )
    }

    // --- Terminal operations (resolve + wait) --- //

    /// Assert that `condition` holds, waiting up to the configured timeout.
    ///
    /// Returns the same collection for chaining.
    pub fn should(&self, condition: Condition<Collection>) -> EsperarResult<&Self> {
        self.waiter().until(&condition)?;
        Ok(self)
    }

    /// Execute a query after the implicit wait, returning its value
    pub fn get<R>(&self, query: Query<Collection, R>) -> EsperarResult<R> {
        self.waiter().until(&query)
    }

    /// Number of nodes resolved at this instant
    pub fn count(&self) -> EsperarResult<usize> {
        self.get(query::size())
    }

    /// Visible texts of all resolved nodes, in document order
    pub fn texts(&self) -> EsperarResult<Vec<String>> {
        self.get(query::texts())
    }

    // --- Internals --- //

    fn waiter(&self) -> Waiter<'_, Collection> {
        Waiter::new(self, self.locator.description(), &self.config)
    }

    /// Resolve the full sequence right now
    pub(crate) fn locate(&self) -> EsperarResult<Vec<NodeHandle>> {
        self.locator.resolve()
    }

    pub(crate) fn wrap_driver_error(&self, source: DriverError) -> EsperarError {
        EsperarError::driver(self.locator.description(), source)
    }
}

impl PartialEq for Collection {
    fn eq(&self, other: &Self) -> bool {
        self.locator.description() == other.locator.description()
    }
}

impl Eq for Collection {}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("locator", &self.locator)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.locator)
    }
}
