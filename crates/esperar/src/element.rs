//! Lazy single-element entity.
//!
//! An [`Element`] wraps a [`Locator`] and a [`Config`] and nothing else: no
//! node handle is ever stored, so the same logical element survives DOM
//! re-renders. Identity is by locator description. Derivation methods
//! (`element`, `all`) build new lazy entities without touching the browser;
//! only terminal actions, queries, and assertions resolve and wait.

use std::sync::Arc;

use crate::collection::{find_every, Collection};
use crate::command::Command;
use crate::condition::Condition;
use crate::config::Config;
use crate::driver::{Driver, NodeHandle};
use crate::locator::{Locator, Selector};
use crate::query::Query;
use crate::result::{DriverError, EsperarError, EsperarResult};
use crate::wait::Waiter;
use crate::{command, query};

/// Build a locator that finds the first node matching `selector`, in
/// document order, under `parent` (or the document root).
///
/// Where many nodes match and one is required, the first wins; this is
/// documented behavior, not an error. An empty match yields a transient
/// not-found failure so the wait loop can retry.
pub(crate) fn find_first(
    description: String,
    parent: Option<Locator<NodeHandle>>,
    selector: Selector,
    config: &Config,
) -> Locator<NodeHandle> {
    let config = config.clone();
    let context = description.clone();
    Locator::new(description, move || {
        let scope = match &parent {
            Some(parent) => Some(parent.resolve()?),
            None => None,
        };
        let driver = config.driver()?;
        let nodes = driver
            .find_all(&selector, scope.as_ref())
            .map_err(|e| EsperarError::driver(context.clone(), e))?;
        nodes.into_iter().next().ok_or_else(|| {
            EsperarError::driver(
                context.clone(),
                DriverError::not_found(format!("element not found by {selector}")),
            )
        })
    })
}

/// A lazy proxy for a single DOM node
#[derive(Clone)]
pub struct Element {
    locator: Locator<NodeHandle>,
    config: Config,
}

impl Element {
    /// Create an element from a locator and a configuration
    #[must_use]
    pub fn new(locator: Locator<NodeHandle>, config: Config) -> Self {
        Self { locator, config }
    }

    /// An element pinned to an already-resolved node.
    ///
    /// Only valid within the single poll attempt that resolved the node;
    /// used by collection filtering to probe candidates.
    pub(crate) fn resolved(node: NodeHandle, description: String, config: Config) -> Self {
        Self::new(
            Locator::new(description, move || Ok(node.clone())),
            config,
        )
    }

    /// Locator description, the element's identity
    #[must_use]
    pub fn description(&self) -> &str {
        self.locator.description()
    }

    /// The configuration this element reads
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Derive an element with a per-call timeout override.
    ///
    /// The shared configuration is never mutated; this is a scoped
    /// derivation for one call site.
    #[must_use]
    pub fn with_timeout(&self, timeout: std::time::Duration) -> Self {
        Self {
            locator: self.locator.clone(),
            config: self.config.clone().with_timeout(timeout),
        }
    }

    // --- Derivations (no browser interaction) --- //

    /// The first element matching `selector` inside this one
    #[must_use]
    pub fn element(&self, selector: impl Into<Selector>) -> Element {
        let selector = selector.into();
        let description = format!("{}.element({selector})", self.locator);
        Element::new(
            find_first(
                description,
                Some(self.locator.clone()),
                selector,
                &self.config,
            ),
            self.config.clone(),
        )
    }

    /// All elements matching `selector` inside this one
    #[must_use]
    pub fn all(&self, selector: impl Into<Selector>) -> Collection {
        let selector = selector.into();
        let description = format!("{}.all({selector})", self.locator);
        Collection::new(
            find_every(
                description,
                Some(self.locator.clone()),
                selector,
                &self.config,
            ),
            self.config.clone(),
        )
    }

    // --- Terminal operations (resolve + wait) --- //

    /// Assert that `condition` holds, waiting up to the configured timeout.
    ///
    /// Returns the same element for chaining.
    pub fn should(&self, condition: Condition<Element>) -> EsperarResult<&Self> {
        self.waiter().until(&condition)?;
        Ok(self)
    }

    /// Execute a command after the implicit wait, retrying transient
    /// failures until the deadline
    pub fn perform(&self, command: Command<Element>) -> EsperarResult<&Self> {
        self.waiter().until(&command)?;
        Ok(self)
    }

    /// Execute a query after the implicit existence wait, returning its value
    pub fn get<R>(&self, query: Query<Element, R>) -> EsperarResult<R> {
        self.waiter().until(&query)
    }

    /// Click the element (waits for it to be present and displayed)
    pub fn click(&self) -> EsperarResult<&Self> {
        self.perform(command::click())
    }

    /// Clear the element and type `text` into it
    pub fn set_value(&self, text: impl Into<String>) -> EsperarResult<&Self> {
        self.perform(command::set_value(text))
    }

    /// Append `text` to the element's current value
    pub fn type_text(&self, text: impl Into<String>) -> EsperarResult<&Self> {
        self.perform(command::type_text(text))
    }

    /// Clear the element's value
    pub fn clear(&self) -> EsperarResult<&Self> {
        self.perform(command::clear())
    }

    /// The element's visible text (waits for existence only)
    pub fn text(&self) -> EsperarResult<String> {
        self.get(query::text())
    }

    /// An attribute value, `None` when absent
    pub fn attribute(&self, name: impl Into<String>) -> EsperarResult<Option<String>> {
        self.get(query::attribute(name))
    }

    /// The `value` attribute
    pub fn value(&self) -> EsperarResult<Option<String>> {
        self.get(query::value())
    }

    /// Whether the element currently reports itself as displayed
    pub fn is_displayed(&self) -> EsperarResult<bool> {
        self.get(query::is_displayed())
    }

    // --- Internals --- //

    fn waiter(&self) -> Waiter<'_, Element> {
        Waiter::new(self, self.locator.description(), &self.config)
    }

    /// Resolve the single target node right now (first match in document
    /// order when many match)
    pub(crate) fn locate(&self) -> EsperarResult<NodeHandle> {
        self.locator.resolve()
    }

    /// Resolve the node and require it to report displayed
    pub(crate) fn locate_visible(&self) -> EsperarResult<NodeHandle> {
        let node = self.locate()?;
        let displayed = self
            .driver()?
            .is_displayed(&node)
            .map_err(|e| self.wrap_driver_error(e))?;
        if displayed {
            Ok(node)
        } else {
            Err(EsperarError::mismatch(
                "visible element",
                "element is present but not displayed",
            ))
        }
    }

    pub(crate) fn driver(&self) -> EsperarResult<Arc<dyn Driver>> {
        self.config.driver()
    }

    pub(crate) fn wrap_driver_error(&self, source: DriverError) -> EsperarError {
        EsperarError::driver(self.locator.description(), source)
    }
}

impl PartialEq for Element {
    /// Identity is the locator description, never a resolved node: the same
    /// logical element may map to different nodes over time.
    fn eq(&self, other: &Self) -> bool {
        self.locator.description() == other.locator.description()
    }
}

impl Eq for Element {}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element")
            .field("locator", &self.locator)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.locator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::{be, have};
    use crate::mock::FakeDriver;
    use std::time::{Duration, Instant};

    fn session(driver: &Arc<FakeDriver>) -> Config {
        Config::new()
            .with_timeout(Duration::from_millis(300))
            .with_poll_interval(Duration::from_millis(10))
            .with_driver(Arc::clone(driver) as Arc<dyn Driver>)
    }

    fn root_element(driver: &Arc<FakeDriver>, css: &str) -> Element {
        let config = session(driver);
        let description = format!("element(css:{css})");
        Element::new(
            find_first(description, None, Selector::css(css), &config),
            config,
        )
    }

    mod laziness_tests {
        use super::*;

        #[test]
        fn test_chained_derivations_touch_no_driver() {
            let driver = Arc::new(FakeDriver::new());
            let element = root_element(&driver, "form");
            let _chain = element.element("input").element("span");
            let _inner = element.all("li").nth(2).element("a");
            assert_eq!(driver.call_count(), 0);
        }

        #[test]
        fn test_identity_is_by_description() {
            let driver = Arc::new(FakeDriver::new());
            let one = root_element(&driver, "button").element("span");
            let two = root_element(&driver, "button").element("span");
            let other = root_element(&driver, "button").element("em");
            assert_eq!(one, two);
            assert_ne!(one, other);
        }

        #[test]
        fn test_display_is_chain_description() {
            let driver = Arc::new(FakeDriver::new());
            let chained = root_element(&driver, "form").element("input");
            assert_eq!(chained.to_string(), "element(css:form).element(css:input)");
        }
    }

    mod action_tests {
        use super::*;

        #[test]
        fn test_click_resolves_then_clicks() {
            let driver = Arc::new(FakeDriver::new());
            let element = root_element(&driver, "button");
            element.click().unwrap();
            assert_eq!(driver.clicked(), vec!["node-1".to_string()]);
        }

        #[test]
        fn test_click_waits_out_initial_not_found() {
            let driver = Arc::new(FakeDriver::new());
            driver.enqueue_find(Err(DriverError::not_found("element not found by css:button")));
            driver.enqueue_find(Err(DriverError::not_found("element not found by css:button")));
            let element = root_element(&driver, "button");
            element.click().unwrap();
            assert!(driver.find_count() >= 3);
            assert_eq!(driver.clicked().len(), 1);
        }

        #[test]
        fn test_click_waits_for_visibility() {
            let driver = Arc::new(FakeDriver::new());
            driver.enqueue_displayed(Ok(false));
            driver.enqueue_displayed(Ok(false));
            let element = root_element(&driver, "button");
            element.click().unwrap();
            assert_eq!(driver.clicked().len(), 1);
        }

        #[test]
        fn test_click_times_out_when_hidden_forever() {
            let driver = Arc::new(FakeDriver::new());
            driver.always_displayed(Ok(false));
            let element = root_element(&driver, "button");
            let err = element.click().unwrap_err();
            let report = err.wait_failure().unwrap();
            assert_eq!(report.condition, "click");
            assert!(report.diagnostic.contains("not displayed"));
        }

        #[test]
        fn test_set_value_and_type_text_recorded() {
            let driver = Arc::new(FakeDriver::new());
            let element = root_element(&driver, "input");
            element.set_value("hello").unwrap().type_text(" world").unwrap();
            assert_eq!(
                driver.typed(),
                vec![
                    ("node-1".to_string(), "hello".to_string()),
                    ("node-1".to_string(), " world".to_string()),
                ]
            );
        }

        #[test]
        fn test_staleness_is_transparent_to_actions() {
            let driver = Arc::new(FakeDriver::new());
            driver.enqueue_click(Err(DriverError::stale("node went away")));
            let element = root_element(&driver, "button");
            element.click().unwrap();
            // first click raised stale, the retry resolved afresh and succeeded
            assert_eq!(driver.click_count(), 2);
        }
    }

    mod query_tests {
        use super::*;

        #[test]
        fn test_text_query_waits_for_existence_only() {
            let driver = Arc::new(FakeDriver::new());
            driver.always_displayed(Ok(false));
            driver.always_text(Ok("Score: 10".to_string()));
            let element = root_element(&driver, "span");
            assert_eq!(element.text().unwrap(), "Score: 10");
        }

        #[test]
        fn test_attribute_query() {
            let driver = Arc::new(FakeDriver::new());
            driver.set_attribute("href", "https://example.com");
            let element = root_element(&driver, "a");
            assert_eq!(
                element.attribute("href").unwrap(),
                Some("https://example.com".to_string())
            );
            assert_eq!(element.attribute("title").unwrap(), None);
        }

        #[test]
        fn test_staleness_recovery_during_read() {
            let driver = Arc::new(FakeDriver::new());
            driver.enqueue_text(Err(DriverError::stale("re-rendered")));
            driver.always_text(Ok("Done".to_string()));
            let element = root_element(&driver, "span");
            assert_eq!(element.text().unwrap(), "Done");
        }
    }

    mod should_tests {
        use super::*;

        #[test]
        fn test_should_returns_self_for_chaining() {
            let driver = Arc::new(FakeDriver::new());
            driver.always_text(Ok("Done".to_string()));
            let element = root_element(&driver, "span");
            element
                .should(be::visible())
                .unwrap()
                .should(have::exact_text("Done"))
                .unwrap();
        }

        #[test]
        fn test_text_becomes_done_scenario() {
            let driver = Arc::new(FakeDriver::new());
            for _ in 0..3 {
                driver.enqueue_text(Ok(String::new()));
            }
            driver.always_text(Ok("Done".to_string()));
            let config = Config::new()
                .with_timeout(Duration::from_millis(1000))
                .with_poll_interval(Duration::from_millis(100))
                .with_driver(Arc::clone(&driver) as Arc<dyn Driver>);
            let element = Element::new(
                find_first(
                    "element(css:.status)".to_string(),
                    None,
                    Selector::css(".status"),
                    &config,
                ),
                config,
            );
            let started = Instant::now();
            element.should(have::exact_text("Done")).unwrap();
            let elapsed = started.elapsed();
            assert!(elapsed >= Duration::from_millis(250), "elapsed {elapsed:?}");
            assert!(elapsed < Duration::from_millis(600), "elapsed {elapsed:?}");
        }

        #[test]
        fn test_never_visible_timeout_message() {
            let driver = Arc::new(FakeDriver::new());
            driver.always_find(Err(DriverError::not_found("element not found by css:.spinner")));
            let config = Config::new()
                .with_timeout(Duration::from_millis(200))
                .with_poll_interval(Duration::from_millis(50))
                .with_driver(Arc::clone(&driver) as Arc<dyn Driver>);
            let element = Element::new(
                find_first(
                    "element(css:.spinner)".to_string(),
                    None,
                    Selector::css(".spinner"),
                    &config,
                ),
                config,
            );
            let message = element.should(be::visible()).unwrap_err().to_string();
            assert!(message.contains("be visible"), "message: {message}");
            assert!(message.contains("not found"), "message: {message}");
        }
    }

    mod scoped_override_tests {
        use super::*;

        #[test]
        fn test_with_timeout_derives_without_mutating_shared_config() {
            let driver = Arc::new(FakeDriver::new());
            let element = root_element(&driver, "button");
            let quick = element.with_timeout(Duration::from_millis(1));
            assert_eq!(quick.config().timeout(), Duration::from_millis(1));
            assert_eq!(element.config().timeout(), Duration::from_millis(300));
            assert_eq!(quick, element);
        }
    }
}
