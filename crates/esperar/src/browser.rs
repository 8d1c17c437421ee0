//! Session entry point.
//!
//! A [`Browser`] is a thin handle over a [`Config`]: it spawns root-level
//! lazy entities (`element`, `all`) and performs session-scoped operations
//! (navigation, capture). It holds no driver itself; every operation asks
//! the config for the current transport, so the session can swap transports
//! without invalidating entities already handed out.

use tracing::debug;

use crate::collection::{find_every, Collection};
use crate::config::Config;
use crate::element::{find_first, Element};
use crate::locator::Selector;
use crate::result::{EsperarError, EsperarResult};

/// Entry point for a browser-testing session
#[derive(Clone, Debug)]
pub struct Browser {
    config: Config,
}

impl Browser {
    /// Create a session over `config`
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// The session's configuration
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Derive a session with a replaced configuration.
    ///
    /// Entities already created keep the configuration they were built
    /// with; only entities created afterwards see the new one.
    #[must_use]
    pub fn with_config(&self, config: Config) -> Self {
        Self { config }
    }

    /// A lazy element for the first node matching `selector`
    #[must_use]
    pub fn element(&self, selector: impl Into<Selector>) -> Element {
        let selector = selector.into();
        let description = format!("browser.element({selector})");
        Element::new(
            find_first(description, None, selector, &self.config),
            self.config.clone(),
        )
    }

    /// A lazy collection for all nodes matching `selector`
    #[must_use]
    pub fn all(&self, selector: impl Into<Selector>) -> Collection {
        let selector = selector.into();
        let description = format!("browser.all({selector})");
        Collection::new(
            find_every(description, None, selector, &self.config),
            self.config.clone(),
        )
    }

    /// Navigate to `url`.
    ///
    /// A relative url (no scheme) is joined onto the configured base url.
    pub fn open(&self, url: &str) -> EsperarResult<&Self> {
        let target = self.absolute(url);
        debug!(url = %target, "navigating");
        self.config
            .driver()?
            .goto(&target)
            .map_err(|e| EsperarError::driver(format!("browser.open({target})"), e))?;
        Ok(self)
    }

    /// Serialized markup of the current page
    pub fn page_source(&self) -> EsperarResult<String> {
        self.config
            .driver()?
            .page_source()
            .map_err(|e| EsperarError::driver("browser.page_source()", e))
    }

    /// PNG screenshot of the current page
    pub fn screenshot(&self) -> EsperarResult<Vec<u8>> {
        self.config
            .driver()?
            .screenshot()
            .map_err(|e| EsperarError::driver("browser.screenshot()", e))
    }

    fn absolute(&self, url: &str) -> String {
        if url.contains("://") || self.config.base_url().is_empty() {
            return url.to_string();
        }
        let base = self.config.base_url().trim_end_matches('/');
        let path = url.trim_start_matches('/');
        format!("{base}/{path}")
    }
}
