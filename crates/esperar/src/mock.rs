//! In-memory scriptable driver for tests.
//!
//! [`FakeDriver`] implements [`Driver`] against a scripted plan per
//! operation: a finite queue of outcomes consumed first, then a repeating
//! tail (or a benign default). This lets a test model pages that change
//! over time, such as "absent twice, then found" or "text empty three
//! times, then Done", while call counters and interaction logs make resolution
//! frequency observable.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::driver::{Driver, DriverResult, NodeHandle};
use crate::locator::Selector;

/// Scripted outcomes for one driver operation: a finite prefix, then an
/// optional repeating tail.
struct Plan<T> {
    queue: VecDeque<DriverResult<T>>,
    tail: Option<DriverResult<T>>,
}

impl<T: Clone> Plan<T> {
    fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            tail: None,
        }
    }

    fn enqueue(&mut self, outcome: DriverResult<T>) {
        self.queue.push_back(outcome);
    }

    fn always(&mut self, outcome: DriverResult<T>) {
        self.tail = Some(outcome);
    }

    fn next(&mut self, default: impl FnOnce() -> T) -> DriverResult<T> {
        if let Some(outcome) = self.queue.pop_front() {
            return outcome;
        }
        match &self.tail {
            Some(outcome) => outcome.clone(),
            None => Ok(default()),
        }
    }
}

struct State {
    find: Plan<Vec<NodeHandle>>,
    displayed: Plan<bool>,
    text: Plan<String>,
    click: Plan<()>,
    node_texts: HashMap<String, String>,
    attributes: HashMap<String, String>,
    page_source: String,
    calls: usize,
    finds: usize,
    clicks: usize,
    clicked: Vec<String>,
    typed: Vec<(String, String)>,
    cleared: Vec<String>,
    visited: Vec<String>,
}

impl State {
    fn new() -> Self {
        Self {
            find: Plan::new(),
            displayed: Plan::new(),
            text: Plan::new(),
            click: Plan::new(),
            node_texts: HashMap::new(),
            attributes: HashMap::new(),
            page_source: "<html><body></body></html>".to_string(),
            calls: 0,
            finds: 0,
            clicks: 0,
            clicked: Vec::new(),
            typed: Vec::new(),
            cleared: Vec::new(),
            visited: Vec::new(),
        }
    }
}

/// A scriptable [`Driver`] backed by in-memory plans and interaction logs.
///
/// Unscripted operations succeed with benign defaults: `find_all` yields a
/// single `node-1`, `is_displayed` reports `true`, `text` reads an empty
/// string (or the per-node override installed with
/// [`set_node_text`](Self::set_node_text)).
pub struct FakeDriver {
    state: Mutex<State>,
}

impl FakeDriver {
    /// Create a driver with default (always succeeding) behavior
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::new()),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    // --- Scripting --- //

    /// Queue one outcome for the next `find_all` call
    pub fn enqueue_find(&self, outcome: DriverResult<Vec<NodeHandle>>) {
        self.state().find.enqueue(outcome);
    }

    /// Set the outcome for every `find_all` call after the queue drains
    pub fn always_find(&self, outcome: DriverResult<Vec<NodeHandle>>) {
        self.state().find.always(outcome);
    }

    /// Queue one outcome for the next `is_displayed` call
    pub fn enqueue_displayed(&self, outcome: DriverResult<bool>) {
        self.state().displayed.enqueue(outcome);
    }

    /// Set the outcome for every `is_displayed` call after the queue drains
    pub fn always_displayed(&self, outcome: DriverResult<bool>) {
        self.state().displayed.always(outcome);
    }

    /// Queue one outcome for the next `text` call
    pub fn enqueue_text(&self, outcome: DriverResult<String>) {
        self.state().text.enqueue(outcome);
    }

    /// Set the outcome for every `text` call after the queue drains
    pub fn always_text(&self, outcome: DriverResult<String>) {
        self.state().text.always(outcome);
    }

    /// Queue one outcome for the next `click` call
    pub fn enqueue_click(&self, outcome: DriverResult<()>) {
        self.state().click.enqueue(outcome);
    }

    /// Fix the text read for one specific node, overriding the text plan
    pub fn set_node_text(&self, node_id: impl Into<String>, text: impl Into<String>) {
        self.state().node_texts.insert(node_id.into(), text.into());
    }

    /// Install an attribute visible on every node
    pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<String>) {
        self.state().attributes.insert(name.into(), value.into());
    }

    /// Replace the markup served by `page_source`
    pub fn set_page_source(&self, markup: impl Into<String>) {
        self.state().page_source = markup.into();
    }

    // --- Observation --- //

    /// Total driver calls of any kind
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.state().calls
    }

    /// Number of `find_all` calls
    #[must_use]
    pub fn find_count(&self) -> usize {
        self.state().finds
    }

    /// Number of `click` calls (including scripted failures)
    #[must_use]
    pub fn click_count(&self) -> usize {
        self.state().clicks
    }

    /// Node ids successfully clicked, in order
    #[must_use]
    pub fn clicked(&self) -> Vec<String> {
        self.state().clicked.clone()
    }

    /// (node id, text) pairs sent by `type_text` and `set_value`, in order
    #[must_use]
    pub fn typed(&self) -> Vec<(String, String)> {
        self.state().typed.clone()
    }

    /// Node ids cleared, in order
    #[must_use]
    pub fn cleared(&self) -> Vec<String> {
        self.state().cleared.clone()
    }

    /// Urls navigated to, in order
    #[must_use]
    pub fn visited(&self) -> Vec<String> {
        self.state().visited.clone()
    }
}

impl Default for FakeDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FakeDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("FakeDriver")
            .field("calls", &state.calls)
            .field("finds", &state.finds)
            .field("clicks", &state.clicks)
            .finish_non_exhaustive()
    }
}

impl Driver for FakeDriver {
    fn find_all(
        &self,
        _selector: &Selector,
        _scope: Option<&NodeHandle>,
    ) -> DriverResult<Vec<NodeHandle>> {
        let mut state = self.state();
        state.calls += 1;
        state.finds += 1;
        state.find.next(|| vec![NodeHandle::new("node-1")])
    }

    fn click(&self, node: &NodeHandle) -> DriverResult<()> {
        let mut state = self.state();
        state.calls += 1;
        state.clicks += 1;
        state.click.next(|| ())?;
        let id = node.id.clone();
        state.clicked.push(id);
        Ok(())
    }

    fn type_text(&self, node: &NodeHandle, text: &str) -> DriverResult<()> {
        let mut state = self.state();
        state.calls += 1;
        state.typed.push((node.id.clone(), text.to_string()));
        Ok(())
    }

    fn set_value(&self, node: &NodeHandle, text: &str) -> DriverResult<()> {
        let mut state = self.state();
        state.calls += 1;
        state.typed.push((node.id.clone(), text.to_string()));
        Ok(())
    }

    fn clear(&self, node: &NodeHandle) -> DriverResult<()> {
        let mut state = self.state();
        state.calls += 1;
        state.cleared.push(node.id.clone());
        Ok(())
    }

    fn text(&self, node: &NodeHandle) -> DriverResult<String> {
        let mut state = self.state();
        state.calls += 1;
        if let Some(text) = state.node_texts.get(&node.id) {
            return Ok(text.clone());
        }
        state.text.next(String::new)
    }

    fn attribute(&self, node: &NodeHandle, name: &str) -> DriverResult<Option<String>> {
        let _ = node;
        let mut state = self.state();
        state.calls += 1;
        Ok(state.attributes.get(name).cloned())
    }

    fn is_displayed(&self, node: &NodeHandle) -> DriverResult<bool> {
        let _ = node;
        let mut state = self.state();
        state.calls += 1;
        state.displayed.next(|| true)
    }

    fn goto(&self, url: &str) -> DriverResult<()> {
        let mut state = self.state();
        state.calls += 1;
        state.visited.push(url.to_string());
        Ok(())
    }

    fn page_source(&self) -> DriverResult<String> {
        let mut state = self.state();
        state.calls += 1;
        Ok(state.page_source.clone())
    }

    fn screenshot(&self) -> DriverResult<Vec<u8>> {
        let mut state = self.state();
        state.calls += 1;
        // PNG signature followed by nothing; enough for encoding tests
        Ok(vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A])
    }
}
