//! Esperar: Lazy Locators and Conditional Waits for Browser Testing
//!
//! Esperar (Spanish: "to wait/expect") is a fluent browser-testing core
//! built around two ideas: entities are *lazy* (an element is a
//! re-executable description of how to find a node, never a cached handle)
//! and every interaction carries an *implicit conditional wait* (actions,
//! reads, and assertions all retry transient failures until a deadline).
//! Together they absorb the two classic flaky-test failure modes ("element
//! not found yet" and "stale element reference") without explicit sleeps
//! in test code.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                     ESPERAR Architecture                         │
//! ├──────────────────────────────────────────────────────────────────┤
//! │   ┌───────────┐     ┌──────────────┐     ┌────────────────┐      │
//! │   │ Browser   │────►│ Element /    │────►│ Waiter         │      │
//! │   │ (entry)   │     │ Collection   │     │ (poll loop)    │      │
//! │   └───────────┘     │ (lazy proxy) │     └───────┬────────┘      │
//! │                     └──────────────┘             │               │
//! │                                         ┌────────▼────────┐      │
//! │                                         │ Driver (trait)  │      │
//! │                                         │ transport layer │      │
//! │                                         └─────────────────┘      │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use esperar::{be, have, Browser, Config, Driver};
//! use esperar::mock::FakeDriver;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # fn main() -> esperar::EsperarResult<()> {
//! let driver = Arc::new(FakeDriver::new());
//! driver.set_node_text("node-1", "Welcome");
//! let browser = Browser::new(
//!     Config::new()
//!         .with_timeout(Duration::from_millis(200))
//!         .with_poll_interval(Duration::from_millis(10))
//!         .with_base_url("https://example.com")
//!         .with_driver(Arc::clone(&driver) as Arc<dyn Driver>),
//! );
//!
//! browser.open("/")?;
//! browser
//!     .element(".banner")
//!     .should(be::visible())?
//!     .should(have::text("Welcome"))?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]
#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

mod browser;
mod collection;
/// Named mutating operations (click, type, clear) and the [`Command`] type
pub mod command;
mod condition;
mod conditions;
mod config;
mod driver;
mod element;
mod locator;
/// Scriptable in-memory driver for tests
pub mod mock;
/// Named state reads (text, attribute, size) and the [`Query`] type
pub mod query;
mod result;
mod wait;

pub use browser::Browser;
pub use collection::Collection;
pub use command::Command;
pub use condition::Condition;
pub use conditions::{be, have};
pub use config::{
    Config, DriverSupplier, TextMatchPolicy, WaitFailureHook, WaitStartHook,
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_TIMEOUT_MS,
};
pub use driver::{Driver, DriverResult, NodeHandle};
pub use element::Element;
pub use locator::{Locator, Selector};
pub use query::Query;
pub use result::{DriverError, ErrorKind, EsperarError, EsperarResult, WaitFailure};
pub use wait::{WaitTask, Waiter};
