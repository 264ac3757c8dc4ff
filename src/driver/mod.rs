//! Session driver layer for operating the remote chat interface
//!
//! This module provides the capability interface agents use to drive a chat
//! UI, plus two implementations: a W3C WebDriver client for real browsers
//! and a scripted in-memory chat service for tests and dry runs.

pub mod scripted;
pub mod selectors;
pub mod webdriver;

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{AgentIdentity, ElementId};

pub use scripted::{ChatScript, ScriptedDriver, ScriptedFactory, SessionLedger};
pub use selectors::ChatSelectors;
pub use webdriver::{WebDriverFactory, WebDriverSession};

/// Locator for a UI element
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Selector {
    /// CSS selector
    Css(String),
    /// XPath expression
    Xpath(String),
}

impl Selector {
    /// Create a CSS selector
    pub fn css(value: impl Into<String>) -> Self {
        Self::Css(value.into())
    }

    /// Create an XPath selector
    pub fn xpath(value: impl Into<String>) -> Self {
        Self::Xpath(value.into())
    }

    /// Selector expression without its strategy
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Css(v) | Self::Xpath(v) => v,
        }
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Css(v) => write!(f, "css:{v}"),
            Self::Xpath(v) => write!(f, "xpath:{v}"),
        }
    }
}

/// Input sent to an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyInput {
    /// Literal text
    Text(String),
    /// Enter / Return
    Enter,
}

/// Capability interface for operating a remote chat UI
///
/// Bounded waits return `Ok(None)` on ordinary absence. Errors are reserved
/// for failures: [`FleetError::DriverUnavailable`](crate::FleetError::DriverUnavailable)
/// when the session can no longer be used, and
/// [`FleetError::DriverInteraction`](crate::FleetError::DriverInteraction)
/// when a single interaction did not go through.
pub trait SessionDriver: Send + Sync + 'static {
    /// Navigate to a URL
    ///
    /// # Errors
    /// Returns error if navigation fails
    fn open(&mut self, url: &str) -> impl Future<Output = Result<()>> + Send;

    /// Wait up to `timeout` for an element to be present
    ///
    /// # Errors
    /// Returns error only on driver failure; absence is `Ok(None)`
    fn wait_for(
        &mut self,
        selector: &Selector,
        timeout: Duration,
    ) -> impl Future<Output = Result<Option<ElementId>>> + Send;

    /// Find a descendant of `parent` without waiting
    ///
    /// # Errors
    /// Returns error only on driver failure; absence is `Ok(None)`
    fn find_within(
        &mut self,
        parent: &ElementId,
        selector: &Selector,
    ) -> impl Future<Output = Result<Option<ElementId>>> + Send;

    /// Type text into the element matched by `selector`
    ///
    /// # Errors
    /// Returns error if the element is missing or does not accept input
    fn fill(&mut self, selector: &Selector, text: &str) -> impl Future<Output = Result<()>> + Send;

    /// Choose the option with `value` in the select matched by `selector`
    ///
    /// # Errors
    /// Returns error if the select or option is missing
    fn select_option(
        &mut self,
        selector: &Selector,
        value: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Click an element
    ///
    /// # Errors
    /// Returns error if the click does not go through
    fn click(&mut self, element: &ElementId) -> impl Future<Output = Result<()>> + Send;

    /// Clear an input element
    ///
    /// # Errors
    /// Returns error if the element cannot be cleared
    fn clear(&mut self, element: &ElementId) -> impl Future<Output = Result<()>> + Send;

    /// Visible text of an element
    ///
    /// # Errors
    /// Returns error if the element cannot be read
    fn read_text(&mut self, element: &ElementId) -> impl Future<Output = Result<String>> + Send;

    /// All elements currently matching `selector`, possibly none
    ///
    /// # Errors
    /// Returns error only on driver failure
    fn list_elements(
        &mut self,
        selector: &Selector,
    ) -> impl Future<Output = Result<Vec<ElementId>>> + Send;

    /// Send text or a special key to an element
    ///
    /// # Errors
    /// Returns error if the element does not accept input
    fn send_keys(
        &mut self,
        element: &ElementId,
        input: KeyInput,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Reload the current page
    ///
    /// # Errors
    /// Returns error if the reload fails
    fn refresh(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Release the session
    ///
    /// Idempotent: closing an already-closed driver is a no-op.
    ///
    /// # Errors
    /// Returns error if cleanup fails
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}

/// Creates one exclusive driver per agent
pub trait DriverFactory: Send + Sync + 'static {
    /// Driver type handed to agents
    type Driver: SessionDriver;

    /// Acquire a fresh driver for `identity`
    ///
    /// # Errors
    /// Returns error if no driver can be acquired
    fn create(
        &self,
        identity: &AgentIdentity,
    ) -> impl Future<Output = Result<Self::Driver>> + Send;
}
