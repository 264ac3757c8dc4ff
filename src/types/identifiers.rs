//! Agent names and element handles
//!
//! An agent's display name doubles as its key in the roster, the log prefix
//! and the value typed into the login form. Element handles only mean
//! something to the driver that issued them, so they never mix with plain
//! text.

use serde::{Deserialize, Serialize};

/// Display name of one agent, unique within a roster
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentName(String);

impl AgentName {
    /// Create a new agent name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the agent name as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AgentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for AgentName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AgentName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Opaque handle to a UI element, issued by a session driver
///
/// Only meaningful to the driver instance that returned it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    /// Create a new element handle
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the element handle as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ElementId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ElementId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
