//! Error types for the chat fleet

use thiserror::Error;

/// Main error type for the chat fleet
#[derive(Error, Debug)]
pub enum FleetError {
    /// The session driver can no longer be used (transport gone, session closed)
    #[error("Driver unavailable: {0}")]
    DriverUnavailable(String),

    /// A single driver interaction failed (stale element, element not interactable)
    #[error("Driver interaction failed: {0}")]
    DriverInteraction(String),

    /// An element the agent needed to act on was not present in time
    #[error("Element not found: {0}")]
    ElementMissing(String),

    /// Login did not reach the landing marker
    #[error("Authentication failed for {agent}: {reason}")]
    AuthenticationFailed {
        /// Agent display name
        agent: String,
        /// What went wrong
        reason: String,
    },

    /// Operation attempted on an agent that has no driver attached
    #[error("Agent {0} has no active session")]
    NoSession(String),

    /// Operation not valid for the fleet's current lifecycle stage
    #[error("Invalid fleet state: {0}")]
    InvalidState(String),

    /// JSON encode/decode error (WebDriver wire bodies, status output)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML decode error when loading configuration
    #[error("Config decode error: {0}")]
    TomlDecode(#[from] toml::de::Error),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for fleet operations
pub type Result<T> = std::result::Result<T, FleetError>;

impl FleetError {
    /// Create a driver unavailable (agent-fatal) error
    pub fn driver_unavailable(msg: impl Into<String>) -> Self {
        Self::DriverUnavailable(msg.into())
    }

    /// Create a recoverable driver interaction error
    pub fn driver_interaction(msg: impl Into<String>) -> Self {
        Self::DriverInteraction(msg.into())
    }

    /// Create an element missing error
    pub fn element_missing(what: impl Into<String>) -> Self {
        Self::ElementMissing(what.into())
    }

    /// Create an authentication failure
    pub fn authentication_failed(agent: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AuthenticationFailed {
            agent: agent.into(),
            reason: reason.into(),
        }
    }

    /// Create a no-session error
    pub fn no_session(agent: impl Into<String>) -> Self {
        Self::NoSession(agent.into())
    }

    /// Create an invalid state error
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Whether this error ends the agent that observed it.
    ///
    /// Only an unusable driver or a missing session is fatal inside the
    /// monitoring loop; everything else is logged and the loop continues.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::DriverUnavailable(_) | Self::NoSession(_))
    }
}
