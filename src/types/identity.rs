//! Agent identity types
//!
//! An [`AgentIdentity`] is fixed when the roster is built and never changes
//! for the lifetime of the agent.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::identifiers::AgentName;
use crate::error::FleetError;

/// Gender tag submitted on the login form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    /// Submitted as `male`
    Male,
    /// Submitted as `female`
    Female,
}

impl Gender {
    /// Value used by the login form's gender select
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Ok(Self::Male),
            "female" | "f" => Ok(Self::Female),
            other => Err(FleetError::invalid_config(format!("unknown gender '{other}'"))),
        }
    }
}

/// Name catalog partition. Only used while building the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameOrigin {
    /// Indian names
    Indian,
    /// American names
    American,
}

/// Immutable identity of one agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentIdentity {
    /// Display name typed into the login form
    pub name: AgentName,
    /// Gender tag selected on the login form
    pub gender: Gender,
    /// Age typed into the login form
    pub age: u8,
}

impl AgentIdentity {
    /// Create a new identity
    pub fn new(name: impl Into<AgentName>, gender: Gender, age: u8) -> Self {
        Self {
            name: name.into(),
            gender,
            age,
        }
    }
}
