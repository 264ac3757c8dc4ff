//! Agent phases and fleet status snapshots

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identity::Gender;

/// Lifecycle phase of an agent
///
/// `Unauthenticated -> Authenticating -> Monitoring <-> Responding`, with
/// `Stopped` reachable from every phase and final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum AgentPhase {
    /// No session has been authenticated yet
    Unauthenticated = 0,
    /// Login form is being submitted
    Authenticating = 1,
    /// Polling for notifications
    Monitoring = 2,
    /// Answering one counterparty's unread messages
    Responding = 3,
    /// Terminal
    Stopped = 4,
}

impl AgentPhase {
    /// Whether moving from `self` to `next` is a legal transition
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        use AgentPhase::{Authenticating, Monitoring, Responding, Stopped, Unauthenticated};
        matches!(
            (self, next),
            (Unauthenticated, Authenticating)
                | (Authenticating, Monitoring)
                | (Monitoring, Responding)
                | (Responding, Monitoring)
                | (Unauthenticated | Authenticating | Monitoring | Responding, Stopped)
        )
    }

    /// Decode from the atomic representation; unknown values read as `Stopped`
    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Unauthenticated,
            1 => Self::Authenticating,
            2 => Self::Monitoring,
            3 => Self::Responding,
            _ => Self::Stopped,
        }
    }
}

/// Point-in-time status of one agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentStatus {
    /// Agent display name
    pub name: String,
    /// Gender tag
    pub gender: Gender,
    /// Age
    pub age: u8,
    /// Current lifecycle phase
    pub phase: AgentPhase,
    /// Whether the monitoring loop is live
    pub active: bool,
    /// Responses sent so far
    pub responses_sent: u64,
    /// Proactive questions asked so far
    pub questions_asked: u64,
    /// Why the agent stopped, if it stopped on its own
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_failure: Option<String>,
}

/// Point-in-time status of the whole fleet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetStatus {
    /// Identifier of this fleet run
    pub run_id: String,
    /// When the snapshot was taken
    pub taken_at: DateTime<Utc>,
    /// Agents whose monitoring loop is live
    pub active: usize,
    /// Agents in the roster
    pub total: usize,
    /// Per-agent details, in roster order
    pub agents: Vec<AgentStatus>,
}
