//! Type definitions for the chat fleet
//!
//! This module contains the shared data types, organized into submodules:
//! - `identifiers`: agent names and driver element handles
//! - `identity`: Immutable agent identity (name, gender, age)
//! - `status`: Agent phases and fleet status snapshots

pub mod identifiers;
pub mod identity;
pub mod status;

pub use identifiers::{AgentName, ElementId};
pub use identity::{AgentIdentity, Gender, NameOrigin};
pub use status::{AgentPhase, AgentStatus, FleetStatus};
