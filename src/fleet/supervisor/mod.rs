//! Fleet supervisor implementation
//!
//! This module is organized into logical submodules:
//! - `core`: the supervisor struct, roster slots and constructors
//! - `start`: authenticating agents and launching their loops
//! - `stop`: cooperative shutdown and driver release
//! - `status`: point-in-time snapshots

mod core;
mod start;
mod status;
mod stop;

pub use self::core::FleetSupervisor;
