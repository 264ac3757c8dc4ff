//! Fleet construction and supervision
//!
//! - `roster`: builds every agent identity from the name catalog
//! - `supervisor`: starts, stops and reports on the fleet

mod roster;
mod supervisor;

pub use roster::build_roster;
pub use supervisor::FleetSupervisor;
