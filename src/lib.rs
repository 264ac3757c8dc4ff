//! # Chat Fleet
//!
//! A supervised fleet of automated chat participants. Each agent logs in to
//! a web chat service through its own browser session, watches for unread
//! conversations, answers every new message once with a paced generic reply,
//! and asks topic questions on a fixed cadence while idle.
//!
//! ## Quick Start
//!
//! ```no_run
//! use chat_fleet::{FleetConfig, FleetSupervisor, WebDriverFactory};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = FleetConfig::default();
//!     let factory = WebDriverFactory::from_config(&config)?;
//!     let fleet = FleetSupervisor::new(config, factory)?;
//!
//!     fleet.start_all().await?;
//!     tokio::time::sleep(std::time::Duration::from_secs(60)).await;
//!     fleet.stop_all().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`fleet`]: roster construction and the [`FleetSupervisor`]
//! - [`agent`]: one agent's login flow and monitoring loop
//! - [`conversation`]: question pacing, reply selection and per-agent state
//! - [`catalog`]: names, topics, questions and affirmations
//! - [`driver`]: the [`SessionDriver`] capability, with WebDriver and
//!   scripted implementations
//! - [`config`]: TOML configuration
//! - [`error`]: error types and handling
//!
//! ## Concurrency
//!
//! Every agent runs on its own tokio task and owns its driver exclusively.
//! Agents share nothing mutable except their own liveness flag and
//! counters, which the supervisor reads for status and clears to stop them.
//! Stopping joins each task before releasing its driver.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod agent;
pub mod catalog;
pub mod config;
pub mod conversation;
pub mod driver;
pub mod error;
pub mod fleet;
pub mod logging;
pub mod types;

pub use agent::{Agent, AgentControls, AgentLiveness};
pub use catalog::ConversationCatalog;
pub use config::FleetConfig;
pub use conversation::{AgentRuntimeState, ConversationPolicy, Question};
pub use driver::{
    ChatScript, ChatSelectors, DriverFactory, ScriptedDriver, ScriptedFactory, Selector,
    SessionDriver, WebDriverFactory,
};
pub use error::{FleetError, Result};
pub use fleet::{FleetSupervisor, build_roster};
pub use types::{AgentIdentity, AgentName, AgentPhase, AgentStatus, FleetStatus, Gender};

/// Version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
