//! Core supervisor structure and construction

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::agent::{Agent, AgentControls};
use crate::catalog::ConversationCatalog;
use crate::config::FleetConfig;
use crate::driver::DriverFactory;
use crate::error::Result;
use crate::types::AgentIdentity;

use super::super::roster::build_roster;

// ============================================================================
// ROSTER SLOT
// ============================================================================

/// One roster entry: identity, random seed, controls and, once launched,
/// the task running the agent
pub(super) struct AgentSlot<D: crate::driver::SessionDriver> {
    pub identity: AgentIdentity,
    pub seed: u64,
    pub controls: AgentControls,
    pub handle: Option<JoinHandle<Agent<D>>>,
    pub attempted: bool,
}

// ============================================================================
// FLEET SUPERVISOR
// ============================================================================

/// Owner of every agent in the fleet
///
/// The roster is fixed at construction. [`start_all`](Self::start_all)
/// launches each agent's loop on its own task; [`stop_all`](Self::stop_all)
/// asks every loop to exit, joins it and only then releases its driver.
pub struct FleetSupervisor<F: DriverFactory> {
    pub(super) run_id: String,
    pub(super) config: Arc<FleetConfig>,
    pub(super) catalog: Arc<ConversationCatalog>,
    pub(super) factory: Arc<F>,
    pub(super) shutdown: CancellationToken,
    pub(super) roster: Mutex<Vec<AgentSlot<F::Driver>>>,
    pub(super) created_at: Instant,
}

impl<F: DriverFactory> FleetSupervisor<F> {
    /// Build the fleet described by `config`
    ///
    /// # Errors
    /// Returns error if the configuration is invalid
    pub fn new(config: FleetConfig, factory: F) -> Result<Self> {
        let mut rng = master_rng(config.seed);
        let roster = build_roster(&config.agents, &mut rng);
        Self::assemble(config, factory, roster, rng)
    }

    /// Build a fleet of exactly `identities`
    ///
    /// # Errors
    /// Returns error if the configuration is invalid
    pub fn with_roster(
        config: FleetConfig,
        factory: F,
        identities: Vec<AgentIdentity>,
    ) -> Result<Self> {
        let rng = master_rng(config.seed);
        Self::assemble(config, factory, identities, rng)
    }

    fn assemble(
        config: FleetConfig,
        factory: F,
        identities: Vec<AgentIdentity>,
        mut rng: StdRng,
    ) -> Result<Self> {
        config.validate()?;
        let catalog = Arc::new(ConversationCatalog::from_config(&config)?);
        let shutdown = CancellationToken::new();

        let roster = identities
            .into_iter()
            .map(|identity| AgentSlot {
                identity,
                seed: rng.next_u64(),
                controls: AgentControls::child_of(&shutdown),
                handle: None,
                attempted: false,
            })
            .collect::<Vec<_>>();

        let run_id = Uuid::new_v4().to_string();
        log::info!("Fleet {} built with {} agents", run_id, roster.len());

        Ok(Self {
            run_id,
            config: Arc::new(config),
            catalog,
            factory: Arc::new(factory),
            shutdown,
            roster: Mutex::new(roster),
            created_at: Instant::now(),
        })
    }

    /// Identifier of this fleet run
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Configuration the fleet was built with
    #[must_use]
    pub fn config(&self) -> &FleetConfig {
        &self.config
    }

    /// Driver factory
    #[must_use]
    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Identities in roster order
    #[must_use]
    pub fn identities(&self) -> Vec<AgentIdentity> {
        self.roster
            .lock()
            .iter()
            .map(|slot| slot.identity.clone())
            .collect()
    }

    /// Seed behind the named agent's random choices
    ///
    /// Feeding it to [`ConversationPolicy::seeded`](crate::ConversationPolicy::seeded)
    /// replays the agent's topic order and picks.
    #[must_use]
    pub fn seed_of(&self, name: &str) -> Option<u64> {
        self.roster
            .lock()
            .iter()
            .find(|slot| slot.identity.name.as_str() == name)
            .map(|slot| slot.seed)
    }

    /// Number of agents in the roster
    #[must_use]
    pub fn len(&self) -> usize {
        self.roster.lock().len()
    }

    /// Whether the roster is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roster.lock().is_empty()
    }

    /// Time since the fleet was built
    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Stop launching agents and interrupt every pause and wait
    ///
    /// Safe to call from a signal handler task while
    /// [`start_all`](Self::start_all) is still running. Follow with
    /// [`stop_all`](Self::stop_all) to join and release.
    pub fn request_shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Whether shutdown has been requested
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Token cancelled when shutdown is requested
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}

fn master_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
