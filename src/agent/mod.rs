//! One automated chat participant
//!
//! This module is organized into logical submodules:
//! - `liveness`: flag, phase and counters the supervisor can observe
//! - `pacing`: interruptible pauses and bounded waits
//! - `login`: the authentication flow
//! - `monitor`: the notification polling loop
//! - `respond`: answering one counterparty's unread messages
//!
//! An [`Agent`] owns its identity, its conversation state, its policy and its
//! session driver exclusively. [`Agent::run`] consumes the agent and hands it
//! back once the loop has exited, so the owner can join the task and then
//! release the driver.

mod liveness;
mod login;
mod monitor;
mod pacing;
mod respond;

pub use liveness::{AgentControls, AgentLiveness};
pub use pacing::interruptible_sleep;

use std::sync::Arc;

use crate::catalog::ConversationCatalog;
use crate::config::FleetConfig;
use crate::conversation::{AgentRuntimeState, ConversationPolicy};
use crate::driver::SessionDriver;
use crate::error::{FleetError, Result};
use crate::types::{AgentIdentity, AgentPhase, AgentStatus};

// ============================================================================
// AGENT
// ============================================================================

/// A single chat participant bound to one session driver
pub struct Agent<D: SessionDriver> {
    identity: AgentIdentity,
    config: Arc<FleetConfig>,
    policy: ConversationPolicy,
    state: AgentRuntimeState,
    driver: Option<D>,
    controls: AgentControls,
    // counterparty whose conversation is open in the page
    open_conversation: Option<String>,
}

impl<D: SessionDriver> Agent<D> {
    /// Create an agent in `Unauthenticated`
    ///
    /// `seed` fixes every random choice the agent makes: topic order,
    /// question and reply picks, and pause lengths.
    pub fn new(
        identity: AgentIdentity,
        driver: D,
        config: Arc<FleetConfig>,
        catalog: Arc<ConversationCatalog>,
        seed: u64,
    ) -> Self {
        let mut policy = ConversationPolicy::seeded(catalog, &config.conversation, seed);
        let state = policy.initial_state(config.conversation.seen_capacity);
        Self {
            identity,
            config,
            policy,
            state,
            driver: Some(driver),
            controls: AgentControls::default(),
            open_conversation: None,
        }
    }

    /// Share liveness and cancellation with an owner
    #[must_use]
    pub fn with_controls(mut self, controls: AgentControls) -> Self {
        controls.liveness.set_phase(self.phase());
        self.controls = controls;
        self
    }

    /// Immutable identity
    #[must_use]
    pub fn identity(&self) -> &AgentIdentity {
        &self.identity
    }

    /// Conversation state
    #[must_use]
    pub fn state(&self) -> &AgentRuntimeState {
        &self.state
    }

    /// Handles for observing and stopping this agent
    #[must_use]
    pub fn controls(&self) -> &AgentControls {
        &self.controls
    }

    /// Current lifecycle phase
    #[must_use]
    pub fn phase(&self) -> AgentPhase {
        self.controls.liveness.phase()
    }

    /// Whether the monitoring loop should keep running
    ///
    /// False once the agent's token is cancelled, even before the loop has
    /// cleared its own flag.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.controls.liveness.is_active() && !self.controls.cancel.is_cancelled()
    }

    /// Whether the agent still holds its driver
    #[must_use]
    pub fn holds_driver(&self) -> bool {
        self.driver.is_some()
    }

    /// Point-in-time status
    #[must_use]
    pub fn status(&self) -> AgentStatus {
        status_of(&self.identity, &self.controls.liveness)
    }

    /// Ask the loop to exit at its next check
    pub fn request_stop(&self) {
        self.controls.request_stop();
    }

    /// Close the driver if the agent still holds it
    ///
    /// Idempotent. A close failure is logged; the driver is gone either way.
    pub async fn release(&mut self) {
        let Some(mut driver) = self.driver.take() else {
            return;
        };
        match driver.close().await {
            Ok(()) => log::debug!("[{}] Session released", self.identity.name),
            Err(e) => log::warn!("[{}] Error releasing session: {}", self.identity.name, e),
        }
    }

    /// Enter `Stopped`, record why, and release the driver
    pub(crate) async fn stop(&mut self, failure: Option<String>) {
        self.controls.liveness.set_active(false);
        if let Some(reason) = failure {
            self.controls.liveness.record_failure(reason);
        }
        self.transition(AgentPhase::Stopped);
        self.release().await;
        log::info!("[{}] Agent stopped", self.identity.name);
    }

    /// Move to `next` if the lifecycle allows it
    pub(crate) fn transition(&self, next: AgentPhase) -> bool {
        let current = self.phase();
        if current == next {
            return true;
        }
        if !current.can_transition_to(next) {
            log::debug!(
                "[{}] Ignoring transition {:?} -> {:?}",
                self.identity.name,
                current,
                next
            );
            return false;
        }
        self.controls.liveness.set_phase(next);
        true
    }

    pub(crate) fn name(&self) -> &str {
        self.identity.name.as_str()
    }

    pub(crate) fn driver_mut(&mut self) -> Result<&mut D> {
        self.driver
            .as_mut()
            .ok_or_else(|| FleetError::no_session(self.identity.name.as_str()))
    }
}

/// Build an [`AgentStatus`] from an identity and its liveness
#[must_use]
pub fn status_of(identity: &AgentIdentity, liveness: &AgentLiveness) -> AgentStatus {
    AgentStatus {
        name: identity.name.to_string(),
        gender: identity.gender,
        age: identity.age,
        phase: liveness.phase(),
        active: liveness.is_active(),
        responses_sent: liveness.responses_sent(),
        questions_asked: liveness.questions_asked(),
        last_failure: liveness.last_failure(),
    }
}
