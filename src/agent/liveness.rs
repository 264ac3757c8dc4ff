//! Observable per-agent liveness
//!
//! The agent's loop is the only writer of phase and counters. The
//! supervisor reads them for status snapshots and clears `active` to ask
//! the loop to exit.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::types::AgentPhase;

/// Liveness flag, phase and counters of one agent
#[derive(Debug)]
pub struct AgentLiveness {
    active: AtomicBool,
    phase: AtomicU8,
    responses_sent: AtomicU64,
    questions_asked: AtomicU64,
    last_failure: Mutex<Option<String>>,
}

impl Default for AgentLiveness {
    fn default() -> Self {
        Self {
            active: AtomicBool::new(false),
            phase: AtomicU8::new(AgentPhase::Unauthenticated as u8),
            responses_sent: AtomicU64::new(0),
            questions_asked: AtomicU64::new(0),
            last_failure: Mutex::new(None),
        }
    }
}

impl AgentLiveness {
    /// Whether the monitoring loop should keep running
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub(crate) fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> AgentPhase {
        AgentPhase::from_u8(self.phase.load(Ordering::SeqCst))
    }

    pub(crate) fn set_phase(&self, phase: AgentPhase) {
        self.phase.store(phase as u8, Ordering::SeqCst);
    }

    /// Responses sent so far
    #[must_use]
    pub fn responses_sent(&self) -> u64 {
        self.responses_sent.load(Ordering::SeqCst)
    }

    pub(crate) fn record_response(&self) {
        self.responses_sent.fetch_add(1, Ordering::SeqCst);
    }

    /// Proactive questions asked so far
    #[must_use]
    pub fn questions_asked(&self) -> u64 {
        self.questions_asked.load(Ordering::SeqCst)
    }

    pub(crate) fn record_question(&self) {
        self.questions_asked.fetch_add(1, Ordering::SeqCst);
    }

    /// Why the agent stopped on its own, if it did
    #[must_use]
    pub fn last_failure(&self) -> Option<String> {
        self.last_failure.lock().clone()
    }

    pub(crate) fn record_failure(&self, reason: impl Into<String>) {
        *self.last_failure.lock() = Some(reason.into());
    }
}

/// Handles the supervisor keeps to observe and stop one agent
#[derive(Debug, Clone, Default)]
pub struct AgentControls {
    /// Shared liveness
    pub liveness: Arc<AgentLiveness>,
    /// Interrupts the agent's pauses and waits
    pub cancel: CancellationToken,
}

impl AgentControls {
    /// Controls whose cancellation follows `parent`
    #[must_use]
    pub fn child_of(parent: &CancellationToken) -> Self {
        Self {
            liveness: Arc::new(AgentLiveness::default()),
            cancel: parent.child_token(),
        }
    }

    /// Ask the agent's loop to exit at its next check
    pub fn request_stop(&self) {
        self.liveness.set_active(false);
        self.cancel.cancel();
    }
}
