//! Fleet status snapshots

use chrono::Utc;

use crate::agent::status_of;
use crate::driver::DriverFactory;
use crate::types::FleetStatus;

use super::core::FleetSupervisor;

impl<F: DriverFactory> FleetSupervisor<F> {
    /// Point-in-time counts of active and total agents, with per-agent detail
    ///
    /// Only reads shared liveness; never changes agent state.
    #[must_use]
    pub fn status_snapshot(&self) -> FleetStatus {
        let agents = self
            .roster
            .lock()
            .iter()
            .map(|slot| status_of(&slot.identity, &slot.controls.liveness))
            .collect::<Vec<_>>();

        FleetStatus {
            run_id: self.run_id.clone(),
            taken_at: Utc::now(),
            active: agents.iter().filter(|agent| agent.active).count(),
            total: agents.len(),
            agents,
        }
    }

    /// Agents whose loop is live
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.roster
            .lock()
            .iter()
            .filter(|slot| slot.controls.liveness.is_active())
            .count()
    }
}
