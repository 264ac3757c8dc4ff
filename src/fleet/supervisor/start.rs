//! Launching agents

use std::sync::Arc;

use crate::agent::Agent;
use crate::driver::DriverFactory;
use crate::error::{FleetError, Result};

use super::core::FleetSupervisor;

impl<F: DriverFactory> FleetSupervisor<F> {
    /// Authenticate every agent and launch the ones that logged in
    ///
    /// Agents are started one after another. A failure to acquire a driver
    /// or to log in is logged and recorded on that agent, which stays
    /// inactive; the next agent is started regardless. Agents already
    /// attempted are skipped, so a second call only picks up stragglers
    /// left by an interrupted first call.
    ///
    /// Returns how many agents are running afterwards.
    ///
    /// # Errors
    /// Returns error if shutdown was already requested
    pub async fn start_all(&self) -> Result<usize> {
        if self.is_shutting_down() {
            return Err(FleetError::invalid_state("fleet is shutting down"));
        }

        let total = self.len();
        log::info!("Starting {} agents", total);

        for index in 0..total {
            if self.is_shutting_down() {
                log::info!("Shutdown requested, not starting remaining agents");
                break;
            }

            // Copy out what the launch needs; the roster lock is never held
            // across an await.
            let pending = {
                let mut roster = self.roster.lock();
                roster.get_mut(index).and_then(|slot| {
                    if slot.attempted {
                        return None;
                    }
                    slot.attempted = true;
                    Some((slot.identity.clone(), slot.seed, slot.controls.clone()))
                })
            };
            let Some((identity, seed, controls)) = pending else {
                continue;
            };

            let driver = match self.factory.create(&identity).await {
                Ok(driver) => driver,
                Err(e) => {
                    log::error!("[{}] Could not acquire a session: {}", identity.name, e);
                    controls.liveness.record_failure(e.to_string());
                    continue;
                }
            };

            let mut agent = Agent::new(
                identity,
                driver,
                Arc::clone(&self.config),
                Arc::clone(&self.catalog),
                seed,
            )
            .with_controls(controls);

            if agent.authenticate().await.is_err() {
                continue;
            }

            let handle = tokio::spawn(agent.run());
            if let Some(slot) = self.roster.lock().get_mut(index) {
                slot.handle = Some(handle);
            }
        }

        let status = self.status_snapshot();
        log::info!("{}/{} agents running", status.active, status.total);
        Ok(status.active)
    }
}
