//! Cooperative shutdown

use futures::future::join_all;

use crate::driver::DriverFactory;

use super::core::FleetSupervisor;

impl<F: DriverFactory> FleetSupervisor<F> {
    /// Stop every agent and release every driver
    ///
    /// Clears each agent's `active` flag and cancels its pauses, joins each
    /// agent's task, and only then releases that agent's driver. Returns
    /// once every launched agent has been joined and released. Idempotent.
    pub async fn stop_all(&self) {
        log::info!("Stopping all agents...");
        self.shutdown.cancel();

        let handles = {
            let mut roster = self.roster.lock();
            roster
                .iter_mut()
                .filter_map(|slot| {
                    slot.controls.request_stop();
                    slot.handle
                        .take()
                        .map(|handle| (slot.identity.name.clone(), handle))
                })
                .collect::<Vec<_>>()
        };

        let joined = join_all(
            handles
                .into_iter()
                .map(|(name, handle)| async move { (name, handle.await) }),
        )
        .await;

        for (name, outcome) in joined {
            match outcome {
                Ok(mut agent) => agent.release().await,
                Err(e) => log::error!("[{}] Agent task ended abnormally: {}", name, e),
            }
        }

        log::info!("All agents stopped");
    }
}
