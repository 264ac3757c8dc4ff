//! Interruptible pauses and waits

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::Agent;
use crate::driver::{Selector, SessionDriver};
use crate::error::Result;
use crate::types::ElementId;

/// Sleep for `duration` unless `cancel` fires first
///
/// Returns `true` if the full pause elapsed. A zero pause still yields to
/// the scheduler so a tight loop cannot starve other agents.
pub async fn interruptible_sleep(cancel: &CancellationToken, duration: Duration) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    if duration.is_zero() {
        tokio::task::yield_now().await;
        return !cancel.is_cancelled();
    }
    tokio::select! {
        () = cancel.cancelled() => false,
        () = tokio::time::sleep(duration) => true,
    }
}

impl<D: SessionDriver> Agent<D> {
    /// Pause, returning whether the agent should carry on afterwards
    pub(crate) async fn pause(&self, duration: Duration) -> bool {
        interruptible_sleep(&self.controls.cancel, duration).await && self.is_active()
    }

    /// Bounded wait for an element; a stop request reads as absence
    pub(crate) async fn wait(&mut self, selector: &Selector, timeout: Duration) -> Result<Option<ElementId>> {
        let cancel = self.controls.cancel.clone();
        let driver = self.driver_mut()?;
        tokio::select! {
            () = cancel.cancelled() => Ok(None),
            found = driver.wait_for(selector, timeout) => found,
        }
    }
}
