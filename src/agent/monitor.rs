//! Notification polling loop

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use super::Agent;
use crate::config::{ProactiveMode, secs};
use crate::driver::SessionDriver;
use crate::error::Result;
use crate::types::AgentPhase;

impl<D: SessionDriver> Agent<D> {
    /// Monitor notifications until stopped, then hand the agent back
    ///
    /// Each pass checks the chat surface (refreshing if it was lost), opens
    /// the notification panel and answers every unread conversation. Errors
    /// that leave the driver unusable stop the agent; anything else is
    /// logged and the loop carries on after a short back-off. The driver
    /// has been released by the time this returns.
    pub async fn run(mut self) -> Self {
        if !self.is_active() || self.phase() != AgentPhase::Monitoring {
            log::warn!("[{}] Not logged in, nothing to monitor", self.name());
            self.stop(None).await;
            return self;
        }

        log::info!("[{}] Started monitoring chat", self.name());
        while self.is_active() {
            let pass = self.monitor_once().await;
            match pass {
                Ok(()) => {}
                Err(e) if e.is_fatal() => {
                    log::error!("[{}] Session lost: {}", self.name(), e);
                    self.stop(Some(e.to_string())).await;
                    return self;
                }
                Err(e) => {
                    log::warn!("[{}] Error in monitoring loop: {}", self.name(), e);
                    let backoff = secs(self.config.pacing.error_backoff_secs);
                    self.pause(backoff).await;
                }
            }
        }

        self.stop(None).await;
        self
    }

    /// One pass of the monitoring loop
    pub(crate) async fn monitor_once(&mut self) -> Result<()> {
        let config = Arc::clone(&self.config);
        let selectors = &config.selectors;
        let timeouts = &config.timeouts;
        let pacing = &config.pacing;

        let surface = self
            .wait(&selectors.chat_surface, secs(timeouts.chat_surface_secs))
            .await?;
        // A cancelled wait reads as absence; only a live agent refreshes.
        if !self.is_active() {
            return Ok(());
        }
        if surface.is_none() {
            log::warn!("[{}] Chat surface lost, refreshing page", self.name());
            self.driver_mut()?.refresh().await?;
            self.open_conversation = None;
            self.pause(secs(pacing.refresh_settle_secs)).await;
            return Ok(());
        }

        let bell = self
            .wait(&selectors.notification_bell, secs(timeouts.bell_secs))
            .await?;
        let Some(bell) = bell else {
            let idle = self.policy.jitter(&pacing.idle_poll);
            return self.idle_tick(idle).await;
        };

        self.driver_mut()?.click(&bell).await?;
        log::debug!("[{}] Opened notifications", self.name());
        if !self.pause(secs(pacing.panel_settle_secs)).await {
            return Ok(());
        }

        let first = self
            .wait(&selectors.unread_entry, secs(timeouts.panel_secs))
            .await?;
        if !self.is_active() {
            return Ok(());
        }
        let entries = if first.is_some() {
            self.driver_mut()?.list_elements(&selectors.unread_entry).await?
        } else {
            Vec::new()
        };

        if entries.is_empty() {
            log::debug!("[{}] No unread messages", self.name());
            let closed = self.driver_mut()?.click(&bell).await;
            if let Err(e) = closed {
                if e.is_fatal() {
                    return Err(e);
                }
                log::debug!("[{}] Could not close notifications: {}", self.name(), e);
            }
            return self.idle_tick(secs(pacing.empty_panel_secs)).await;
        }

        log::info!("[{}] {} unread conversation(s)", self.name(), entries.len());
        self.transition(AgentPhase::Responding);
        for entry in &entries {
            if !self.is_active() {
                break;
            }
            let outcome = self.respond_to(entry).await;
            if let Err(e) = outcome {
                if e.is_fatal() {
                    return Err(e);
                }
                log::warn!("[{}] Error handling conversation: {}", self.name(), e);
            }
        }
        self.transition(AgentPhase::Monitoring);

        let idle = self.policy.jitter(&pacing.idle_poll);
        self.pause(idle).await;
        Ok(())
    }

    /// Nothing to answer: maybe ask a question, then wait `rest`
    async fn idle_tick(&mut self, rest: Duration) -> Result<()> {
        if !self.is_active() {
            return Ok(());
        }

        if self.config.conversation.proactive_questions == ProactiveMode::Idle
            && let Some(question) = self
                .policy
                .should_ask_question(&mut self.state, Instant::now())
        {
            self.controls.liveness.record_question();
            log::info!(
                "[{}] Asking about {}: {}",
                self.name(),
                question.topic,
                question.text
            );
            let delivered = self.deliver_question(&question.text).await;
            match delivered {
                Ok(true) => {}
                Ok(false) => {
                    log::debug!("[{}] No open conversation, question not sent", self.name());
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => log::warn!("[{}] Could not send question: {}", self.name(), e),
            }
        }

        self.pause(rest).await;
        Ok(())
    }
}
