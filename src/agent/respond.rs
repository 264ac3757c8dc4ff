//! Answering unread conversations

use std::sync::Arc;
use std::time::Duration;

use super::Agent;
use crate::config::secs;
use crate::driver::{KeyInput, SessionDriver};
use crate::error::{FleetError, Result};
use crate::types::ElementId;

/// Shown when an entry carries no readable sender
const UNKNOWN_SENDER: &str = "unknown";

impl<D: SessionDriver> Agent<D> {
    /// Open one unread entry and answer every message not seen before
    ///
    /// Returns how many replies went out.
    pub(crate) async fn respond_to(&mut self, entry: &ElementId) -> Result<usize> {
        let config = Arc::clone(&self.config);
        let selectors = &config.selectors;

        let counterparty = self.sender_of(entry).await?;
        log::info!("[{}] Found unread message from {}", self.name(), counterparty);

        self.driver_mut()?.click(entry).await?;
        self.open_conversation = Some(counterparty.clone());
        if !self.pause(secs(config.pacing.conversation_settle_secs)).await {
            return Ok(0);
        }

        if self
            .wait(&selectors.chat_message, secs(config.timeouts.messages_secs))
            .await?
            .is_none()
        {
            log::debug!("[{}] Conversation with {} is empty", self.name(), counterparty);
            return Ok(0);
        }

        let elements = self.driver_mut()?.list_elements(&selectors.chat_message).await?;
        let mut texts = Vec::with_capacity(elements.len());
        for element in &elements {
            let read = self.driver_mut()?.read_text(element).await;
            match read {
                Ok(text) => texts.push(text),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => log::warn!("[{}] Skipping unreadable message: {}", self.name(), e),
            }
        }

        self.answer_messages(&counterparty, texts).await
    }

    /// Reply once to each new message in `texts`, in order
    pub(crate) async fn answer_messages(&mut self, counterparty: &str, texts: Vec<String>) -> Result<usize> {
        let mut replies = 0;
        let mut echoes = self.state.echo_filter(counterparty);
        for text in texts {
            if !self.is_active() {
                break;
            }
            if echoes.is_echo(&text) || !self.state.register_inbound(&text) {
                continue;
            }
            log::info!(
                "[{}] Received new message from {}: {}",
                self.name(),
                counterparty,
                text.trim()
            );

            let reply = self.policy.generate_response(&text);
            let sent = self.send_text(counterparty, &reply).await;
            match sent {
                Ok(true) => {
                    replies += 1;
                    self.controls.liveness.record_response();
                    log::info!("[{}] Sent response to {}: {}", self.name(), counterparty, reply);
                    let pause = self.policy.jitter(&self.config.conversation.post_send_delay);
                    if !self.pause(pause).await {
                        break;
                    }
                }
                Ok(false) => break,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    log::warn!(
                        "[{}] Error replying to {}: {}",
                        self.name(),
                        counterparty,
                        e
                    );
                }
            }
        }
        Ok(replies)
    }

    /// Type a question into the open conversation, if there is one
    pub(crate) async fn deliver_question(&mut self, text: &str) -> Result<bool> {
        let Some(counterparty) = self.open_conversation.clone() else {
            return Ok(false);
        };
        let selector = self.config.selectors.message_input.clone();
        if self.wait(&selector, Duration::ZERO).await?.is_none() {
            return Ok(false);
        }
        self.send_text(&counterparty, text).await
    }

    /// Type `text` after a simulated delay and submit it
    ///
    /// Uses the send button when present and Enter otherwise. Returns
    /// `false` if the agent was stopped before anything was submitted.
    async fn send_text(&mut self, counterparty: &str, text: &str) -> Result<bool> {
        let config = Arc::clone(&self.config);
        let selectors = &config.selectors;

        let typing = self.policy.jitter(&config.conversation.typing_delay);
        if !self.pause(typing).await {
            return Ok(false);
        }

        let input = self
            .wait(&selectors.message_input, secs(config.timeouts.input_secs))
            .await?
            .ok_or_else(|| FleetError::element_missing("message input"))?;

        let driver = self.driver_mut()?;
        driver.clear(&input).await?;
        driver.send_keys(&input, KeyInput::Text(text.to_string())).await?;

        let button = self
            .wait(&selectors.send_button, secs(config.timeouts.send_button_secs))
            .await?;
        match button {
            Some(button) => self.driver_mut()?.click(&button).await?,
            None => {
                log::debug!("[{}] No send button, pressing Enter", self.name());
                self.driver_mut()?.send_keys(&input, KeyInput::Enter).await?;
            }
        }

        self.state.remember_outbound(counterparty, text);
        Ok(true)
    }

    async fn sender_of(&mut self, entry: &ElementId) -> Result<String> {
        let selector = self.config.selectors.unread_sender.clone();
        let Some(sender) = self.driver_mut()?.find_within(entry, &selector).await? else {
            return Ok(UNKNOWN_SENDER.to_string());
        };
        let name = self.driver_mut()?.read_text(&sender).await;
        match name {
            Ok(name) if !name.trim().is_empty() => Ok(name.trim().to_string()),
            Ok(_) => Ok(UNKNOWN_SENDER.to_string()),
            Err(e) if e.is_fatal() => Err(e),
            Err(_) => Ok(UNKNOWN_SENDER.to_string()),
        }
    }
}
