//! W3C WebDriver session driver
//!
//! Drives a real browser through a chromedriver-compatible HTTP endpoint.
//! Each agent gets its own browser session; nothing is shared between
//! sessions except the pooled HTTP client.

mod protocol;
mod session;

pub use session::WebDriverSession;

use std::time::Duration;

use crate::config::{FleetConfig, secs};
use crate::error::{FleetError, Result};
use crate::types::AgentIdentity;

use super::DriverFactory;

/// Creates one browser session per agent
#[derive(Debug, Clone)]
pub struct WebDriverFactory {
    http: reqwest::Client,
    endpoint: String,
    headless: bool,
}

impl WebDriverFactory {
    /// Factory targeting `endpoint`
    ///
    /// Every HTTP request to the endpoint gives up after `request_timeout`,
    /// so a hung browser cannot block an agent's stop.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built
    pub fn new(endpoint: impl Into<String>, headless: bool, request_timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| FleetError::driver_unavailable(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            headless,
        })
    }

    /// Factory configured from `webdriver_url`, `headless` and
    /// `timeouts.request_secs`
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built
    pub fn from_config(config: &FleetConfig) -> Result<Self> {
        Self::new(
            config.webdriver_url.clone(),
            config.headless,
            secs(config.timeouts.request_secs),
        )
    }
}

impl DriverFactory for WebDriverFactory {
    type Driver = WebDriverSession;

    async fn create(&self, identity: &AgentIdentity) -> Result<WebDriverSession> {
        log::debug!("[{}] Starting browser session", identity.name);
        WebDriverSession::start(self.http.clone(), &self.endpoint, self.headless).await
    }
}
