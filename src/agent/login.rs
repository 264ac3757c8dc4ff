//! Authentication flow

use super::Agent;
use crate::config::secs;
use crate::driver::SessionDriver;
use crate::error::{FleetError, Result};
use crate::types::AgentPhase;

impl<D: SessionDriver> Agent<D> {
    /// Log in to the chat service
    ///
    /// Navigates to the service, fills name, gender and age, submits, and
    /// waits for the landing marker. On success the agent is `Monitoring`
    /// and active. On any failure it is `Stopped`, inactive, and its driver
    /// has been released. A stop request that lands while logging in counts
    /// as a failure.
    ///
    /// # Errors
    /// Returns [`FleetError::AuthenticationFailed`] if login did not complete
    pub async fn authenticate(&mut self) -> Result<()> {
        if !self.transition(AgentPhase::Authenticating) {
            return Err(FleetError::authentication_failed(
                self.name(),
                format!("cannot log in from {:?}", self.phase()),
            ));
        }
        log::info!("[{}] Logging in", self.name());

        let mut outcome = self.submit_login().await;
        if outcome.is_ok() && self.controls.cancel.is_cancelled() {
            outcome = Err(FleetError::authentication_failed(
                self.name(),
                "stop requested during login",
            ));
        }
        match outcome {
            Ok(()) => {
                self.controls.liveness.set_active(true);
                self.transition(AgentPhase::Monitoring);
                log::info!("[{}] Logged in successfully", self.name());
                Ok(())
            }
            Err(e) => {
                let error = match e {
                    FleetError::AuthenticationFailed { .. } => e,
                    other => FleetError::authentication_failed(self.name(), other.to_string()),
                };
                log::error!("[{}] Login failed: {}", self.name(), error);
                self.stop(Some(error.to_string())).await;
                Err(error)
            }
        }
    }

    async fn submit_login(&mut self) -> Result<()> {
        let config = std::sync::Arc::clone(&self.config);
        let selectors = &config.selectors;
        let timeout = secs(config.timeouts.login_secs);
        let name = self.identity.name.to_string();
        let gender = self.identity.gender;
        let age = self.identity.age.to_string();

        self.driver_mut()?.open(&config.service_url).await?;

        for (field, selector) in [
            ("name field", &selectors.username),
            ("gender field", &selectors.gender),
            ("age field", &selectors.age),
        ] {
            if self.wait(selector, timeout).await?.is_none() {
                return Err(FleetError::authentication_failed(&name, format!("{field} not found")));
            }
        }

        let driver = self.driver_mut()?;
        driver.fill(&selectors.username, &name).await?;
        driver.select_option(&selectors.gender, gender.as_str()).await?;
        driver.fill(&selectors.age, &age).await?;

        let submit = self
            .wait(&selectors.submit, timeout)
            .await?
            .ok_or_else(|| FleetError::authentication_failed(&name, "submit button not found"))?;
        self.driver_mut()?.click(&submit).await?;

        if self.wait(&selectors.chat_surface, timeout).await?.is_none() {
            return Err(FleetError::authentication_failed(&name, "landing page never appeared"));
        }
        Ok(())
    }
}
