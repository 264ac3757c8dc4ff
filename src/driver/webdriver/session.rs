//! One browser session speaking W3C WebDriver over HTTP

use std::time::Duration;

use reqwest::Method;
use serde_json::{Value, json};
use tokio::time::Instant;

use super::protocol::{
    ENTER_KEY, classify_error, element_from, elements_from, locator_body, new_session_body,
};
use crate::driver::{KeyInput, Selector, SessionDriver};
use crate::error::{FleetError, Result};
use crate::types::ElementId;

/// Interval between presence checks inside a bounded wait
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Browser session handle
///
/// Dropping an unclosed session schedules a best-effort `DELETE` on the
/// current runtime; call [`SessionDriver::close`] for a deterministic release.
pub struct WebDriverSession {
    http: reqwest::Client,
    endpoint: String,
    session_id: Option<String>,
}

impl WebDriverSession {
    /// Create a new browser session at `endpoint`
    ///
    /// # Errors
    /// Returns error if the endpoint is unreachable or refuses the session
    pub async fn start(http: reqwest::Client, endpoint: &str, headless: bool) -> Result<Self> {
        let response = http
            .post(format!("{endpoint}/session"))
            .json(&new_session_body(headless))
            .send()
            .await
            .map_err(|e| FleetError::driver_unavailable(format!("WebDriver unreachable: {e}")))?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| FleetError::driver_unavailable(format!("bad new-session reply: {e}")))?;
        let value = body.get("value").cloned().unwrap_or(Value::Null);

        if !status.is_success() {
            return Err(FleetError::driver_unavailable(classify_error(value).to_string()));
        }

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| FleetError::driver_unavailable("new-session reply has no sessionId"))?
            .to_string();

        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
            session_id: Some(session_id),
        })
    }

    /// Session identifier, while the session is open
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let session_id = self
            .session_id
            .as_deref()
            .ok_or_else(|| FleetError::driver_unavailable("session already closed"))?;
        let url = format!("{}/session/{session_id}{path}", self.endpoint);

        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FleetError::driver_interaction(format!("WebDriver request timed out: {e}"))
                } else {
                    FleetError::driver_unavailable(format!("WebDriver transport: {e}"))
                }
            })?;
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| FleetError::driver_interaction(format!("undecodable reply: {e}")))?;
        let value = body.get("value").cloned().unwrap_or(Value::Null);

        if status.is_success() {
            Ok(value)
        } else {
            Err(classify_error(value))
        }
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value> {
        self.command(Method::POST, path, Some(body)).await
    }

    async fn find(&self, parent: Option<&ElementId>, selector: &Selector) -> Result<Option<ElementId>> {
        let path = match parent {
            Some(parent) => format!("/element/{}/element", parent.as_str()),
            None => "/element".to_string(),
        };
        match self.post(&path, locator_body(selector)).await {
            Ok(value) => Ok(element_from(&value)),
            Err(FleetError::ElementMissing(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn require(&self, selector: &Selector) -> Result<ElementId> {
        self.find(None, selector)
            .await?
            .ok_or_else(|| FleetError::element_missing(selector.to_string()))
    }

    async fn type_text(&self, element: &ElementId, text: &str) -> Result<()> {
        self.post(
            &format!("/element/{}/value", element.as_str()),
            json!({ "text": text }),
        )
        .await
        .map(|_| ())
    }
}

impl SessionDriver for WebDriverSession {
    async fn open(&mut self, url: &str) -> Result<()> {
        self.post("/url", json!({ "url": url })).await.map(|_| ())
    }

    async fn wait_for(&mut self, selector: &Selector, timeout: Duration) -> Result<Option<ElementId>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(element) = self.find(None, selector).await? {
                return Ok(Some(element));
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(POLL_INTERVAL.min(deadline - now)).await;
        }
    }

    async fn find_within(
        &mut self,
        parent: &ElementId,
        selector: &Selector,
    ) -> Result<Option<ElementId>> {
        self.find(Some(parent), selector).await
    }

    async fn fill(&mut self, selector: &Selector, text: &str) -> Result<()> {
        let element = self.require(selector).await?;
        self.type_text(&element, text).await
    }

    async fn select_option(&mut self, selector: &Selector, value: &str) -> Result<()> {
        let select = self.require(selector).await?;
        let option = Selector::css(format!("option[value='{value}']"));
        let option = self
            .find(Some(&select), &option)
            .await?
            .ok_or_else(|| FleetError::element_missing(format!("{selector} option {value}")))?;
        self.click(&option).await
    }

    async fn click(&mut self, element: &ElementId) -> Result<()> {
        self.post(&format!("/element/{}/click", element.as_str()), json!({}))
            .await
            .map(|_| ())
    }

    async fn clear(&mut self, element: &ElementId) -> Result<()> {
        self.post(&format!("/element/{}/clear", element.as_str()), json!({}))
            .await
            .map(|_| ())
    }

    async fn read_text(&mut self, element: &ElementId) -> Result<String> {
        let value = self
            .command(Method::GET, &format!("/element/{}/text", element.as_str()), None)
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn list_elements(&mut self, selector: &Selector) -> Result<Vec<ElementId>> {
        let value = self.post("/elements", locator_body(selector)).await?;
        Ok(elements_from(&value))
    }

    async fn send_keys(&mut self, element: &ElementId, input: KeyInput) -> Result<()> {
        match input {
            KeyInput::Text(text) => self.type_text(element, &text).await,
            KeyInput::Enter => self.type_text(element, ENTER_KEY).await,
        }
    }

    async fn refresh(&mut self) -> Result<()> {
        self.post("/refresh", json!({})).await.map(|_| ())
    }

    async fn close(&mut self) -> Result<()> {
        let Some(session_id) = self.session_id.take() else {
            return Ok(());
        };
        let url = format!("{}/session/{session_id}", self.endpoint);
        match self.http.delete(url).send().await {
            Ok(_) => Ok(()),
            Err(e) => {
                // The browser may already be gone; the session is released either way.
                log::warn!("Failed to delete WebDriver session {session_id}: {e}");
                Ok(())
            }
        }
    }
}

impl Drop for WebDriverSession {
    fn drop(&mut self) {
        let Some(session_id) = self.session_id.take() else {
            return;
        };
        let url = format!("{}/session/{session_id}", self.endpoint);
        let http = self.http.clone();
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                let _ = http.delete(url).send().await;
            });
        }
    }
}
