//! Scripted in-memory chat service
//!
//! [`ScriptedDriver`] implements [`SessionDriver`] against a [`ChatScript`]
//! instead of a browser. It understands the same [`ChatSelectors`] the real
//! UI uses, so agents run unmodified against it. Tests inspect the script
//! afterwards (refresh calls, sent messages, login form) and the
//! [`SessionLedger`] to account for every opened session.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use super::{ChatSelectors, DriverFactory, KeyInput, Selector, SessionDriver};
use crate::error::{FleetError, Result};
use crate::types::{AgentIdentity, ElementId};

const USERNAME: &str = "username";
const GENDER: &str = "gender";
const AGE: &str = "age";
const SUBMIT: &str = "submit";
const SURFACE: &str = "chat-surface";
const BELL: &str = "bell";
const INPUT: &str = "message-input";
const SEND: &str = "send";

// ============================================================================
// LEDGER
// ============================================================================

/// Counts sessions across every driver a factory has handed out
#[derive(Debug, Default)]
pub struct SessionLedger {
    opened: AtomicUsize,
    closed: AtomicUsize,
    dropped_open: AtomicUsize,
    used_after_close: AtomicUsize,
}

impl SessionLedger {
    /// Sessions created
    #[must_use]
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Sessions released through `close()`
    #[must_use]
    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// Sessions dropped without `close()`
    #[must_use]
    pub fn dropped_open(&self) -> usize {
        self.dropped_open.load(Ordering::SeqCst)
    }

    /// Calls made on a driver after it was closed
    #[must_use]
    pub fn used_after_close(&self) -> usize {
        self.used_after_close.load(Ordering::SeqCst)
    }

    /// Sessions neither closed nor dropped
    #[must_use]
    pub fn live(&self) -> usize {
        self.opened()
            .saturating_sub(self.closed())
            .saturating_sub(self.dropped_open())
    }
}

// ============================================================================
// SCRIPT
// ============================================================================

/// A message the agent submitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    /// Counterparty whose conversation was open, if any
    pub to: Option<String>,
    /// Submitted text
    pub text: String,
}

#[derive(Debug, Default)]
struct ScriptState {
    reject_login: bool,
    logged_in: bool,
    landed: bool,
    surface_presence: VecDeque<bool>,
    fail_after_ops: Option<usize>,
    ops: usize,
    send_button: bool,
    echo_sent: bool,
    next_entry: usize,
    // counterparty -> every message shown in their conversation
    history: BTreeMap<String, Vec<String>>,
    // entry id -> counterparty, for conversations with unread messages
    unread: BTreeMap<usize, String>,
    panel_open: bool,
    open_conversation: Option<String>,
    input_buffer: String,
    form: HashMap<String, String>,
    opened_urls: Vec<String>,
    refresh_calls: usize,
    sent: Vec<SentMessage>,
    closed: bool,
}

/// Behaviour and observable state of one simulated session
///
/// Build with the consuming methods, share with [`Arc`], and inspect after
/// the agent has run.
#[derive(Debug)]
pub struct ChatScript {
    state: Mutex<ScriptState>,
}

impl Default for ChatScript {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatScript {
    /// A session that accepts login and always shows the chat surface
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ScriptState {
                send_button: true,
                ..ScriptState::default()
            }),
        }
    }

    /// Never show the post-login landing marker
    #[must_use]
    pub fn reject_login(self) -> Self {
        self.state.lock().reject_login = true;
        self
    }

    /// Chat surface presence for successive checks after the landing check
    ///
    /// Once the sequence is exhausted the surface is present.
    #[must_use]
    pub fn with_surface_sequence(self, presence: impl IntoIterator<Item = bool>) -> Self {
        self.state.lock().surface_presence = presence.into_iter().collect();
        self
    }

    /// Queue an unread conversation
    #[must_use]
    pub fn with_conversation<I, S>(self, from: &str, messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for message in messages {
            self.push_message(from, message);
        }
        self
    }

    /// Fail with an unusable-driver error once `ops` calls have been made
    #[must_use]
    pub fn fail_after(self, ops: usize) -> Self {
        self.state.lock().fail_after_ops = Some(ops);
        self
    }

    /// Hide the send button so messages go out with Enter
    #[must_use]
    pub fn without_send_button(self) -> Self {
        self.state.lock().send_button = false;
        self
    }

    /// Show the agent's own submitted messages in the open conversation
    #[must_use]
    pub fn with_echo(self) -> Self {
        self.state.lock().echo_sent = true;
        self
    }

    /// Deliver a new message from `from`, raising a notification
    pub fn push_message(&self, from: &str, text: impl Into<String>) {
        let mut state = self.state.lock();
        state
            .history
            .entry(from.to_string())
            .or_default()
            .push(text.into());
        if !state.unread.values().any(|name| name == from) {
            let id = state.next_entry;
            state.next_entry += 1;
            state.unread.insert(id, from.to_string());
        }
    }

    /// Number of `refresh()` calls so far
    #[must_use]
    pub fn refresh_calls(&self) -> usize {
        self.state.lock().refresh_calls
    }

    /// Messages submitted so far
    #[must_use]
    pub fn sent(&self) -> Vec<SentMessage> {
        self.state.lock().sent.clone()
    }

    /// Value typed into a login form field (`username`, `gender`, `age`)
    #[must_use]
    pub fn form_value(&self, field: &str) -> Option<String> {
        self.state.lock().form.get(field).cloned()
    }

    /// URLs navigated to
    #[must_use]
    pub fn opened_urls(&self) -> Vec<String> {
        self.state.lock().opened_urls.clone()
    }

    /// Whether the landing marker has been reached
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.state.lock().logged_in
    }

    /// Whether the session has been closed
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Conversations still marked unread
    #[must_use]
    pub fn unread_count(&self) -> usize {
        self.state.lock().unread.len()
    }
}

// ============================================================================
// DRIVER
// ============================================================================

/// [`SessionDriver`] backed by a [`ChatScript`]
pub struct ScriptedDriver {
    script: Arc<ChatScript>,
    selectors: ChatSelectors,
    ledger: Arc<SessionLedger>,
    closed: bool,
}

impl ScriptedDriver {
    /// Open a scripted session, recording it in `ledger`
    #[must_use]
    pub fn new(
        script: Arc<ChatScript>,
        selectors: ChatSelectors,
        ledger: Arc<SessionLedger>,
    ) -> Self {
        ledger.opened.fetch_add(1, Ordering::SeqCst);
        Self {
            script,
            selectors,
            ledger,
            closed: false,
        }
    }

    /// The script this driver runs against
    #[must_use]
    pub fn script(&self) -> &Arc<ChatScript> {
        &self.script
    }

    /// Count one operation and fail if the script says the driver is gone
    fn tick(&self) -> Result<parking_lot::MutexGuard<'_, ScriptState>> {
        if self.closed {
            self.ledger.used_after_close.fetch_add(1, Ordering::SeqCst);
            return Err(FleetError::driver_unavailable("session already closed"));
        }
        let mut state = self.script.state.lock();
        state.ops += 1;
        if let Some(limit) = state.fail_after_ops
            && state.ops > limit
        {
            return Err(FleetError::driver_unavailable("browser session crashed"));
        }
        Ok(state)
    }

    fn field_name(&self, selector: &Selector) -> Option<&'static str> {
        if *selector == self.selectors.username {
            Some(USERNAME)
        } else if *selector == self.selectors.gender {
            Some(GENDER)
        } else if *selector == self.selectors.age {
            Some(AGE)
        } else {
            None
        }
    }

    fn locate(&self, state: &mut ScriptState, selector: &Selector) -> Option<ElementId> {
        let s = &self.selectors;
        if let Some(field) = self.field_name(selector) {
            return (!state.logged_in).then(|| ElementId::from(field));
        }
        if *selector == s.submit {
            return (!state.logged_in).then(|| ElementId::from(SUBMIT));
        }
        if *selector == s.chat_surface {
            if !state.logged_in {
                return None;
            }
            if !state.landed {
                state.landed = true;
                return Some(ElementId::from(SURFACE));
            }
            let present = state.surface_presence.pop_front().unwrap_or(true);
            return present.then(|| ElementId::from(SURFACE));
        }
        if *selector == s.notification_bell {
            // Toolbar button, present on every logged-in page
            return state.logged_in.then(|| ElementId::from(BELL));
        }
        if *selector == s.unread_entry {
            return self.entries(state).into_iter().next();
        }
        if *selector == s.chat_message {
            return self.messages(state).into_iter().next();
        }
        if *selector == s.message_input {
            return state
                .open_conversation
                .is_some()
                .then(|| ElementId::from(INPUT));
        }
        if *selector == s.send_button {
            return (state.open_conversation.is_some() && state.send_button)
                .then(|| ElementId::from(SEND));
        }
        None
    }

    fn entries(&self, state: &ScriptState) -> Vec<ElementId> {
        if !state.panel_open {
            return Vec::new();
        }
        state
            .unread
            .keys()
            .map(|id| ElementId::new(format!("entry:{id}")))
            .collect()
    }

    fn messages(&self, state: &ScriptState) -> Vec<ElementId> {
        let Some(from) = state.open_conversation.as_ref() else {
            return Vec::new();
        };
        let count = state.history.get(from).map_or(0, Vec::len);
        (0..count)
            .map(|i| ElementId::new(format!("msg:{i}")))
            .collect()
    }

    fn submit_input(state: &mut ScriptState) {
        let text = std::mem::take(&mut state.input_buffer);
        if state.echo_sent
            && let Some(to) = state.open_conversation.clone()
        {
            state.history.entry(to).or_default().push(text.clone());
        }
        state.sent.push(SentMessage {
            to: state.open_conversation.clone(),
            text,
        });
    }
}

fn parse_index(id: &ElementId, prefix: &str) -> Option<usize> {
    id.as_str().strip_prefix(prefix)?.parse().ok()
}

impl SessionDriver for ScriptedDriver {
    async fn open(&mut self, url: &str) -> Result<()> {
        let mut state = self.tick()?;
        state.opened_urls.push(url.to_string());
        state.panel_open = false;
        state.open_conversation = None;
        Ok(())
    }

    async fn wait_for(&mut self, selector: &Selector, _timeout: Duration) -> Result<Option<ElementId>> {
        let mut state = self.tick()?;
        Ok(self.locate(&mut state, selector))
    }

    async fn find_within(
        &mut self,
        parent: &ElementId,
        selector: &Selector,
    ) -> Result<Option<ElementId>> {
        let state = self.tick()?;
        if *selector != self.selectors.unread_sender {
            return Ok(None);
        }
        Ok(parse_index(parent, "entry:")
            .filter(|id| state.unread.contains_key(id))
            .map(|id| ElementId::new(format!("sender:{id}"))))
    }

    async fn fill(&mut self, selector: &Selector, text: &str) -> Result<()> {
        let field = self
            .field_name(selector)
            .ok_or_else(|| FleetError::driver_interaction(format!("cannot fill {selector}")))?;
        let mut state = self.tick()?;
        state.form.insert(field.to_string(), text.to_string());
        Ok(())
    }

    async fn select_option(&mut self, selector: &Selector, value: &str) -> Result<()> {
        if *selector != self.selectors.gender {
            return Err(FleetError::driver_interaction(format!(
                "{selector} is not a select"
            )));
        }
        let mut state = self.tick()?;
        state.form.insert(GENDER.to_string(), value.to_string());
        Ok(())
    }

    async fn click(&mut self, element: &ElementId) -> Result<()> {
        let mut state = self.tick()?;
        match element.as_str() {
            SUBMIT => {
                state.logged_in = !state.reject_login;
                Ok(())
            }
            BELL => {
                state.panel_open = !state.panel_open;
                Ok(())
            }
            SEND => {
                Self::submit_input(&mut state);
                Ok(())
            }
            _ => {
                let id = parse_index(element, "entry:").ok_or_else(|| {
                    FleetError::driver_interaction(format!("element {} not clickable", element.as_str()))
                })?;
                let from = state.unread.remove(&id).ok_or_else(|| {
                    FleetError::driver_interaction("stale element reference")
                })?;
                state.panel_open = false;
                state.open_conversation = Some(from);
                Ok(())
            }
        }
    }

    async fn clear(&mut self, element: &ElementId) -> Result<()> {
        let mut state = self.tick()?;
        if element.as_str() == INPUT {
            state.input_buffer.clear();
        }
        Ok(())
    }

    async fn read_text(&mut self, element: &ElementId) -> Result<String> {
        let state = self.tick()?;
        if let Some(id) = parse_index(element, "sender:") {
            return state
                .unread
                .get(&id)
                .cloned()
                .ok_or_else(|| FleetError::driver_interaction("stale element reference"));
        }
        if let Some(i) = parse_index(element, "msg:") {
            return state
                .open_conversation
                .as_ref()
                .and_then(|from| state.history.get(from))
                .and_then(|messages| messages.get(i))
                .cloned()
                .ok_or_else(|| FleetError::driver_interaction("stale element reference"));
        }
        Ok(String::new())
    }

    async fn list_elements(&mut self, selector: &Selector) -> Result<Vec<ElementId>> {
        let mut state = self.tick()?;
        if *selector == self.selectors.unread_entry {
            return Ok(self.entries(&state));
        }
        if *selector == self.selectors.chat_message {
            return Ok(self.messages(&state));
        }
        Ok(self.locate(&mut state, selector).into_iter().collect())
    }

    async fn send_keys(&mut self, element: &ElementId, input: KeyInput) -> Result<()> {
        let mut state = self.tick()?;
        if element.as_str() != INPUT {
            return Err(FleetError::driver_interaction(format!(
                "element {} does not accept input",
                element.as_str()
            )));
        }
        match input {
            KeyInput::Text(text) => state.input_buffer.push_str(&text),
            KeyInput::Enter => Self::submit_input(&mut state),
        }
        Ok(())
    }

    async fn refresh(&mut self) -> Result<()> {
        let mut state = self.tick()?;
        state.refresh_calls += 1;
        state.panel_open = false;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.script.state.lock().closed = true;
        self.ledger.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Drop for ScriptedDriver {
    fn drop(&mut self) {
        if !self.closed {
            self.script.state.lock().closed = true;
            self.ledger.dropped_open.fetch_add(1, Ordering::SeqCst);
        }
    }
}

// ============================================================================
// FACTORY
// ============================================================================

type ScriptTemplate = dyn Fn(&AgentIdentity) -> Option<ChatScript> + Send + Sync;

/// Hands out one [`ScriptedDriver`] per agent
///
/// The template decides each agent's script; returning `None` makes driver
/// acquisition fail for that agent.
pub struct ScriptedFactory {
    selectors: ChatSelectors,
    template: Box<ScriptTemplate>,
    scripts: Mutex<HashMap<String, Arc<ChatScript>>>,
    ledger: Arc<SessionLedger>,
}

impl ScriptedFactory {
    /// Every agent gets a fresh [`ChatScript::new`]
    #[must_use]
    pub fn new(selectors: ChatSelectors) -> Self {
        Self::with_template(selectors, |_| Some(ChatScript::new()))
    }

    /// Choose each agent's script with `template`
    pub fn with_template<F>(selectors: ChatSelectors, template: F) -> Self
    where
        F: Fn(&AgentIdentity) -> Option<ChatScript> + Send + Sync + 'static,
    {
        Self {
            selectors,
            template: Box::new(template),
            scripts: Mutex::new(HashMap::new()),
            ledger: Arc::new(SessionLedger::default()),
        }
    }

    /// Script handed to the agent called `name`
    #[must_use]
    pub fn script_for(&self, name: &str) -> Option<Arc<ChatScript>> {
        self.scripts.lock().get(name).cloned()
    }

    /// Every script handed out so far, keyed by agent name
    #[must_use]
    pub fn scripts(&self) -> Vec<(String, Arc<ChatScript>)> {
        self.scripts
            .lock()
            .iter()
            .map(|(name, script)| (name.clone(), Arc::clone(script)))
            .collect()
    }

    /// Session accounting across all drivers
    #[must_use]
    pub fn ledger(&self) -> Arc<SessionLedger> {
        Arc::clone(&self.ledger)
    }
}

impl DriverFactory for ScriptedFactory {
    type Driver = ScriptedDriver;

    async fn create(&self, identity: &AgentIdentity) -> Result<ScriptedDriver> {
        let script = (self.template)(identity).ok_or_else(|| {
            FleetError::driver_unavailable(format!("no browser available for {}", identity.name))
        })?;
        let script = Arc::new(script);
        self.scripts
            .lock()
            .insert(identity.name.to_string(), Arc::clone(&script));
        Ok(ScriptedDriver::new(
            script,
            self.selectors.clone(),
            Arc::clone(&self.ledger),
        ))
    }
}
