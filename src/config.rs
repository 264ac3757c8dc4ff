//! Fleet configuration
//!
//! Reads a TOML file into [`FleetConfig`]. Every field has a default, so a
//! partial file only overrides what it names. Defaults describe a full
//! deployment: 30 male and 25 female agents against
//! `https://chatsafari.com`, a question every 30 seconds, and at most three
//! questions in a row.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::driver::ChatSelectors;
use crate::error::{FleetError, Result};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Default chat service
pub const DEFAULT_SERVICE_URL: &str = "https://chatsafari.com";

/// Default chromedriver endpoint
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

/// Default bounded run length (24 hours)
pub const DEFAULT_RUN_DURATION_SECS: u64 = 86_400;

const DEFAULT_TOPICS: &[&str] = &[
    "hobbies",
    "movies",
    "music",
    "travel",
    "food",
    "sports",
    "technology",
    "books",
    "fashion",
    "daily life",
];

// ============================================================================
// DELAY RANGE
// ============================================================================

/// Inclusive range of seconds a randomized pause is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DelayRange {
    /// Lower bound in seconds
    pub min_secs: f64,
    /// Upper bound in seconds
    pub max_secs: f64,
}

impl DelayRange {
    /// Create a new range
    #[must_use]
    pub const fn new(min_secs: f64, max_secs: f64) -> Self {
        Self { min_secs, max_secs }
    }

    /// Zero-length range, used to disable a pause
    #[must_use]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Draw a uniformly distributed duration from the range
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.max_secs <= self.min_secs {
            return secs(self.min_secs);
        }
        secs(rng.gen_range(self.min_secs..=self.max_secs))
    }

    fn validate(&self, field: &str) -> Result<()> {
        if !self.min_secs.is_finite() || !self.max_secs.is_finite() || self.min_secs < 0.0 {
            return Err(FleetError::invalid_config(format!(
                "{field}: bounds must be finite and non-negative"
            )));
        }
        if self.min_secs > self.max_secs {
            return Err(FleetError::invalid_config(format!(
                "{field}: min_secs {} exceeds max_secs {}",
                self.min_secs, self.max_secs
            )));
        }
        Ok(())
    }
}

/// Convert fractional seconds to a `Duration`, clamping negatives to zero
#[must_use]
pub fn secs(value: f64) -> Duration {
    if value.is_finite() && value > 0.0 {
        Duration::from_secs_f64(value)
    } else {
        Duration::ZERO
    }
}

// ============================================================================
// SECTIONS
// ============================================================================

/// How many agents of each gender to run, and their age bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentCounts {
    /// Male agents (capped by the name catalog)
    pub male: usize,
    /// Female agents (capped by the name catalog)
    pub female: usize,
    /// Youngest age drawn
    pub min_age: u8,
    /// Oldest age drawn
    pub max_age: u8,
}

impl Default for AgentCounts {
    fn default() -> Self {
        Self {
            male: 30,
            female: 25,
            min_age: 16,
            max_age: 32,
        }
    }
}

/// Whether proactive questions fire during idle monitoring ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProactiveMode {
    /// Ask on idle ticks once the question interval is satisfied
    #[default]
    Idle,
    /// Never ask proactively
    Disabled,
}

/// Conversation pacing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationSettings {
    /// Minimum seconds between proactive questions
    pub question_interval_secs: f64,
    /// Maximum proactive questions in one streak
    pub max_consecutive_questions: u32,
    /// Simulated typing latency before each send
    pub typing_delay: DelayRange,
    /// Pause after each send before the next message
    pub post_send_delay: DelayRange,
    /// Topic catalog, in catalog order
    pub topics: Vec<String>,
    /// Proactive question behaviour
    pub proactive_questions: ProactiveMode,
    /// Cap on remembered inbound messages per agent; unbounded when absent
    pub seen_capacity: Option<usize>,
}

impl ConversationSettings {
    /// Question interval as a `Duration`
    #[must_use]
    pub fn question_interval(&self) -> Duration {
        secs(self.question_interval_secs)
    }
}

impl Default for ConversationSettings {
    fn default() -> Self {
        Self {
            question_interval_secs: 30.0,
            max_consecutive_questions: 3,
            typing_delay: DelayRange::new(0.5, 1.5),
            post_send_delay: DelayRange::new(2.0, 4.0),
            topics: DEFAULT_TOPICS.iter().map(|t| (*t).to_string()).collect(),
            proactive_questions: ProactiveMode::Idle,
            seen_capacity: None,
        }
    }
}

/// Settle and retry pauses inside the monitoring loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingSettings {
    /// Randomized pause between notification polls
    pub idle_poll: DelayRange,
    /// Wait after opening the notification panel
    pub panel_settle_secs: f64,
    /// Wait after opening a conversation
    pub conversation_settle_secs: f64,
    /// Wait after refreshing a lost chat surface
    pub refresh_settle_secs: f64,
    /// Wait after closing an empty notification panel
    pub empty_panel_secs: f64,
    /// Wait after a recoverable loop error
    pub error_backoff_secs: f64,
}

impl Default for PacingSettings {
    fn default() -> Self {
        Self {
            idle_poll: DelayRange::new(1.0, 3.0),
            panel_settle_secs: 1.0,
            conversation_settle_secs: 2.0,
            refresh_settle_secs: 5.0,
            empty_panel_secs: 1.0,
            error_backoff_secs: 1.0,
        }
    }
}

impl PacingSettings {
    /// All pauses zeroed, for tests and dry runs
    #[must_use]
    pub fn immediate() -> Self {
        Self {
            idle_poll: DelayRange::zero(),
            panel_settle_secs: 0.0,
            conversation_settle_secs: 0.0,
            refresh_settle_secs: 0.0,
            empty_panel_secs: 0.0,
            error_backoff_secs: 0.0,
        }
    }
}

/// Bounded waits for UI conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutSettings {
    /// Login form fields and the post-login landing marker
    pub login_secs: f64,
    /// Chat surface presence check
    pub chat_surface_secs: f64,
    /// Notification bell
    pub bell_secs: f64,
    /// Unread entries in the notification panel
    pub panel_secs: f64,
    /// Messages in an opened conversation
    pub messages_secs: f64,
    /// Message input field
    pub input_secs: f64,
    /// Send button
    pub send_button_secs: f64,
    /// Any single WebDriver HTTP request
    pub request_secs: f64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            login_secs: 10.0,
            chat_surface_secs: 5.0,
            bell_secs: 3.0,
            panel_secs: 3.0,
            messages_secs: 5.0,
            input_secs: 5.0,
            send_button_secs: 3.0,
            request_secs: 30.0,
        }
    }
}

// ============================================================================
// FLEET CONFIG
// ============================================================================

/// Complete fleet configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    /// Chat service landing page
    pub service_url: String,
    /// WebDriver endpoint used by the browser driver
    pub webdriver_url: String,
    /// Run browsers without a window
    pub headless: bool,
    /// Raise the default log level to debug
    pub debug: bool,
    /// Append logs to this file instead of stderr
    pub log_file: Option<PathBuf>,
    /// Seed for every random choice; entropy when absent
    pub seed: Option<u64>,
    /// Stop the fleet after this many seconds; run until interrupted when absent
    pub run_duration_secs: Option<u64>,
    /// Seconds between status log lines
    pub status_interval_secs: u64,
    /// Roster size and ages
    pub agents: AgentCounts,
    /// Conversation pacing
    pub conversation: ConversationSettings,
    /// Loop pauses
    pub pacing: PacingSettings,
    /// Bounded waits
    pub timeouts: TimeoutSettings,
    /// UI locators
    pub selectors: ChatSelectors,
    /// Per-topic question overrides
    pub questions: BTreeMap<String, Vec<String>>,
    /// Affirmation overrides; built-in list when empty
    pub responses: Vec<String>,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            service_url: DEFAULT_SERVICE_URL.to_string(),
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            headless: false,
            debug: true,
            log_file: None,
            seed: None,
            run_duration_secs: Some(DEFAULT_RUN_DURATION_SECS),
            status_interval_secs: 10,
            agents: AgentCounts::default(),
            conversation: ConversationSettings::default(),
            pacing: PacingSettings::default(),
            timeouts: TimeoutSettings::default(),
            selectors: ChatSelectors::default(),
            questions: BTreeMap::new(),
            responses: Vec::new(),
        }
    }
}

impl FleetConfig {
    /// Load and validate configuration from a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read, does not parse, or fails validation
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    /// Returns error if the text does not parse or fails validation
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Render the configuration as TOML
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| FleetError::invalid_config(e.to_string()))
    }

    /// Check cross-field constraints
    ///
    /// # Errors
    /// Returns the first violated constraint
    pub fn validate(&self) -> Result<()> {
        if self.service_url.trim().is_empty() {
            return Err(FleetError::invalid_config("service_url is empty"));
        }
        if self.conversation.topics.is_empty() {
            return Err(FleetError::invalid_config("conversation.topics is empty"));
        }
        if self.conversation.max_consecutive_questions == 0 {
            return Err(FleetError::invalid_config(
                "conversation.max_consecutive_questions must be at least 1",
            ));
        }
        if !self.conversation.question_interval_secs.is_finite()
            || self.conversation.question_interval_secs < 0.0
        {
            return Err(FleetError::invalid_config(
                "conversation.question_interval_secs must be finite and non-negative",
            ));
        }
        if self.conversation.seen_capacity == Some(0) {
            return Err(FleetError::invalid_config(
                "conversation.seen_capacity must be at least 1 when set",
            ));
        }
        if self.agents.min_age > self.agents.max_age {
            return Err(FleetError::invalid_config(format!(
                "agents.min_age {} exceeds agents.max_age {}",
                self.agents.min_age, self.agents.max_age
            )));
        }
        self.conversation.typing_delay.validate("conversation.typing_delay")?;
        self.conversation
            .post_send_delay
            .validate("conversation.post_send_delay")?;
        self.pacing.idle_poll.validate("pacing.idle_poll")?;
        if !self.timeouts.request_secs.is_finite() || self.timeouts.request_secs <= 0.0 {
            return Err(FleetError::invalid_config(
                "timeouts.request_secs must be finite and positive",
            ));
        }
        Ok(())
    }

    /// Configured run length, if bounded
    #[must_use]
    pub fn run_duration(&self) -> Option<Duration> {
        self.run_duration_secs.map(Duration::from_secs)
    }
}
