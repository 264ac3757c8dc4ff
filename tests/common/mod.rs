//! Helpers shared by the integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chat_fleet::config::{DelayRange, PacingSettings, ProactiveMode};
use chat_fleet::driver::SessionLedger;
use chat_fleet::{
    Agent, AgentIdentity, ChatScript, ConversationCatalog, FleetConfig, Gender, ScriptedDriver,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Configuration with every pause removed and questions off
pub fn fast_config() -> FleetConfig {
    let mut config = FleetConfig::default();
    config.seed = Some(7);
    config.pacing = PacingSettings::immediate();
    config.conversation.typing_delay = DelayRange::zero();
    config.conversation.post_send_delay = DelayRange::zero();
    config.conversation.proactive_questions = ProactiveMode::Disabled;
    config
}

pub fn identity(name: &str) -> AgentIdentity {
    AgentIdentity::new(name, Gender::Female, 21)
}

/// Agent wired to `script`, with its driver recorded in `ledger`
pub fn scripted_agent(
    name: &str,
    script: ChatScript,
    config: FleetConfig,
    ledger: &Arc<SessionLedger>,
) -> (Agent<ScriptedDriver>, Arc<ChatScript>) {
    let catalog = Arc::new(ConversationCatalog::from_config(&config).unwrap());
    let script = Arc::new(script);
    let driver = ScriptedDriver::new(
        Arc::clone(&script),
        config.selectors.clone(),
        Arc::clone(ledger),
    );
    let agent = Agent::new(identity(name), driver, Arc::new(config), catalog, 11);
    (agent, script)
}

/// Poll `condition` until it holds, failing the test after five seconds
pub async fn wait_until(what: &str, mut condition: impl FnMut() -> bool) {
    let reached = tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(reached.is_ok(), "timed out waiting for {what}");
}
