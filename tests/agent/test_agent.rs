//! Tests for the agent lifecycle against the scripted chat service
//!
//! Covers login, the monitoring loop, replies, refresh on a lost chat
//! surface, proactive questions and fatal driver failures.

#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;
use std::time::Duration;

use chat_fleet::config::ProactiveMode;
use chat_fleet::driver::SessionLedger;
use chat_fleet::{AgentPhase, ChatScript, ConversationCatalog, FleetError};

use common::{fast_config, init_logging, scripted_agent, wait_until};

#[tokio::test]
async fn test_login_submits_identity() {
    init_logging();
    let ledger = Arc::new(SessionLedger::default());
    let (mut agent, script) = scripted_agent("Priya", ChatScript::new(), fast_config(), &ledger);

    assert_eq!(agent.phase(), AgentPhase::Unauthenticated);
    agent.authenticate().await.unwrap();

    assert_eq!(agent.phase(), AgentPhase::Monitoring);
    assert!(agent.is_active());
    assert!(script.is_logged_in());
    assert_eq!(script.opened_urls(), vec!["https://chatsafari.com".to_string()]);
    assert_eq!(script.form_value("username").as_deref(), Some("Priya"));
    assert_eq!(script.form_value("gender").as_deref(), Some("female"));
    assert_eq!(script.form_value("age").as_deref(), Some("21"));

    agent.release().await;
    assert_eq!(ledger.live(), 0);
}

#[tokio::test]
async fn test_login_failure_stops_and_releases() {
    init_logging();
    let ledger = Arc::new(SessionLedger::default());
    let (mut agent, script) = scripted_agent(
        "Neha",
        ChatScript::new().reject_login(),
        fast_config(),
        &ledger,
    );

    let result = agent.authenticate().await;
    assert!(matches!(result, Err(FleetError::AuthenticationFailed { .. })));
    assert_eq!(agent.phase(), AgentPhase::Stopped);
    assert!(!agent.is_active());
    assert!(!agent.holds_driver());
    assert!(script.is_closed());
    assert!(agent.status().last_failure.is_some());
    assert_eq!(ledger.closed(), 1);
    assert_eq!(ledger.live(), 0);
}

#[tokio::test]
async fn test_run_without_login_stops_immediately() {
    init_logging();
    let ledger = Arc::new(SessionLedger::default());
    let (agent, _script) = scripted_agent("Ravi", ChatScript::new(), fast_config(), &ledger);

    let agent = agent.run().await;
    assert_eq!(agent.phase(), AgentPhase::Stopped);
    assert!(!agent.holds_driver());
    assert_eq!(ledger.live(), 0);
}

#[tokio::test]
async fn test_duplicate_messages_answered_once() {
    init_logging();
    let ledger = Arc::new(SessionLedger::default());
    let (mut agent, script) = scripted_agent(
        "Meera",
        ChatScript::new().with_conversation("alex", ["hi", "hi", "bye"]),
        fast_config(),
        &ledger,
    );
    agent.authenticate().await.unwrap();

    let controls = agent.controls().clone();
    let handle = tokio::spawn(agent.run());

    wait_until("two replies", || script.sent().len() >= 2).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    controls.request_stop();
    let agent = handle.await.unwrap();

    let sent = script.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|m| m.to.as_deref() == Some("alex")));

    let catalog = ConversationCatalog::builtin();
    assert!(sent.iter().all(|m| catalog.responses().contains(&m.text)));

    assert_eq!(agent.status().responses_sent, 2);
    assert!(agent.state().seen().contains("hi"));
    assert!(agent.state().seen().contains("bye"));
    assert_eq!(script.unread_count(), 0);
    assert_eq!(agent.phase(), AgentPhase::Stopped);
    assert_eq!(ledger.live(), 0);
}

#[tokio::test]
async fn test_revisited_conversation_answers_only_new_messages() {
    init_logging();
    let ledger = Arc::new(SessionLedger::default());
    let (mut agent, script) = scripted_agent(
        "Anita",
        ChatScript::new().with_conversation("sam", ["hello"]),
        fast_config(),
        &ledger,
    );
    agent.authenticate().await.unwrap();

    let controls = agent.controls().clone();
    let handle = tokio::spawn(agent.run());

    wait_until("first reply", || script.sent().len() == 1).await;
    script.push_message("sam", "hello");
    script.push_message("sam", "where are you from?");
    wait_until("second reply", || script.sent().len() >= 2).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    controls.request_stop();
    let agent = handle.await.unwrap();

    assert_eq!(script.sent().len(), 2);
    assert_eq!(agent.status().responses_sent, 2);
}

#[tokio::test]
async fn test_lost_chat_surface_refreshes_once() {
    init_logging();
    let ledger = Arc::new(SessionLedger::default());
    let (mut agent, script) = scripted_agent(
        "Kavita",
        ChatScript::new().with_surface_sequence([false, true]),
        fast_config(),
        &ledger,
    );
    agent.authenticate().await.unwrap();

    let controls = agent.controls().clone();
    let handle = tokio::spawn(agent.run());

    wait_until("a refresh", || script.refresh_calls() >= 1).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    controls.request_stop();
    let agent = handle.await.unwrap();

    assert_eq!(script.refresh_calls(), 1);
    assert_eq!(agent.phase(), AgentPhase::Stopped);
}

#[tokio::test]
async fn test_enter_used_without_send_button() {
    init_logging();
    let ledger = Arc::new(SessionLedger::default());
    let (mut agent, script) = scripted_agent(
        "Sneha",
        ChatScript::new()
            .without_send_button()
            .with_conversation("riley", ["hey"]),
        fast_config(),
        &ledger,
    );
    agent.authenticate().await.unwrap();

    let controls = agent.controls().clone();
    let handle = tokio::spawn(agent.run());

    wait_until("a reply", || !script.sent().is_empty()).await;
    controls.request_stop();
    handle.await.unwrap();

    let sent = script.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to.as_deref(), Some("riley"));
    assert!(!sent[0].text.is_empty());
}

#[tokio::test]
async fn test_fatal_driver_failure_stops_agent() {
    init_logging();
    let ledger = Arc::new(SessionLedger::default());
    // Login takes ten operations; the browser dies shortly after.
    let (mut agent, script) = scripted_agent(
        "Geeta",
        ChatScript::new().fail_after(14),
        fast_config(),
        &ledger,
    );
    agent.authenticate().await.unwrap();

    let agent = tokio::time::timeout(Duration::from_secs(5), agent.run())
        .await
        .expect("agent did not stop on its own");

    assert_eq!(agent.phase(), AgentPhase::Stopped);
    assert!(!agent.is_active());
    assert!(!agent.holds_driver());
    assert!(agent.status().last_failure.is_some());
    assert!(script.is_closed());
    assert_eq!(ledger.live(), 0);
    assert_eq!(ledger.used_after_close(), 0);
}

#[tokio::test]
async fn test_idle_questions_go_to_open_conversation() {
    init_logging();
    let mut config = fast_config();
    config.conversation.proactive_questions = ProactiveMode::Idle;
    config.conversation.question_interval_secs = 0.0;

    let ledger = Arc::new(SessionLedger::default());
    let (mut agent, script) = scripted_agent(
        "Lakshmi",
        ChatScript::new().with_conversation("casey", ["hi"]),
        config,
        &ledger,
    );
    agent.authenticate().await.unwrap();

    let controls = agent.controls().clone();
    let handle = tokio::spawn(agent.run());

    wait_until("three questions", || controls.liveness.questions_asked() >= 3).await;
    controls.request_stop();
    let agent = handle.await.unwrap();

    let catalog = ConversationCatalog::builtin();
    let questions: Vec<&String> = catalog.topics().iter().flat_map(|t| &t.questions).collect();
    let sent = script.sent();
    assert!(sent.iter().any(|m| catalog.responses().contains(&m.text)));
    assert!(sent.iter().any(|m| questions.contains(&&m.text)));
    assert!(sent.iter().all(|m| m.to.as_deref() == Some("casey")));
    assert!(agent.state().consecutive_questions() <= 3);
}

#[tokio::test]
async fn test_disabled_questions_never_fire() {
    init_logging();
    let mut config = fast_config();
    config.conversation.question_interval_secs = 0.0;

    let ledger = Arc::new(SessionLedger::default());
    let (mut agent, _script) = scripted_agent("Maya", ChatScript::new(), config, &ledger);
    agent.authenticate().await.unwrap();

    let controls = agent.controls().clone();
    let handle = tokio::spawn(agent.run());
    tokio::time::sleep(Duration::from_millis(50)).await;
    controls.request_stop();
    let agent = handle.await.unwrap();

    assert_eq!(agent.status().questions_asked, 0);
    assert_eq!(agent.state().questions_asked(), 0);
}

#[tokio::test]
async fn test_stop_interrupts_long_pause() {
    init_logging();
    let mut config = fast_config();
    config.pacing.idle_poll = chat_fleet::config::DelayRange::new(60.0, 60.0);
    config.pacing.empty_panel_secs = 60.0;

    let ledger = Arc::new(SessionLedger::default());
    let (mut agent, _script) = scripted_agent("Rani", ChatScript::new(), config, &ledger);
    agent.authenticate().await.unwrap();

    let controls = agent.controls().clone();
    let handle = tokio::spawn(agent.run());
    tokio::time::sleep(Duration::from_millis(20)).await;

    controls.request_stop();
    let agent = tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("stop was not prompt")
        .unwrap();
    assert_eq!(agent.phase(), AgentPhase::Stopped);
    assert_eq!(ledger.live(), 0);
}

#[tokio::test]
async fn test_cancelled_token_ends_loop_without_refresh() {
    init_logging();
    let ledger = Arc::new(SessionLedger::default());
    let (mut agent, script) = scripted_agent("Pallavi", ChatScript::new(), fast_config(), &ledger);
    agent.authenticate().await.unwrap();

    let controls = agent.controls().clone();
    let handle = tokio::spawn(agent.run());
    tokio::time::sleep(Duration::from_millis(20)).await;

    // Only the token, as a fleet-wide shutdown request does
    controls.cancel.cancel();
    let agent = tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("loop kept running after cancellation")
        .unwrap();

    assert_eq!(script.refresh_calls(), 0);
    assert_eq!(agent.phase(), AgentPhase::Stopped);
    assert!(!controls.liveness.is_active());
    assert_eq!(ledger.live(), 0);
}

#[tokio::test]
async fn test_cancelled_token_fails_login() {
    init_logging();
    let ledger = Arc::new(SessionLedger::default());
    let (mut agent, _script) = scripted_agent("Swati", ChatScript::new(), fast_config(), &ledger);

    agent.controls().cancel.cancel();
    let result = agent.authenticate().await;

    assert!(matches!(result, Err(FleetError::AuthenticationFailed { .. })));
    assert!(!agent.controls().liveness.is_active());
    assert_eq!(agent.phase(), AgentPhase::Stopped);
    assert_eq!(ledger.live(), 0);
}

#[tokio::test]
async fn test_idle_question_when_bell_shows_nothing_unread() {
    init_logging();
    let mut config = fast_config();
    config.conversation.proactive_questions = ProactiveMode::Idle;
    config.conversation.question_interval_secs = 0.0;
    config.pacing.empty_panel_secs = 60.0;

    let ledger = Arc::new(SessionLedger::default());
    let (mut agent, script) = scripted_agent(
        "Nandini",
        ChatScript::new().with_conversation("sam", ["hey"]),
        config,
        &ledger,
    );
    agent.authenticate().await.unwrap();

    let controls = agent.controls().clone();
    let handle = tokio::spawn(agent.run());

    // The bell stays on the page after the only conversation is read
    wait_until("a question", || controls.liveness.questions_asked() == 1).await;
    wait_until("the question to be sent", || script.sent().len() == 2).await;
    controls.request_stop();
    let agent = handle.await.unwrap();

    let sent = script.sent();
    let catalog = ConversationCatalog::builtin();
    assert!(catalog.responses().contains(&sent[0].text));
    let first_topic = &agent.state().topics()[0];
    assert!(catalog.questions_for(first_topic).contains(&sent[1].text.as_str()));
    assert_eq!(sent[1].to.as_deref(), Some("sam"));
    assert_eq!(agent.state().consecutive_questions(), 1);
}

#[tokio::test]
async fn test_counterparty_repeating_agent_reply_is_answered() {
    init_logging();
    let mut config = fast_config();
    config.responses = vec!["ok!".to_string()];

    let ledger = Arc::new(SessionLedger::default());
    let (mut agent, script) = scripted_agent(
        "Aarti",
        ChatScript::new().with_echo().with_conversation("jordan", ["hi"]),
        config,
        &ledger,
    );
    agent.authenticate().await.unwrap();

    let controls = agent.controls().clone();
    let handle = tokio::spawn(agent.run());

    wait_until("first reply", || script.sent().len() == 1).await;
    script.push_message("jordan", "ok!");
    wait_until("second reply", || script.sent().len() == 2).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    controls.request_stop();
    let agent = handle.await.unwrap();

    // Own echoes stay unanswered; the counterparty's copy is answered once
    assert_eq!(script.sent().len(), 2);
    assert_eq!(agent.state().sent_count("jordan", "ok!"), 2);
    assert!(agent.state().seen().contains("ok!"));
}

#[test]
fn test_phase_transitions() {
    use AgentPhase::{Authenticating, Monitoring, Responding, Stopped, Unauthenticated};

    assert!(Unauthenticated.can_transition_to(Authenticating));
    assert!(Authenticating.can_transition_to(Monitoring));
    assert!(Monitoring.can_transition_to(Responding));
    assert!(Responding.can_transition_to(Monitoring));
    for phase in [Unauthenticated, Authenticating, Monitoring, Responding] {
        assert!(phase.can_transition_to(Stopped));
    }

    assert!(!Unauthenticated.can_transition_to(Monitoring));
    assert!(!Stopped.can_transition_to(Monitoring));
    assert!(!Stopped.can_transition_to(Unauthenticated));
}
