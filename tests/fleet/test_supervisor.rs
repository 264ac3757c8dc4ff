//! Tests for roster construction and `FleetSupervisor`
//!
//! Fleets run against the scripted chat service with every pause removed.

#[path = "../common/mod.rs"]
mod common;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;

use chat_fleet::config::{AgentCounts, ProactiveMode};
use chat_fleet::{
    AgentPhase, ChatScript, ConversationCatalog, ConversationPolicy, FleetError, FleetSupervisor,
    Gender, ScriptedFactory, build_roster,
};

use common::{fast_config, identity, init_logging, wait_until};

#[test]
fn test_default_roster() {
    let counts = AgentCounts::default();
    let roster = build_roster(&counts, &mut StdRng::seed_from_u64(1));

    assert_eq!(roster.len(), 55);
    assert_eq!(roster.iter().filter(|a| a.gender == Gender::Male).count(), 30);
    assert_eq!(roster.iter().filter(|a| a.gender == Gender::Female).count(), 25);
    assert!(roster.iter().all(|a| (16..=32).contains(&a.age)));

    let names: HashSet<&str> = roster.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names.len(), roster.len());
    assert_eq!(roster[0].name.as_str(), "Arjun");
}

#[test]
fn test_roster_respects_counts() {
    let counts = AgentCounts {
        male: 3,
        female: 2,
        min_age: 20,
        max_age: 20,
    };
    let roster = build_roster(&counts, &mut StdRng::seed_from_u64(1));

    let names: Vec<&str> = roster.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["Arjun", "Rahul", "Amit", "Priya", "Neha"]);
    assert!(roster.iter().all(|a| a.age == 20));
}

#[test]
fn test_roster_capped_by_catalog() {
    let counts = AgentCounts {
        male: 500,
        female: 0,
        ..AgentCounts::default()
    };
    let roster = build_roster(&counts, &mut StdRng::seed_from_u64(1));
    assert_eq!(roster.len(), 30);
}

#[test]
fn test_roster_ages_are_seeded() {
    let counts = AgentCounts::default();
    let a = build_roster(&counts, &mut StdRng::seed_from_u64(5));
    let b = build_roster(&counts, &mut StdRng::seed_from_u64(5));
    assert_eq!(a, b);
}

#[tokio::test]
async fn test_status_before_start() {
    let mut config = fast_config();
    config.agents.male = 2;
    config.agents.female = 2;
    let fleet = FleetSupervisor::new(config, ScriptedFactory::new(Default::default())).unwrap();

    let status = fleet.status_snapshot();
    assert_eq!(status.total, 4);
    assert_eq!(status.active, 0);
    assert_eq!(status.run_id, fleet.run_id());
    assert!(status.agents.iter().all(|a| a.phase == AgentPhase::Unauthenticated));
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let mut config = fast_config();
    config.conversation.topics.clear();
    let result = FleetSupervisor::new(config, ScriptedFactory::new(Default::default()));
    assert!(matches!(result, Err(FleetError::InvalidConfig(_))));
}

#[tokio::test]
async fn test_stop_all_releases_every_session() {
    init_logging();
    let config = fast_config();
    let factory = ScriptedFactory::new(config.selectors.clone());
    let fleet =
        FleetSupervisor::with_roster(config, factory, vec![identity("Priya"), identity("Mary")])
            .unwrap();

    assert_eq!(fleet.start_all().await.unwrap(), 2);
    assert_eq!(fleet.active_count(), 2);
    tokio::time::sleep(Duration::from_millis(20)).await;

    fleet.stop_all().await;

    let ledger = fleet.factory().ledger();
    assert_eq!(ledger.opened(), 2);
    assert_eq!(ledger.closed(), 2);
    assert_eq!(ledger.live(), 0);
    assert_eq!(ledger.dropped_open(), 0);
    assert_eq!(ledger.used_after_close(), 0);

    let status = fleet.status_snapshot();
    assert_eq!(status.active, 0);
    assert!(status.agents.iter().all(|a| a.phase == AgentPhase::Stopped));

    // A second stop is a no-op
    fleet.stop_all().await;
    assert_eq!(fleet.factory().ledger().closed(), 2);
}

#[tokio::test]
async fn test_login_failure_is_isolated() {
    init_logging();
    let config = fast_config();
    let factory = ScriptedFactory::with_template(config.selectors.clone(), |identity| {
        let script = ChatScript::new();
        Some(if identity.name.as_str() == "Linda" {
            script.reject_login()
        } else {
            script
        })
    });
    let roster = vec![identity("Pooja"), identity("Linda"), identity("Susan")];
    let fleet = FleetSupervisor::with_roster(config, factory, roster).unwrap();

    assert_eq!(fleet.start_all().await.unwrap(), 2);

    let status = fleet.status_snapshot();
    assert_eq!(status.active, 2);
    assert_eq!(status.total, 3);
    let linda = status.agents.iter().find(|a| a.name == "Linda").unwrap();
    assert!(!linda.active);
    assert_eq!(linda.phase, AgentPhase::Stopped);
    assert!(linda.last_failure.is_some());
    assert!(fleet.factory().script_for("Linda").unwrap().is_closed());

    fleet.stop_all().await;
    assert_eq!(fleet.factory().ledger().live(), 0);
}

#[tokio::test]
async fn test_missing_driver_is_isolated() {
    init_logging();
    let config = fast_config();
    let factory = ScriptedFactory::with_template(config.selectors.clone(), |identity| {
        (identity.name.as_str() != "Ritu").then(ChatScript::new)
    });
    let roster = vec![identity("Ritu"), identity("Karen")];
    let fleet = FleetSupervisor::with_roster(config, factory, roster).unwrap();

    assert_eq!(fleet.start_all().await.unwrap(), 1);
    let status = fleet.status_snapshot();
    let ritu = status.agents.iter().find(|a| a.name == "Ritu").unwrap();
    assert_eq!(ritu.phase, AgentPhase::Unauthenticated);
    assert!(ritu.last_failure.is_some());

    fleet.stop_all().await;
    assert_eq!(fleet.factory().ledger().opened(), 1);
    assert_eq!(fleet.factory().ledger().live(), 0);
}

#[tokio::test]
async fn test_start_after_shutdown_is_refused() {
    let config = fast_config();
    let factory = ScriptedFactory::new(config.selectors.clone());
    let fleet = FleetSupervisor::with_roster(config, factory, vec![identity("Sarah")]).unwrap();

    fleet.request_shutdown();
    assert!(matches!(
        fleet.start_all().await,
        Err(FleetError::InvalidState(_))
    ));
    fleet.stop_all().await;
    assert_eq!(fleet.factory().ledger().opened(), 0);
}

#[tokio::test]
async fn test_two_agents_three_topics_end_to_end() {
    init_logging();
    let mut config = fast_config();
    config.conversation.topics = vec!["music".into(), "food".into(), "travel".into()];

    let factory = ScriptedFactory::new(config.selectors.clone());
    let fleet =
        FleetSupervisor::with_roster(config, factory, vec![identity("Deepika"), identity("Jessica")])
            .unwrap();
    assert_eq!(fleet.start_all().await.unwrap(), 2);

    let deepika = fleet.factory().script_for("Deepika").unwrap();
    let jessica = fleet.factory().script_for("Jessica").unwrap();
    deepika.push_message("jordan", "hi there");
    jessica.push_message("morgan", "hello");
    jessica.push_message("morgan", "how old are you?");

    wait_until("both agents to reply", || {
        deepika.sent().len() >= 1 && jessica.sent().len() >= 2
    })
    .await;
    fleet.stop_all().await;

    assert_eq!(deepika.sent().len(), 1);
    assert_eq!(jessica.sent().len(), 2);
    assert!(deepika.sent().iter().all(|m| m.to.as_deref() == Some("jordan")));
    assert!(jessica.sent().iter().all(|m| m.to.as_deref() == Some("morgan")));

    let status = fleet.status_snapshot();
    let sent: u64 = status.agents.iter().map(|a| a.responses_sent).sum();
    assert_eq!(sent, 3);
    assert_eq!(fleet.factory().ledger().live(), 0);
}

#[tokio::test]
async fn test_two_agents_first_idle_tick_asks_first_topic() {
    init_logging();
    let mut config = fast_config();
    config.conversation.topics = vec!["music".into(), "food".into(), "travel".into()];
    config.conversation.proactive_questions = ProactiveMode::Idle;
    config.conversation.question_interval_secs = 0.0;
    config.conversation.max_consecutive_questions = 1;
    // One idle tick per agent before the test stops the fleet
    config.pacing.empty_panel_secs = 60.0;

    let factory = ScriptedFactory::with_template(config.selectors.clone(), |identity| {
        let visitor = if identity.name.as_str() == "Deepika" { "jordan" } else { "morgan" };
        Some(ChatScript::new().with_conversation(visitor, ["hi"]))
    });
    let fleet = FleetSupervisor::with_roster(
        config.clone(),
        factory,
        vec![identity("Deepika"), identity("Jessica")],
    )
    .unwrap();
    assert_eq!(fleet.start_all().await.unwrap(), 2);

    let names = ["Deepika", "Jessica"];
    for name in names {
        let script = fleet.factory().script_for(name).unwrap();
        wait_until("a reply and a question", || script.sent().len() == 2).await;
    }
    fleet.stop_all().await;

    let catalog = Arc::new(ConversationCatalog::from_config(&config).unwrap());
    let status = fleet.status_snapshot();
    for name in names {
        let seed = fleet.seed_of(name).unwrap();
        let order = ConversationPolicy::seeded(Arc::clone(&catalog), &config.conversation, seed)
            .initial_state(None)
            .topics()
            .to_vec();

        let sent = fleet.factory().script_for(name).unwrap().sent();
        assert_eq!(sent.len(), 2);
        assert!(catalog.responses().contains(&sent[0].text));
        assert!(catalog.questions_for(&order[0]).contains(&sent[1].text.as_str()));

        let agent = status.agents.iter().find(|a| a.name == name).unwrap();
        assert_eq!(agent.questions_asked, 1);
        assert_eq!(agent.responses_sent, 1);
    }
    assert_eq!(fleet.factory().ledger().live(), 0);
}

#[tokio::test]
async fn test_shutdown_request_ends_agents_without_refresh() {
    init_logging();
    let config = fast_config();
    let factory = ScriptedFactory::new(config.selectors.clone());
    let fleet =
        FleetSupervisor::with_roster(config, factory, vec![identity("Kiran"), identity("Emily")])
            .unwrap();
    assert_eq!(fleet.start_all().await.unwrap(), 2);
    tokio::time::sleep(Duration::from_millis(20)).await;

    fleet.request_shutdown();
    wait_until("every agent to stop", || fleet.active_count() == 0).await;

    let status = fleet.status_snapshot();
    assert!(status.agents.iter().all(|a| a.phase == AgentPhase::Stopped));
    for name in ["Kiran", "Emily"] {
        assert_eq!(fleet.factory().script_for(name).unwrap().refresh_calls(), 0);
    }

    fleet.stop_all().await;
    assert_eq!(fleet.factory().ledger().live(), 0);
}
