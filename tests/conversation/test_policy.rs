//! Tests for `ConversationPolicy`
//!
//! Question pacing, streak limits, topic rotation and reply selection

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use chat_fleet::config::{ConversationSettings, DelayRange};
use chat_fleet::{ConversationCatalog, ConversationPolicy};

fn settings(interval_secs: f64, max_streak: u32) -> ConversationSettings {
    ConversationSettings {
        question_interval_secs: interval_secs,
        max_consecutive_questions: max_streak,
        ..ConversationSettings::default()
    }
}

fn policy(seed: u64, settings: &ConversationSettings) -> ConversationPolicy {
    ConversationPolicy::seeded(Arc::new(ConversationCatalog::builtin()), settings, seed)
}

#[test]
fn test_first_tick_asks() {
    let mut policy = policy(1, &settings(30.0, 3));
    let mut state = policy.initial_state(None);

    let question = policy.should_ask_question(&mut state, Instant::now());
    let question = question.expect("no question on first tick");

    assert_eq!(question.topic, state.topics()[0]);
    let catalog = ConversationCatalog::builtin();
    assert!(catalog.questions_for(&question.topic).contains(&question.text.as_str()));
    assert_eq!(state.consecutive_questions(), 1);
    assert_eq!(state.topic_cursor(), 1);
    assert_eq!(state.questions_asked(), 1);
}

#[test]
fn test_interval_not_elapsed() {
    let mut policy = policy(2, &settings(30.0, 3));
    let mut state = policy.initial_state(None);
    let start = Instant::now();

    assert!(policy.should_ask_question(&mut state, start).is_some());
    let before = (state.topic_cursor(), state.consecutive_questions());

    let soon = start + Duration::from_secs(10);
    assert!(policy.should_ask_question(&mut state, soon).is_none());
    assert_eq!((state.topic_cursor(), state.consecutive_questions()), before);
    assert_eq!(state.last_question_at(), Some(start));

    let later = start + Duration::from_secs(30);
    assert!(policy.should_ask_question(&mut state, later).is_some());
}

#[test]
fn test_streak_limit_resets_without_asking() {
    let mut policy = policy(3, &settings(30.0, 3));
    let mut state = policy.initial_state(None);
    let start = Instant::now();

    for i in 0..3 {
        let now = start + Duration::from_secs(30 * i);
        assert!(policy.should_ask_question(&mut state, now).is_some());
    }
    assert_eq!(state.consecutive_questions(), 3);

    let cursor = state.topic_cursor();
    let blocked = start + Duration::from_secs(90);
    assert!(policy.should_ask_question(&mut state, blocked).is_none());
    assert_eq!(state.consecutive_questions(), 0);
    assert_eq!(state.topic_cursor(), cursor);

    assert!(policy.should_ask_question(&mut state, blocked).is_some());
    assert_eq!(state.consecutive_questions(), 1);
}

#[test]
fn test_streak_never_exceeds_maximum() {
    let mut policy = policy(4, &settings(0.0, 2));
    let mut state = policy.initial_state(None);
    let now = Instant::now();

    let mut asked = 0;
    for _ in 0..30 {
        if policy.should_ask_question(&mut state, now).is_some() {
            asked += 1;
        }
        assert!(state.consecutive_questions() <= 2);
    }
    assert_eq!(asked, 20);
}

#[test]
fn test_inbound_message_resets_streak() {
    let mut policy = policy(5, &settings(0.0, 3));
    let mut state = policy.initial_state(None);
    let now = Instant::now();

    policy.should_ask_question(&mut state, now);
    policy.should_ask_question(&mut state, now);
    assert_eq!(state.consecutive_questions(), 2);

    assert!(state.register_inbound("sure, I like hiking"));
    assert_eq!(state.consecutive_questions(), 0);
}

#[test]
fn test_topics_cycle_through_every_topic() {
    let mut policy = policy(6, &settings(0.0, 100));
    let mut state = policy.initial_state(None);
    let order = state.topics().to_vec();
    let now = Instant::now();

    let asked: Vec<String> = (0..order.len() * 2)
        .map(|_| policy.should_ask_question(&mut state, now).unwrap().topic)
        .collect();

    assert_eq!(&asked[..order.len()], order.as_slice());
    assert_eq!(&asked[order.len()..], order.as_slice());
    assert_eq!(state.topic_cursor(), 0);
}

#[test]
fn test_topic_order_is_seeded_permutation() {
    let catalog = ConversationCatalog::builtin();
    let settings = ConversationSettings::default();

    let first = policy(42, &settings).initial_state(None);
    let again = policy(42, &settings).initial_state(None);
    assert_eq!(first.topics(), again.topics());

    let mut sorted = first.topics().to_vec();
    sorted.sort();
    let mut expected = catalog.topic_names();
    expected.sort();
    assert_eq!(sorted, expected);
}

#[test]
fn test_topic_order_for_fixed_seed() {
    let settings = ConversationSettings::default();
    let state = policy(42, &settings).initial_state(None);
    assert_eq!(
        state.topics(),
        [
            "books",
            "travel",
            "daily life",
            "sports",
            "hobbies",
            "fashion",
            "technology",
            "food",
            "music",
            "movies",
        ]
    );

    let topics = ["music".to_string(), "food".to_string(), "travel".to_string()];
    let catalog = ConversationCatalog::from_parts(&topics, &Default::default(), &[]).unwrap();
    let mut three = ConversationPolicy::seeded(Arc::new(catalog), &settings, 42);
    let state = three.initial_state(None);
    assert_eq!(state.topics(), ["travel", "food", "music"]);

    let first = three.should_ask_question(&mut state.clone(), Instant::now()).unwrap();
    assert_eq!(first.topic, "travel");
}

#[test]
fn test_same_seed_same_decisions() {
    let settings = settings(0.0, 3);
    let mut a = policy(9, &settings);
    let mut b = policy(9, &settings);
    let mut state_a = a.initial_state(None);
    let mut state_b = b.initial_state(None);
    let now = Instant::now();

    for _ in 0..10 {
        assert_eq!(
            a.should_ask_question(&mut state_a, now),
            b.should_ask_question(&mut state_b, now)
        );
        assert_eq!(a.generate_response("hi"), b.generate_response("hi"));
    }
}

#[test]
fn test_response_comes_from_catalog() {
    let catalog = ConversationCatalog::builtin();
    let mut policy = policy(10, &ConversationSettings::default());

    for inbound in ["hi", "", "what's your name?"] {
        let reply = policy.generate_response(inbound);
        assert!(catalog.responses().contains(&reply));
    }
}

#[test]
fn test_custom_responses() {
    let catalog = ConversationCatalog::from_parts(
        &["music".to_string()],
        &Default::default(),
        &["ok!".to_string()],
    )
    .unwrap();
    let mut policy =
        ConversationPolicy::seeded(Arc::new(catalog), &ConversationSettings::default(), 1);
    assert_eq!(policy.generate_response("anything"), "ok!");
}

#[test]
fn test_jitter_stays_in_range() {
    let mut policy = policy(11, &ConversationSettings::default());
    let range = DelayRange::new(0.5, 1.5);
    for _ in 0..50 {
        let pause = policy.jitter(&range);
        assert!(pause >= Duration::from_millis(500));
        assert!(pause <= Duration::from_millis(1500));
    }
    assert_eq!(policy.jitter(&DelayRange::zero()), Duration::ZERO);
}
