//! Question pacing and reply selection
//!
//! All randomness goes through the policy's own [`StdRng`], so a fixed seed
//! reproduces every shuffle, pick and delay.

use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tokio::time::Instant;

use super::state::AgentRuntimeState;
use crate::catalog::{ConversationCatalog, FALLBACK_QUESTION};
use crate::config::{ConversationSettings, DelayRange};

/// Reply used if the affirmation catalog is somehow empty
const FALLBACK_RESPONSE: &str = "I see what you're saying.";

/// A proactive question chosen by the policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    /// Topic the question belongs to
    pub topic: String,
    /// Question text
    pub text: String,
}

/// Pacing and reply decisions for one agent
#[derive(Debug)]
pub struct ConversationPolicy {
    catalog: Arc<ConversationCatalog>,
    question_interval: Duration,
    max_consecutive_questions: u32,
    rng: StdRng,
}

impl ConversationPolicy {
    /// Policy drawing from `rng`
    #[must_use]
    pub fn new(
        catalog: Arc<ConversationCatalog>,
        settings: &ConversationSettings,
        rng: StdRng,
    ) -> Self {
        Self {
            catalog,
            question_interval: settings.question_interval(),
            max_consecutive_questions: settings.max_consecutive_questions,
            rng,
        }
    }

    /// Policy with a deterministic random source
    #[must_use]
    pub fn seeded(
        catalog: Arc<ConversationCatalog>,
        settings: &ConversationSettings,
        seed: u64,
    ) -> Self {
        Self::new(catalog, settings, StdRng::seed_from_u64(seed))
    }

    /// Fresh state with the catalog's topics in a shuffled order
    pub fn initial_state(&mut self, seen_capacity: Option<usize>) -> AgentRuntimeState {
        let mut topics = self.catalog.topic_names();
        topics.shuffle(&mut self.rng);
        AgentRuntimeState::new(topics, seen_capacity)
    }

    /// Decide whether to ask a question at `now`, and which
    ///
    /// A question is due once the interval has passed since the last one.
    /// While the streak is below the maximum, a due tick asks: it takes the
    /// topic under the cursor, advances the cursor, picks one of the topic's
    /// questions, stamps `now` and grows the streak. A due tick that finds
    /// the streak full only resets the streak.
    pub fn should_ask_question(
        &mut self,
        state: &mut AgentRuntimeState,
        now: Instant,
    ) -> Option<Question> {
        let due = state
            .last_question_at
            .is_none_or(|last| now.saturating_duration_since(last) >= self.question_interval);
        if !due {
            return None;
        }

        if state.consecutive_questions >= self.max_consecutive_questions {
            state.consecutive_questions = 0;
            return None;
        }

        let topic = state.next_topic()?;
        let text = self
            .catalog
            .questions_for(&topic)
            .choose(&mut self.rng)
            .map_or_else(|| FALLBACK_QUESTION.to_string(), |q| (*q).to_string());

        state.last_question_at = Some(now);
        state.consecutive_questions += 1;
        state.questions_asked += 1;

        Some(Question { topic, text })
    }

    /// Pick a reply to an inbound message
    ///
    /// Content-agnostic: the reply is a uniform pick from the affirmations.
    pub fn generate_response(&mut self, _inbound: &str) -> String {
        self.catalog
            .responses()
            .choose(&mut self.rng)
            .map_or_else(|| FALLBACK_RESPONSE.to_string(), Clone::clone)
    }

    /// Draw a pause from `range`
    pub fn jitter(&mut self, range: &DelayRange) -> Duration {
        range.sample(&mut self.rng)
    }
}
