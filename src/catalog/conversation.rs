//! Topic questions and generic affirmations

use std::collections::BTreeMap;

use crate::config::FleetConfig;
use crate::error::{FleetError, Result};

/// Question used for topics without any candidates
pub const FALLBACK_QUESTION: &str = "Tell me more about yourself.";

const BUILTIN_QUESTIONS: &[(&str, &[&str])] = &[
    (
        "hobbies",
        &[
            "What do you like to do in your free time?",
            "Do you have any interesting hobbies?",
            "What activities do you enjoy most?",
        ],
    ),
    (
        "movies",
        &[
            "What kind of movies do you like?",
            "Who's your favorite actor?",
            "What's the last movie you watched?",
        ],
    ),
    (
        "music",
        &[
            "What type of music do you listen to?",
            "Who's your favorite artist?",
            "What's your favorite song?",
        ],
    ),
    (
        "travel",
        &[
            "Have you been to any interesting places?",
            "Where would you like to travel?",
            "What's your dream destination?",
        ],
    ),
    (
        "food",
        &[
            "What's your favorite cuisine?",
            "Do you like cooking?",
            "What's your favorite restaurant?",
        ],
    ),
    (
        "sports",
        &[
            "Do you follow any sports?",
            "What's your favorite team?",
            "Do you play any sports?",
        ],
    ),
    (
        "technology",
        &[
            "What gadgets do you use?",
            "Are you interested in new technology?",
            "What's your favorite app?",
        ],
    ),
    (
        "books",
        &[
            "Do you like reading?",
            "What's your favorite book?",
            "What genre do you prefer?",
        ],
    ),
    (
        "fashion",
        &[
            "What's your style like?",
            "Do you follow fashion trends?",
            "What's your favorite clothing brand?",
        ],
    ),
    (
        "daily life",
        &[
            "How do you usually spend your day?",
            "What's your morning routine?",
            "What do you do to relax?",
        ],
    ),
];

const BUILTIN_RESPONSES: &[&str] = &[
    "That's interesting! Tell me more.",
    "I can relate to that.",
    "Really? That's fascinating!",
    "I understand what you mean.",
    "That's a great point!",
    "I agree with you.",
    "That's something I hadn't considered.",
    "Interesting perspective!",
    "I see what you're saying.",
    "That makes sense to me.",
];

/// One conversation topic and its candidate questions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    /// Topic name
    pub name: String,
    /// Candidate questions, never empty
    pub questions: Vec<String>,
}

/// Immutable topic and response tables
#[derive(Debug, Clone)]
pub struct ConversationCatalog {
    topics: Vec<Topic>,
    responses: Vec<String>,
}

impl ConversationCatalog {
    /// Catalog with every built-in topic and the built-in affirmations
    #[must_use]
    pub fn builtin() -> Self {
        let topics = BUILTIN_QUESTIONS
            .iter()
            .map(|(name, questions)| Topic {
                name: (*name).to_string(),
                questions: questions.iter().map(|q| (*q).to_string()).collect(),
            })
            .collect();

        Self {
            topics,
            responses: BUILTIN_RESPONSES.iter().map(|r| (*r).to_string()).collect(),
        }
    }

    /// Build the catalog from configuration
    ///
    /// Topic order follows `conversation.topics`. Questions come from the
    /// `[questions]` overrides, then the built-in table, then
    /// [`FALLBACK_QUESTION`].
    ///
    /// # Errors
    /// Returns error if no topics are configured
    pub fn from_config(config: &FleetConfig) -> Result<Self> {
        Self::from_parts(
            &config.conversation.topics,
            &config.questions,
            &config.responses,
        )
    }

    /// Build the catalog from a topic list, question overrides and responses
    ///
    /// An empty `responses` slice selects the built-in affirmations.
    ///
    /// # Errors
    /// Returns error if `topic_names` is empty
    pub fn from_parts(
        topic_names: &[String],
        overrides: &BTreeMap<String, Vec<String>>,
        responses: &[String],
    ) -> Result<Self> {
        if topic_names.is_empty() {
            return Err(FleetError::invalid_config("topic catalog is empty"));
        }

        let topics = topic_names
            .iter()
            .map(|name| {
                let questions = overrides
                    .get(name)
                    .filter(|qs| !qs.is_empty())
                    .cloned()
                    .or_else(|| builtin_questions(name))
                    .unwrap_or_else(|| vec![FALLBACK_QUESTION.to_string()]);
                Topic {
                    name: name.clone(),
                    questions,
                }
            })
            .collect();

        let responses = if responses.is_empty() {
            BUILTIN_RESPONSES.iter().map(|r| (*r).to_string()).collect()
        } else {
            responses.to_vec()
        };

        Ok(Self { topics, responses })
    }

    /// Topics in catalog order
    #[must_use]
    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    /// Topic names in catalog order
    #[must_use]
    pub fn topic_names(&self) -> Vec<String> {
        self.topics.iter().map(|t| t.name.clone()).collect()
    }

    /// Candidate questions for a topic
    ///
    /// Unknown topics get the single fallback question.
    #[must_use]
    pub fn questions_for(&self, topic: &str) -> Vec<&str> {
        self.topics
            .iter()
            .find(|t| t.name == topic)
            .map_or_else(
                || vec![FALLBACK_QUESTION],
                |t| t.questions.iter().map(String::as_str).collect(),
            )
    }

    /// Generic affirmations used as replies
    #[must_use]
    pub fn responses(&self) -> &[String] {
        &self.responses
    }
}

impl Default for ConversationCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn builtin_questions(topic: &str) -> Option<Vec<String>> {
    BUILTIN_QUESTIONS
        .iter()
        .find(|(name, _)| *name == topic)
        .map(|(_, qs)| qs.iter().map(|q| (*q).to_string()).collect())
}
