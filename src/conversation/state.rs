//! Per-agent conversation state
//!
//! Owned exclusively by the agent's own loop. Nothing outside that loop
//! writes to it.

use std::collections::{HashMap, HashSet, VecDeque};

use tokio::time::Instant;

/// Set of message texts an agent has already handled
///
/// Unbounded by default. With a capacity, the oldest entries are evicted
/// first once the set is full.
#[derive(Debug, Clone, Default)]
pub struct SeenMessages {
    order: VecDeque<String>,
    set: HashSet<String>,
    capacity: Option<usize>,
}

impl SeenMessages {
    /// Create an empty set, optionally bounded
    #[must_use]
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            order: VecDeque::new(),
            set: HashSet::new(),
            capacity,
        }
    }

    /// Whether `text` has been handled
    #[must_use]
    pub fn contains(&self, text: &str) -> bool {
        self.set.contains(text)
    }

    /// Record `text`; returns `false` if it was already present
    pub fn insert(&mut self, text: &str) -> bool {
        if self.set.contains(text) {
            return false;
        }
        if let Some(capacity) = self.capacity {
            while self.order.len() >= capacity {
                match self.order.pop_front() {
                    Some(oldest) => {
                        self.set.remove(&oldest);
                    }
                    None => break,
                }
            }
        }
        self.order.push_back(text.to_string());
        self.set.insert(text.to_string());
        true
    }

    /// Number of remembered texts
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing has been remembered yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Mutable conversation state of one agent
#[derive(Debug, Clone)]
pub struct AgentRuntimeState {
    pub(crate) last_question_at: Option<Instant>,
    pub(crate) consecutive_questions: u32,
    pub(crate) questions_asked: u64,
    topics: Vec<String>,
    topic_cursor: usize,
    seen: SeenMessages,
    // counterparty -> text -> times sent
    outbound: HashMap<String, HashMap<String, usize>>,
}

impl AgentRuntimeState {
    /// State with a fixed topic order
    ///
    /// `topics` must not be empty; [`ConversationPolicy::initial_state`](super::ConversationPolicy::initial_state)
    /// produces the shuffled order agents normally use.
    #[must_use]
    pub fn new(topics: Vec<String>, seen_capacity: Option<usize>) -> Self {
        Self {
            last_question_at: None,
            consecutive_questions: 0,
            questions_asked: 0,
            topics,
            topic_cursor: 0,
            seen: SeenMessages::new(seen_capacity),
            outbound: HashMap::new(),
        }
    }

    /// Topic order fixed at construction
    #[must_use]
    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    /// Index of the next topic to ask about
    #[must_use]
    pub fn topic_cursor(&self) -> usize {
        self.topic_cursor
    }

    /// Questions asked in the current streak
    #[must_use]
    pub fn consecutive_questions(&self) -> u32 {
        self.consecutive_questions
    }

    /// When the last question was asked
    #[must_use]
    pub fn last_question_at(&self) -> Option<Instant> {
        self.last_question_at
    }

    /// Questions asked over the agent's lifetime
    #[must_use]
    pub fn questions_asked(&self) -> u64 {
        self.questions_asked
    }

    /// Remembered message texts
    #[must_use]
    pub fn seen(&self) -> &SeenMessages {
        &self.seen
    }

    /// Take the topic under the cursor and move the cursor on, wrapping
    pub(crate) fn next_topic(&mut self) -> Option<String> {
        let topic = self.topics.get(self.topic_cursor)?.clone();
        self.topic_cursor = (self.topic_cursor + 1) % self.topics.len();
        Some(topic)
    }

    /// Record an inbound message
    ///
    /// Returns `true` if the trimmed text is non-empty and has not been seen
    /// before. A new message from a counterparty ends the question streak.
    pub fn register_inbound(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() || !self.seen.insert(text) {
            return false;
        }
        self.consecutive_questions = 0;
        true
    }

    /// Record text the agent sent into `counterparty`'s conversation
    ///
    /// Outbound text never enters the seen set; see [`echo_filter`](Self::echo_filter).
    pub fn remember_outbound(&mut self, counterparty: &str, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        *self
            .outbound
            .entry(counterparty.to_string())
            .or_default()
            .entry(text.to_string())
            .or_default() += 1;
    }

    /// Times the agent has sent `text` to `counterparty`
    #[must_use]
    pub fn sent_count(&self, counterparty: &str, text: &str) -> usize {
        self.outbound
            .get(counterparty)
            .and_then(|texts| texts.get(text.trim()))
            .copied()
            .unwrap_or(0)
    }

    /// Filter for one read of `counterparty`'s conversation
    ///
    /// A conversation shows the agent's own messages alongside the
    /// counterparty's. Every send of a text accounts for one occurrence of
    /// it in the read; further occurrences are the counterparty's.
    #[must_use]
    pub fn echo_filter(&self, counterparty: &str) -> EchoFilter {
        EchoFilter {
            remaining: self.outbound.get(counterparty).cloned().unwrap_or_default(),
        }
    }
}

/// Recognises the agent's own messages within one conversation read
#[derive(Debug, Clone, Default)]
pub struct EchoFilter {
    remaining: HashMap<String, usize>,
}

impl EchoFilter {
    /// Whether this occurrence of `text` is one the agent sent
    pub fn is_echo(&mut self, text: &str) -> bool {
        match self.remaining.get_mut(text.trim()) {
            Some(count) if *count > 0 => {
                *count -= 1;
                true
            }
            _ => false,
        }
    }
}
