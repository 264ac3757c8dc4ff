//! Conversation pacing and reply selection
//!
//! - `state`: per-agent mutable conversation state (topic rotation, question
//!   streak, seen inbound texts, sent outbound texts)
//! - `policy`: pure decisions over that state (when to ask, what to ask,
//!   what to reply), driven by a seedable random source

pub mod policy;
pub mod state;

pub use policy::{ConversationPolicy, Question};
pub use state::{AgentRuntimeState, EchoFilter, SeenMessages};
