//! Read-only catalogs shared by every agent
//!
//! - `names`: display names partitioned by origin and gender
//! - `conversation`: topic questions and generic affirmations
//!
//! Catalogs are built once at fleet construction and never mutated, so they
//! are shared behind `Arc` without locking.

pub mod conversation;
pub mod names;

pub use conversation::{ConversationCatalog, FALLBACK_QUESTION, Topic};
pub use names::{ORIGINS, names_for};
