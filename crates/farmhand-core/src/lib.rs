//! farmhand-core: crop advisory core (shared types, knowledge base, advisor).
//!
//! Everything here is transport-agnostic and stateless per request over an
//! immutable knowledge base; the gateway add-on builds on this crate.

mod advisor;
mod knowledge;
mod shared;

// Shared
pub use shared::{ChatResponse, CoreConfig};

// Knowledge
pub use knowledge::{CropRecord, Fact, KnowledgeBase, KnowledgeError};

// Advisor
pub use advisor::{resolve_topic, CropAdvisor, MAIN_TOPICS, TOPIC_KEYWORDS};
