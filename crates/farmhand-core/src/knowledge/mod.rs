//! Static crop knowledge: one-time loader and insertion-ordered lookup.

mod store;

pub use store::{CropRecord, Fact, KnowledgeBase, KnowledgeError};
