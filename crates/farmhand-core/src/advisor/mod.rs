//! Crop advisor: decides what a message is asking about and formats a reply
//! from the knowledge base. Stateless per request; the knowledge base is
//! shared read-only, so identical input always yields an identical reply.

mod topics;

pub use topics::{resolve_topic, MAIN_TOPICS, TOPIC_KEYWORDS};

use crate::knowledge::{Fact, KnowledgeBase};
use crate::shared::ChatResponse;
use std::sync::Arc;

/// Greeting substrings checked before any crop routing.
const GREETINGS: [&str; 3] = ["hello", "hi", "hey"];

const GREETING_RESPONSE: &str = "Hello! I'm your farming assistant. I can help you with crop info, irrigation, fertilizers, pests, and more.";

const FALLBACK_RESPONSE: &str =
    "I'm here to help with comprehensive farming guidance! Ask me about specific crops or topics.";

/// Answers free-text farming questions against a shared [`KnowledgeBase`].
pub struct CropAdvisor {
    knowledge: Arc<KnowledgeBase>,
}

impl CropAdvisor {
    pub fn new(knowledge: Arc<KnowledgeBase>) -> Self {
        Self { knowledge }
    }

    /// Crop names in knowledge-base order (insertion order of the source file).
    pub fn available_crops(&self) -> Vec<&str> {
        self.knowledge.crop_names()
    }

    /// Formats advice for a crop: one topic when given, otherwise the general
    /// summary over the main topics.
    pub fn advice(&self, crop: &str, topic: Option<&str>) -> String {
        let Some(record) = self.knowledge.get(crop) else {
            return format!(
                "Sorry, I don't have information about {}. Available crops: {}",
                crop,
                self.knowledge.crop_names().join(", ")
            );
        };

        if let Some(topic) = topic {
            return match record.get(topic) {
                Some(Fact::List(items)) => format!("\u{2022} {}", items.join("\n\u{2022} ")),
                Some(Fact::Text(text)) => text.clone(),
                None => format!("No information available for {} of {}.", topic, crop),
            };
        }

        // General summary: main topics in fixed order, absent ones skipped.
        let mut response = format!("Here's general information about {}:\n\n", crop);
        for topic in MAIN_TOPICS {
            let Some(fact) = record.get(topic) else {
                continue;
            };
            let value = match fact {
                Fact::Text(text) => text.clone(),
                Fact::List(items) => items.join("\n\u{2022} "),
            };
            response.push_str(&format!("**{}:** {}\n\n", title_case(topic), value));
        }
        response
    }

    /// Runs the full decision chain for one inbound message. First matching
    /// rule wins.
    pub fn process_message(&self, message: &str, crop_hint: Option<&str>) -> ChatResponse {
        let message_lower = message.to_lowercase();

        // Detect crop if not provided
        let crop = crop_hint.or_else(|| self.knowledge.detect_crop(message));

        // Greetings
        if GREETINGS.iter().any(|g| message_lower.contains(g)) {
            return ChatResponse {
                response: GREETING_RESPONSE.to_string(),
                crop_type: None,
                suggestions: Some(vec![
                    "What crops do you know about?".to_string(),
                    "Tell me about wheat farming".to_string(),
                ]),
            };
        }

        // Available crops
        if message_lower.contains("what crops") || message_lower.contains("available crops") {
            let crops = self.knowledge.crop_names();
            return ChatResponse {
                response: format!("I have information about: {}", crops.join(", ")),
                crop_type: None,
                suggestions: Some(
                    crops
                        .iter()
                        .take(4)
                        .map(|crop| format!("Complete guide for {}", crop))
                        .collect(),
                ),
            };
        }

        // Crop-specific queries. An explicit hint that names an unknown crop
        // falls through to the generic help reply.
        if let Some(crop) = crop.filter(|c| self.knowledge.get(c).is_some()) {
            let topic = resolve_topic(message);
            return ChatResponse {
                response: self.advice(crop, topic),
                crop_type: Some(crop.to_string()),
                suggestions: None,
            };
        }

        ChatResponse {
            response: FALLBACK_RESPONSE.to_string(),
            crop_type: None,
            suggestions: Some(vec![
                "Available crops".to_string(),
                "Organic farming tips".to_string(),
            ]),
        }
    }
}

/// "organic_tips" -> "Organic Tips": underscores to spaces, each word
/// title-cased.
fn title_case(topic: &str) -> String {
    topic
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
