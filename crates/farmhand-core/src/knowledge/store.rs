//! In-memory knowledge base loaded once at startup from a JSON resource.
//!
//! Crop-name precedence (first match wins) is the source file's key order, so
//! crops are kept as an ordered sequence of pairs rather than a hash map.

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// A single pre-written fact, or an ordered list of facts, for one topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Fact {
    Text(String),
    List(Vec<String>),
}

/// Per-crop record: topic key -> fact(s).
///
/// No schema is enforced beyond "value is a string or a list of strings";
/// unknown topic keys are tolerated and simply unreachable by the keyword
/// table unless a keyword resolves to their exact name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CropRecord {
    topics: HashMap<String, Fact>,
}

impl CropRecord {
    /// Returns the fact(s) stored under `topic`, if any.
    pub fn get(&self, topic: &str) -> Option<&Fact> {
        self.topics.get(topic)
    }
}

/// Error raised while loading the knowledge resource.
#[derive(Debug)]
pub enum KnowledgeError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for KnowledgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KnowledgeError::Io(e) => write!(f, "knowledge resource unreadable: {}", e),
            KnowledgeError::Parse(e) => write!(f, "knowledge resource malformed: {}", e),
        }
    }
}

impl std::error::Error for KnowledgeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            KnowledgeError::Io(e) => Some(e),
            KnowledgeError::Parse(e) => Some(e),
        }
    }
}

/// Immutable crop knowledge, ordered as authored in the source file.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    crops: Vec<(String, CropRecord)>,
}

impl KnowledgeBase {
    /// Loads the knowledge resource at `path`.
    ///
    /// A missing file is tolerated: a diagnostic is emitted and an empty
    /// knowledge base is returned. An unreadable or malformed file is an
    /// error, fatal at startup for the caller.
    pub fn load_or_empty(path: impl AsRef<Path>) -> Result<Self, KnowledgeError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::warn!(
                target: "farmhand::knowledge",
                path = %path.display(),
                "Knowledge file not found. Using empty data."
            );
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(KnowledgeError::Io)?;
        serde_json::from_str(&raw).map_err(KnowledgeError::Parse)
    }

    /// Number of crops loaded.
    pub fn len(&self) -> usize {
        self.crops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crops.is_empty()
    }

    /// Crop names in source-file order.
    pub fn crop_names(&self) -> Vec<&str> {
        self.crops.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Returns the record for an exact crop name.
    pub fn get(&self, crop: &str) -> Option<&CropRecord> {
        self.crops
            .iter()
            .find(|(name, _)| name == crop)
            .map(|(_, record)| record)
    }

    /// Returns the first crop (in source order) whose lowercased name occurs
    /// as a substring of the lowercased message.
    pub fn detect_crop(&self, message: &str) -> Option<&str> {
        let message = message.to_lowercase();
        self.crops
            .iter()
            .map(|(name, _)| name.as_str())
            .find(|name| message.contains(&name.to_lowercase()))
    }
}

impl<'de> Deserialize<'de> for KnowledgeBase {
    // Hand-rolled so the JSON object's key order survives: crop precedence is
    // insertion order and an unordered map would lose the tie-break.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct KbVisitor;

        impl<'de> Visitor<'de> for KbVisitor {
            type Value = KnowledgeBase;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of crop names to crop records")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut crops = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, record)) = access.next_entry::<String, CropRecord>()? {
                    crops.push((name, record));
                }
                Ok(KnowledgeBase { crops })
            }
        }

        deserializer.deserialize_map(KbVisitor)
    }
}
