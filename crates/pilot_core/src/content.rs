use std::fmt;

use chrono::{Local, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Display label given to every pasted text block.
pub const PASTED_TEXT_LABEL: &str = "Pasted Text";

const ID_SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 9;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Opaque identifier of a content item: epoch millis followed by a random base-36 suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..ID_SUFFIX_LEN)
            .map(|_| ID_SUFFIX_ALPHABET[rng.gen_range(0..ID_SUFFIX_ALPHABET.len())] as char)
            .collect();
        Self(format!("{}{suffix}", Utc::now().timestamp_millis()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ContentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Document,
    Text,
}

/// One unit of ingested material tracked for inclusion in question answering.
///
/// Field names on the wire match the records written by earlier clients, so a
/// persisted history survives an upgrade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: ContentId,
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub name: String,
    #[serde(rename = "timestamp")]
    pub created_at: String,
    #[serde(rename = "isActive")]
    pub active: bool,
}

impl ContentItem {
    /// A freshly captured, active item stamped with the local time.
    pub fn new(id: ContentId, kind: ContentKind, name: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            name: name.into(),
            created_at: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            active: true,
        }
    }
}

/// Content known to exist before the session started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentSeed {
    pub kind: ContentKind,
    pub name: String,
}

impl ContentSeed {
    pub fn new(kind: ContentKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}
