//! Request and response bodies of the question-answering backend.

use serde::{Deserialize, Serialize};

pub const UPLOAD_PATH: &str = "api/upload";
pub const CHAT_PATH: &str = "api/chat";
/// Repeated multipart field carrying each uploaded file.
pub const UPLOAD_FIELD: &str = "files";
/// `message` value that older backends route to text ingestion.
pub const INGEST_TEXT_SENTINEL: &str = "process_text";
/// Question sent at startup to check that the backend still has an index.
pub const PROBE_QUESTION: &str = "test";
/// Substring of the `detail` a backend returns when nothing is indexed.
pub const NO_CONTENT_MARKER: &str = "No documents indexed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatOperation {
    Question,
    IngestText,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest<'a> {
    pub operation: ChatOperation,
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<&'a str>,
}

impl<'a> ChatRequest<'a> {
    pub fn question(question: &'a str) -> Self {
        Self {
            operation: ChatOperation::Question,
            message: question,
            text: None,
        }
    }

    /// The sentinel stays in `message` so backends that predate `operation` still route correctly.
    pub fn ingest_text(text: &'a str) -> Self {
        Self {
            operation: ChatOperation::IngestText,
            message: INGEST_TEXT_SENTINEL,
            text: Some(text),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub response: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<String>,
}
