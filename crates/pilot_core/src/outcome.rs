use std::fmt;

use crate::ContentKind;

pub(crate) const ANSWER_FALLBACK: &str = "Sorry, I could not process your request.";
const ANSWER_NETWORK_FAILURE: &str = "Sorry, there was an error connecting to the server.";
const ANSWER_REJECTED: &str = "Failed to get response";

/// Why a backend call did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// Transport-level failure; no response was received.
    Network(String),
    /// Non-success response, with the backend's `detail` when it sent one.
    Rejected { status: u16, detail: Option<String> },
    /// The request could not be constructed.
    InvalidRequest(String),
    /// A success response whose body could not be understood.
    MalformedResponse(String),
}

impl Failure {
    pub fn detail(&self) -> Option<&str> {
        match self {
            Failure::Rejected {
                detail: Some(detail),
                ..
            } => Some(detail),
            _ => None,
        }
    }

    /// Banner text for a failed ingestion batch of the given kind.
    pub fn ingest_message(&self, kind: ContentKind) -> String {
        if let Some(detail) = self.detail() {
            return detail.to_string();
        }
        match (self, kind) {
            (Failure::InvalidRequest(reason), _) => reason.clone(),
            (Failure::Rejected { .. } | Failure::MalformedResponse(_), ContentKind::Document) => {
                "Upload failed".to_string()
            }
            (Failure::Network(_), ContentKind::Document) => "Failed to upload files".to_string(),
            (_, ContentKind::Text) => "Failed to process text".to_string(),
        }
    }

    /// Transcript text for a failed question.
    pub fn answer_message(&self) -> String {
        if let Some(detail) = self.detail() {
            return detail.to_string();
        }
        match self {
            Failure::InvalidRequest(reason) | Failure::MalformedResponse(reason) => reason.clone(),
            Failure::Rejected { .. } => ANSWER_REJECTED.to_string(),
            Failure::Network(_) => ANSWER_NETWORK_FAILURE.to_string(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Network(reason) => write!(f, "network failure: {reason}"),
            Failure::Rejected { status, detail } => match detail {
                Some(detail) => write!(f, "rejected with status {status}: {detail}"),
                None => write!(f, "rejected with status {status}"),
            },
            Failure::InvalidRequest(reason) => write!(f, "invalid request: {reason}"),
            Failure::MalformedResponse(reason) => write!(f, "malformed response: {reason}"),
        }
    }
}

/// A submission the session declined without touching any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Nothing to submit after trimming.
    EmptyInput,
    /// Another ingestion or question is still outstanding.
    ConcurrentOperation,
    /// A backend report was overtaken by an ingestion that started after it was requested.
    Superseded,
}

/// Result of one caller-facing session operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Failed { message: String },
    Ignored(Rejection),
}
