use crate::{ContentKind, ContentSeed, PASTED_TEXT_LABEL};

/// Progress of the single ingestion batch the session tracks.
///
/// `Idle → Starting → Sending → ServerProcessing → Complete`, with `Failed`
/// reachable from any of the three in-flight phases.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IngestPhase {
    #[default]
    Idle,
    /// Request being constructed.
    Starting,
    /// Request on the wire.
    Sending,
    /// Backend accepted the batch; settle delay running.
    ServerProcessing,
    Complete,
    Failed {
        message: String,
    },
}

impl IngestPhase {
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            IngestPhase::Starting | IngestPhase::Sending | IngestPhase::ServerProcessing
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, IngestPhase::Complete | IngestPhase::Failed { .. })
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            IngestPhase::Failed { message } => Some(message),
            _ => None,
        }
    }
}

/// A file picked or dropped by the user, already read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            mime: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }
}

/// The payload of one ingestion batch. A batch is all-or-nothing: it becomes
/// content items only once the backend has accepted all of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum IngestBatch {
    Files(Vec<UploadFile>),
    Text(String),
}

impl IngestBatch {
    pub(crate) fn kind(&self) -> ContentKind {
        match self {
            IngestBatch::Files(_) => ContentKind::Document,
            IngestBatch::Text(_) => ContentKind::Text,
        }
    }

    /// Items to register once the batch completes, in input order.
    pub(crate) fn seeds(&self) -> Vec<ContentSeed> {
        match self {
            IngestBatch::Files(files) => files
                .iter()
                .map(|file| ContentSeed::new(ContentKind::Document, file.name.clone()))
                .collect(),
            IngestBatch::Text(_) => vec![ContentSeed::new(ContentKind::Text, PASTED_TEXT_LABEL)],
        }
    }
}

/// Human-readable status for a phase, or `None` when nothing should be shown.
pub fn status_label(kind: ContentKind, phase: &IngestPhase) -> Option<&'static str> {
    match (kind, phase) {
        (_, IngestPhase::Idle) | (_, IngestPhase::Failed { .. }) => None,
        (ContentKind::Document, IngestPhase::Starting) => Some("Starting upload..."),
        (ContentKind::Document, IngestPhase::Sending) => Some("Uploading to server..."),
        (ContentKind::Document, IngestPhase::ServerProcessing) => Some("Processing files..."),
        (ContentKind::Document, IngestPhase::Complete) => Some("Upload complete!"),
        (ContentKind::Text, IngestPhase::Complete) => Some("Text processed successfully!"),
        (ContentKind::Text, _) => Some("Processing text..."),
    }
}
