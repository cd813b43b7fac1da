use crate::{IngestPhase, Message, SessionStage};

/// Snapshot of everything the host shell renders, apart from the content list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub stage: SessionStage,
    pub ingest_phase: IngestPhase,
    /// Progress text for the ingestion banner.
    pub ingest_status: Option<String>,
    pub ingest_error: Option<String>,
    pub waiting_for_answer: bool,
    pub messages: Vec<Message>,
}
