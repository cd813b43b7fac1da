use crate::ingest::{status_label, IngestBatch};
use crate::view_model::AppViewModel;
use crate::{ContentKind, IngestPhase, Outcome, Rejection, Role, Transcript};

/// Which workflow the host should present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStage {
    #[default]
    Ingestion,
    Conversation,
}

/// Busy flag of the conversation workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversationState {
    #[default]
    Idle,
    Waiting,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    stage: SessionStage,
    ingest: IngestPhase,
    ingest_kind: Option<ContentKind>,
    batch: Option<IngestBatch>,
    conversation: ConversationState,
    transcript: Transcript,
    completed_batches: u64,
    outcome: Option<Outcome>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            stage: self.stage,
            ingest_phase: self.ingest.clone(),
            ingest_status: self
                .ingest_kind
                .and_then(|kind| status_label(kind, &self.ingest))
                .map(str::to_string),
            ingest_error: self.ingest.error_message().map(str::to_string),
            waiting_for_answer: self.conversation == ConversationState::Waiting,
            messages: self.transcript.messages().to_vec(),
        }
    }

    pub fn stage(&self) -> SessionStage {
        self.stage
    }

    pub fn ingest_phase(&self) -> &IngestPhase {
        &self.ingest
    }

    pub fn conversation(&self) -> ConversationState {
        self.conversation
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Number of ingestion batches that completed in this session.
    pub fn completed_batches(&self) -> u64 {
        self.completed_batches
    }

    /// True while an ingestion batch or a question is outstanding.
    pub fn is_busy(&self) -> bool {
        self.ingest.is_in_flight() || self.conversation == ConversationState::Waiting
    }

    /// Returns and clears the outcome recorded by the last resolving message.
    pub fn take_outcome(&mut self) -> Option<Outcome> {
        self.outcome.take()
    }

    pub(crate) fn set_stage(&mut self, stage: SessionStage) {
        self.stage = stage;
    }

    pub(crate) fn reject(&mut self, rejection: Rejection) {
        self.outcome = Some(Outcome::Ignored(rejection));
    }

    pub(crate) fn resolve(&mut self, outcome: Outcome) {
        self.outcome = Some(outcome);
    }

    pub(crate) fn begin_ingest(&mut self, batch: IngestBatch) {
        self.ingest = IngestPhase::Starting;
        self.ingest_kind = Some(batch.kind());
        self.batch = Some(batch);
        self.outcome = None;
    }

    pub(crate) fn set_ingest_phase(&mut self, phase: IngestPhase) {
        self.ingest = phase;
    }

    pub(crate) fn ingest_kind(&self) -> Option<ContentKind> {
        self.ingest_kind
    }

    pub(crate) fn record_completed_batch(&mut self) {
        self.completed_batches += 1;
    }

    pub(crate) fn take_batch(&mut self) -> Option<IngestBatch> {
        self.batch.take()
    }

    pub(crate) fn clear_ingest(&mut self) {
        self.ingest = IngestPhase::Idle;
        self.ingest_kind = None;
        self.batch = None;
    }

    pub(crate) fn begin_question(&mut self, question: &str) {
        self.transcript.push(Role::User, question);
        self.conversation = ConversationState::Waiting;
        self.outcome = None;
    }

    pub(crate) fn finish_question(&mut self, reply: String) {
        self.transcript.push(Role::Assistant, reply);
        self.conversation = ConversationState::Idle;
    }

    pub(crate) fn clear_transcript(&mut self) {
        self.transcript = Transcript::new();
    }
}
