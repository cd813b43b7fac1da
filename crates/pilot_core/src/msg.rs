use crate::{Failure, UploadFile};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Session start: whether persisted state says content was already ingested.
    SessionRestored { ingested: bool },
    /// User dropped or picked a batch of files.
    FilesSubmitted(Vec<UploadFile>),
    /// User pasted a text block for ingestion.
    TextSubmitted(String),
    /// The ingestion request was built and handed to the transport.
    IngestRequestSent,
    /// The backend accepted the ingestion batch.
    IngestAccepted,
    /// The post-acceptance settle delay elapsed.
    IngestSettled,
    /// The ingestion request failed.
    IngestFailed(Failure),
    /// User closed the finished ingestion panel.
    IngestDismissed,
    /// User asked a question.
    QuestionSubmitted(String),
    /// Backend answered; `None` when the response carried no answer text.
    AnswerReceived(Option<String>),
    /// The question request failed.
    AnswerFailed(Failure),
    /// The startup probe found nothing indexed on the backend. `since` is the
    /// completed batch count observed when the probe was sent.
    IndexReportedEmpty { since: u64 },
    /// The content list changed; `conversable` is true when content was
    /// ingested and at least one item is still active.
    ContentAvailabilityChanged { conversable: bool },
    /// User asked to start over with new content.
    ResetRequested,
}
