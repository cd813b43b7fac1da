use crate::{ContentKind, ContentSeed, UploadFile};

/// IO the engine performs on behalf of the pure session core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    UploadFiles { files: Vec<UploadFile> },
    IngestText { text: String },
    AwaitSettle { kind: ContentKind },
    AskQuestion { question: String },
    /// Add one registry item per seed, in order.
    RegisterContent { seeds: Vec<ContentSeed> },
    MarkIngested,
    ClearContent,
    ClearIngestedMarker,
}
