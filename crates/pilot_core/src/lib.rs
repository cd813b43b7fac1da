//! Session core: content registry, ingestion and conversation state machines.
mod content;
mod effect;
mod ingest;
mod msg;
mod outcome;
mod registry;
mod state;
mod store;
mod transcript;
mod update;
mod view_model;

pub use content::{ContentId, ContentItem, ContentKind, ContentSeed, PASTED_TEXT_LABEL};
pub use effect::Effect;
pub use ingest::{status_label, IngestPhase, UploadFile};
pub use msg::Msg;
pub use outcome::{Failure, Outcome, Rejection};
pub use registry::{ContentRegistry, CONTENT_HISTORY_KEY, INGESTED_MARKER_KEY};
pub use state::{AppState, ConversationState, SessionStage};
pub use store::{DurableStore, MemoryStore, StoreError};
pub use transcript::{Message, Role, Transcript};
pub use update::update;
pub use view_model::AppViewModel;
