//! Session engine: backend IO, durable storage and effect execution.
mod backend;
mod protocol;
mod session;
mod settings;
mod store;
mod upload;

pub use backend::{Backend, BackendError, ProgressSink, ReqwestBackend, TransportEvent};
pub use protocol::{
    ChatOperation, ChatRequest, ChatResponse, ErrorBody, INGEST_TEXT_SENTINEL, NO_CONTENT_MARKER,
    PROBE_QUESTION,
};
pub use session::{Reconciliation, SessionOrchestrator};
pub use settings::{BackendSettings, SessionSettings};
pub use store::{FileStore, FileStoreError};
pub use upload::{load_upload, UploadError};
