use pilot_core::{Failure, UploadFile};
use pilot_logging::{pilot_info, pilot_warn};
use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use thiserror::Error;
use url::Url;

use crate::protocol::{ChatRequest, ChatResponse, ErrorBody, CHAT_PATH, UPLOAD_FIELD, UPLOAD_PATH};
use crate::BackendSettings;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("invalid backend endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("could not build request: {0}")]
    InvalidRequest(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("backend rejected request with status {status}")]
    Rejected { status: u16, detail: Option<String> },
    #[error("could not read response: {0}")]
    Decode(String),
}

impl From<BackendError> for Failure {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::InvalidEndpoint(reason) | BackendError::InvalidRequest(reason) => {
                Failure::InvalidRequest(reason)
            }
            BackendError::Timeout(reason) | BackendError::Network(reason) => {
                Failure::Network(reason)
            }
            BackendError::Rejected { status, detail } => Failure::Rejected { status, detail },
            BackendError::Decode(reason) => Failure::MalformedResponse(reason),
        }
    }
}

/// Transport milestones reported while an ingestion request is underway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportEvent {
    /// The request body is built and about to go on the wire.
    RequestSent,
    ResponseReceived { status: u16 },
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: TransportEvent);
}

#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// Ingest a batch of files as one request.
    async fn upload_files(
        &self,
        files: &[UploadFile],
        sink: &dyn ProgressSink,
    ) -> Result<(), BackendError>;

    async fn ingest_text(&self, text: &str, sink: &dyn ProgressSink) -> Result<(), BackendError>;

    /// Ask a question. `Ok(None)` means the backend answered without any text.
    async fn ask(&self, question: &str) -> Result<Option<String>, BackendError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    settings: BackendSettings,
}

impl ReqwestBackend {
    pub fn new(settings: BackendSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self) -> Result<reqwest::Client, BackendError> {
        let mut builder = reqwest::Client::builder().connect_timeout(self.settings.connect_timeout);
        if let Some(timeout) = self.settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        builder
            .build()
            .map_err(|err| BackendError::InvalidRequest(err.to_string()))
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        let mut base = self.settings.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        Url::parse(&base)
            .and_then(|url| url.join(path))
            .map_err(|err| BackendError::InvalidEndpoint(err.to_string()))
    }

    async fn post_chat(
        &self,
        request: &ChatRequest<'_>,
        sink: Option<&dyn ProgressSink>,
    ) -> Result<reqwest::Response, BackendError> {
        let url = self.endpoint(CHAT_PATH)?;
        let client = self.build_client()?;

        if let Some(sink) = sink {
            sink.emit(TransportEvent::RequestSent);
        }
        pilot_info!(
            "POST {} operation={:?} message_len={}",
            url,
            request.operation,
            request.message.len()
        );
        let response = client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        check_status(response, sink).await
    }
}

#[async_trait::async_trait]
impl Backend for ReqwestBackend {
    async fn upload_files(
        &self,
        files: &[UploadFile],
        sink: &dyn ProgressSink,
    ) -> Result<(), BackendError> {
        let url = self.endpoint(UPLOAD_PATH)?;
        let client = self.build_client()?;

        let mut form = Form::new();
        for file in files {
            let mut part = Part::bytes(file.bytes.clone()).file_name(file.name.clone());
            if let Some(mime) = file.mime.as_deref() {
                part = part
                    .mime_str(mime)
                    .map_err(|err| BackendError::InvalidRequest(err.to_string()))?;
            }
            form = form.part(UPLOAD_FIELD, part);
        }

        sink.emit(TransportEvent::RequestSent);
        pilot_info!("POST {} files={}", url, files.len());
        let response = client
            .post(url)
            .header(ACCEPT, "application/json")
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        check_status(response, Some(sink)).await?;
        Ok(())
    }

    async fn ingest_text(&self, text: &str, sink: &dyn ProgressSink) -> Result<(), BackendError> {
        self.post_chat(&ChatRequest::ingest_text(text), Some(sink))
            .await
            .map(|_| ())
    }

    async fn ask(&self, question: &str) -> Result<Option<String>, BackendError> {
        let response = self.post_chat(&ChatRequest::question(question), None).await?;
        let body = response.json::<ChatResponse>().await.map_err(|err| {
            pilot_warn!("Chat response body was not understood: {}", err);
            BackendError::Decode(err.to_string())
        })?;
        Ok(body.response)
    }
}

async fn check_status(
    response: reqwest::Response,
    sink: Option<&dyn ProgressSink>,
) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    pilot_info!("Backend responded with status {}", status);
    if let Some(sink) = sink {
        sink.emit(TransportEvent::ResponseReceived {
            status: status.as_u16(),
        });
    }
    if status.is_success() {
        return Ok(response);
    }

    let detail = match response.bytes().await {
        Ok(body) => serde_json::from_slice::<ErrorBody>(&body)
            .ok()
            .and_then(|body| body.detail),
        Err(err) => {
            pilot_warn!("Failed to read error body: {}", err);
            None
        }
    };
    Err(BackendError::Rejected {
        status: status.as_u16(),
        detail,
    })
}

fn map_reqwest_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        return BackendError::Timeout(err.to_string());
    }
    if err.is_builder() {
        return BackendError::InvalidRequest(err.to_string());
    }
    BackendError::Network(err.to_string())
}
