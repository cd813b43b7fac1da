use std::time::Duration;

use pilot_core::ContentKind;

#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// `None` lets a request run until the transport reports success or failure.
    pub request_timeout: Option<Duration>,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub backend: BackendSettings,
    /// Pause between an accepted upload and `Complete`, so the host can show
    /// that the backend is indexing.
    pub document_settle_delay: Duration,
    pub text_settle_delay: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            backend: BackendSettings::default(),
            document_settle_delay: Duration::from_millis(1000),
            text_settle_delay: Duration::ZERO,
        }
    }
}

impl SessionSettings {
    pub fn settle_delay(&self, kind: ContentKind) -> Duration {
        match kind {
            ContentKind::Document => self.document_settle_delay,
            ContentKind::Text => self.text_settle_delay,
        }
    }
}
