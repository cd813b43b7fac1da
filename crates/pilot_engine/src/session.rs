//! Session orchestrator: runs the effects of the pure session core against the
//! backend and the content registry.
//!
//! State lives behind a mutex that is never held across an await, so the
//! orchestrator can be shared by reference between concurrently polled
//! operations. Guards in the core reject overlapping submissions.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use pilot_core::{
    update, AppState, AppViewModel, ContentId, ContentItem, ContentRegistry, ContentSeed,
    DurableStore, Effect, Failure, Msg, Outcome, SessionStage, UploadFile,
};
use pilot_logging::{pilot_debug, pilot_info, pilot_warn};

use crate::protocol::{NO_CONTENT_MARKER, PROBE_QUESTION};
use crate::{Backend, ProgressSink, ReqwestBackend, SessionSettings, TransportEvent};

/// Result of the startup consistency probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// The backend answered; its index and the persisted state agree.
    Confirmed,
    /// The backend has nothing indexed; the session was sent back to ingestion.
    ResetRequired,
    /// The probe failed for another reason; nothing was changed.
    Inconclusive(Failure),
}

struct Session<S: DurableStore> {
    state: AppState,
    registry: ContentRegistry<S>,
}

pub struct SessionOrchestrator<B: Backend, S: DurableStore> {
    backend: B,
    settings: SessionSettings,
    session: Mutex<Session<S>>,
}

impl<S: DurableStore> SessionOrchestrator<ReqwestBackend, S> {
    /// Orchestrator talking HTTP to the backend named in `settings`.
    pub fn connect(store: S, settings: SessionSettings) -> Self {
        let backend = ReqwestBackend::new(settings.backend.clone());
        Self::new(backend, store, settings)
    }
}

impl<B: Backend, S: DurableStore> SessionOrchestrator<B, S> {
    /// Start a session from whatever the store remembers.
    pub fn new(backend: B, store: S, settings: SessionSettings) -> Self {
        let registry = ContentRegistry::hydrate(store);
        let ingested = is_conversable(&registry);
        let (state, _) = update(AppState::new(), Msg::SessionRestored { ingested });
        pilot_info!(
            "Session restored: stage={:?} items={}",
            state.stage(),
            registry.len()
        );
        Self {
            backend,
            settings,
            session: Mutex::new(Session { state, registry }),
        }
    }

    /// Replace the content list with content produced before this session.
    pub fn initialize_content(&self, seed: impl IntoIterator<Item = ContentSeed>) {
        let conversable = {
            let mut session = self.lock();
            session.registry.initialize(seed);
            if !session.registry.is_empty() {
                session.registry.set_ingested_marker();
            }
            is_conversable(&session.registry)
        };
        self.dispatch(Msg::ContentAvailabilityChanged { conversable });
    }

    pub async fn submit_files(&self, files: Vec<UploadFile>) -> Outcome {
        pilot_info!("Submitting {} file(s) for ingestion", files.len());
        self.run(Msg::FilesSubmitted(files)).await
    }

    pub async fn submit_pasted_text(&self, text: impl Into<String>) -> Outcome {
        let text = text.into();
        pilot_info!("Submitting pasted text len={}", text.len());
        self.run(Msg::TextSubmitted(text)).await
    }

    pub async fn ask(&self, question: impl Into<String>) -> Outcome {
        self.run(Msg::QuestionSubmitted(question.into())).await
    }

    /// Probe the backend and fall back to ingestion if it reports an empty index.
    ///
    /// The report is discarded when an ingestion batch completed or was still
    /// in flight by the time the probe answered.
    pub async fn reconcile_startup(&self) -> Reconciliation {
        let since = self.lock().state.completed_batches();
        let failure = match self.backend.ask(PROBE_QUESTION).await {
            Ok(_) => {
                pilot_info!("Startup probe confirmed backend index");
                return Reconciliation::Confirmed;
            }
            Err(err) => Failure::from(err),
        };

        if failure
            .detail()
            .is_some_and(|detail| detail.contains(NO_CONTENT_MARKER))
        {
            let outcome = self.run(Msg::IndexReportedEmpty { since }).await;
            if let Outcome::Ignored(rejection) = outcome {
                pilot_warn!("Empty index report superseded by ingestion: {:?}", rejection);
                return Reconciliation::Inconclusive(failure);
            }
            pilot_info!("Backend reports no indexed content; returned to ingestion");
            return Reconciliation::ResetRequired;
        }
        pilot_warn!("Startup probe inconclusive: {}", failure);
        Reconciliation::Inconclusive(failure)
    }

    /// Drop all content, the transcript and the ingestion marker.
    pub async fn reset_session(&self) -> Outcome {
        self.run(Msg::ResetRequested).await
    }

    pub fn dismiss_ingestion(&self) {
        self.dispatch(Msg::IngestDismissed);
    }

    pub fn toggle_content(&self, id: &ContentId) -> Option<bool> {
        let (active, conversable) = {
            let mut session = self.lock();
            let active = session.registry.toggle_active(id);
            (active, is_conversable(&session.registry))
        };
        if active.is_some() {
            self.dispatch(Msg::ContentAvailabilityChanged { conversable });
        }
        active
    }

    pub fn remove_content(&self, id: &ContentId) -> Option<ContentItem> {
        let (removed, conversable) = {
            let mut session = self.lock();
            let removed = session.registry.remove(id);
            (removed, is_conversable(&session.registry))
        };
        if removed.is_some() {
            self.dispatch(Msg::ContentAvailabilityChanged { conversable });
        }
        removed
    }

    pub fn content(&self) -> Vec<ContentItem> {
        self.lock().registry.list().to_vec()
    }

    pub fn active_content(&self) -> Vec<ContentItem> {
        self.lock().registry.active_items().cloned().collect()
    }

    pub fn stage(&self) -> SessionStage {
        self.lock().state.stage()
    }

    pub fn view(&self) -> AppViewModel {
        self.lock().state.view()
    }

    fn lock(&self) -> MutexGuard<'_, Session<S>> {
        lock_session(&self.session)
    }

    fn dispatch(&self, msg: Msg) -> (Vec<Effect>, Option<Outcome>) {
        apply(&self.session, msg)
    }

    async fn run(&self, msg: Msg) -> Outcome {
        let (effects, mut outcome) = self.dispatch(msg);
        let mut queue = VecDeque::from(effects);
        while let Some(effect) = queue.pop_front() {
            let Some(next) = self.execute(effect).await else {
                continue;
            };
            let (effects, resolved) = self.dispatch(next);
            queue.extend(effects);
            if resolved.is_some() {
                outcome = resolved;
            }
        }
        outcome.unwrap_or(Outcome::Completed)
    }

    async fn execute(&self, effect: Effect) -> Option<Msg> {
        match effect {
            Effect::UploadFiles { files } => {
                let sink = SessionSink {
                    session: &self.session,
                };
                Some(match self.backend.upload_files(&files, &sink).await {
                    Ok(()) => Msg::IngestAccepted,
                    Err(err) => Msg::IngestFailed(err.into()),
                })
            }
            Effect::IngestText { text } => {
                let sink = SessionSink {
                    session: &self.session,
                };
                Some(match self.backend.ingest_text(&text, &sink).await {
                    Ok(()) => Msg::IngestAccepted,
                    Err(err) => Msg::IngestFailed(err.into()),
                })
            }
            Effect::AwaitSettle { kind } => {
                let delay = self.settings.settle_delay(kind);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Some(Msg::IngestSettled)
            }
            Effect::AskQuestion { question } => {
                pilot_info!("Asking question len={}", question.len());
                Some(match self.backend.ask(&question).await {
                    Ok(answer) => Msg::AnswerReceived(answer),
                    Err(err) => Msg::AnswerFailed(err.into()),
                })
            }
            Effect::RegisterContent { seeds } => {
                let mut session = self.lock();
                for seed in seeds {
                    session.registry.add(seed.kind, seed.name);
                }
                None
            }
            Effect::MarkIngested => {
                self.lock().registry.set_ingested_marker();
                None
            }
            Effect::ClearContent => {
                self.lock().registry.clear();
                None
            }
            Effect::ClearIngestedMarker => {
                self.lock().registry.clear_ingested_marker();
                None
            }
        }
    }
}

/// Feeds transport milestones of an ingestion request back into the session.
struct SessionSink<'a, S: DurableStore> {
    session: &'a Mutex<Session<S>>,
}

impl<S: DurableStore> ProgressSink for SessionSink<'_, S> {
    fn emit(&self, event: TransportEvent) {
        match event {
            TransportEvent::RequestSent => {
                apply(self.session, Msg::IngestRequestSent);
            }
            TransportEvent::ResponseReceived { status } => {
                pilot_debug!("Ingestion response status {}", status);
            }
        }
    }
}

/// Conversation needs ingested content with at least one item in scope.
fn is_conversable<S: DurableStore>(registry: &ContentRegistry<S>) -> bool {
    registry.ingested_marker() && registry.has_active_content()
}

fn lock_session<S: DurableStore>(session: &Mutex<Session<S>>) -> MutexGuard<'_, Session<S>> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

fn apply<S: DurableStore>(session: &Mutex<Session<S>>, msg: Msg) -> (Vec<Effect>, Option<Outcome>) {
    let mut session = lock_session(session);
    let state = std::mem::take(&mut session.state);
    let (mut state, effects) = update(state, msg);
    let outcome = state.take_outcome();
    session.state = state;
    (effects, outcome)
}
