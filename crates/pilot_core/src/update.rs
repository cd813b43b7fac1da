use pilot_logging::{pilot_debug, pilot_warn};

use crate::ingest::IngestBatch;
use crate::outcome::ANSWER_FALLBACK;
use crate::{
    AppState, ConversationState, Effect, IngestPhase, Msg, Outcome, Rejection, SessionStage,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::SessionRestored { ingested } => {
            state.set_stage(if ingested {
                SessionStage::Conversation
            } else {
                SessionStage::Ingestion
            });
            Vec::new()
        }
        Msg::FilesSubmitted(files) => {
            if files.is_empty() {
                state.reject(Rejection::EmptyInput);
                return (state, Vec::new());
            }
            submit_batch(&mut state, IngestBatch::Files(files))
        }
        Msg::TextSubmitted(text) => {
            if text.trim().is_empty() {
                state.reject(Rejection::EmptyInput);
                return (state, Vec::new());
            }
            submit_batch(&mut state, IngestBatch::Text(text))
        }
        Msg::IngestRequestSent => {
            if *state.ingest_phase() == IngestPhase::Starting {
                advance(&mut state, IngestPhase::Sending);
            }
            Vec::new()
        }
        Msg::IngestAccepted => {
            let awaiting_response = matches!(
                state.ingest_phase(),
                IngestPhase::Starting | IngestPhase::Sending
            );
            match state.ingest_kind() {
                Some(kind) if awaiting_response => {
                    advance(&mut state, IngestPhase::ServerProcessing);
                    vec![Effect::AwaitSettle { kind }]
                }
                _ => Vec::new(),
            }
        }
        Msg::IngestSettled => {
            if *state.ingest_phase() != IngestPhase::ServerProcessing {
                return (state, Vec::new());
            }
            let Some(batch) = state.take_batch() else {
                return (state, Vec::new());
            };
            advance(&mut state, IngestPhase::Complete);
            state.record_completed_batch();
            state.set_stage(SessionStage::Conversation);
            state.resolve(Outcome::Completed);
            vec![
                Effect::RegisterContent {
                    seeds: batch.seeds(),
                },
                Effect::MarkIngested,
            ]
        }
        Msg::IngestFailed(failure) => {
            if !state.ingest_phase().is_in_flight() {
                return (state, Vec::new());
            }
            let kind = state.take_batch().map(|batch| batch.kind());
            let message = match kind.or(state.ingest_kind()) {
                Some(kind) => failure.ingest_message(kind),
                None => failure.to_string(),
            };
            pilot_warn!("Ingestion failed: {}", failure);
            advance(
                &mut state,
                IngestPhase::Failed {
                    message: message.clone(),
                },
            );
            state.resolve(Outcome::Failed { message });
            Vec::new()
        }
        Msg::IngestDismissed => {
            if state.ingest_phase().is_terminal() {
                state.clear_ingest();
            }
            Vec::new()
        }
        Msg::QuestionSubmitted(question) => {
            if question.trim().is_empty() {
                state.reject(Rejection::EmptyInput);
                return (state, Vec::new());
            }
            if state.is_busy() {
                state.reject(Rejection::ConcurrentOperation);
                return (state, Vec::new());
            }
            state.begin_question(&question);
            vec![Effect::AskQuestion { question }]
        }
        Msg::AnswerReceived(answer) => {
            if state.conversation() == ConversationState::Waiting {
                let reply = answer
                    .filter(|text| !text.is_empty())
                    .unwrap_or_else(|| ANSWER_FALLBACK.to_string());
                state.finish_question(reply);
                state.resolve(Outcome::Completed);
            }
            Vec::new()
        }
        Msg::AnswerFailed(failure) => {
            if state.conversation() == ConversationState::Waiting {
                pilot_warn!("Question failed: {}", failure);
                let message = failure.answer_message();
                state.finish_question(message.clone());
                state.resolve(Outcome::Failed { message });
            }
            Vec::new()
        }
        Msg::IndexReportedEmpty { since } => {
            if state.ingest_phase().is_in_flight() || state.completed_batches() != since {
                pilot_debug!(
                    "Empty index report predates ingestion (since={} now={})",
                    since,
                    state.completed_batches()
                );
                state.reject(Rejection::Superseded);
                return (state, Vec::new());
            }
            state.set_stage(SessionStage::Ingestion);
            state.resolve(Outcome::Completed);
            vec![Effect::ClearIngestedMarker, Effect::ClearContent]
        }
        Msg::ContentAvailabilityChanged { conversable } => {
            if !state.ingest_phase().is_in_flight() {
                state.set_stage(if conversable {
                    SessionStage::Conversation
                } else {
                    SessionStage::Ingestion
                });
            }
            Vec::new()
        }
        Msg::ResetRequested => {
            if state.is_busy() {
                state.reject(Rejection::ConcurrentOperation);
                return (state, Vec::new());
            }
            state.clear_transcript();
            state.clear_ingest();
            state.set_stage(SessionStage::Ingestion);
            state.resolve(Outcome::Completed);
            vec![Effect::ClearContent, Effect::ClearIngestedMarker]
        }
    };

    (state, effects)
}

fn submit_batch(state: &mut AppState, batch: IngestBatch) -> Vec<Effect> {
    if state.is_busy() {
        state.reject(Rejection::ConcurrentOperation);
        return Vec::new();
    }
    let effect = match &batch {
        IngestBatch::Files(files) => Effect::UploadFiles {
            files: files.clone(),
        },
        IngestBatch::Text(text) => Effect::IngestText { text: text.clone() },
    };
    state.begin_ingest(batch);
    pilot_debug!("Ingestion phase -> {:?}", state.ingest_phase());
    vec![effect]
}

fn advance(state: &mut AppState, phase: IngestPhase) {
    pilot_debug!("Ingestion phase {:?} -> {:?}", state.ingest_phase(), phase);
    state.set_ingest_phase(phase);
}
