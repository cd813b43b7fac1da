use std::sync::Once;
use std::time::Duration;

use pilot_core::{
    ContentId, ContentKind, ContentSeed, DurableStore, IngestPhase, MemoryStore, Message, Outcome,
    Rejection, Role, SessionStage, UploadFile, INGESTED_MARKER_KEY, PASTED_TEXT_LABEL,
};
use pilot_engine::{BackendSettings, Reconciliation, SessionOrchestrator, SessionSettings};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(pilot_logging::initialize_for_tests);
}

fn settings_for(server: &MockServer) -> SessionSettings {
    SessionSettings {
        backend: BackendSettings {
            base_url: server.uri(),
            ..BackendSettings::default()
        },
        document_settle_delay: Duration::ZERO,
        ..SessionSettings::default()
    }
}

fn files(names: &[&str]) -> Vec<UploadFile> {
    names
        .iter()
        .map(|name| UploadFile::new(*name, b"content".to_vec()))
        .collect()
}

async fn mount_upload(server: &MockServer, template: ResponseTemplate, calls: u64) {
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(template)
        .expect(calls)
        .mount(server)
        .await;
}

async fn mount_chat(server: &MockServer, template: ResponseTemplate, calls: u64) {
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(template)
        .expect(calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn successful_upload_registers_documents_in_input_order() {
    init_logging();
    let server = MockServer::start().await;
    mount_upload(&server, ResponseTemplate::new(200).set_body_json(json!({})), 1).await;

    let store = MemoryStore::new();
    let session = SessionOrchestrator::connect(store.clone(), settings_for(&server));
    assert_eq!(session.stage(), SessionStage::Ingestion);

    let outcome = session.submit_files(files(&["a.pdf", "b.txt"])).await;

    assert_eq!(outcome, Outcome::Completed);
    let content = session.content();
    let names: Vec<_> = content.iter().map(|item| item.name.as_str()).collect();
    assert_eq!(names, vec!["a.pdf", "b.txt"]);
    assert!(content
        .iter()
        .all(|item| item.kind == ContentKind::Document && item.active));
    assert_eq!(session.stage(), SessionStage::Conversation);
    assert!(store.get(INGESTED_MARKER_KEY).is_some());

    let view = session.view();
    assert_eq!(view.ingest_phase, IngestPhase::Complete);
    assert_eq!(view.ingest_status.as_deref(), Some("Upload complete!"));
}

#[tokio::test]
async fn failed_upload_leaves_registry_untouched() {
    init_logging();
    let server = MockServer::start().await;
    mount_upload(
        &server,
        ResponseTemplate::new(500).set_body_json(json!({"detail": "Unsupported file type: c.docx"})),
        1,
    )
    .await;

    let session = SessionOrchestrator::connect(MemoryStore::new(), settings_for(&server));
    session.initialize_content(vec![ContentSeed::new(ContentKind::Document, "existing.pdf")]);
    let before = session.content();

    let outcome = session
        .submit_files(files(&["a.pdf", "b.txt", "c.docx"]))
        .await;

    assert_eq!(
        outcome,
        Outcome::Failed {
            message: "Unsupported file type: c.docx".to_string()
        }
    );
    assert_eq!(session.content(), before);
    assert_eq!(
        session.view().ingest_error.as_deref(),
        Some("Unsupported file type: c.docx")
    );
}

#[tokio::test]
async fn unreachable_backend_fails_ingestion_with_generic_message() {
    init_logging();
    let settings = SessionSettings {
        backend: BackendSettings {
            base_url: "http://127.0.0.1:1".to_string(),
            ..BackendSettings::default()
        },
        ..SessionSettings::default()
    };
    let session = SessionOrchestrator::connect(MemoryStore::new(), settings);

    let outcome = session.submit_files(files(&["a.pdf"])).await;
    assert_eq!(
        outcome,
        Outcome::Failed {
            message: "Failed to upload files".to_string()
        }
    );
    assert!(session.content().is_empty());

    // The failed batch does not block a resubmission.
    let outcome = session.submit_pasted_text("notes").await;
    assert!(matches!(outcome, Outcome::Failed { .. }));
}

#[tokio::test]
async fn empty_batch_makes_no_request() {
    init_logging();
    let server = MockServer::start().await;
    mount_upload(&server, ResponseTemplate::new(200), 0).await;

    let session = SessionOrchestrator::connect(MemoryStore::new(), settings_for(&server));
    let outcome = session.submit_files(Vec::new()).await;

    assert_eq!(outcome, Outcome::Ignored(Rejection::EmptyInput));
    assert_eq!(session.view().ingest_phase, IngestPhase::Idle);
}

#[tokio::test]
async fn pasted_text_registers_text_item() {
    init_logging();
    let server = MockServer::start().await;
    mount_chat(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({"response": "Text processed successfully"})),
        1,
    )
    .await;

    let session = SessionOrchestrator::connect(MemoryStore::new(), settings_for(&server));
    assert_eq!(
        session.submit_pasted_text("   ").await,
        Outcome::Ignored(Rejection::EmptyInput)
    );
    assert_eq!(session.submit_pasted_text("some notes").await, Outcome::Completed);

    let content = session.content();
    assert_eq!(content.len(), 1);
    assert_eq!(content[0].kind, ContentKind::Text);
    assert_eq!(content[0].name, PASTED_TEXT_LABEL);
    assert_eq!(
        session.view().ingest_status.as_deref(),
        Some("Text processed successfully!")
    );
}

#[tokio::test]
async fn settle_delay_holds_server_processing_and_blocks_questions() {
    init_logging();
    let server = MockServer::start().await;
    mount_upload(&server, ResponseTemplate::new(200), 1).await;
    mount_chat(&server, ResponseTemplate::new(200), 0).await;

    let settings = SessionSettings {
        document_settle_delay: Duration::from_millis(600),
        ..settings_for(&server)
    };
    let session = SessionOrchestrator::connect(MemoryStore::new(), settings);

    let probe = async {
        tokio::time::sleep(Duration::from_millis(200)).await;
        let phase = session.view().ingest_phase;
        let status = session.view().ingest_status;
        let asked = session.ask("Too early?").await;
        (phase, status, asked)
    };
    let (outcome, (phase, status, asked)) =
        tokio::join!(session.submit_files(files(&["a.pdf"])), probe);

    assert_eq!(outcome, Outcome::Completed);
    assert_eq!(phase, IngestPhase::ServerProcessing);
    assert_eq!(status.as_deref(), Some("Processing files..."));
    assert_eq!(asked, Outcome::Ignored(Rejection::ConcurrentOperation));
    assert!(session.view().messages.is_empty());
}

#[tokio::test]
async fn blank_question_is_not_sent() {
    init_logging();
    let server = MockServer::start().await;
    mount_chat(&server, ResponseTemplate::new(200), 0).await;

    let session = SessionOrchestrator::connect(MemoryStore::new(), settings_for(&server));
    assert_eq!(session.ask("").await, Outcome::Ignored(Rejection::EmptyInput));
    assert_eq!(session.ask("  \n").await, Outcome::Ignored(Rejection::EmptyInput));
    assert!(session.view().messages.is_empty());
}

#[tokio::test]
async fn overlapping_question_is_rejected() {
    init_logging();
    let server = MockServer::start().await;
    mount_chat(
        &server,
        ResponseTemplate::new(200)
            .set_delay(Duration::from_millis(200))
            .set_body_json(json!({"response": "X is a letter."})),
        1,
    )
    .await;

    let session = SessionOrchestrator::connect(MemoryStore::new(), settings_for(&server));
    let (first, second) = tokio::join!(session.ask("What is X?"), session.ask("And Y?"));

    assert_eq!(first, Outcome::Completed);
    assert_eq!(second, Outcome::Ignored(Rejection::ConcurrentOperation));
    assert_eq!(
        session.view().messages,
        vec![
            Message {
                role: Role::User,
                content: "What is X?".to_string()
            },
            Message {
                role: Role::Assistant,
                content: "X is a letter.".to_string()
            },
        ]
    );
    assert!(!session.view().waiting_for_answer);
}

#[tokio::test]
async fn undecodable_answer_is_shown_inline() {
    init_logging();
    let server = MockServer::start().await;
    mount_chat(
        &server,
        ResponseTemplate::new(200).set_body_string("<html>oops</html>"),
        1,
    )
    .await;

    let session = SessionOrchestrator::connect(MemoryStore::new(), settings_for(&server));
    let outcome = session.ask("What is X?").await;

    let Outcome::Failed { message } = outcome else {
        panic!("expected a failed answer, got {outcome:?}");
    };
    assert!(!message.is_empty());
    assert_ne!(message, "Sorry, I could not process your request.");
    let view = session.view();
    assert_eq!(view.messages[1].content, message);
    assert!(!view.waiting_for_answer);
}

#[tokio::test]
async fn question_failure_is_shown_inline() {
    init_logging();
    let server = MockServer::start().await;
    mount_chat(
        &server,
        ResponseTemplate::new(500).set_body_json(json!({"detail": "LLM unavailable"})),
        1,
    )
    .await;

    let session = SessionOrchestrator::connect(MemoryStore::new(), settings_for(&server));
    let outcome = session.ask("What is X?").await;

    assert_eq!(
        outcome,
        Outcome::Failed {
            message: "LLM unavailable".to_string()
        }
    );
    let view = session.view();
    assert_eq!(view.messages.len(), 2);
    assert_eq!(view.messages[1].role, Role::Assistant);
    assert_eq!(view.messages[1].content, "LLM unavailable");
    assert_eq!(view.ingest_error, None);
}

#[tokio::test]
async fn empty_index_probe_resets_persisted_session() {
    init_logging();
    let server = MockServer::start().await;
    mount_chat(
        &server,
        ResponseTemplate::new(500).set_body_json(json!({"detail": "No documents indexed"})),
        1,
    )
    .await;

    let store = MemoryStore::new();
    let session = SessionOrchestrator::connect(store.clone(), settings_for(&server));
    session.initialize_content(vec![ContentSeed::new(ContentKind::Document, "a.pdf")]);
    assert_eq!(session.stage(), SessionStage::Conversation);
    assert!(store.get(INGESTED_MARKER_KEY).is_some());

    assert_eq!(
        session.reconcile_startup().await,
        Reconciliation::ResetRequired
    );
    assert!(store.get(INGESTED_MARKER_KEY).is_none());
    assert!(session.content().is_empty());
    assert_eq!(session.stage(), SessionStage::Ingestion);
}

#[tokio::test]
async fn empty_index_report_does_not_erase_concurrent_upload() {
    init_logging();
    let server = MockServer::start().await;
    mount_upload(&server, ResponseTemplate::new(200), 1).await;
    mount_chat(
        &server,
        ResponseTemplate::new(500)
            .set_delay(Duration::from_millis(300))
            .set_body_json(json!({"detail": "No documents indexed"})),
        1,
    )
    .await;

    let store = MemoryStore::new();
    let session = SessionOrchestrator::connect(store.clone(), settings_for(&server));
    let (reconciliation, upload) = tokio::join!(
        session.reconcile_startup(),
        session.submit_files(files(&["a.pdf"]))
    );

    assert_eq!(upload, Outcome::Completed);
    assert!(matches!(reconciliation, Reconciliation::Inconclusive(_)));
    assert_eq!(session.content().len(), 1);
    assert_eq!(session.stage(), SessionStage::Conversation);
    assert!(store.get(INGESTED_MARKER_KEY).is_some());
}

#[tokio::test]
async fn healthy_probe_changes_nothing() {
    init_logging();
    let server = MockServer::start().await;
    mount_chat(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({"response": "ok"})),
        1,
    )
    .await;

    let store = MemoryStore::new();
    let session = SessionOrchestrator::connect(store.clone(), settings_for(&server));
    session.initialize_content(vec![ContentSeed::new(ContentKind::Document, "a.pdf")]);

    assert_eq!(session.reconcile_startup().await, Reconciliation::Confirmed);
    assert_eq!(session.content().len(), 1);
    assert!(store.get(INGESTED_MARKER_KEY).is_some());
    // The probe is not part of the conversation.
    assert!(session.view().messages.is_empty());
}

#[tokio::test]
async fn unreachable_probe_is_inconclusive() {
    init_logging();
    let settings = SessionSettings {
        backend: BackendSettings {
            base_url: "http://127.0.0.1:1".to_string(),
            ..BackendSettings::default()
        },
        ..SessionSettings::default()
    };
    let store = MemoryStore::new();
    let session = SessionOrchestrator::connect(store.clone(), settings);
    session.initialize_content(vec![ContentSeed::new(ContentKind::Document, "a.pdf")]);

    assert!(matches!(
        session.reconcile_startup().await,
        Reconciliation::Inconclusive(_)
    ));
    assert_eq!(session.stage(), SessionStage::Conversation);
    assert!(store.get(INGESTED_MARKER_KEY).is_some());
}

#[tokio::test]
async fn session_state_survives_reload() {
    init_logging();
    let server = MockServer::start().await;
    mount_upload(&server, ResponseTemplate::new(200), 1).await;

    let store = MemoryStore::new();
    let session = SessionOrchestrator::connect(store.clone(), settings_for(&server));
    session.submit_files(files(&["a.pdf", "b.txt"])).await;
    let first = session.content()[0].id.clone();
    assert_eq!(session.toggle_content(&first), Some(false));
    let before = session.content();

    let reloaded = SessionOrchestrator::connect(store, settings_for(&server));
    assert_eq!(reloaded.content(), before);
    assert_eq!(reloaded.active_content().len(), 1);
    assert_eq!(reloaded.stage(), SessionStage::Conversation);
    assert!(reloaded.view().messages.is_empty());
}

#[tokio::test]
async fn reset_session_clears_content_transcript_and_marker() {
    init_logging();
    let server = MockServer::start().await;
    mount_upload(&server, ResponseTemplate::new(200), 1).await;
    mount_chat(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({"response": "Answer"})),
        1,
    )
    .await;

    let store = MemoryStore::new();
    let session = SessionOrchestrator::connect(store.clone(), settings_for(&server));
    session.submit_files(files(&["a.pdf"])).await;
    session.ask("Q").await;
    assert_eq!(session.view().messages.len(), 2);

    assert_eq!(session.reset_session().await, Outcome::Completed);
    assert!(session.content().is_empty());
    assert!(session.view().messages.is_empty());
    assert_eq!(session.view().ingest_phase, IngestPhase::Idle);
    assert_eq!(session.stage(), SessionStage::Ingestion);
    assert!(store.get(INGESTED_MARKER_KEY).is_none());
}

#[tokio::test]
async fn removing_content_is_persisted() {
    init_logging();
    let store = MemoryStore::new();
    let session = SessionOrchestrator::connect(store.clone(), SessionSettings::default());
    session.initialize_content(vec![
        ContentSeed::new(ContentKind::Document, "a.pdf"),
        ContentSeed::new(ContentKind::Text, PASTED_TEXT_LABEL),
    ]);
    let first = session.content()[0].clone();

    assert_eq!(session.remove_content(&first.id), Some(first.clone()));
    assert_eq!(session.remove_content(&first.id), None);

    let reloaded = SessionOrchestrator::connect(store, SessionSettings::default());
    assert_eq!(reloaded.content().len(), 1);
    assert_eq!(reloaded.content()[0].name, PASTED_TEXT_LABEL);
}

#[tokio::test]
async fn deactivating_all_content_leaves_conversation() {
    init_logging();
    let store = MemoryStore::new();
    let session = SessionOrchestrator::connect(store.clone(), SessionSettings::default());
    session.initialize_content(vec![ContentSeed::new(ContentKind::Document, "a.pdf")]);
    assert_eq!(session.stage(), SessionStage::Conversation);
    let id = session.content()[0].id.clone();

    assert_eq!(session.toggle_content(&id), Some(false));
    assert_eq!(session.stage(), SessionStage::Ingestion);

    let reloaded = SessionOrchestrator::connect(store.clone(), SessionSettings::default());
    assert!(reloaded.active_content().is_empty());
    assert_eq!(reloaded.stage(), SessionStage::Ingestion);

    assert_eq!(reloaded.toggle_content(&id), Some(true));
    assert_eq!(reloaded.stage(), SessionStage::Conversation);
    let reloaded = SessionOrchestrator::connect(store, SessionSettings::default());
    assert_eq!(reloaded.stage(), SessionStage::Conversation);
}

#[tokio::test]
async fn removing_last_item_leaves_conversation() {
    init_logging();
    let session = SessionOrchestrator::connect(MemoryStore::new(), SessionSettings::default());
    session.initialize_content(vec![
        ContentSeed::new(ContentKind::Document, "a.pdf"),
        ContentSeed::new(ContentKind::Text, PASTED_TEXT_LABEL),
    ]);
    let content = session.content();

    session.remove_content(&content[0].id);
    assert_eq!(session.stage(), SessionStage::Conversation);
    session.remove_content(&content[1].id);
    assert!(session.content().is_empty());
    assert_eq!(session.stage(), SessionStage::Ingestion);
}

#[tokio::test]
async fn unknown_ids_do_not_change_stage() {
    init_logging();
    let session = SessionOrchestrator::connect(MemoryStore::new(), SessionSettings::default());
    session.initialize_content(vec![ContentSeed::new(ContentKind::Document, "a.pdf")]);
    let missing = ContentId::generate();

    assert_eq!(session.toggle_content(&missing), None);
    assert_eq!(session.remove_content(&missing), None);
    assert_eq!(session.stage(), SessionStage::Conversation);
}
