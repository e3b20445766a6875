use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

use supportdesk_api::SupportBackend;
use supportdesk_chat::{
    ChatPanel, ConversationStore, FileStore, IgnoreReason, KeyValueStore, MemoryStore,
    NotificationLevel, PanelOptions, PanelState, RecordingNotifier, SubmitOutcome,
};
use supportdesk_types::{
    conversation_key, Ack, Channel, ConversationView, DeskError, DeskResult, HealthStatus,
    QueryRequest, QueryResult, SessionId, Ticket, SESSION_STORAGE_KEY,
};

/// Scripted backend recording every query it receives
#[derive(Default)]
struct FakeBackend {
    delay: Duration,
    failure: Option<DeskError>,
    calls: Mutex<Vec<(&'static str, QueryRequest)>>,
}

impl FakeBackend {
    fn answering() -> Self {
        Self::default()
    }

    fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    fn failing(error: DeskError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<(&'static str, QueryRequest)> {
        self.calls.lock().unwrap().clone()
    }

    async fn respond(&self, endpoint: &'static str, request: &QueryRequest) -> DeskResult<QueryResult> {
        self.calls.lock().unwrap().push((endpoint, request.clone()));
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        Ok(answer_for(request))
    }
}

fn answer_for(request: &QueryRequest) -> QueryResult {
    serde_json::from_value(json!({
        "answer": format!("Answer to: {}", request.query),
        "citations": [{ "doc": "Docs", "url": "https://docs.example.com" }],
        "classification": {
            "topic": "API/SDK",
            "sentiment": "Curious",
            "priority": "P2",
            "confidence": 0.87
        },
        "classification_reasons": {
            "topic_reasoning": "SDK question",
            "sentiment_reasoning": "Inquisitive",
            "priority_reasoning": "Not blocking"
        },
        "processing_time": 1.2,
        "cache_hit": false,
        "followup_suggestions": [
            { "question": "How do I authenticate?" },
            { "question": "Which Python versions are supported?" }
        ],
        "session_id": request.session_id.as_str(),
        "response_type": "rag_response"
    }))
    .unwrap()
}

#[async_trait]
impl SupportBackend for FakeBackend {
    async fn submit_query(&self, request: &QueryRequest) -> DeskResult<QueryResult> {
        self.respond("query", request).await
    }

    async fn submit_followup_query(&self, request: &QueryRequest) -> DeskResult<QueryResult> {
        self.respond("followup", request).await
    }

    async fn get_conversation(&self, _session_id: &SessionId) -> DeskResult<ConversationView> {
        Err(DeskError::transport(Some(404), "Conversation not found"))
    }

    async fn clear_conversation(&self, _session_id: &SessionId) -> DeskResult<Ack> {
        Ok(Ack {
            message: "cleared".to_string(),
        })
    }

    async fn get_health(&self) -> DeskResult<HealthStatus> {
        Ok(HealthStatus {
            status: "healthy".to_string(),
            message: "ok".to_string(),
        })
    }

    async fn list_tickets(&self) -> DeskResult<Vec<Ticket>> {
        Ok(Vec::new())
    }
}

struct Harness {
    backend: Arc<FakeBackend>,
    store: Arc<dyn KeyValueStore>,
    notifier: Arc<RecordingNotifier>,
    panel: ChatPanel,
}

fn harness_with(backend: FakeBackend, store: Arc<dyn KeyValueStore>) -> Harness {
    let backend = Arc::new(backend);
    let notifier = Arc::new(RecordingNotifier::new());
    let panel = ChatPanel::new(
        backend.clone(),
        store.clone(),
        notifier.clone(),
        PanelOptions::default(),
    );
    Harness {
        backend,
        store,
        notifier,
        panel,
    }
}

fn harness(backend: FakeBackend) -> Harness {
    harness_with(backend, Arc::new(MemoryStore::new()))
}

#[tokio::test]
async fn test_submit_appends_question_then_answer() {
    let h = harness(FakeBackend::answering());

    let outcome = h.panel.submit("How do I install the Python SDK?").await;
    let answer = outcome.answer().expect("answered").clone();

    let messages = h.panel.messages().await;
    assert_eq!(messages.len(), 2);
    assert!(messages[0].is_user());
    assert_eq!(messages[0].content, "How do I install the Python SDK?");
    assert_eq!(messages[1], answer);

    let response = answer.response.as_ref().unwrap();
    assert!(!response.answer.is_empty());
    assert!((0.0..=1.0).contains(&response.classification.confidence));

    let calls = h.backend.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "query");
    assert_eq!(calls[0].1.channel, Channel::WebChat);
    assert_eq!(calls[0].1.session_id, h.panel.session_id().await);
    assert!(calls[0].1.include_followup);
    assert_eq!(h.panel.state(), PanelState::Idle);
}

#[tokio::test]
async fn test_input_is_trimmed_and_empty_input_ignored() {
    let h = harness(FakeBackend::answering());

    assert_eq!(
        h.panel.submit("   \n").await,
        SubmitOutcome::Ignored(IgnoreReason::EmptyInput)
    );
    assert!(h.panel.messages().await.is_empty());
    assert!(h.backend.calls().is_empty());

    h.panel.submit("  padded question  ").await;
    assert_eq!(h.backend.calls()[0].1.query, "padded question");
}

#[tokio::test]
async fn test_transport_error_keeps_question_only() {
    let h = harness(FakeBackend::failing(DeskError::transport(
        Some(503),
        "Classifier unavailable",
    )));

    let outcome = h.panel.submit("Is lineage broken?").await;
    match outcome {
        SubmitOutcome::Failed { question, error } => {
            assert_eq!(question.content, "Is lineage broken?");
            assert_eq!(error.status(), Some(503));
        }
        other => panic!("unexpected outcome {:?}", other),
    }

    let messages = h.panel.messages().await;
    assert_eq!(messages.len(), 1);
    assert!(messages[0].is_user());
    assert_eq!(h.panel.state(), PanelState::Idle);

    let notifications = h.notifier.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].level, NotificationLevel::Error);
    assert_eq!(notifications[0].message, "Classifier unavailable");
}

#[tokio::test]
async fn test_second_submit_while_awaiting_is_ignored() {
    let h = harness(FakeBackend::slow(Duration::from_millis(100)));

    let (first, second) = tokio::join!(h.panel.submit("first"), async {
        assert_eq!(h.panel.state(), PanelState::AwaitingResponse);
        h.panel.submit("second").await
    });

    assert!(matches!(first, SubmitOutcome::Answered { .. }));
    assert_eq!(second, SubmitOutcome::Ignored(IgnoreReason::Busy));

    let messages = h.panel.messages().await;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].content, "first");
    assert_eq!(h.backend.calls().len(), 1);

    // the guard is released once the first request completes
    assert!(matches!(
        h.panel.submit("third").await,
        SubmitOutcome::Answered { .. }
    ));
}

#[tokio::test]
async fn test_followup_selection_uses_followup_endpoint() {
    let h = harness(FakeBackend::answering());
    h.panel.submit("How do I install the Python SDK?").await;

    assert_eq!(
        h.panel.followup_suggestions().await,
        vec![
            "How do I authenticate?".to_string(),
            "Which Python versions are supported?".to_string()
        ]
    );

    let outcome = h.panel.select_followup(1).await;
    assert!(matches!(outcome, SubmitOutcome::Answered { .. }));

    let calls = h.backend.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].0, "followup");
    assert_eq!(calls[1].1.query, "Which Python versions are supported?");
    assert_eq!(h.panel.messages().await.len(), 4);

    assert_eq!(
        h.panel.select_followup(7).await,
        SubmitOutcome::Ignored(IgnoreReason::NoSuchSuggestion)
    );
}

#[tokio::test]
async fn test_channel_and_followup_flag_are_sent() {
    let h = harness(FakeBackend::answering());
    h.panel.set_channel(Channel::Slack).await;
    h.panel.set_include_followup(false).await;

    h.panel.submit("Connector keeps failing").await;

    let request = &h.backend.calls()[0].1;
    assert_eq!(request.channel, Channel::Slack);
    assert!(!request.include_followup);
}

#[tokio::test]
async fn test_new_session_starts_empty_and_keeps_old_conversation() {
    let h = harness(FakeBackend::answering());
    h.panel.submit("one").await;
    h.panel.submit("two").await;
    assert_eq!(h.panel.messages().await.len(), 4);
    let old = h.panel.session_id().await;

    let renewed = h.panel.new_session().await;
    assert_ne!(renewed, old);
    assert!(h.panel.messages().await.is_empty());

    let mut reader = ConversationStore::new(h.store.clone());
    assert!(reader.load(&renewed).is_empty());
    assert_eq!(reader.load(&old).len(), 4);
}

#[tokio::test]
async fn test_clear_session_drops_conversation_and_id() {
    let h = harness(FakeBackend::answering());
    h.panel.submit("one").await;
    let old = h.panel.session_id().await;

    let fresh = h.panel.clear_session().await;
    assert_ne!(fresh, old);
    assert!(h.panel.messages().await.is_empty());
    assert!(h.store.get(&conversation_key(&old)).unwrap().is_none());

    let stored = h.store.get(SESSION_STORAGE_KEY).unwrap().unwrap();
    assert_eq!(stored, format!("\"{}\"", fresh));
}

#[tokio::test]
async fn test_response_after_session_change_is_discarded() {
    let h = harness(FakeBackend::slow(Duration::from_millis(100)));

    let (outcome, renewed) = tokio::join!(h.panel.submit("slow question"), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        h.panel.new_session().await
    });

    assert!(matches!(outcome, SubmitOutcome::Discarded { .. }));
    assert_eq!(h.panel.session_id().await, renewed);
    assert!(h.panel.messages().await.is_empty());
}

#[tokio::test]
async fn test_conversation_survives_reload() {
    let temp = TempDir::new().unwrap();
    let first_session;
    let first_messages;
    {
        let store = Arc::new(FileStore::open(temp.path().join("storage")).unwrap());
        let h = harness_with(FakeBackend::answering(), store);
        h.panel.submit("one").await;
        h.panel.submit("two").await;
        first_session = h.panel.session_id().await;
        first_messages = h.panel.messages().await;
    }

    let store = Arc::new(FileStore::open(temp.path().join("storage")).unwrap());
    let h = harness_with(FakeBackend::answering(), store);
    assert_eq!(h.panel.session_id().await, first_session);
    assert_eq!(h.panel.messages().await, first_messages);
}

#[tokio::test]
async fn test_corrupt_conversation_loads_empty() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let session = SessionId::from("corrupted-session");
    store
        .set(SESSION_STORAGE_KEY, &format!("\"{}\"", session))
        .unwrap();
    store
        .set(&conversation_key(&session), "{not json")
        .unwrap();

    let h = harness_with(FakeBackend::answering(), store);
    assert_eq!(h.panel.session_id().await, session);
    assert!(h.panel.messages().await.is_empty());
    assert!(h.notifier.notifications().is_empty());
}
