use clap::Parser;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::process::ExitCode;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use supportdesk::app::commands;
use supportdesk::config::FileConfig;
use supportdesk::{AppConfig, Cli, Desk, SessionAction};
use supportdesk_chat::ConversationStore;
use supportdesk_types::SessionId;

fn query_result(answer: &str, session_id: &str) -> Value {
    json!({
        "answer": answer,
        "citations": [],
        "classification": {
            "topic": "How-to",
            "sentiment": "Curious",
            "priority": "P2",
            "confidence": 0.8
        },
        "classification_reasons": {
            "topic_reasoning": "asks how",
            "sentiment_reasoning": "neutral",
            "priority_reasoning": "low impact"
        },
        "processing_time": 0.9,
        "cache_hit": true,
        "followup_suggestions": [],
        "session_id": session_id,
        "response_type": "rag_response"
    })
}

fn desk_for(server: &MockServer, data_dir: &TempDir) -> Desk {
    let uri = server.uri();
    let cli = Cli::try_parse_from(["supportdesk", "--backend-url", uri.as_str()]).unwrap();
    let config = AppConfig::resolve(&cli, data_dir.path().to_path_buf(), FileConfig::default()).unwrap();
    Desk::open(config)
}

fn words(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

#[tokio::test]
async fn test_ask_stores_exchange_and_logs_it() {
    let server = MockServer::start().await;
    let data_dir = TempDir::new().unwrap();
    let desk = desk_for(&server, &data_dir);
    let session_id = desk.panel().session_id().await;

    Mock::given(method("POST"))
        .and(path("/api/query"))
        .and(body_partial_json(json!({
            "query": "How do I install the Python SDK?",
            "channel": "Web Chat",
            "include_followup": true
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(query_result("pip install it", session_id.as_str())),
        )
        .expect(1)
        .mount(&server)
        .await;

    let code = commands::run_ask(&desk, &words("How do I install the Python SDK?"), false)
        .await
        .unwrap();
    assert_eq!(code, ExitCode::SUCCESS);

    let messages = desk.panel().messages().await;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].content, "pip install it");

    let logs: Vec<_> = std::fs::read_dir(data_dir.path().join("logs"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(logs.len(), 1);
    let content = std::fs::read_to_string(&logs[0]).unwrap();
    let lines: Vec<Value> = content
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["role"], "user");
    assert_eq!(lines[1]["topic"], "How-to");
}

#[tokio::test]
async fn test_ask_failure_keeps_question_only() {
    let server = MockServer::start().await;
    let data_dir = TempDir::new().unwrap();
    let desk = desk_for(&server, &data_dir);

    Mock::given(method("POST"))
        .and(path("/api/query"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "detail": "boom" })))
        .mount(&server)
        .await;

    let code = commands::run_ask(&desk, &words("anything at all"), false)
        .await
        .unwrap();
    assert_eq!(code, ExitCode::FAILURE);

    let messages = desk.panel().messages().await;
    assert_eq!(messages.len(), 1);
    assert!(messages[0].is_user());
}

#[tokio::test]
async fn test_ask_blank_input_exits_without_request() {
    let server = MockServer::start().await;
    let data_dir = TempDir::new().unwrap();
    let desk = desk_for(&server, &data_dir);

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let code = commands::run_ask(&desk, &words("   "), false).await.unwrap();
    assert_eq!(code, ExitCode::from(2));
    assert!(desk.panel().messages().await.is_empty());
}

#[tokio::test]
async fn test_health_reports_status_in_exit_code() {
    let server = MockServer::start().await;
    let data_dir = TempDir::new().unwrap();
    let desk = desk_for(&server, &data_dir);

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "degraded",
            "message": "vector store offline"
        })))
        .mount(&server)
        .await;

    let code = commands::run_health(&desk, false, 30).await.unwrap();
    assert_eq!(code, ExitCode::FAILURE);
}

#[tokio::test]
async fn test_health_ok_and_unreachable() {
    let server = MockServer::start().await;
    let data_dir = TempDir::new().unwrap();
    let desk = desk_for(&server, &data_dir);

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "healthy",
            "message": "all systems go"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Support API" })))
        .mount(&server)
        .await;

    let code = commands::run_health(&desk, false, 30).await.unwrap();
    assert_eq!(code, ExitCode::SUCCESS);

    let cli = Cli::try_parse_from(["supportdesk", "--backend-url", "http://127.0.0.1:1"]).unwrap();
    let config = AppConfig::resolve(&cli, data_dir.path().to_path_buf(), FileConfig::default()).unwrap();
    let offline = Desk::open(config);
    let code = commands::run_health(&offline, false, 30).await.unwrap();
    assert_eq!(code, ExitCode::FAILURE);
}

#[tokio::test]
async fn test_session_new_keeps_previous_conversation() {
    let server = MockServer::start().await;
    let data_dir = TempDir::new().unwrap();
    let desk = desk_for(&server, &data_dir);
    let first = desk.panel().session_id().await;

    Mock::given(method("POST"))
        .and(path("/api/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(query_result("ok", first.as_str())))
        .mount(&server)
        .await;

    commands::run_ask(&desk, &words("one"), false).await.unwrap();
    commands::run_ask(&desk, &words("two"), false).await.unwrap();
    commands::run_session(&desk, &SessionAction::New).await.unwrap();

    let second = desk.panel().session_id().await;
    assert_ne!(second, first);
    assert!(desk.panel().messages().await.is_empty());

    let mut reader = ConversationStore::new(desk.store.clone());
    assert_eq!(reader.load(&first).len(), 4);
}

#[tokio::test]
async fn test_session_clear_remote_deletes_backend_record() {
    let server = MockServer::start().await;
    let data_dir = TempDir::new().unwrap();
    let desk = desk_for(&server, &data_dir);
    let first: SessionId = desk.panel().session_id().await;

    Mock::given(method("DELETE"))
        .and(path(format!("/api/conversation/{}", first)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "cleared" })))
        .expect(1)
        .mount(&server)
        .await;

    commands::run_session(&desk, &SessionAction::Clear { remote: true })
        .await
        .unwrap();

    assert_ne!(desk.panel().session_id().await, first);
}

#[tokio::test]
async fn test_tickets_and_remote_history_hit_backend() {
    let server = MockServer::start().await;
    let data_dir = TempDir::new().unwrap();
    let desk = desk_for(&server, &data_dir);
    let session = desk.panel().session_id().await;

    Mock::given(method("GET"))
        .and(path("/api/tickets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tickets": [{
                "id": "TICKET-1",
                "subject": "SSO login loop",
                "body": "Users bounce back to the login page",
                "topic": "SSO",
                "sentiment": "Urgent",
                "priority": "P0",
                "confidence": 0.95,
                "topic_reasoning": "mentions SSO",
                "sentiment_reasoning": "blocked",
                "priority_reasoning": "all users",
                "processing_time": 3.1
            }],
            "count": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/api/conversation/{}", session)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "conversation": {
                "session_id": session.as_str(),
                "messages": [],
                "created_at": "2024-05-01T10:00:00",
                "updated_at": "2024-05-01T10:00:00"
            },
            "total_messages": 0,
            "last_activity": "2024-05-01T10:00:00"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let filter = commands::ticket_filter(None, None, Some("P0".to_string())).unwrap();
    commands::run_tickets(&desk, filter, true).await.unwrap();
    commands::run_history(&desk, true, false).await.unwrap();
}

#[test]
fn test_blank_ticket_filter_is_rejected() {
    assert!(commands::ticket_filter(Some("  ".to_string()), None, None).is_err());
    let filter = commands::ticket_filter(Some("all".to_string()), None, None).unwrap();
    assert!(filter.is_empty());
}
