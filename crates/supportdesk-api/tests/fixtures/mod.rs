#![allow(dead_code)]

use serde_json::{json, Value};
use wiremock::matchers::*;
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mock support backend for exercising the HTTP client
pub struct BackendMockServer {
    server: MockServer,
}

impl BackendMockServer {
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn server(&self) -> &MockServer {
        &self.server
    }

    /// Answer `POST {endpoint}` with a well-formed query result
    pub async fn mock_query_success(&self, endpoint: &str, query: &str, answer: &str, session_id: &str) {
        Mock::given(method("POST"))
            .and(path(endpoint))
            .and(body_partial_json(json!({ "query": query, "session_id": session_id })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(query_result_json(answer, session_id)),
            )
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Answer `method endpoint` with an arbitrary JSON body and status
    pub async fn mock_json(&self, http_method: &str, endpoint: &str, status: u16, body: Value) {
        Mock::given(method(http_method))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Answer `method endpoint` with a non-JSON body
    pub async fn mock_raw(&self, http_method: &str, endpoint: &str, status: u16, body: &str) {
        Mock::given(method(http_method))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&self.server)
            .await;
    }
}

/// A complete, valid query result payload
pub fn query_result_json(answer: &str, session_id: &str) -> Value {
    json!({
        "answer": answer,
        "citations": [
            { "doc": "Python SDK", "url": "https://developer.example.com/sdks/python" }
        ],
        "classification": {
            "topic": "API/SDK",
            "sentiment": "Curious",
            "priority": "P2",
            "confidence": 0.92
        },
        "classification_reasons": {
            "topic": "Mentions the Python SDK",
            "sentiment": "Neutral question",
            "priority": "No blocking issue"
        },
        "processing_time": 1.84,
        "cache_hit": false,
        "followup_suggestions": [
            { "question": "How do I authenticate with the SDK?" }
        ],
        "session_id": session_id,
        "response_type": "rag_response"
    })
}

/// A flat ticket record as the backend's ticket index stores it
pub fn ticket_record_json(id: &str, topic: &str, priority: &str) -> Value {
    json!({
        "id": id,
        "subject": format!("Subject of {}", id),
        "body": format!("Body of {}", id),
        "topic": topic,
        "sentiment": "Frustrated",
        "priority": priority,
        "confidence": 0.8,
        "topic_reasoning": "keyword match",
        "sentiment_reasoning": "tone",
        "priority_reasoning": "impact",
        "processing_time": 2.5
    })
}
