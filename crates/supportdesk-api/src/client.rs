use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Instant;

use supportdesk_logging::{log_request, log_response};
use supportdesk_types::{
    sort_tickets, Ack, ConversationView, DeskError, DeskResult, HealthStatus, QueryRequest,
    QueryResult, RootInfo, SessionId, Ticket, TicketList,
};

use crate::config::ApiConfig;

pub const HEALTH_PATH: &str = "/health";
pub const QUERY_PATH: &str = "/api/query";
pub const FOLLOWUP_QUERY_PATH: &str = "/api/query/conversation";
pub const CONVERSATION_PATH: &str = "/api/conversation";

/// Capabilities of the support backend.
///
/// Implementations are stateless request/response mappings: they never touch
/// local session or conversation state.
#[async_trait]
pub trait SupportBackend: Send + Sync {
    /// Classify and answer a fresh query
    async fn submit_query(&self, request: &QueryRequest) -> DeskResult<QueryResult>;

    /// Conversation-aware variant used for follow-up questions
    async fn submit_followup_query(&self, request: &QueryRequest) -> DeskResult<QueryResult>;

    /// Backend-held conversation for a session
    async fn get_conversation(&self, session_id: &SessionId) -> DeskResult<ConversationView>;

    /// Drop the backend-held conversation for a session
    async fn clear_conversation(&self, session_id: &SessionId) -> DeskResult<Ack>;

    async fn get_health(&self) -> DeskResult<HealthStatus>;

    /// Classified tickets, ordered by ticket number
    async fn list_tickets(&self) -> DeskResult<Vec<Ticket>>;
}

/// HTTP implementation of [`SupportBackend`]
pub struct ApiClient {
    config: ApiConfig,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// URL of the backend's conversation record for `session_id`.
    ///
    /// The id is pushed as one percent-encoded path segment, so `/`, `?` or `#`
    /// in a stored id cannot select a different resource.
    pub fn conversation_url(&self, session_id: &SessionId) -> DeskResult<String> {
        let mut url = Url::parse(&self.url(CONVERSATION_PATH))
            .map_err(|e| DeskError::Validation(format!("Invalid backend URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| DeskError::Validation("Backend URL cannot carry a path".to_string()))?
            .push(session_id.as_str());
        Ok(url.into())
    }

    /// `GET /` greeting
    pub async fn get_root_message(&self) -> DeskResult<RootInfo> {
        self.request(Method::GET, "/", None).await
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> DeskResult<T> {
        self.send(method, self.url(path), path, body).await
    }

    /// `endpoint` names the request in parse errors
    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        url: String,
        endpoint: &str,
        body: Option<Value>,
    ) -> DeskResult<T> {
        log_request(method.as_str(), &url, body.as_ref(), self.config.verbose);

        let started = Instant::now();
        let mut builder = self
            .client
            .request(method, &url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = &body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| DeskError::transport(None, format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            DeskError::transport(
                Some(status.as_u16()),
                format!("Failed to read response from {}: {}", url, e),
            )
        })?;
        log_response(status, started.elapsed(), &text, self.config.verbose);

        if !status.is_success() {
            return Err(error_from_response(status, &text));
        }

        serde_json::from_str(&text).map_err(|e| DeskError::parse(endpoint, e.to_string()))
    }

    async fn query(&self, path: &str, request: &QueryRequest) -> DeskResult<QueryResult> {
        let body = serde_json::to_value(request)
            .map_err(|e| DeskError::Validation(format!("Failed to encode query: {}", e)))?;
        let result: QueryResult = self.request(Method::POST, path, Some(body)).await?;
        result
            .validate()
            .map_err(|reason| DeskError::parse(path, reason))?;
        Ok(result)
    }
}

/// Build the transport error for a non-2xx response, preferring the backend's `detail`
fn error_from_response(status: StatusCode, body: &str) -> DeskError {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("detail").cloned())
        .and_then(|detail| match detail {
            Value::String(s) if !s.is_empty() => Some(s),
            Value::String(_) | Value::Null => None,
            other => Some(other.to_string()),
        });

    let message = detail.unwrap_or_else(|| {
        format!(
            "HTTP {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown")
        )
    });
    DeskError::transport(Some(status.as_u16()), message)
}

#[async_trait]
impl SupportBackend for ApiClient {
    async fn submit_query(&self, request: &QueryRequest) -> DeskResult<QueryResult> {
        self.query(QUERY_PATH, request).await
    }

    async fn submit_followup_query(&self, request: &QueryRequest) -> DeskResult<QueryResult> {
        self.query(FOLLOWUP_QUERY_PATH, request).await
    }

    async fn get_conversation(&self, session_id: &SessionId) -> DeskResult<ConversationView> {
        let url = self.conversation_url(session_id)?;
        self.send(Method::GET, url, CONVERSATION_PATH, None).await
    }

    async fn clear_conversation(&self, session_id: &SessionId) -> DeskResult<Ack> {
        let url = self.conversation_url(session_id)?;
        self.send(Method::DELETE, url, CONVERSATION_PATH, None).await
    }

    async fn get_health(&self) -> DeskResult<HealthStatus> {
        self.request(Method::GET, HEALTH_PATH, None).await
    }

    async fn list_tickets(&self) -> DeskResult<Vec<Ticket>> {
        let path = self.config.tickets_path.clone();
        let list: TicketList = self.request(Method::GET, &path, None).await?;

        if let Some(error) = list.error {
            return Err(DeskError::transport(Some(200), error));
        }

        let listed_at = Utc::now();
        let mut tickets = Vec::with_capacity(list.tickets.len());
        for record in list.tickets {
            let ticket = record.into_ticket(listed_at);
            ticket
                .result
                .validate()
                .map_err(|reason| DeskError::parse(&path, format!("{}: {}", ticket.id, reason)))?;
            tickets.push(ticket);
        }
        sort_tickets(&mut tickets);

        if let Some(count) = list.count {
            if count != tickets.len() {
                log::debug!("Ticket listing reported {} tickets, received {}", count, tickets.len());
            }
        }
        Ok(tickets)
    }
}
