//! Core types and structures for supportdesk
//!
//! This crate provides the data model shared by the API client, the local
//! session/conversation stores and the command-line front end.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};
use uuid::Uuid;

pub mod error;
pub mod ticket;

pub use error::{DeskError, DeskResult};
pub use ticket::{sort_tickets, Ticket, TicketFilter, TicketList, TicketRecord, TicketSummary};

// ============================================================================
// Constants
// ============================================================================

/// Durable key holding the current session identifier
pub const SESSION_STORAGE_KEY: &str = "supportdesk-session-id";

/// Prefix of the durable key holding one session's conversation snapshot
pub const CONVERSATION_KEY_PREFIX: &str = "supportdesk-conversation-";

/// Default backend base URL
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Session id attached to tickets that come from the bulk listing
pub const TICKET_SESSION_ID: &str = "backend-ticket";

pub const KNOWN_TOPICS: [&str; 10] = [
    "How-to",
    "Product",
    "Connector",
    "Lineage",
    "API/SDK",
    "SSO",
    "Glossary",
    "Best practices",
    "Sensitive data",
    "General",
];

pub const KNOWN_SENTIMENTS: [&str; 5] = ["Urgent", "Frustrated", "Positive", "Curious", "Neutral"];

pub const KNOWN_PRIORITIES: [&str; 4] = ["P0", "P1", "P2", "P3"];

/// Durable key for the conversation of `session_id`
pub fn conversation_key(session_id: &SessionId) -> String {
    format!("{}{}", CONVERSATION_KEY_PREFIX, session_id)
}

// ============================================================================
// Session Types
// ============================================================================

/// Opaque identifier correlating one profile's requests and conversation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// New random identifier (UUID v4, 122 random bits)
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Message Types
// ============================================================================

static LAST_MESSAGE_MILLIS: AtomicI64 = AtomicI64::new(0);

/// Message id derived from the creation time in milliseconds.
///
/// Ids handed out by one process are strictly increasing: a second message
/// created within the same millisecond gets `previous + 1`.
pub fn next_message_id(created_at: DateTime<Utc>) -> String {
    let candidate = created_at.timestamp_millis();
    let mut last = LAST_MESSAGE_MILLIS.load(Ordering::SeqCst);
    loop {
        let next = candidate.max(last + 1);
        match LAST_MESSAGE_MILLIS.compare_exchange(last, next, Ordering::SeqCst, Ordering::SeqCst) {
            Ok(_) => return next.to_string(),
            Err(actual) => last = actual,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One entry of a locally stored conversation.
///
/// Serialized as `{id, type, content, timestamp, response?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(rename = "type")]
    pub role: Role,
    pub content: String,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub response: Option<QueryResult>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        let created_at = Utc::now();
        Self {
            id: next_message_id(created_at),
            role: Role::User,
            content: content.into(),
            created_at,
            response: None,
        }
    }

    /// Assistant message carrying the full backend result; content is the answer text
    pub fn assistant(result: QueryResult) -> Self {
        let created_at = Utc::now();
        Self {
            id: next_message_id(created_at),
            role: Role::Assistant,
            content: result.answer.clone(),
            created_at,
            response: Some(result),
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }
}

/// Trim user input and reject it when nothing is left
pub fn validate_query_input(text: &str) -> DeskResult<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(DeskError::Validation("query must not be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

// ============================================================================
// Channel
// ============================================================================

/// Support channel a query is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Channel {
    #[default]
    #[serde(rename = "Web Chat")]
    WebChat,
    #[serde(rename = "WhatsApp")]
    WhatsApp,
    #[serde(rename = "Email")]
    Email,
    #[serde(rename = "Voice")]
    Voice,
    #[serde(rename = "Slack")]
    Slack,
    #[serde(rename = "Teams")]
    Teams,
}

impl Channel {
    pub const ALL: [Channel; 6] = [
        Channel::WebChat,
        Channel::WhatsApp,
        Channel::Email,
        Channel::Voice,
        Channel::Slack,
        Channel::Teams,
    ];

    /// Value sent on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::WebChat => "Web Chat",
            Channel::WhatsApp => "WhatsApp",
            Channel::Email => "Email",
            Channel::Voice => "Voice",
            Channel::Slack => "Slack",
            Channel::Teams => "Teams",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Channel::Teams => "Microsoft Teams",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "web chat" | "webchat" | "web-chat" | "web_chat" | "web" => Ok(Channel::WebChat),
            "whatsapp" => Ok(Channel::WhatsApp),
            "email" | "e-mail" => Ok(Channel::Email),
            "voice" | "phone" => Ok(Channel::Voice),
            "slack" => Ok(Channel::Slack),
            "teams" | "microsoft teams" | "ms-teams" => Ok(Channel::Teams),
            other => Err(DeskError::Validation(format!(
                "unknown channel '{}' (expected one of: {})",
                other,
                Channel::ALL
                    .iter()
                    .map(|c| c.label())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }
}

// ============================================================================
// Backend Request / Response Types
// ============================================================================

/// Body of `POST /api/query` and `POST /api/query/conversation`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    pub session_id: SessionId,
    pub channel: Channel,
    pub include_followup: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub doc: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub topic: String,
    pub sentiment: String,
    pub priority: String,
    pub confidence: f64,
}

/// Free-text rationale for each classification label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReasons {
    #[serde(alias = "topic_reasoning")]
    pub topic: String,
    #[serde(alias = "sentiment_reasoning")]
    pub sentiment: String,
    #[serde(alias = "priority_reasoning")]
    pub priority: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowupSuggestion {
    pub question: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    #[default]
    RagResponse,
    RoutingMessage,
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseType::RagResponse => write!(f, "rag_response"),
            ResponseType::RoutingMessage => write!(f, "routing_message"),
        }
    }
}

/// Answer plus classification produced by the backend for one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub answer: String,
    pub citations: Vec<Citation>,
    pub classification: Classification,
    pub classification_reasons: ClassificationReasons,
    #[serde(rename = "processing_time")]
    pub processing_time_seconds: f64,
    pub cache_hit: bool,
    pub followup_suggestions: Vec<FollowupSuggestion>,
    pub session_id: SessionId,
    pub response_type: ResponseType,
}

impl QueryResult {
    /// Range checks that serde cannot express
    pub fn validate(&self) -> Result<(), String> {
        let confidence = self.classification.confidence;
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return Err(format!(
                "classification.confidence {} is outside [0, 1]",
                confidence
            ));
        }
        if !self.processing_time_seconds.is_finite() || self.processing_time_seconds < 0.0 {
            return Err(format!(
                "processing_time {} must be a non-negative number",
                self.processing_time_seconds
            ));
        }
        Ok(())
    }
}

/// One message of the backend's own conversation record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub role: String,
    pub content: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub session_id: SessionId,
    pub messages: Vec<ConversationEntry>,
    pub created_at: String,
    pub updated_at: String,
}

/// Response of `GET /api/conversation/{session_id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationView {
    pub conversation: ConversationRecord,
    pub total_messages: usize,
    pub last_activity: String,
}

/// Response of `GET /health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub message: String,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Plain `{message}` acknowledgement (delete responses, `GET /`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    pub message: String,
}

/// Response of `GET /`
pub type RootInfo = Ack;
