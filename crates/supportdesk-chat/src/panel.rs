//! Chat submission flow: user input, optimistic append, backend request, answer ingestion.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use supportdesk_api::SupportBackend;
use supportdesk_types::{
    validate_query_input, Channel, DeskError, Message, QueryRequest, SessionId,
};

use crate::conversation::ConversationStore;
use crate::notify::{Notification, Notifier};
use crate::session::SessionIdentity;
use crate::store::KeyValueStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    Idle,
    AwaitingResponse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    EmptyInput,
    /// Another submission is still in flight
    Busy,
    /// No follow-up suggestion at the requested position
    NoSuchSuggestion,
}

/// Result of one `submit`
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Answered { question: Message, answer: Message },
    /// The question stays in the conversation; no answer was appended
    Failed { question: Message, error: DeskError },
    /// The session changed while the request was in flight
    Discarded { question: Message },
    Ignored(IgnoreReason),
}

impl SubmitOutcome {
    pub fn answer(&self) -> Option<&Message> {
        match self {
            SubmitOutcome::Answered { answer, .. } => Some(answer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelOptions {
    pub channel: Channel,
    pub include_followup: bool,
}

impl Default for PanelOptions {
    fn default() -> Self {
        Self {
            channel: Channel::default(),
            include_followup: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    Query,
    Followup,
}

struct PanelInner {
    identity: SessionIdentity,
    conversation: ConversationStore,
    options: PanelOptions,
}

impl PanelInner {
    fn active_session(&mut self) -> SessionId {
        let session_id = self.identity.get_or_create_session();
        if self.conversation.session_id() != Some(&session_id) {
            self.conversation.load(&session_id);
        }
        session_id
    }
}

/// One chat panel: a session, its conversation, and at most one request in flight.
pub struct ChatPanel {
    backend: Arc<dyn SupportBackend>,
    notifier: Arc<dyn Notifier>,
    in_flight: AtomicBool,
    inner: Mutex<PanelInner>,
}

/// Clears the in-flight flag however the submission ends
struct FlightGuard<'a>(&'a AtomicBool);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl ChatPanel {
    /// Open the panel on the stored session (creating one if needed) and load its conversation
    pub fn new(
        backend: Arc<dyn SupportBackend>,
        store: Arc<dyn KeyValueStore>,
        notifier: Arc<dyn Notifier>,
        options: PanelOptions,
    ) -> Self {
        let mut inner = PanelInner {
            identity: SessionIdentity::new(store.clone()),
            conversation: ConversationStore::new(store),
            options,
        };
        inner.active_session();

        Self {
            backend,
            notifier,
            in_flight: AtomicBool::new(false),
            inner: Mutex::new(inner),
        }
    }

    pub fn state(&self) -> PanelState {
        if self.in_flight.load(Ordering::SeqCst) {
            PanelState::AwaitingResponse
        } else {
            PanelState::Idle
        }
    }

    pub async fn session_id(&self) -> SessionId {
        self.inner.lock().await.active_session()
    }

    pub async fn messages(&self) -> Vec<Message> {
        let mut inner = self.inner.lock().await;
        inner.active_session();
        inner.conversation.messages().to_vec()
    }

    pub async fn options(&self) -> PanelOptions {
        self.inner.lock().await.options
    }

    pub async fn set_channel(&self, channel: Channel) {
        self.inner.lock().await.options.channel = channel;
    }

    pub async fn set_include_followup(&self, include_followup: bool) {
        self.inner.lock().await.options.include_followup = include_followup;
    }

    /// Submit a fresh question
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        self.run(text, Endpoint::Query).await
    }

    /// Submit through the conversation-aware endpoint
    pub async fn submit_followup(&self, text: &str) -> SubmitOutcome {
        self.run(text, Endpoint::Followup).await
    }

    /// Follow-up suggestions of the latest answer, in backend order
    pub async fn followup_suggestions(&self) -> Vec<String> {
        let mut inner = self.inner.lock().await;
        inner.active_session();
        inner
            .conversation
            .messages()
            .iter()
            .rev()
            .find_map(|m| m.response.as_ref())
            .map(|r| {
                r.followup_suggestions
                    .iter()
                    .map(|s| s.question.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Submit the `index`-th (zero-based) suggestion of the latest answer as a follow-up
    pub async fn select_followup(&self, index: usize) -> SubmitOutcome {
        let suggestions = self.followup_suggestions().await;
        match suggestions.get(index) {
            Some(question) => self.submit_followup(question).await,
            None => SubmitOutcome::Ignored(IgnoreReason::NoSuchSuggestion),
        }
    }

    /// Switch to a new session; the previous conversation stays stored under its old id
    pub async fn new_session(&self) -> SessionId {
        let mut inner = self.inner.lock().await;
        let session_id = inner.identity.renew_session();
        inner.conversation.load(&session_id);
        session_id
    }

    /// Delete the current conversation and session id, then start over
    pub async fn clear_session(&self) -> SessionId {
        let mut inner = self.inner.lock().await;
        let old = inner.active_session();
        inner.conversation.clear(&old);
        let session_id = inner.identity.clear_session();
        inner.conversation.load(&session_id);
        session_id
    }

    async fn run(&self, text: &str, endpoint: Endpoint) -> SubmitOutcome {
        let query = match validate_query_input(text) {
            Ok(query) => query,
            Err(_) => return SubmitOutcome::Ignored(IgnoreReason::EmptyInput),
        };

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            log::debug!("Submission ignored, a request is already in flight");
            return SubmitOutcome::Ignored(IgnoreReason::Busy);
        }
        let _flight = FlightGuard(&self.in_flight);

        let (session_id, question, request) = {
            let mut inner = self.inner.lock().await;
            let session_id = inner.active_session();
            let question = Message::user(query.clone());
            if let Err(e) = inner.conversation.append(&session_id, question.clone()) {
                log::warn!("Could not record question: {}", e);
            }
            let request = QueryRequest {
                query,
                session_id: session_id.clone(),
                channel: inner.options.channel,
                include_followup: inner.options.include_followup,
            };
            (session_id, question, request)
        };

        let response = match endpoint {
            Endpoint::Query => self.backend.submit_query(&request).await,
            Endpoint::Followup => self.backend.submit_followup_query(&request).await,
        };

        let mut inner = self.inner.lock().await;
        if inner.identity.current() != Some(&session_id) {
            log::info!(
                "Discarding response for session {}, panel moved on",
                session_id
            );
            return SubmitOutcome::Discarded { question };
        }

        match response {
            Ok(result) => {
                if result.session_id != session_id {
                    log::debug!(
                        "Backend answered for session {}, expected {}",
                        result.session_id,
                        session_id
                    );
                }
                let answer = Message::assistant(result);
                if let Err(e) = inner.conversation.append(&session_id, answer.clone()) {
                    log::warn!("Could not record answer: {}", e);
                }
                SubmitOutcome::Answered { question, answer }
            }
            Err(error) => {
                log::warn!("Query failed: {}", error);
                self.notifier.notify(Notification::error(error.to_string()));
                SubmitOutcome::Failed { question, error }
            }
        }
    }
}
