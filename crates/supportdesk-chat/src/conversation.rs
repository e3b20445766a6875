use std::sync::Arc;

use supportdesk_types::{conversation_key, DeskError, DeskResult, Message, SessionId};

use crate::store::KeyValueStore;

/// Ordered message log for the active session, persisted as full snapshots.
///
/// Every write replaces the stored record with the complete sequence, so the
/// durable copy is always either the previous or the new snapshot.
pub struct ConversationStore {
    store: Arc<dyn KeyValueStore>,
    session_id: Option<SessionId>,
    messages: Vec<Message>,
}

impl ConversationStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            session_id: None,
            messages: Vec::new(),
        }
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Make `session_id` the active conversation and return its stored messages.
    ///
    /// Missing or undecodable records yield an empty conversation.
    pub fn load(&mut self, session_id: &SessionId) -> &[Message] {
        self.messages = read_snapshot(self.store.as_ref(), session_id);
        self.session_id = Some(session_id.clone());
        &self.messages
    }

    /// Append one message and persist the whole updated conversation
    pub fn append(&mut self, session_id: &SessionId, message: Message) -> DeskResult<&[Message]> {
        if self.session_id.as_ref() != Some(session_id) {
            self.load(session_id);
        }

        if message.is_assistant() && !self.messages.iter().any(Message::is_user) {
            return Err(DeskError::Validation(
                "assistant message without a preceding user message".to_string(),
            ));
        }

        self.messages.push(message);
        self.persist(session_id);
        Ok(&self.messages)
    }

    /// Drop the stored record; the in-memory log is reset when it belongs to `session_id`
    pub fn clear(&mut self, session_id: &SessionId) {
        if let Err(e) = self.store.remove(&conversation_key(session_id)) {
            log::warn!("Could not remove conversation {}: {}", session_id, e);
        }
        if self.session_id.as_ref() == Some(session_id) {
            self.messages.clear();
        }
    }

    fn persist(&self, session_id: &SessionId) {
        let snapshot = match serde_json::to_string(&self.messages) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::warn!("Could not encode conversation {}: {}", session_id, e);
                return;
            }
        };
        if let Err(e) = self.store.set(&conversation_key(session_id), &snapshot) {
            log::warn!(
                "Conversation {} kept in memory only ({} messages): {}",
                session_id,
                self.messages.len(),
                e
            );
        }
    }
}

fn read_snapshot(store: &dyn KeyValueStore, session_id: &SessionId) -> Vec<Message> {
    let key = conversation_key(session_id);
    let raw = match store.get(&key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            log::warn!("Could not read conversation {}: {}", session_id, e);
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<Message>>(&raw) {
        Ok(messages) => messages,
        Err(e) => {
            let err = DeskError::parse(key, e.to_string());
            log::warn!("Treating conversation as empty: {}", err);
            Vec::new()
        }
    }
}
