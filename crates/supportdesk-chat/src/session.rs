use std::sync::Arc;

use supportdesk_types::{SessionId, SESSION_STORAGE_KEY};

use crate::store::KeyValueStore;

/// Durable session identifier for one data directory.
///
/// Storage failures never surface: the identifier falls back to living in
/// memory for the rest of the process.
pub struct SessionIdentity {
    store: Arc<dyn KeyValueStore>,
    current: Option<SessionId>,
}

impl SessionIdentity {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            current: None,
        }
    }

    /// Identifier resolved so far, if any
    pub fn current(&self) -> Option<&SessionId> {
        self.current.as_ref()
    }

    /// Return the stored identifier, creating and persisting one on first use
    pub fn get_or_create_session(&mut self) -> SessionId {
        if let Some(id) = &self.current {
            return id.clone();
        }

        match self.store.get(SESSION_STORAGE_KEY) {
            Ok(Some(raw)) => {
                if let Some(id) = decode_session_id(&raw) {
                    log::debug!("Resuming session {}", id);
                    self.current = Some(id.clone());
                    return id;
                }
                log::warn!("Ignoring unreadable stored session id {:?}", raw);
            }
            Ok(None) => {}
            Err(e) => {
                log::warn!("Session storage unavailable, using in-memory session: {}", e);
                let id = SessionId::generate();
                self.current = Some(id.clone());
                return id;
            }
        }

        self.renew_session()
    }

    /// Switch to a freshly generated identifier
    pub fn renew_session(&mut self) -> SessionId {
        let id = SessionId::generate();
        self.persist(&id);
        log::info!("Started session {}", id);
        self.current = Some(id.clone());
        id
    }

    /// Forget the stored identifier, then renew
    pub fn clear_session(&mut self) -> SessionId {
        if let Err(e) = self.store.remove(SESSION_STORAGE_KEY) {
            log::warn!("Could not remove stored session id: {}", e);
        }
        self.current = None;
        self.renew_session()
    }

    fn persist(&self, id: &SessionId) {
        let encoded = match serde_json::to_string(id) {
            Ok(encoded) => encoded,
            Err(e) => {
                log::warn!("Could not encode session id: {}", e);
                return;
            }
        };
        if let Err(e) = self.store.set(SESSION_STORAGE_KEY, &encoded) {
            log::warn!("Session {} kept in memory only: {}", id, e);
        }
    }
}

/// Accepts the JSON string form and, for hand-edited files, a bare id
fn decode_session_id(raw: &str) -> Option<SessionId> {
    let id = serde_json::from_str::<String>(raw)
        .unwrap_or_else(|_| raw.trim().to_string());
    if id.is_empty() || id.chars().any(char::is_whitespace) {
        None
    } else {
        Some(SessionId::from(id))
    }
}
