use thiserror::Error;

/// Error taxonomy shared by every supportdesk crate
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeskError {
    /// Non-2xx HTTP status or a network failure. `status` is `None` when no response arrived.
    #[error("{message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// A payload that does not match the expected schema, or durable data that failed to decode
    #[error("invalid payload from {endpoint}: {reason}")]
    Parse { endpoint: String, reason: String },

    /// Input rejected before any request was made
    #[error("{0}")]
    Validation(String),

    /// Durable key-value storage failure
    #[error("storage error: {0}")]
    Storage(String),
}

impl DeskError {
    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        DeskError::Transport {
            status,
            message: message.into(),
        }
    }

    pub fn parse(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        DeskError::Parse {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, DeskError::Transport { .. })
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, DeskError::Parse { .. })
    }

    /// HTTP status carried by a transport error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            DeskError::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<std::io::Error> for DeskError {
    fn from(e: std::io::Error) -> Self {
        DeskError::Storage(e.to_string())
    }
}

pub type DeskResult<T> = Result<T, DeskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_display_uses_message_only() {
        let err = DeskError::transport(Some(503), "HTTP 503: Service Unavailable");
        assert_eq!(err.to_string(), "HTTP 503: Service Unavailable");
        assert_eq!(err.status(), Some(503));
        assert!(err.is_transport());
        assert!(!err.is_parse());
    }

    #[test]
    fn test_parse_display_names_endpoint() {
        let err = DeskError::parse("/api/query", "missing field `answer`");
        assert_eq!(
            err.to_string(),
            "invalid payload from /api/query: missing field `answer`"
        );
        assert_eq!(err.status(), None);
    }
}
