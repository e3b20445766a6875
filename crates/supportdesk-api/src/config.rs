use supportdesk_types::{DeskError, DeskResult, DEFAULT_BACKEND_URL};

/// Ticket listing path served by the backend
pub const DEFAULT_TICKETS_PATH: &str = "/api/tickets";

/// Legacy ticket listing path used by older deployments
pub const LEGACY_TICKETS_PATH: &str = "/tickets";

/// Connection settings for [`crate::ApiClient`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub tickets_path: String,
    /// Dump every request and response to the console
    pub verbose: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BACKEND_URL.to_string(),
            tickets_path: DEFAULT_TICKETS_PATH.to_string(),
            verbose: false,
        }
    }
}

impl ApiConfig {
    pub fn new(base_url: &str) -> DeskResult<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            ..Self::default()
        })
    }

    pub fn with_tickets_path(mut self, path: &str) -> Self {
        self.tickets_path = normalize_path(path);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Trim trailing slashes and insist on an http(s) scheme
pub fn normalize_base_url(url: &str) -> DeskResult<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(DeskError::Validation(format!(
            "backend URL '{}' must start with http:// or https://",
            url
        )));
    }
    reqwest::Url::parse(trimmed)
        .map_err(|e| DeskError::Validation(format!("invalid backend URL '{}': {}", url, e)))?;
    Ok(trimmed.to_string())
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}
