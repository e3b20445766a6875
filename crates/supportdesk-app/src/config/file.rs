use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Optional settings read from `config.toml`
///
/// ```toml
/// backend_url = "https://support.example.com"
/// channel = "Slack"
/// tickets_path = "/api/tickets"
/// include_followup = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub backend_url: Option<String>,
    pub channel: Option<String>,
    pub tickets_path: Option<String>,
    pub include_followup: Option<bool>,
}

impl FileConfig {
    /// Parse `path`; `Ok(None)` when the file does not exist
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(Some(config))
    }
}
