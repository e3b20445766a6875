use anyhow::Result;
use chrono::Local;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use supportdesk_types::{Channel, Message, SessionId};

#[derive(Serialize)]
struct LogEntry<'a> {
    timestamp: String, // ISO‑8601 Local time
    session_id: &'a str,
    role: String,
    channel: &'a str,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    topic: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sentiment: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_type: Option<String>,
}

/// Append-only JSONL record of every message exchanged during one run
pub struct ExchangeLogger {
    file_path: PathBuf,
    file: Option<tokio::fs::File>,
}

impl ExchangeLogger {
    /// Create a new logger; the file name is based on the current local time.
    pub async fn new(logs_dir: &Path) -> Result<Self> {
        fs::create_dir_all(logs_dir).await?;

        let now_local = Local::now();
        let filename = format!("exchanges-{}.jsonl", now_local.format("%Y-%m-%d-%H%M%S"));
        let file_path = logs_dir.join(filename);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)
            .await?;
        Ok(Self {
            file_path,
            file: Some(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Append one message. Write failures disable the logger.
    pub async fn log(&mut self, session_id: &SessionId, channel: Channel, message: &Message) {
        let classification = message.response.as_ref().map(|r| &r.classification);
        let entry = LogEntry {
            timestamp: Local::now().to_rfc3339(),
            session_id: session_id.as_str(),
            role: message.role.to_string(),
            channel: channel.as_str(),
            content: &message.content,
            topic: classification.map(|c| c.topic.as_str()),
            sentiment: classification.map(|c| c.sentiment.as_str()),
            priority: classification.map(|c| c.priority.as_str()),
            confidence: classification.map(|c| c.confidence),
            response_type: message.response.as_ref().map(|r| r.response_type.to_string()),
        };

        let Some(file) = &mut self.file else {
            return;
        };
        let json = match serde_json::to_string(&entry) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Could not serialize exchange log entry: {}", e);
                return;
            }
        };

        let written = async {
            file.write_all(json.as_bytes()).await?;
            file.write_all(b"\n").await?;
            file.flush().await
        }
        .await;

        if let Err(e) = written {
            log::warn!(
                "Exchange logging disabled after write error on {}: {}",
                self.file_path.display(),
                e
            );
            self.file = None;
        }
    }

    /// Close the logger (explicit drop). Called on graceful shutdown.
    pub async fn shutdown(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = file.sync_all().await;
        }
    }
}
