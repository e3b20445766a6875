use colored::Colorize;
use std::sync::Arc;

use supportdesk_api::ApiClient;
use supportdesk_chat::{ChatPanel, FileStore, KeyValueStore, MemoryStore, PanelOptions};
use supportdesk_logging::ExchangeLogger;

use crate::config::AppConfig;
use crate::notifier::ConsoleNotifier;

/// Everything a command needs: settings, the HTTP client and local storage
pub struct Desk {
    pub config: AppConfig,
    pub client: Arc<ApiClient>,
    pub store: Arc<dyn KeyValueStore>,
    pub notifier: Arc<ConsoleNotifier>,
}

impl Desk {
    pub fn open(config: AppConfig) -> Self {
        let storage_dir = config.storage_dir();
        let store: Arc<dyn KeyValueStore> = match FileStore::open(&storage_dir) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                log::warn!("Falling back to in-memory storage: {}", e);
                eprintln!(
                    "{} {}",
                    "⚠️".yellow(),
                    format!(
                        "Storage at {} unavailable, this session will not be saved",
                        storage_dir.display()
                    )
                    .yellow()
                );
                Arc::new(MemoryStore::new())
            }
        };

        Self {
            client: Arc::new(ApiClient::new(config.api.clone())),
            store,
            notifier: Arc::new(ConsoleNotifier),
            config,
        }
    }

    /// Chat panel over the stored session
    pub fn panel(&self) -> ChatPanel {
        ChatPanel::new(
            self.client.clone(),
            self.store.clone(),
            self.notifier.clone(),
            PanelOptions {
                channel: self.config.channel,
                include_followup: self.config.include_followup,
            },
        )
    }

    /// Exchange log for this run, or `None` (with a notice) when it cannot be opened
    pub async fn exchange_logger(&self) -> Option<ExchangeLogger> {
        let opened = match self.config.logs_dir() {
            Ok(dir) => ExchangeLogger::new(&dir).await,
            Err(e) => Err(e),
        };
        match opened {
            Ok(logger) => {
                log::debug!("Exchange log at {}", logger.path().display());
                Some(logger)
            }
            Err(e) => {
                eprintln!("Logging disabled: {}", e);
                None
            }
        }
    }
}
