use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// CLI arguments for supportdesk
#[derive(Parser, Debug)]
#[command(name = "supportdesk")]
#[command(about = "Support desk client - ask the support copilot, review answers and browse classified tickets")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Base URL of the support backend (e.g., http://localhost:8000)
    #[arg(long, global = true, value_name = "URL", env = "SUPPORTDESK_BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Directory holding the session, conversations, logs and config.toml (default: ~/.supportdesk)
    #[arg(long, global = true, value_name = "DIR", env = "SUPPORTDESK_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Channel queries are attributed to (Web Chat, WhatsApp, Email, Voice, Slack, Teams)
    #[arg(long, global = true, value_name = "CHANNEL", env = "SUPPORTDESK_CHANNEL")]
    pub channel: Option<String>,

    /// Ticket listing path on the backend (older deployments use /tickets)
    #[arg(long, global = true, value_name = "PATH", env = "SUPPORTDESK_TICKETS_PATH")]
    pub tickets_path: Option<String>,

    /// Path to a TOML config file (default: <data-dir>/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Do not ask the backend for follow-up suggestions
    #[arg(long, global = true)]
    pub no_followup: bool,

    /// Enable verbose debug output (shows HTTP requests, responses, timings)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Ask one question and print the answer with its classification
    Ask {
        /// Question text
        #[arg(required = true, num_args = 1.., value_name = "TEXT")]
        text: Vec<String>,

        /// Send through the conversation-aware follow-up endpoint
        #[arg(long)]
        followup: bool,
    },

    /// Interactive chat (default when no command is given)
    Chat,

    /// Show the conversation of the current session
    History {
        /// Show the backend's own record instead of the local one
        #[arg(long)]
        remote: bool,

        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect or reset the session identifier
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },

    /// Browse classified tickets
    Tickets {
        /// Only tickets with this topic ("all" for any)
        #[arg(long, value_name = "TOPIC")]
        topic: Option<String>,

        /// Only tickets with this sentiment ("all" for any)
        #[arg(long, value_name = "SENTIMENT")]
        sentiment: Option<String>,

        /// Only tickets with this priority ("all" for any)
        #[arg(long, value_name = "PRIORITY")]
        priority: Option<String>,

        /// Print summary figures after the table
        #[arg(long)]
        summary: bool,
    },

    /// Check that the backend is up
    Health {
        /// Keep checking and report status changes until interrupted
        #[arg(long)]
        watch: bool,

        /// Seconds between checks in watch mode
        #[arg(long, default_value = "30", value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
        interval: u64,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Print the current session id and message count
    Show,
    /// Start a new session; the old conversation stays on disk
    New,
    /// Delete the current conversation and session id
    Clear {
        /// Also drop the backend's record of the conversation
        #[arg(long)]
        remote: bool,
    },
}
