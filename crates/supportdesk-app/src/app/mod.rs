pub mod commands;
pub mod repl;
pub mod setup;

use anyhow::Result;
use std::process::ExitCode;

pub use repl::run_repl_mode;
pub use setup::Desk;

use crate::cli::{Cli, Commands};
use crate::config::AppConfig;

/// Execute the parsed command line
pub async fn run(cli: Cli) -> Result<ExitCode> {
    if let Some(Commands::Completions { shell }) = &cli.command {
        return commands::run_completions(*shell);
    }

    let config = AppConfig::from_cli(&cli)?;
    let desk = Desk::open(config);

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Ask { text, followup } => commands::run_ask(&desk, &text, followup).await,
        Commands::Chat => {
            run_repl_mode(&desk).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::History { remote, json } => commands::run_history(&desk, remote, json).await,
        Commands::Session { action } => commands::run_session(&desk, &action).await,
        Commands::Tickets {
            topic,
            sentiment,
            priority,
            summary,
        } => {
            let filter = commands::ticket_filter(topic, sentiment, priority)?;
            commands::run_tickets(&desk, filter, summary).await
        }
        Commands::Health { watch, interval } => {
            commands::run_health(&desk, watch, interval).await
        }
        Commands::Completions { shell } => commands::run_completions(shell),
    }
}
