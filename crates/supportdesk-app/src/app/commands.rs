use anyhow::{Context, Result};
use clap::CommandFactory;
use clap_complete::Shell;
use colored::Colorize;
use std::process::ExitCode;
use std::time::Duration;

use supportdesk_api::SupportBackend;
use supportdesk_chat::{IgnoreReason, Notification, Notifier, SubmitOutcome};
use supportdesk_logging::ExchangeLogger;
use supportdesk_types::{
    validate_query_input, Channel, SessionId, TicketFilter, TicketSummary, KNOWN_PRIORITIES,
    KNOWN_SENTIMENTS, KNOWN_TOPICS,
};

use crate::app::setup::Desk;
use crate::cli::{Cli, SessionAction};
use crate::render;

/// Exit status for input rejected before anything was sent
const EXIT_INVALID_INPUT: u8 = 2;

/// Record an outcome in the exchange log
pub async fn log_outcome(
    logger: &mut Option<ExchangeLogger>,
    session_id: &SessionId,
    channel: Channel,
    outcome: &SubmitOutcome,
) {
    let Some(logger) = logger else {
        return;
    };
    match outcome {
        SubmitOutcome::Answered { question, answer } => {
            logger.log(session_id, channel, question).await;
            logger.log(session_id, channel, answer).await;
        }
        SubmitOutcome::Failed { question, .. } | SubmitOutcome::Discarded { question } => {
            logger.log(session_id, channel, question).await;
        }
        SubmitOutcome::Ignored(_) => {}
    }
}

/// `supportdesk ask`
pub async fn run_ask(desk: &Desk, words: &[String], followup: bool) -> Result<ExitCode> {
    let text = match validate_query_input(&words.join(" ")) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("{} {}", "❌".bright_red(), e.to_string().bright_red());
            return Ok(ExitCode::from(EXIT_INVALID_INPUT));
        }
    };

    let panel = desk.panel();
    let session_id = panel.session_id().await;
    let mut logger = desk.exchange_logger().await;

    let outcome = if followup {
        panel.submit_followup(&text).await
    } else {
        panel.submit(&text).await
    };
    log_outcome(&mut logger, &session_id, desk.config.channel, &outcome).await;
    if let Some(logger) = &mut logger {
        logger.shutdown().await;
    }

    Ok(match outcome {
        SubmitOutcome::Answered { answer, .. } => {
            render::print_answer(&answer);
            ExitCode::SUCCESS
        }
        SubmitOutcome::Ignored(IgnoreReason::EmptyInput) => ExitCode::from(EXIT_INVALID_INPUT),
        // the notifier already reported the error
        _ => ExitCode::FAILURE,
    })
}

/// `supportdesk history`
pub async fn run_history(desk: &Desk, remote: bool, json: bool) -> Result<ExitCode> {
    let panel = desk.panel();

    if remote {
        let session_id = panel.session_id().await;
        return match desk.client.get_conversation(&session_id).await {
            Ok(view) => {
                if json {
                    println!("{}", serde_json::to_string_pretty(&view)?);
                } else {
                    render::print_remote_history(&view);
                }
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                desk.notifier.notify(Notification::error(e.to_string()));
                Ok(ExitCode::FAILURE)
            }
        };
    }

    let messages = panel.messages().await;
    if json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
    } else {
        render::print_history(&messages);
    }
    Ok(ExitCode::SUCCESS)
}

/// `supportdesk session ...`
pub async fn run_session(desk: &Desk, action: &SessionAction) -> Result<ExitCode> {
    let panel = desk.panel();

    match action {
        SessionAction::Show => {
            let session_id = panel.session_id().await;
            let count = panel.messages().await.len();
            println!("{} {}", "Session:".bright_yellow(), session_id);
            println!("{} {}", "Messages:".bright_yellow(), count);
            println!("{} {}", "Channel:".bright_yellow(), desk.config.channel.label());
            println!(
                "{} {}",
                "Storage:".bright_yellow(),
                desk.config.storage_dir().display()
            );
        }
        SessionAction::New => {
            let previous = panel.session_id().await;
            let session_id = panel.new_session().await;
            println!("{} {}", "✓ New session".bright_green(), session_id);
            println!(
                "{}",
                format!("Previous conversation kept under {}", previous).bright_black()
            );
        }
        SessionAction::Clear { remote } => {
            if *remote {
                let session_id = panel.session_id().await;
                match desk.client.clear_conversation(&session_id).await {
                    Ok(ack) => println!("{}", ack.message.bright_black()),
                    Err(e) => desk.notifier.notify(Notification::error(format!(
                        "Backend conversation not cleared: {}",
                        e
                    ))),
                }
            }
            let session_id = panel.clear_session().await;
            println!("{} {}", "✓ Cleared. New session".bright_green(), session_id);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn unknown_label_hint(kind: &str, value: Option<&str>, known: &[&str]) {
    if let Some(value) = value {
        if !known.contains(&value) {
            println!(
                "{}",
                format!("Known {} labels: {}", kind, known.join(", ")).bright_black()
            );
        }
    }
}

/// `supportdesk tickets`
pub async fn run_tickets(desk: &Desk, filter: TicketFilter, summary: bool) -> Result<ExitCode> {
    let tickets = match desk.client.list_tickets().await {
        Ok(tickets) => tickets,
        Err(e) => {
            desk.notifier.notify(Notification::error(e.to_string()));
            return Ok(ExitCode::FAILURE);
        }
    };

    let shown = filter.apply(&tickets);
    render::print_ticket_table(&shown);
    if !filter.is_empty() {
        println!(
            "{}",
            format!("Showing {} of {} tickets", shown.len(), tickets.len()).bright_black()
        );
        if shown.is_empty() {
            unknown_label_hint("topic", filter.topic.as_deref(), &KNOWN_TOPICS);
            unknown_label_hint("sentiment", filter.sentiment.as_deref(), &KNOWN_SENTIMENTS);
            unknown_label_hint("priority", filter.priority.as_deref(), &KNOWN_PRIORITIES);
        }
    }

    if summary {
        render::print_summary(&TicketSummary::from_tickets(shown.iter().copied()));
    }
    Ok(ExitCode::SUCCESS)
}

/// `supportdesk health`
pub async fn run_health(desk: &Desk, watch: bool, interval_secs: u64) -> Result<ExitCode> {
    if !watch {
        return Ok(match desk.client.get_health().await {
            Ok(health) => {
                let root = desk.client.get_root_message().await.ok();
                render::print_health(&health, root.as_ref());
                if health.is_healthy() {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::FAILURE
                }
            }
            Err(e) => {
                desk.notifier
                    .notify(Notification::error(format!("Backend unreachable: {}", e)));
                ExitCode::FAILURE
            }
        });
    }

    println!(
        "{}",
        format!(
            "Watching {} every {}s (Ctrl-C to stop)",
            desk.config.api.base_url, interval_secs
        )
        .bright_black()
    );

    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    let mut last_healthy: Option<bool> = None;
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                println!("{}", "Stopped.".bright_black());
                return Ok(ExitCode::SUCCESS);
            }
        }

        let healthy = match desk.client.get_health().await {
            Ok(health) => {
                if last_healthy != Some(health.is_healthy()) {
                    render::print_health(&health, None);
                }
                health.is_healthy()
            }
            Err(e) => {
                if last_healthy != Some(false) {
                    desk.notifier
                        .notify(Notification::error(format!("Backend unreachable: {}", e)));
                }
                false
            }
        };
        last_healthy = Some(healthy);
    }
}

/// `supportdesk completions <shell>`
pub fn run_completions(shell: Shell) -> Result<ExitCode> {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    clap_complete::generate(shell, &mut command, name, &mut std::io::stdout());
    Ok(ExitCode::SUCCESS)
}

/// Build the ticket filter from CLI options, rejecting blank values
pub fn ticket_filter(
    topic: Option<String>,
    sentiment: Option<String>,
    priority: Option<String>,
) -> Result<TicketFilter> {
    for (name, value) in [("topic", &topic), ("sentiment", &sentiment), ("priority", &priority)] {
        if let Some(value) = value {
            validate_query_input(value).with_context(|| format!("--{} needs a value", name))?;
        }
    }
    Ok(TicketFilter::new(topic, sentiment, priority))
}
