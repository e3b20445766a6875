use anyhow::Result;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use supportdesk_chat::{ChatPanel, IgnoreReason, SubmitOutcome};
use supportdesk_types::Channel;

use crate::app::commands::log_outcome;
use crate::app::setup::Desk;
use crate::render;

/// A parsed REPL line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplInput {
    Ask(String),
    /// 1-based follow-up suggestion number
    Followup(usize),
    NewSession,
    ClearSession,
    History,
    Channel(Option<String>),
    Session,
    Help,
    Exit,
    Empty,
    Invalid(String),
}

pub fn parse_repl_line(line: &str) -> ReplInput {
    let line = line.trim();
    if line.is_empty() {
        return ReplInput::Empty;
    }
    if line == "exit" || line == "quit" {
        return ReplInput::Exit;
    }
    if !line.starts_with('/') {
        return ReplInput::Ask(line.to_string());
    }

    let (command, arg) = match line.split_once(char::is_whitespace) {
        Some((command, arg)) => (command, arg.trim()),
        None => (line, ""),
    };
    match command {
        "/f" | "/followup" => match arg.parse::<usize>() {
            Ok(n) if n >= 1 => ReplInput::Followup(n),
            _ => ReplInput::Invalid(format!("Usage: {} <number>", command)),
        },
        "/new" => ReplInput::NewSession,
        "/clear" => ReplInput::ClearSession,
        "/history" => ReplInput::History,
        "/channel" if arg.is_empty() => ReplInput::Channel(None),
        "/channel" => ReplInput::Channel(Some(arg.to_string())),
        "/session" => ReplInput::Session,
        "/help" | "/?" => ReplInput::Help,
        "/exit" | "/quit" => ReplInput::Exit,
        other => ReplInput::Invalid(format!("Unknown command '{}'. Type /help", other)),
    }
}

fn print_help() {
    println!("{}", "Commands:".bright_cyan());
    println!("  <text>           - Ask a question");
    println!("  /f <n>           - Ask follow-up suggestion number n");
    println!("  /new             - Start a new session (old conversation is kept)");
    println!("  /clear           - Delete this conversation and start a new session");
    println!("  /history         - Show this session's conversation");
    println!("  /channel [name]  - Show or change the channel");
    println!("  /session         - Show the session id");
    println!("  /exit            - Quit");
}

async fn show_outcome(panel: &ChatPanel, outcome: &SubmitOutcome) {
    match outcome {
        SubmitOutcome::Answered { answer, .. } => render::print_answer(answer),
        SubmitOutcome::Ignored(IgnoreReason::NoSuchSuggestion) => {
            let count = panel.followup_suggestions().await.len();
            eprintln!(
                "{} {}",
                "❌".bright_red(),
                format!("No such follow-up ({} available)", count).bright_red()
            );
        }
        SubmitOutcome::Ignored(IgnoreReason::Busy) => {
            println!("{}", "Still waiting for the previous answer".bright_yellow())
        }
        // errors were reported by the notifier; empty input never gets here
        _ => {}
    }
}

/// Run the interactive chat loop
pub async fn run_repl_mode(desk: &Desk) -> Result<()> {
    let panel = desk.panel();
    let mut logger = desk.exchange_logger().await;

    println!("{}", "💬 Support Desk".bright_cyan().bold());
    println!(
        "{}",
        format!(
            "Backend: {} • Session: {}",
            desk.config.api.base_url,
            panel.session_id().await
        )
        .bright_black()
    );
    let existing = panel.messages().await.len();
    if existing > 0 {
        println!(
            "{}",
            format!("Resuming conversation with {} messages (/history to view)", existing)
                .bright_black()
        );
    }
    println!("{}", "Type /help for commands, 'exit' to quit\n".bright_black());

    let mut rl = DefaultEditor::new()?;

    loop {
        let options = panel.options().await;
        let indicator = format!("[{}]", options.channel.label()).bright_magenta();
        let readline = rl.readline(&format!("{} {} ", indicator, "You:".bright_green().bold()));

        match readline {
            Ok(line) => {
                let input = parse_repl_line(&line);
                if !matches!(input, ReplInput::Empty) {
                    rl.add_history_entry(line.trim())?;
                }

                match input {
                    ReplInput::Empty => continue,
                    ReplInput::Exit => {
                        println!("{}", "Goodbye!".bright_cyan());
                        break;
                    }
                    ReplInput::Help => print_help(),
                    ReplInput::Invalid(message) => {
                        eprintln!("{} {}", "❌".bright_red(), message.bright_red())
                    }
                    ReplInput::Ask(text) => {
                        let session_id = panel.session_id().await;
                        println!("{}", "Thinking...".bright_black());
                        let outcome = panel.submit(&text).await;
                        log_outcome(&mut logger, &session_id, options.channel, &outcome).await;
                        show_outcome(&panel, &outcome).await;
                    }
                    ReplInput::Followup(n) => {
                        let session_id = panel.session_id().await;
                        let outcome = panel.select_followup(n - 1).await;
                        if let SubmitOutcome::Answered { question, .. } = &outcome {
                            println!("{} {}", "You:".bright_green().bold(), question.content);
                        }
                        log_outcome(&mut logger, &session_id, options.channel, &outcome).await;
                        show_outcome(&panel, &outcome).await;
                    }
                    ReplInput::NewSession => {
                        let session_id = panel.new_session().await;
                        println!("{} {}", "✓ New session".bright_green(), session_id);
                    }
                    ReplInput::ClearSession => {
                        let session_id = panel.clear_session().await;
                        println!("{} {}", "✓ Cleared. New session".bright_green(), session_id);
                    }
                    ReplInput::History => render::print_history(&panel.messages().await),
                    ReplInput::Session => {
                        println!("{} {}", "Session:".bright_yellow(), panel.session_id().await)
                    }
                    ReplInput::Channel(None) => {
                        let names: Vec<&str> = Channel::ALL.iter().map(|c| c.label()).collect();
                        println!("{} {}", "Channel:".bright_yellow(), options.channel.label());
                        println!("{}", format!("Available: {}", names.join(", ")).bright_black());
                    }
                    ReplInput::Channel(Some(name)) => match name.parse::<Channel>() {
                        Ok(channel) => {
                            panel.set_channel(channel).await;
                            println!("{} {}", "✓ Channel".bright_green(), channel.label());
                        }
                        Err(e) => eprintln!("{} {}", "❌".bright_red(), e.to_string().bright_red()),
                    },
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "^C".bright_black());
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "Goodbye!".bright_cyan());
                break;
            }
            Err(err) => {
                eprintln!("{} {}", "Error:".bright_red().bold(), err);
                break;
            }
        }
    }

    if let Some(logger) = &mut logger {
        logger.shutdown().await;
    }
    Ok(())
}
