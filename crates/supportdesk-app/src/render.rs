//! Console rendering for answers, conversations, tickets and health.

use colored::{ColoredString, Colorize};

use supportdesk_logging::safe_truncate;
use supportdesk_types::{
    Ack, ConversationView, HealthStatus, Message, QueryResult, ResponseType, Ticket,
    TicketSummary,
};

pub fn priority_label(priority: &str) -> ColoredString {
    paint_priority(priority, priority)
}

pub fn sentiment_label(sentiment: &str) -> ColoredString {
    paint_sentiment(sentiment, sentiment)
}

/// Colour `text` the way `priority` is coloured
fn paint_priority(priority: &str, text: &str) -> ColoredString {
    match priority {
        "P0" => text.bright_red().bold(),
        "P1" => text.yellow().bold(),
        "P2" => text.bright_blue(),
        "P3" => text.green(),
        _ => text.normal(),
    }
}

fn paint_sentiment(sentiment: &str, text: &str) -> ColoredString {
    match sentiment {
        "Urgent" => text.bright_red(),
        "Frustrated" => text.yellow(),
        "Positive" => text.green(),
        "Curious" => text.cyan(),
        _ => text.normal(),
    }
}

pub fn topic_label(topic: &str) -> ColoredString {
    topic.bright_magenta()
}

pub fn format_seconds(seconds: f64) -> String {
    format!("{:.2}s", seconds)
}

pub fn format_confidence(confidence: f64) -> String {
    format!("{:.0}%", confidence * 100.0)
}

/// Print an assistant message: answer, classification, sources and follow-ups
pub fn print_answer(message: &Message) {
    let Some(result) = &message.response else {
        println!("\n{} {}\n", "Assistant:".bright_blue().bold(), message.content);
        return;
    };

    let label = match result.response_type {
        ResponseType::RagResponse => "Assistant:".bright_blue().bold(),
        ResponseType::RoutingMessage => "Routed:".bright_yellow().bold(),
    };
    println!("\n{} {}\n", label, result.answer);
    print_classification(result);

    if !result.citations.is_empty() {
        println!("{}", "Sources:".bright_yellow());
        for citation in &result.citations {
            println!("  • {} {}", citation.doc, citation.url.bright_black());
        }
    }

    if !result.followup_suggestions.is_empty() {
        println!("{}", "Follow-up questions:".bright_yellow());
        for (i, suggestion) in result.followup_suggestions.iter().enumerate() {
            println!("  {} {}", format!("[{}]", i + 1).bright_cyan(), suggestion.question);
        }
    }

    let cache = if result.cache_hit { "cached" } else { "fresh" };
    println!(
        "{}\n",
        format!(
            "{} • {}",
            format_seconds(result.processing_time_seconds),
            cache
        )
        .bright_black()
    );
}

fn print_classification(result: &QueryResult) {
    let c = &result.classification;
    let reasons = &result.classification_reasons;
    println!(
        "{} {}  {} {}  {} {}  {} {}",
        "Topic:".bright_black(),
        topic_label(&c.topic),
        "Sentiment:".bright_black(),
        sentiment_label(&c.sentiment),
        "Priority:".bright_black(),
        priority_label(&c.priority),
        "Confidence:".bright_black(),
        format_confidence(c.confidence)
    );
    for (name, reason) in [
        ("topic", &reasons.topic),
        ("sentiment", &reasons.sentiment),
        ("priority", &reasons.priority),
    ] {
        if !reason.trim().is_empty() {
            println!("  {} {}", format!("{}:", name).bright_black(), reason);
        }
    }
    println!();
}

/// Print the local conversation log
pub fn print_history(messages: &[Message]) {
    if messages.is_empty() {
        println!("{}", "No messages in this session yet.".bright_black());
        return;
    }
    for message in messages {
        let when = message.created_at.format("%Y-%m-%d %H:%M:%S");
        if message.is_user() {
            println!(
                "{} {} {}",
                when.to_string().bright_black(),
                "You:".bright_green().bold(),
                message.content
            );
        } else {
            let summary = message
                .response
                .as_ref()
                .map(|r| {
                    format!(
                        " [{} / {} / {}]",
                        r.classification.topic, r.classification.sentiment, r.classification.priority
                    )
                })
                .unwrap_or_default();
            println!(
                "{} {} {}{}",
                when.to_string().bright_black(),
                "Assistant:".bright_blue().bold(),
                message.content,
                summary.bright_black()
            );
        }
    }
}

/// Print the backend's record of a conversation
pub fn print_remote_history(view: &ConversationView) {
    println!(
        "{}",
        format!(
            "Backend conversation {} • {} messages • last activity {}",
            view.conversation.session_id, view.total_messages, view.last_activity
        )
        .bright_cyan()
    );
    for entry in &view.conversation.messages {
        let role = match entry.role.as_str() {
            "user" => "You:".bright_green().bold(),
            "assistant" => "Assistant:".bright_blue().bold(),
            other => other.normal(),
        };
        println!("{} {} {}", entry.timestamp.bright_black(), role, entry.content);
    }
}

const ID_WIDTH: usize = 12;
const SUBJECT_WIDTH: usize = 44;
const TOPIC_WIDTH: usize = 16;
const SENTIMENT_WIDTH: usize = 11;
const PRIORITY_WIDTH: usize = 3;

fn pad(text: &str, width: usize) -> String {
    format!("{:<width$}", safe_truncate(text, width), width = width)
}

/// One table row; cells are truncated and padded before colouring
pub fn format_ticket_row(ticket: &Ticket) -> String {
    let c = ticket.classification();
    format!(
        "{} {} {} {} {} {:>5}",
        pad(&ticket.id, ID_WIDTH).bright_cyan(),
        pad(&ticket.query, SUBJECT_WIDTH),
        topic_label(&pad(&c.topic, TOPIC_WIDTH)),
        paint_sentiment(&c.sentiment, &pad(&c.sentiment, SENTIMENT_WIDTH)),
        paint_priority(&c.priority, &pad(&c.priority, PRIORITY_WIDTH)),
        format_confidence(c.confidence)
    )
}

pub fn print_ticket_table(tickets: &[&Ticket]) {
    if tickets.is_empty() {
        println!("{}", "No tickets match.".bright_black());
        return;
    }
    let header = format!(
        "{} {} {} {} {} {:>5}",
        pad("ID", ID_WIDTH),
        pad("Subject", SUBJECT_WIDTH),
        pad("Topic", TOPIC_WIDTH),
        pad("Sentiment", SENTIMENT_WIDTH),
        pad("Pri", PRIORITY_WIDTH),
        "Conf"
    );
    println!("{}", header.bold());
    println!("{}", "─".repeat(header.chars().count()).bright_black());
    for ticket in tickets {
        println!("{}", format_ticket_row(ticket));
    }
}

pub fn print_summary(summary: &TicketSummary) {
    let dash = || "n/a".to_string();
    println!();
    println!("{} {}", "Total tickets:".bright_yellow(), summary.total);
    println!(
        "{} {}",
        "High priority (P0):".bright_yellow(),
        summary.high_priority.to_string().bright_red()
    );
    println!(
        "{} {}",
        "Average confidence:".bright_yellow(),
        summary.average_confidence.map(format_confidence).unwrap_or_else(dash)
    );
    println!(
        "{} {}",
        "Average processing time:".bright_yellow(),
        summary
            .average_processing_time
            .map(format_seconds)
            .unwrap_or_else(dash)
    );
}

pub fn print_health(health: &HealthStatus, root: Option<&Ack>) {
    let status = if health.is_healthy() {
        format!("● {}", health.status).bright_green().bold()
    } else {
        format!("● {}", health.status).bright_red().bold()
    };
    println!("{} {}", status, health.message);
    if let Some(root) = root {
        println!("{}", root.message.bright_black());
    }
}
