use colored::Colorize;

use supportdesk_chat::{Notification, NotificationLevel, Notifier};

/// Prints notifications as one-line console toasts on stderr
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Info => {
                eprintln!("{} {}", "ℹ".bright_cyan(), notification.message.bright_black())
            }
            NotificationLevel::Error => eprintln!(
                "{} {}",
                "❌".bright_red(),
                notification.message.bright_red()
            ),
        }
    }
}
