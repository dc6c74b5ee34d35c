//! Console output for the CLI subcommands

use ace_domain::{ConfigIssue, Message, Role, Severity};
use colored::Colorize;

/// Formats history and diagnostics for terminal display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format a history window as a colored transcript
    pub fn format_history(messages: &[Message]) -> String {
        if messages.is_empty() {
            return format!("{}\n", "(no messages)".dimmed());
        }

        let mut output = String::new();
        output.push_str(&Self::header(&format!("History ({} messages)", messages.len())));
        output.push('\n');

        for message in messages {
            let label = match message.role {
                Role::User => "user".cyan().bold(),
                Role::Assistant => "assistant".green().bold(),
            };
            output.push_str(&format!("\n{}\n", label));
            if message.content.is_empty() {
                output.push_str(&format!("{}\n", "  (empty)".dimmed()));
            } else {
                output.push_str(&Self::indent(&message.content, "  "));
                output.push('\n');
            }
        }

        output.push_str(&Self::footer());
        output
    }

    /// Format a history window as JSON
    pub fn format_history_json(messages: &[Message]) -> String {
        serde_json::to_string_pretty(messages).unwrap_or_else(|_| "[]".to_string())
    }

    /// One line per configuration issue, errors in red
    pub fn format_issues(issues: &[ConfigIssue]) -> String {
        issues
            .iter()
            .map(|issue| {
                let tag = match issue.severity {
                    Severity::Error => "error:".red().bold(),
                    Severity::Warning => "warning:".yellow().bold(),
                };
                format!("{} {}", tag, issue.message)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
