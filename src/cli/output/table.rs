//! Table output formatting for CLI commands
//!
//! Formatted table output for prompts, epics, and activity records using
//! comfy-table. Status cells are color-coded; when the terminal does not
//! support color they degrade to icon prefixes.

use std::env;

use chrono::{DateTime, Utc};
use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};

use crate::domain::models::{
    ActivityRecord, Epic, EpicStatus, Prompt, PromptPriority, PromptStatus,
};

use super::truncate;

/// Table formatter for CLI output
pub struct TableFormatter {
    use_colors: bool,
}

impl TableFormatter {
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
        }
    }

    pub const fn with_colors(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// Format the prompt collection as a table.
    pub fn format_prompts(&self, prompts: &[Prompt]) -> String {
        let mut table = base_table();

        table.set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Title").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
            Cell::new("Priority").add_attribute(Attribute::Bold),
            Cell::new("Epic").add_attribute(Attribute::Bold),
            Cell::new("PR").add_attribute(Attribute::Bold),
            Cell::new("Updated").add_attribute(Attribute::Bold),
        ]);

        for prompt in prompts {
            let id = prompt.id.as_uuid().to_string();

            let status_cell = if self.use_colors {
                Cell::new(prompt.status.to_string()).fg(status_color(prompt.status))
            } else {
                Cell::new(format!("{} {}", status_icon(prompt.status), prompt.status))
            };

            let priority_cell = if self.use_colors {
                Cell::new(prompt.priority.to_string()).fg(priority_color(prompt.priority))
            } else {
                Cell::new(prompt.priority.to_string())
            };

            let epic = prompt
                .epic_id
                .map(|id| id.to_string()[..8].to_string())
                .unwrap_or_else(|| "-".to_string());

            let pr = prompt
                .github_pr_number
                .map(|n| format!("#{n}"))
                .unwrap_or_else(|| "-".to_string());

            table.add_row(vec![
                Cell::new(&id[..8]),
                Cell::new(truncate(&prompt.title, 40)),
                status_cell,
                priority_cell,
                Cell::new(epic),
                Cell::new(pr),
                Cell::new(format_relative_time(&prompt.updated_at)),
            ]);
        }

        table.to_string()
    }

    /// Format a list of epics as a table.
    pub fn format_epics(&self, epics: &[Epic]) -> String {
        let mut table = base_table();

        table.set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Name").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
            Cell::new("Color").add_attribute(Attribute::Bold),
            Cell::new("Updated").add_attribute(Attribute::Bold),
        ]);

        for epic in epics {
            let id = epic.id.to_string();

            let status_cell = if self.use_colors {
                Cell::new(epic.status.to_string()).fg(epic_status_color(epic.status))
            } else {
                Cell::new(epic.status.to_string())
            };

            table.add_row(vec![
                Cell::new(&id[..8]),
                Cell::new(truncate(&epic.name, 40)),
                status_cell,
                Cell::new(&epic.color),
                Cell::new(format_relative_time(&epic.updated_at)),
            ]);
        }

        table.to_string()
    }

    /// Format the automation activity trail, newest first.
    pub fn format_activity(&self, records: &[ActivityRecord]) -> String {
        let mut table = base_table();

        table.set_header(vec![
            Cell::new("When").add_attribute(Attribute::Bold),
            Cell::new("Action").add_attribute(Attribute::Bold),
            Cell::new("Entity").add_attribute(Attribute::Bold),
            Cell::new("Details").add_attribute(Attribute::Bold),
            Cell::new("OK").add_attribute(Attribute::Bold),
            Cell::new("ms").add_attribute(Attribute::Bold),
        ]);

        for record in records {
            let entity = record
                .entity_id
                .map(|id| format!("{} {}", record.entity_type.as_str(), &id.to_string()[..8]))
                .unwrap_or_else(|| record.entity_type.as_str().to_string());

            let ok_cell = if self.use_colors {
                let (text, color) = if record.success {
                    ("yes", Color::Green)
                } else {
                    ("no", Color::Red)
                };
                Cell::new(text).fg(color)
            } else {
                Cell::new(if record.success { "✓" } else { "✗" })
            };

            table.add_row(vec![
                Cell::new(format_relative_time(&record.created_at)),
                Cell::new(&record.action),
                Cell::new(entity),
                Cell::new(truncate(record.details.as_deref().unwrap_or("-"), 50)),
                ok_cell,
                Cell::new(record.processing_time_ms.to_string()),
            ]);
        }

        table.to_string()
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn base_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Check if color output is supported
fn supports_color() -> bool {
    // Respect NO_COLOR environment variable
    if env::var("NO_COLOR").is_ok() {
        return false;
    }

    // Check for dumb terminal
    if let Ok(term) = env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    true
}

/// Map prompt status to color
fn status_color(status: PromptStatus) -> Color {
    match status {
        PromptStatus::Todo => Color::White,
        PromptStatus::InProgress | PromptStatus::PrReview => Color::Yellow,
        PromptStatus::Generating | PromptStatus::SendingToCursor | PromptStatus::CursorWorking => {
            Color::Cyan
        }
        PromptStatus::SentToCursor => Color::Blue,
        PromptStatus::PrCreated => Color::Magenta,
        PromptStatus::PrReady | PromptStatus::PrMerged | PromptStatus::Done => Color::Green,
        PromptStatus::Error => Color::Red,
    }
}

/// Map prompt status to icon
fn status_icon(status: PromptStatus) -> &'static str {
    match status {
        PromptStatus::Todo => "○",
        PromptStatus::InProgress | PromptStatus::PrReady => "●",
        PromptStatus::Generating | PromptStatus::SendingToCursor | PromptStatus::CursorWorking => {
            "⟳"
        }
        PromptStatus::SentToCursor | PromptStatus::PrCreated | PromptStatus::PrReview => "⧗",
        PromptStatus::PrMerged | PromptStatus::Done => "✓",
        PromptStatus::Error => "✗",
    }
}

/// Map prompt priority to color
fn priority_color(priority: PromptPriority) -> Color {
    match priority {
        PromptPriority::Low => Color::DarkGrey,
        PromptPriority::Normal => Color::White,
        PromptPriority::High => Color::Red,
    }
}

/// Map epic status to color
fn epic_status_color(status: EpicStatus) -> Color {
    match status {
        EpicStatus::Todo => Color::White,
        EpicStatus::InProgress => Color::Cyan,
        EpicStatus::Done => Color::Green,
    }
}

/// Format relative time (e.g., "2 hours ago")
pub fn format_relative_time(datetime: &DateTime<Utc>) -> String {
    let now = Utc::now();
    let duration = now.signed_duration_since(*datetime);

    if duration.num_seconds() < 60 {
        "just now".to_string()
    } else if duration.num_minutes() < 60 {
        let mins = duration.num_minutes();
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if duration.num_hours() < 24 {
        let hours = duration.num_hours();
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if duration.num_days() < 30 {
        let days = duration.num_days();
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        datetime.format("%Y-%m-%d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    #[test]
    fn test_format_prompts() {
        let mut prompt = Prompt::new(Uuid::new_v4(), "Fix the login flow");
        prompt.status = PromptStatus::CursorWorking;
        prompt.github_pr_number = Some(42);

        let formatter = TableFormatter::with_colors(false);
        let output = formatter.format_prompts(&[prompt]);

        assert!(output.contains("Fix the login flow"));
        assert!(output.contains("cursor_working"));
        assert!(output.contains("#42"));
    }

    #[test]
    fn test_format_epics() {
        let epic = Epic::new(Uuid::new_v4(), "Payments");

        let formatter = TableFormatter::with_colors(false);
        let output = formatter.format_epics(&[epic]);

        assert!(output.contains("Payments"));
        assert!(output.contains("todo"));
        assert!(output.contains("#6366f1"));
    }

    #[test]
    fn test_format_activity() {
        let record = ActivityRecord::new(Uuid::new_v4(), Uuid::new_v4(), "auto_status_update")
            .with_details("2 prompts moved");

        let formatter = TableFormatter::with_colors(false);
        let output = formatter.format_activity(&[record]);

        assert!(output.contains("auto_status_update"));
        assert!(output.contains("2 prompts moved"));
        assert!(output.contains("✓"));
    }

    #[test]
    fn test_status_icon_mapping() {
        assert_eq!(status_icon(PromptStatus::Done), "✓");
        assert_eq!(status_icon(PromptStatus::Error), "✗");
        assert_eq!(status_icon(PromptStatus::Generating), "⟳");
        assert_eq!(status_icon(PromptStatus::Todo), "○");
    }

    #[test]
    fn test_status_color_mapping() {
        assert_eq!(status_color(PromptStatus::Done), Color::Green);
        assert_eq!(status_color(PromptStatus::Error), Color::Red);
        assert_eq!(status_color(PromptStatus::CursorWorking), Color::Cyan);
    }

    #[test]
    fn test_format_relative_time() {
        let now = Utc::now();
        assert_eq!(format_relative_time(&now), "just now");
        assert_eq!(
            format_relative_time(&(now - Duration::minutes(5))),
            "5 mins ago"
        );
        assert_eq!(
            format_relative_time(&(now - Duration::hours(1))),
            "1 hour ago"
        );
        assert_eq!(
            format_relative_time(&(now - Duration::days(3))),
            "3 days ago"
        );
    }
}
